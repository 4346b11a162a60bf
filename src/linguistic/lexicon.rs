//! Closed-class English word lists used by the structural heuristics.
//!
//! All entries are lowercase.

pub const PREPOSITIONS: &[&str] = &[
    "about", "above", "across", "after", "against", "along", "among", "around", "at", "before",
    "behind", "below", "beneath", "beside", "between", "beyond", "by", "despite", "down",
    "during", "except", "for", "from", "in", "inside", "into", "near", "of", "off", "on", "onto",
    "out", "outside", "over", "past", "per", "through", "throughout", "to", "toward", "towards",
    "under", "underneath", "up", "upon", "via", "with", "within", "without",
];

/// Articles, demonstratives, possessives and quantifiers.
pub const DETERMINERS: &[&str] = &[
    "a", "an", "the", "this", "these", "those", "my", "your", "his", "her", "its", "our",
    "their", "some", "any", "each", "every", "no", "another", "such", "several", "many", "few",
    "both", "either", "neither", "all", "most",
];

/// Words that open an embedded clause.
pub const SUBORDINATORS: &[&str] = &[
    "that", "which", "who", "whom", "whose", "because", "although", "though", "if", "unless",
    "when", "whenever", "while", "whereas", "where", "wherever", "since", "until", "once",
    "whether",
];

/// Function words that never head a noun phrase.
pub const STOPWORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "nor", "so", "yet", "i", "me", "my", "we", "us",
    "our", "you", "your", "he", "him", "his", "she", "her", "it", "its", "they", "them",
    "their", "this", "that", "these", "those", "is", "am", "are", "was", "were", "be", "been",
    "being", "have", "has", "had", "do", "does", "did", "will", "would", "shall", "should",
    "can", "could", "may", "might", "must", "not", "no", "very", "too", "also", "just", "then",
    "than", "there", "here", "what", "which", "who", "whom", "whose", "how", "why", "when",
    "where", "if", "as", "of", "in", "on", "at", "by", "for", "with", "to", "from", "up",
    "down", "out", "about", "into", "over", "under", "again", "some", "any", "each", "every",
    "all", "both", "more", "most", "such", "own", "same", "other", "only", "now", "well",
    "indeed", "furthermore", "however", "because", "while", "although", "though", "unless",
    "until", "since", "whether", "yes", "oh",
];

/// Derivational endings that mark nouns.
pub const NOUN_SUFFIXES: &[&str] = &[
    "tion", "sion", "ment", "ness", "ity", "ance", "ence", "ship", "ism", "ist", "ogy", "hood",
    "dom", "ure", "age",
];

/// Abbreviations whose trailing period does not end a sentence.
pub const ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "vs", "etc", "inc", "ltd",
];

pub fn contains(list: &[&str], word: &str) -> bool {
    list.contains(&word)
}
