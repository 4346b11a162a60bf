//! Lexical approximations of parse-tree depth and noun heads.
//!
//! Without a dependency parser the tree is estimated from closed-class
//! words: every subordinator opens a nested clause, every preposition opens
//! a phrase that nests under the previous open one, and determiners hang one
//! level below the noun they introduce. Clause-internal punctuation closes
//! open prepositional phrases.

use super::lexicon::{self, DETERMINERS, NOUN_SUFFIXES, PREPOSITIONS, STOPWORDS, SUBORDINATORS};
use super::text::{Sentence, Token};

/// Estimated maximum token depth of `sentence`; 0 when it has no words.
///
/// A main-clause word sits at depth 1. A subordinator raises the clause
/// level by one. Inside `k` open prepositional phrases a preposition sits at
/// `clause + 2k` and its object at one level below the preposition.
pub fn dependency_depth(sentence: &Sentence) -> usize {
    let mut clause = 1usize;
    let mut open_phrases = 0usize;
    let mut max_depth = 0usize;

    for token in &sentence.tokens {
        if !token.is_word() {
            if token.is_phrase_break() {
                open_phrases = 0;
            }
            continue;
        }
        let word = token.lower.as_str();
        let depth = if lexicon::contains(SUBORDINATORS, word) {
            clause += 1;
            open_phrases = 0;
            clause
        } else if lexicon::contains(PREPOSITIONS, word) {
            let depth = clause + 2 * open_phrases;
            open_phrases += 1;
            depth
        } else {
            let base = if open_phrases == 0 {
                clause
            } else {
                clause + 2 * open_phrases - 1
            };
            if lexicon::contains(DETERMINERS, word) {
                base + 1
            } else {
                base
            }
        };
        max_depth = max_depth.max(depth);
    }

    max_depth
}

/// Noun heads of `sentence`, using each token's original spelling.
///
/// Three cues mark a noun:
///
/// * a capitalized word that does not open the sentence (proper noun),
/// * the last content word of a run that follows a determiner,
/// * a content word longer than four characters with a nominal suffix.
pub fn noun_heads(sentence: &Sentence) -> Vec<&str> {
    let words: Vec<&Token> = sentence.words().collect();
    let mut is_noun = vec![false; words.len()];

    for (i, word) in words.iter().enumerate() {
        let lower = word.lower.as_str();
        let content = !lexicon::contains(STOPWORDS, lower);

        if i > 0 && word.is_capitalized() && word.text != "I" && content {
            is_noun[i] = true;
        }
        if content && lower.chars().count() > 4 && NOUN_SUFFIXES.iter().any(|s| lower.ends_with(s))
        {
            is_noun[i] = true;
        }
        if lexicon::contains(DETERMINERS, lower) {
            let mut head = None;
            for (j, next) in words.iter().enumerate().skip(i + 1) {
                if lexicon::contains(STOPWORDS, &next.lower) {
                    break;
                }
                head = Some(j);
            }
            if let Some(j) = head {
                is_noun[j] = true;
            }
        }
    }

    words
        .iter()
        .zip(is_noun)
        .filter_map(|(w, noun)| noun.then_some(w.text.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linguistic::text::Document;

    fn first(text: &str) -> Sentence {
        Document::parse(text).sentences.remove(0)
    }

    #[test]
    fn flat_sentence_has_depth_one() {
        assert_eq!(dependency_depth(&first("Dogs bark.")), 1);
    }

    #[test]
    fn determiner_sits_below_its_noun() {
        assert_eq!(dependency_depth(&first("The dog barked.")), 2);
    }

    #[test]
    fn nested_prepositions_deepen() {
        // in(1) the(3) box(2) on(3) the(5) table(4)
        assert_eq!(dependency_depth(&first("Put it in the box on the table.")), 5);
    }

    #[test]
    fn comma_closes_open_phrases() {
        let nested = dependency_depth(&first("It sat in the box on the shelf."));
        let split = dependency_depth(&first("It sat in the box, on the shelf."));
        assert!(split < nested, "{split} !< {nested}");
    }

    #[test]
    fn subordinate_clause_raises_depth() {
        let simple = dependency_depth(&first("I left early."));
        let nested = dependency_depth(&first("I left because it rained."));
        assert!(nested > simple);
    }

    #[test]
    fn sentence_without_words_has_depth_zero() {
        assert_eq!(dependency_depth(&first("42 ?")), 0);
    }

    #[test]
    fn finds_determiner_heads_and_proper_nouns() {
        let s = first("Yesterday I met Alice near the old station.");
        assert_eq!(noun_heads(&s), vec!["Alice", "station"]);
    }

    #[test]
    fn suffix_marks_nouns() {
        let s = first("Careful preparation improves happiness.");
        assert_eq!(noun_heads(&s), vec!["preparation", "happiness"]);
    }
}
