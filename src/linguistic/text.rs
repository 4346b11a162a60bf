//! Transcript cleaning, tokenization and sentence segmentation.
//!
//! Two cleaning passes exist because two families of metrics read text
//! differently:
//!
//! * [`clean_transcript`] strips `[mm:ss]` timestamps and `Speaker N:`
//!   labels and collapses whitespace; case and punctuation are kept for
//!   tokenization.
//! * [`normalize_for_heuristics`] additionally drops every character that is
//!   not a word character, whitespace or one of `.,!?`, and lower-cases.

use once_cell::sync::Lazy;
use regex::Regex;

use super::lexicon::{self, ABBREVIATIONS};

static TIMESTAMP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\d{2}:\d{2}\]").expect("hard-coded pattern compiles"));
static SPEAKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Speaker \d+:").expect("hard-coded pattern compiles"));
static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("hard-coded pattern compiles"));
static HEURISTIC_STRIP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s.,!?]").expect("hard-coded pattern compiles"));
static TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\p{L}+(?:['’]\p{L}+)*|\p{N}+(?:[.,:]\p{N}+)*|\.{3}|…|[^\s\p{L}\p{N}]")
        .expect("hard-coded pattern compiles")
});

// ---------------------------------------------------------------------------
// Cleaning
// ---------------------------------------------------------------------------

/// Strip timestamps and speaker labels, collapse whitespace, trim.
///
/// # Example
///
/// ```rust
/// use ai_voice_detector::linguistic::clean_transcript;
///
/// let raw = "[00:01] Speaker 1: Hello   there.\n[00:03] Speaker 2: Hi.";
/// assert_eq!(clean_transcript(raw), "Hello there. Hi.");
/// ```
pub fn clean_transcript(text: &str) -> String {
    let text = TIMESTAMP.replace_all(text, "");
    let text = SPEAKER.replace_all(&text, "");
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

/// Keep only word characters, whitespace and `.,!?`; collapse whitespace;
/// lower-case.
pub fn normalize_for_heuristics(text: &str) -> String {
    let text = HEURISTIC_STRIP.replace_all(text, "");
    WHITESPACE
        .replace_all(&text, " ")
        .trim()
        .to_lowercase()
}

// ---------------------------------------------------------------------------
// Tokens
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Letters, optionally joined by apostrophes.
    Word,
    Number,
    Punct,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub lower: String,
    pub kind: TokenKind,
}

impl Token {
    fn new(text: &str) -> Self {
        let first = text.chars().next();
        let kind = match first {
            Some(c) if c.is_alphabetic() => TokenKind::Word,
            Some(c) if c.is_numeric() => TokenKind::Number,
            _ => TokenKind::Punct,
        };
        Self {
            text: text.to_string(),
            lower: text.to_lowercase(),
            kind,
        }
    }

    pub fn is_word(&self) -> bool {
        self.kind == TokenKind::Word
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.text.as_str(), "." | "!" | "?")
    }

    /// Clause-internal punctuation that closes an open phrase.
    pub fn is_phrase_break(&self) -> bool {
        matches!(self.text.as_str(), "," | ";" | ":" | "-" | "–" | "—" | "(" | ")")
    }

    pub fn is_capitalized(&self) -> bool {
        self.text.chars().next().is_some_and(char::is_uppercase)
    }
}

/// Split `text` into word, number and punctuation tokens.
pub fn tokenize(text: &str) -> Vec<Token> {
    TOKEN
        .find_iter(text)
        .map(|m| Token::new(m.as_str()))
        .collect()
}

// ---------------------------------------------------------------------------
// Sentences
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    pub tokens: Vec<Token>,
}

impl Sentence {
    /// Token count, punctuation included.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn words(&self) -> impl Iterator<Item = &Token> {
        self.tokens.iter().filter(|t| t.is_word())
    }

    pub fn text(&self) -> String {
        self.tokens
            .iter()
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A cleaned transcript segmented into sentences.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    pub sentences: Vec<Sentence>,
}

impl Document {
    /// Tokenize and segment `text`.
    ///
    /// A sentence ends after `.`, `!` or `?` (runs of them stay together),
    /// except for the period of a known abbreviation.
    pub fn parse(text: &str) -> Self {
        let tokens = tokenize(text);
        let mut sentences = Vec::new();
        let mut current: Vec<Token> = Vec::new();

        for (i, token) in tokens.iter().enumerate() {
            current.push(token.clone());
            if !token.is_terminal() {
                continue;
            }
            let next_is_terminal = tokens.get(i + 1).is_some_and(Token::is_terminal);
            let after_abbreviation = token.text == "."
                && i > 0
                && tokens[i - 1].is_word()
                && lexicon::contains(ABBREVIATIONS, &tokens[i - 1].lower);
            if !next_is_terminal && !after_abbreviation {
                sentences.push(Sentence {
                    tokens: std::mem::take(&mut current),
                });
            }
        }
        if !current.is_empty() {
            sentences.push(Sentence { tokens: current });
        }

        Self { sentences }
    }

    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.sentences.iter().flat_map(|s| s.tokens.iter())
    }

    /// Lower-cased word tokens, in order.
    pub fn words_lower(&self) -> Vec<&str> {
        self.tokens()
            .filter(|t| t.is_word())
            .map(|t| t.lower.as_str())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_strips_labels_and_timestamps() {
        assert_eq!(
            clean_transcript("  [12:34]Speaker 10: So...\t\tyes  "),
            "So... yes"
        );
    }

    #[test]
    fn normalize_drops_symbols_and_lowercases() {
        assert_eq!(
            normalize_for_heuristics("Hello, World! It's  50% (maybe)?"),
            "hello, world! its 50 maybe?"
        );
    }

    #[test]
    fn tokenize_classifies_tokens() {
        let tokens = tokenize("Don't pay $3.50, ok...");
        let kinds: Vec<_> = tokens.iter().map(|t| (t.text.as_str(), t.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                ("Don't", TokenKind::Word),
                ("pay", TokenKind::Word),
                ("$", TokenKind::Punct),
                ("3.50", TokenKind::Number),
                (",", TokenKind::Punct),
                ("ok", TokenKind::Word),
                ("...", TokenKind::Punct),
            ]
        );
    }

    #[test]
    fn parse_splits_on_terminal_punctuation() {
        let doc = Document::parse("Hello, my name is AI. Furthermore, indeed, I am here.");
        assert_eq!(doc.sentences.len(), 2);
        assert_eq!(doc.sentences[0].len(), 7);
    }

    #[test]
    fn parse_keeps_repeated_terminals_together() {
        let doc = Document::parse("Really?! Yes.");
        assert_eq!(doc.sentences.len(), 2);
        assert_eq!(doc.sentences[0].text(), "Really ? !");
    }

    #[test]
    fn parse_ignores_abbreviation_periods() {
        let doc = Document::parse("I met Dr. Smith today. He was kind.");
        assert_eq!(doc.sentences.len(), 2);
    }

    #[test]
    fn unterminated_text_is_one_sentence() {
        let doc = Document::parse("no punctuation at all");
        assert_eq!(doc.sentences.len(), 1);
        assert_eq!(doc.words_lower(), vec!["no", "punctuation", "at", "all"]);
    }

    #[test]
    fn empty_text_has_no_sentences() {
        assert!(Document::parse("").is_empty());
        assert!(Document::parse("   ").is_empty());
    }
}
