//! Bag-of-words cosine similarity between sentences.

use std::collections::BTreeMap;

use super::lexicon::{self, STOPWORDS};
use super::text::Sentence;

/// Lower-cased content-word counts for one sentence.
///
/// Falls back to every word when the sentence holds only stopwords, so a
/// sentence like "It is what it is." still has a vector.
pub fn term_counts(sentence: &Sentence) -> BTreeMap<&str, f32> {
    let mut counts = BTreeMap::new();
    for word in sentence.words() {
        if !lexicon::contains(STOPWORDS, &word.lower) {
            *counts.entry(word.lower.as_str()).or_insert(0.0) += 1.0;
        }
    }
    if counts.is_empty() {
        for word in sentence.words() {
            *counts.entry(word.lower.as_str()).or_insert(0.0) += 1.0;
        }
    }
    counts
}

/// Cosine of two term-count vectors; 0 when either is empty.
pub fn cosine(a: &BTreeMap<&str, f32>, b: &BTreeMap<&str, f32>) -> f32 {
    let dot: f32 = a
        .iter()
        .filter_map(|(term, x)| b.get(term).map(|y| x * y))
        .sum();
    let norm = |v: &BTreeMap<&str, f32>| v.values().map(|x| x * x).sum::<f32>().sqrt();
    let denom = norm(a) * norm(b);
    if denom > 0.0 {
        (dot / denom).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

pub fn sentence_similarity(a: &Sentence, b: &Sentence) -> f32 {
    cosine(&term_counts(a), &term_counts(b))
}
