//! Surface heuristics feeding the full fusion policy.
//!
//! These read the heuristic-normalised text (see
//! [`normalize_for_heuristics`]) and split on whitespace only.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::metrics::inverted_variance;
use super::text::normalize_for_heuristics;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TextHeuristicScores {
    pub repetition: f32,
    pub complexity: f32,
    pub consistency: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct TextHeuristics {
    variance_k: f32,
}

impl TextHeuristics {
    pub fn new(variance_k: f32) -> Self {
        Self { variance_k }
    }

    /// Score `transcript`; empty text scores 0 on every heuristic.
    pub fn score(&self, transcript: &str) -> TextHeuristicScores {
        let text = normalize_for_heuristics(transcript);
        let words: Vec<&str> = text.split_whitespace().collect();
        let scores = TextHeuristicScores {
            repetition: repetition(&words),
            complexity: self.complexity(&text),
            consistency: consistency(&words),
        };
        log::debug!(
            "linguistic: heuristics repetition={:.3} complexity={:.3} consistency={:.3}",
            scores.repetition,
            scores.complexity,
            scores.consistency
        );
        scores
    }

    /// Inverted variance of words per `.`-delimited sentence.
    fn complexity(&self, text: &str) -> f32 {
        let lengths: Vec<f32> = text
            .split('.')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.split_whitespace().count() as f32)
            .collect();
        if lengths.is_empty() {
            return 0.0;
        }
        inverted_variance(&lengths, self.variance_k)
    }
}

/// Count of the most frequent 3-word phrase per ten words, capped at 1.
fn repetition(words: &[&str]) -> f32 {
    if words.len() < 3 {
        return 0.0;
    }
    let mut counts: HashMap<[&str; 3], usize> = HashMap::new();
    for w in words.windows(3) {
        *counts.entry([w[0], w[1], w[2]]).or_insert(0) += 1;
    }
    let max = counts.values().copied().max().unwrap_or(0);
    let expected = words.len() as f32 / 10.0;
    (max as f32 / expected).min(1.0)
}

/// `1 - min(1, 2 * TTR)`: only heavily repetitive vocabulary scores above 0.
fn consistency(words: &[&str]) -> f32 {
    if words.is_empty() {
        return 0.0;
    }
    let ttr = words.iter().collect::<HashSet<_>>().len() as f32 / words.len() as f32;
    1.0 - (ttr * 2.0).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heuristics() -> TextHeuristics {
        TextHeuristics::new(2.0)
    }

    #[test]
    fn empty_text_scores_zero() {
        assert_eq!(heuristics().score(""), TextHeuristicScores::default());
        assert_eq!(heuristics().score("  \n "), TextHeuristicScores::default());
    }

    #[test]
    fn repeated_phrase_saturates_repetition() {
        // 30 words, one phrase ten times: 10 / 3 > 1.
        let text = "i love you ".repeat(10);
        assert_eq!(heuristics().score(&text).repetition, 1.0);
    }

    #[test]
    fn phrase_repeated_ceil_words_over_ten_times_saturates() {
        // 25 words; "the red fox" three times = ceil(25 / 10).
        let text = "the red fox ran far the red fox sat down the red fox \
                    then slept under a big oak tree by the calm river bank";
        let scores = heuristics().score(text);
        assert_eq!(text.split_whitespace().count(), 25);
        assert_eq!(scores.repetition, 1.0);
    }

    #[test]
    fn unique_phrases_score_low() {
        let text = "one two three four five six seven eight nine ten eleven twelve";
        // Every trigram once: 1 / 1.2.
        let r = heuristics().score(text).repetition;
        assert!((r - 1.0 / 1.2).abs() < 1e-6, "r = {r}");
    }

    #[test]
    fn equal_sentences_have_full_complexity() {
        let s = heuristics().score("Cats eat fish. Dogs eat meat.");
        assert_eq!(s.complexity, 1.0);
    }

    #[test]
    fn varied_sentences_lower_complexity() {
        let s = heuristics().score(
            "Yes. This particular sentence is considerably longer than the first one was.",
        );
        assert!(s.complexity < 1.0);
    }

    #[test]
    fn consistency_tracks_vocabulary_repetition() {
        assert_eq!(heuristics().score("all different words here").consistency, 0.0);
        // TTR 1/8 -> 1 - 0.25
        let s = heuristics().score("la la la la la la la la");
        assert!((s.consistency - 0.75).abs() < 1e-6);
    }
}
