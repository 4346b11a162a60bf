//! The nine transcript metrics.
//!
//! Every metric is a pure function of the cleaned transcript and resolves
//! degenerate input (no words, one sentence, zero variance) to a fixed
//! value instead of failing.

use std::collections::{BTreeMap, HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::LinguisticConfig;

use super::similarity::sentence_similarity;
use super::syntax::{dependency_depth, noun_heads};
use super::text::{clean_transcript, Document};

static PAUSE_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\.{3}|…|\b(?:uh|um|er|ah)\b").expect("hard-coded pattern compiles")
});
static SEGMENT_SPLIT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]+").expect("hard-coded pattern compiles"));

// ---------------------------------------------------------------------------
// Shared numeric helpers
// ---------------------------------------------------------------------------

fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f32>() / values.len() as f32
    }
}

/// Population variance.
fn variance(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f32>() / values.len() as f32
}

/// `1 - min(1, variance / (mean * k))`.
///
/// A non-positive `mean * k` means every value is zero, which counts as no
/// variation at all and scores 1.
pub fn inverted_variance(values: &[f32], k: f32) -> f32 {
    let denom = mean(values) * k;
    if denom.is_nan() || denom <= 0.0 {
        return 1.0;
    }
    1.0 - (variance(values) / denom).min(1.0)
}

/// Shannon entropy in nats of a frequency table.
fn entropy<K>(counts: &HashMap<K, usize>) -> f32 {
    let total: usize = counts.values().sum();
    if total == 0 {
        return 0.0;
    }
    let total = total as f32;
    counts
        .values()
        .map(|&c| {
            let p = c as f32 / total;
            -p * p.ln()
        })
        .sum()
}

fn frequencies<'a>(items: impl IntoIterator<Item = &'a str>) -> HashMap<&'a str, usize> {
    let mut counts = HashMap::new();
    for item in items {
        *counts.entry(item).or_insert(0) += 1;
    }
    counts
}

fn type_token_ratio(words: &[&str]) -> f32 {
    if words.is_empty() {
        return 0.0;
    }
    words.iter().collect::<HashSet<_>>().len() as f32 / words.len() as f32
}

// ---------------------------------------------------------------------------
// LinguisticFeatureSet
// ---------------------------------------------------------------------------

/// The nine metric scores of one transcript, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LinguisticFeatureSet {
    pub lexical_diversity: f32,
    pub syntactic_complexity: f32,
    pub response_coherence: f32,
    pub word_distribution: f32,
    pub sentence_variance: f32,
    pub semantic_consistency: f32,
    pub topic_coherence: f32,
    pub pause_pattern_score: f32,
    pub speech_rate_consistency: f32,
}

impl LinguisticFeatureSet {
    /// `(name, score)` pairs in a fixed order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f32)> {
        [
            ("lexical_diversity", self.lexical_diversity),
            ("syntactic_complexity", self.syntactic_complexity),
            ("response_coherence", self.response_coherence),
            ("word_distribution", self.word_distribution),
            ("sentence_variance", self.sentence_variance),
            ("semantic_consistency", self.semantic_consistency),
            ("topic_coherence", self.topic_coherence),
            ("pause_pattern_score", self.pause_pattern_score),
            ("speech_rate_consistency", self.speech_rate_consistency),
        ]
        .into_iter()
    }

    pub fn as_map(&self) -> BTreeMap<String, f32> {
        self.iter().map(|(k, v)| (k.to_string(), v)).collect()
    }
}

// ---------------------------------------------------------------------------
// LinguisticAnalyzer
// ---------------------------------------------------------------------------

/// Computes a [`LinguisticFeatureSet`] from raw transcript text.
#[derive(Debug, Clone)]
pub struct LinguisticAnalyzer {
    config: LinguisticConfig,
}

impl LinguisticAnalyzer {
    pub fn new(config: &LinguisticConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Clean `transcript` and score it.
    ///
    /// # Example
    ///
    /// ```rust
    /// use ai_voice_detector::config::LinguisticConfig;
    /// use ai_voice_detector::linguistic::LinguisticAnalyzer;
    ///
    /// let set = LinguisticAnalyzer::new(&LinguisticConfig::default()).analyze("Just one sentence.");
    /// assert_eq!(set.response_coherence, 1.0);
    /// assert_eq!(set.sentence_variance, 0.0);
    /// ```
    pub fn analyze(&self, transcript: &str) -> LinguisticFeatureSet {
        let cleaned = clean_transcript(transcript);
        let doc = Document::parse(&cleaned);
        let words = doc.words_lower();

        let set = LinguisticFeatureSet {
            lexical_diversity: self.lexical_diversity(&words),
            syntactic_complexity: self.syntactic_complexity(&doc),
            response_coherence: response_coherence(&doc),
            word_distribution: self.word_distribution(&words),
            sentence_variance: self.sentence_variance(&doc),
            semantic_consistency: self.semantic_consistency(&doc),
            topic_coherence: self.topic_coherence(&doc),
            pause_pattern_score: self.pause_pattern(&cleaned),
            speech_rate_consistency: self.speech_rate_consistency(&cleaned),
        };
        for (name, score) in set.iter() {
            log::debug!("linguistic: {name} = {score:.3}");
        }
        set
    }

    /// Mean of whole-text TTR and moving-average TTR.
    fn lexical_diversity(&self, words: &[&str]) -> f32 {
        if words.is_empty() {
            return 0.0;
        }
        let ttr = type_token_ratio(words);
        let window = self.config.mattr_window.max(1);
        let mattr = if words.len() <= window {
            ttr
        } else {
            let ratios: Vec<f32> = words.windows(window).map(type_token_ratio).collect();
            mean(&ratios)
        };
        ((ttr + mattr) / 2.0).clamp(0.0, 1.0)
    }

    fn syntactic_complexity(&self, doc: &Document) -> f32 {
        if doc.is_empty() || self.config.depth_divisor <= 0.0 {
            return 0.0;
        }
        let depths: Vec<f32> = doc
            .sentences
            .iter()
            .map(|s| dependency_depth(s) as f32)
            .collect();
        (mean(&depths) / self.config.depth_divisor).clamp(0.0, 1.0)
    }

    fn word_distribution(&self, words: &[&str]) -> f32 {
        if words.is_empty() || self.config.word_entropy_divisor <= 0.0 {
            return 0.0;
        }
        let h = entropy(&frequencies(words.iter().copied()));
        1.0 - (h / self.config.word_entropy_divisor).min(1.0)
    }

    /// Token counts per sentence, punctuation included.
    fn sentence_variance(&self, doc: &Document) -> f32 {
        if doc.sentences.len() < 2 {
            return 0.0;
        }
        let lengths: Vec<f32> = doc.sentences.iter().map(|s| s.len() as f32).collect();
        inverted_variance(&lengths, self.config.variance_k)
    }

    fn semantic_consistency(&self, doc: &Document) -> f32 {
        let sentences = &doc.sentences;
        if sentences.len() < 2 {
            return 0.0;
        }
        let mut sims = Vec::with_capacity(sentences.len() * (sentences.len() - 1) / 2);
        for (i, a) in sentences.iter().enumerate() {
            for b in &sentences[i + 1..] {
                sims.push(sentence_similarity(a, b));
            }
        }
        inverted_variance(&sims, self.config.variance_k)
    }

    fn topic_coherence(&self, doc: &Document) -> f32 {
        let nouns: Vec<&str> = doc.sentences.iter().flat_map(noun_heads).collect();
        if nouns.is_empty() || self.config.topic_entropy_divisor <= 0.0 {
            return 0.0;
        }
        let h = entropy(&frequencies(nouns));
        1.0 - (h / self.config.topic_entropy_divisor).min(1.0)
    }

    /// Distance of the filler rate from the human baseline.
    fn pause_pattern(&self, cleaned: &str) -> f32 {
        let lower = cleaned.to_lowercase();
        let markers = PAUSE_MARKER.find_iter(&lower).count();
        let words = lower.split_whitespace().count();
        if markers == 0 || words == 0 {
            return self.config.pause_neutral;
        }
        let rate = markers as f32 / words as f32;
        ((rate - self.config.pause_baseline).abs() * self.config.pause_scale).clamp(0.0, 1.0)
    }

    fn speech_rate_consistency(&self, cleaned: &str) -> f32 {
        let rates: Vec<f32> = SEGMENT_SPLIT
            .split(cleaned)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.split_whitespace().count() as f32)
            .collect();
        if rates.len() < 2 {
            return 0.0;
        }
        inverted_variance(&rates, self.config.variance_k)
    }
}

/// Mean similarity of adjacent sentences; 1.0 below two sentences.
fn response_coherence(doc: &Document) -> f32 {
    if doc.sentences.len() < 2 {
        return 1.0;
    }
    let sims: Vec<f32> = doc
        .sentences
        .windows(2)
        .map(|pair| sentence_similarity(&pair[0], &pair[1]))
        .collect();
    mean(&sims).clamp(0.0, 1.0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
