//! Raw per-signal scores fed into the fusion engine.

use serde::{Deserialize, Serialize};

use crate::classifier::ClassifierOutput;
use crate::features::AcousticFeatures;
use crate::linguistic::TextHeuristicScores;

/// `min(mfcc_variance / scale, 1)`; 0 without features.
///
/// # Example
///
/// ```rust
/// use ai_voice_detector::features::AcousticFeatures;
/// use ai_voice_detector::fusion::audio_score;
///
/// assert_eq!(audio_score(&AcousticFeatures::NoFeatures, 5000.0), 0.0);
/// ```
pub fn audio_score(features: &AcousticFeatures, variance_scale: f32) -> f32 {
    let Some(bundle) = features.bundle() else {
        return 0.0;
    };
    if variance_scale <= 0.0 {
        return 0.0;
    }
    let score = bundle.mfcc_variance() / variance_scale;
    if score.is_finite() {
        score.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Case-insensitive occurrence count of `keywords` in `text`.
///
/// Deliberately unclamped: two hits score 2.0 and the final clamp of the
/// blend bounds the result.
pub fn keyword_score(text: &str, keywords: &[String]) -> f32 {
    let haystack = text.to_lowercase();
    keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .map(|k| haystack.matches(k.as_str()).count())
        .sum::<usize>() as f32
}

/// Inputs of the coarse two-signal blend.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CoarseSignals {
    pub audio: f32,
    pub text: f32,
}

/// Inputs of the five-signal blend.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FullSignals {
    pub repetition: f32,
    pub complexity: f32,
    pub consistency: f32,
    pub perplexity: f32,
    pub classifier: f32,
}

impl FullSignals {
    pub fn new(heuristics: TextHeuristicScores, classifier: ClassifierOutput) -> Self {
        Self {
            repetition: heuristics.repetition,
            complexity: heuristics.complexity,
            consistency: heuristics.consistency,
            perplexity: classifier.naturalness_score,
            classifier: classifier.ai_probability,
        }
    }

    pub fn uniform(score: f32) -> Self {
        Self {
            repetition: score,
            complexity: score,
            consistency: score,
            perplexity: score,
            classifier: score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureBundle;

    fn features_with_variance_10000() -> AcousticFeatures {
        let bundle = FeatureBundle::new(
            vec![vec![-100.0, 100.0], vec![100.0, -100.0]],
            vec![0.0; 2],
            vec![0.0; 2],
            vec![0.0; 2],
        )
        .unwrap();
        AcousticFeatures::Extracted(bundle)
    }

    #[test]
    fn audio_score_saturates() {
        assert_eq!(audio_score(&features_with_variance_10000(), 5000.0), 1.0);
        assert_eq!(audio_score(&features_with_variance_10000(), 40_000.0), 0.25);
    }

    #[test]
    fn audio_score_guards_scale() {
        assert_eq!(audio_score(&features_with_variance_10000(), 0.0), 0.0);
    }

    #[test]
    fn keywords_match_case_insensitively() {
        let keywords = vec!["furthermore".to_string(), "indeed".to_string()];
        let text = "Hello, my name is AI. Furthermore, indeed, I am here.";
        assert_eq!(keyword_score(text, &keywords), 2.0);
        assert_eq!(keyword_score("INDEED indeed", &keywords), 2.0);
        assert_eq!(keyword_score("nothing here", &keywords), 0.0);
    }

    #[test]
    fn blank_keywords_are_ignored() {
        assert_eq!(keyword_score("abc", &["".to_string(), " ".to_string()]), 0.0);
    }
}
