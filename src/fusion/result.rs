//! The value object handed back to callers.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::config::FusionPolicy;
use crate::linguistic::LinguisticFeatureSet;
use crate::transcription::Transcript;

use super::band::{BandThresholds, SignalScore};
use super::engine::FusedScore;

/// Scores above this are listed as key indicators in the summary report.
pub const KEY_INDICATOR_THRESHOLD: f32 = 0.7;

/// What happened to the transcript side of the analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TextStatus {
    /// Transcript analysed and every text signal computed.
    Analyzed,
    /// The provider returned a blank transcript.
    EmptyTranscript,
    /// Transcription timed out or failed; acoustic signals only.
    TranscriptionUnavailable { reason: String },
    /// Linguistic metrics computed, but no classifier scores.
    ClassifierUnavailable,
}

/// Final confidence plus everything needed to explain it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    final_confidence: f32,
    policy: FusionPolicy,
    transcript: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    transcript_metadata: Option<serde_json::Value>,
    scores: BTreeMap<String, SignalScore>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    linguistic: Option<LinguisticFeatureSet>,
    /// Linguistic metric name → rendered likelihood sentence.
    analysis: BTreeMap<String, String>,
    text_status: TextStatus,
}

impl DetectionResult {
    pub fn new(fused: FusedScore, text_status: TextStatus) -> Self {
        Self {
            final_confidence: fused.final_confidence,
            policy: fused.policy,
            transcript: String::new(),
            transcript_metadata: None,
            scores: fused.signals,
            linguistic: None,
            analysis: BTreeMap::new(),
            text_status,
        }
    }

    pub fn with_transcript(mut self, transcript: &Transcript) -> Self {
        self.transcript = transcript.text.clone();
        self.transcript_metadata = transcript.metadata.clone();
        self
    }

    /// Attach the linguistic metrics and their rendered analysis.
    pub fn with_linguistic(mut self, set: LinguisticFeatureSet, thresholds: &BandThresholds) -> Self {
        self.analysis = set
            .iter()
            .map(|(name, score)| (name.to_string(), thresholds.likelihood(score)))
            .collect();
        self.linguistic = Some(set);
        self
    }

    pub fn final_confidence(&self) -> f32 {
        self.final_confidence
    }

    pub fn policy(&self) -> FusionPolicy {
        self.policy
    }

    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    pub fn transcript_metadata(&self) -> Option<&serde_json::Value> {
        self.transcript_metadata.as_ref()
    }

    pub fn scores(&self) -> &BTreeMap<String, SignalScore> {
        &self.scores
    }

    pub fn score(&self, name: &str) -> Option<f32> {
        self.scores.get(name).map(|s| s.score)
    }

    pub fn linguistic(&self) -> Option<&LinguisticFeatureSet> {
        self.linguistic.as_ref()
    }

    pub fn analysis(&self) -> &BTreeMap<String, String> {
        &self.analysis
    }

    pub fn text_status(&self) -> &TextStatus {
        &self.text_status
    }

    /// Plain-text report: overall confidence and every fusion signal or
    /// linguistic metric above [`KEY_INDICATOR_THRESHOLD`].
    pub fn summary_report(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "AI Voice Detection Report");
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "Overall AI confidence: {:.2}%",
            self.final_confidence * 100.0
        );
        let _ = writeln!(out, "Fusion policy: {}", self.policy);
        let _ = writeln!(out);
        let _ = writeln!(out, "Key indicators:");

        let mut indicators: Vec<(&str, f32)> = self
            .scores
            .iter()
            .map(|(name, s)| (name.as_str(), s.score))
            .collect();
        if let Some(set) = &self.linguistic {
            for (name, score) in set.iter() {
                indicators.push((name, score));
            }
        }
        indicators.retain(|(_, score)| *score > KEY_INDICATOR_THRESHOLD);

        if indicators.is_empty() {
            let _ = writeln!(out, "- none");
        }
        for (name, score) in indicators {
            let _ = writeln!(out, "- {name}: {:.2}%", score * 100.0);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FusionConfig;
    use crate::fusion::{CoarseSignals, ScoreFusionEngine};

    fn coarse_result(audio: f32, text: f32) -> DetectionResult {
        let engine = ScoreFusionEngine::new(&FusionConfig::default());
        DetectionResult::new(
            engine.fuse_coarse(CoarseSignals { audio, text }),
            TextStatus::Analyzed,
        )
    }

    #[test]
    fn report_lists_indicators_above_threshold() {
        let report = coarse_result(0.9, 0.2).summary_report();
        assert!(report.contains("Overall AI confidence: 62.00%"), "{report}");
        assert!(report.contains("- audio_score: 90.00%"));
        assert!(!report.contains("text_score"));
    }

    #[test]
    fn report_without_indicators_says_none() {
        let report = coarse_result(0.1, 0.0).summary_report();
        assert!(report.contains("- none"));
    }

    #[test]
    fn linguistic_metrics_are_rendered() {
        let set = LinguisticFeatureSet {
            lexical_diversity: 0.85,
            ..LinguisticFeatureSet::default()
        };
        let result = coarse_result(0.0, 0.0).with_linguistic(set, &BandThresholds::default());
        assert_eq!(
            result.analysis()["lexical_diversity"],
            "High likelihood of AI generation (0.85)"
        );
        assert_eq!(result.analysis().len(), 9);
        assert!(result.summary_report().contains("- lexical_diversity: 85.00%"));
    }

    #[test]
    fn transcript_and_metadata_are_kept() {
        let t = Transcript::new("hi").with_metadata(serde_json::json!([{ "speaker": 0 }]));
        let result = coarse_result(0.0, 0.0).with_transcript(&t);
        assert_eq!(result.transcript(), "hi");
        assert!(result.transcript_metadata().is_some());
    }

    #[test]
    fn serializes_to_json() {
        let result = coarse_result(1.0, 2.0);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["final_confidence"], 1.0);
        assert_eq!(json["policy"], "coarse");
        assert_eq!(json["text_status"]["status"], "analyzed");
        assert_eq!(json["scores"]["text_score"]["band"], "high");
    }
}
