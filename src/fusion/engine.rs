//! Weighted blending of per-signal scores.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::{CoarseWeights, FullWeights, FusionConfig, FusionPolicy};

use super::band::{BandThresholds, SignalScore};
use super::signals::{CoarseSignals, FullSignals};

/// The blended confidence and the explained signals behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedScore {
    /// `clamp(Σ wᵢ·sᵢ, 0, 1)`.
    pub final_confidence: f32,
    /// Policy that actually produced the score.
    pub policy: FusionPolicy,
    pub signals: BTreeMap<String, SignalScore>,
}

/// Applies the configured fusion policy.
///
/// Fusion is infallible: a non-finite weighted sum collapses to 0 and the
/// full policy falls back to the coarse blend when its inputs are missing.
#[derive(Debug, Clone)]
pub struct ScoreFusionEngine {
    policy: FusionPolicy,
    coarse: CoarseWeights,
    full: FullWeights,
    thresholds: BandThresholds,
}

impl ScoreFusionEngine {
    pub fn new(config: &FusionConfig) -> Self {
        Self {
            policy: config.policy,
            coarse: config.coarse_weights.clone(),
            full: config.full_weights.clone(),
            thresholds: BandThresholds::from_config(config),
        }
    }

    pub fn policy(&self) -> FusionPolicy {
        self.policy
    }

    pub fn thresholds(&self) -> &BandThresholds {
        &self.thresholds
    }

    /// Pick the configured policy, degrading to coarse without `full`.
    ///
    /// Under the full policy the coarse signals are still listed in
    /// [`FusedScore::signals`] but carry no weight.
    pub fn fuse(&self, coarse: CoarseSignals, full: Option<FullSignals>) -> FusedScore {
        match (self.policy, full) {
            (FusionPolicy::Full, Some(full)) => {
                let mut fused = self.fuse_full(&full);
                for (name, score) in [("audio_score", coarse.audio), ("text_score", coarse.text)] {
                    fused
                        .signals
                        .insert(name.to_string(), self.thresholds.indicator(score));
                }
                fused
            }
            (FusionPolicy::Full, None) => {
                log::warn!("fusion: transcript signals unavailable, using coarse policy");
                self.fuse_coarse(coarse)
            }
            (FusionPolicy::Coarse, _) => self.fuse_coarse(coarse),
        }
    }

    /// `audio · w_audio + text · w_text`.
    ///
    /// ```rust
    /// use ai_voice_detector::config::FusionConfig;
    /// use ai_voice_detector::fusion::{CoarseSignals, ScoreFusionEngine};
    ///
    /// let engine = ScoreFusionEngine::new(&FusionConfig::default());
    /// let fused = engine.fuse_coarse(CoarseSignals { audio: 1.0, text: 2.0 });
    /// assert_eq!(fused.final_confidence, 1.0);
    /// ```
    pub fn fuse_coarse(&self, signals: CoarseSignals) -> FusedScore {
        self.blend(
            FusionPolicy::Coarse,
            &[
                ("audio_score", signals.audio, self.coarse.audio),
                ("text_score", signals.text, self.coarse.text),
            ],
        )
    }

    pub fn fuse_full(&self, signals: &FullSignals) -> FusedScore {
        self.blend(
            FusionPolicy::Full,
            &[
                ("repetition_score", signals.repetition, self.full.repetition),
                ("complexity_score", signals.complexity, self.full.complexity),
                ("consistency_score", signals.consistency, self.full.consistency),
                ("perplexity_score", signals.perplexity, self.full.perplexity),
                ("classifier_score", signals.classifier, self.full.classifier),
            ],
        )
    }

    fn blend(&self, policy: FusionPolicy, parts: &[(&str, f32, f32)]) -> FusedScore {
        let sum: f32 = parts.iter().map(|(_, score, weight)| score * weight).sum();
        let final_confidence = if sum.is_finite() {
            sum.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let signals = parts
            .iter()
            .map(|(name, score, _)| (name.to_string(), self.thresholds.indicator(*score)))
            .collect();
        log::debug!("fusion: {policy} blend = {final_confidence:.3}");
        FusedScore {
            final_confidence,
            policy,
            signals,
        }
    }
}
