//! Qualitative bands used to explain individual scores.

use serde::{Deserialize, Serialize};

use crate::config::FusionConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    High,
    Moderate,
    Low,
}

impl Band {
    /// Wording used for fusion signals.
    pub fn indicator_label(self) -> &'static str {
        match self {
            Band::High => "Strong",
            Band::Moderate => "Moderate",
            Band::Low => "Weak",
        }
    }

    /// Wording used for linguistic metrics.
    pub fn likelihood_label(self) -> &'static str {
        match self {
            Band::High => "High",
            Band::Moderate => "Moderate",
            Band::Low => "Low",
        }
    }
}

/// Strict lower bounds of the upper two bands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandThresholds {
    pub strong: f32,
    pub moderate: f32,
}

impl Default for BandThresholds {
    fn default() -> Self {
        Self {
            strong: 0.8,
            moderate: 0.6,
        }
    }
}

impl BandThresholds {
    pub fn from_config(config: &FusionConfig) -> Self {
        Self {
            strong: config.strong_threshold,
            moderate: config.moderate_threshold,
        }
    }

    /// ```rust
    /// use ai_voice_detector::fusion::{Band, BandThresholds};
    ///
    /// let t = BandThresholds::default();
    /// assert_eq!(t.classify(0.81), Band::High);
    /// assert_eq!(t.classify(0.8), Band::Moderate);
    /// assert_eq!(t.classify(0.6), Band::Low);
    /// ```
    pub fn classify(&self, score: f32) -> Band {
        if score > self.strong {
            Band::High
        } else if score > self.moderate {
            Band::Moderate
        } else {
            Band::Low
        }
    }

    /// `"Strong indicator (0.83)"`.
    pub fn indicator(&self, score: f32) -> SignalScore {
        let band = self.classify(score);
        SignalScore {
            score,
            band,
            explanation: format!("{} indicator ({score:.2})", band.indicator_label()),
        }
    }

    /// `"High likelihood of AI generation (0.83)"`.
    pub fn likelihood(&self, score: f32) -> String {
        format!(
            "{} likelihood of AI generation ({score:.2})",
            self.classify(score).likelihood_label()
        )
    }
}

/// One contributing signal with its band and rendered explanation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalScore {
    pub score: f32,
    pub band: Band,
    pub explanation: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_use_strict_thresholds() {
        let t = BandThresholds::default();
        assert_eq!(t.classify(1.0), Band::High);
        assert_eq!(t.classify(0.7), Band::Moderate);
        assert_eq!(t.classify(0.0), Band::Low);
    }

    #[test]
    fn explanations_are_rendered_with_two_decimals() {
        let t = BandThresholds::default();
        assert_eq!(t.indicator(0.834).explanation, "Strong indicator (0.83)");
        assert_eq!(t.indicator(0.65).explanation, "Moderate indicator (0.65)");
        assert_eq!(t.likelihood(0.1), "Low likelihood of AI generation (0.10)");
    }

    #[test]
    fn thresholds_follow_config() {
        let config = FusionConfig {
            strong_threshold: 0.5,
            moderate_threshold: 0.2,
            ..FusionConfig::default()
        };
        let t = BandThresholds::from_config(&config);
        assert_eq!(t.classify(0.55), Band::High);
        assert_eq!(t.classify(0.3), Band::Moderate);
    }
}
