//! Detector settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and handed to each
//! pipeline stage by value.  Every field is `#[serde(default)]`-backed, so a
//! partial `settings.toml` only overrides what it names.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::AppPaths;

/// Environment variable that overrides [`TranscriptionConfig::api_key`].
pub const API_KEY_ENV: &str = "GLADIA_API_KEY";

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// A configuration value that no pipeline stage can work with.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: f32 },

    #[error("{field} must be within [0, 1] (got {value})")]
    OutOfUnitRange { field: &'static str, value: f32 },
}

// ---------------------------------------------------------------------------
// FusionPolicy
// ---------------------------------------------------------------------------

/// Selects how the per-signal scores are blended into one confidence.
///
/// | Variant | Signals | Weights |
/// |---------|---------|---------|
/// | Coarse  | MFCC-variance audio heuristic + keyword text heuristic | 0.6 / 0.4 |
/// | Full    | repetition, complexity, consistency, perplexity, classifier | 0.2 each |
///
/// `Full` degrades to `Coarse` whenever the transcript-derived signals are
/// unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FusionPolicy {
    Coarse,
    Full,
}

impl Default for FusionPolicy {
    fn default() -> Self {
        Self::Full
    }
}

impl std::str::FromStr for FusionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "coarse" => Ok(Self::Coarse),
            "full" => Ok(Self::Full),
            other => Err(format!("unknown fusion policy: {other}")),
        }
    }
}

impl std::fmt::Display for FusionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Coarse => write!(f, "coarse"),
            Self::Full => write!(f, "full"),
        }
    }
}

// ---------------------------------------------------------------------------
// AudioConfig
// ---------------------------------------------------------------------------

/// Ingestion and voice-activity settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Rate every downstream stage works at.  Resampling happens once, at
    /// ingestion.
    pub target_sample_rate: u32,
    /// Run the spectral noise suppressor before voice-activity gating.
    pub noise_reduction_enabled: bool,
    /// Frames quieter than `peak - vad_threshold_db` are treated as silence.
    pub vad_threshold_db: u32,
    /// RMS window of the voice-activity gate, in samples.
    pub vad_frame_length: usize,
    /// Hop between voice-activity frames, in samples.
    pub vad_hop_length: usize,
    /// Files above this size are refused before decoding.
    pub max_file_bytes: u64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            target_sample_rate: 16_000,
            noise_reduction_enabled: true,
            vad_threshold_db: 20,
            vad_frame_length: 2048,
            vad_hop_length: 512,
            max_file_bytes: 16 * 1024 * 1024,
        }
    }
}

// ---------------------------------------------------------------------------
// DenoiseConfig
// ---------------------------------------------------------------------------

/// Spectral-gating parameters for the noise suppressor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DenoiseConfig {
    pub n_fft: usize,
    pub hop_length: usize,
    /// A bin is kept when it rises this many standard deviations above its
    /// estimated noise floor.
    pub n_std_thresh: f32,
    /// Fraction of the gated energy that is removed (1.0 = full gate).
    pub prop_decrease: f32,
    /// Width of the moving average applied to the gate mask along time.
    pub time_smoothing_frames: usize,
}

impl Default for DenoiseConfig {
    fn default() -> Self {
        Self {
            n_fft: 1024,
            hop_length: 256,
            n_std_thresh: 1.5,
            prop_decrease: 1.0,
            time_smoothing_frames: 3,
        }
    }
}

// ---------------------------------------------------------------------------
// FeatureConfig
// ---------------------------------------------------------------------------

/// Acoustic feature extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Number of cepstral coefficients per frame.
    pub mfcc_count: usize,
    /// Hop between analysis frames; shared by every feature series so all
    /// arrays have the same frame count.
    pub hop_length: usize,
    pub n_fft: usize,
    pub n_mels: usize,
    /// Fraction of spectral energy below the roll-off frequency.
    pub rolloff_percent: f32,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            mfcc_count: 13,
            hop_length: 512,
            n_fft: 2048,
            n_mels: 128,
            rolloff_percent: 0.85,
        }
    }
}

// ---------------------------------------------------------------------------
// TranscriptionConfig
// ---------------------------------------------------------------------------

/// Remote speech-to-text provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    /// Base URL of the provider (no trailing slash).
    pub base_url: String,
    /// Provider credential.  `GLADIA_API_KEY` takes precedence when set.
    pub api_key: Option<String>,
    pub diarization: bool,
    pub translation: bool,
    /// Sleep between two status polls.
    pub poll_interval_ms: u64,
    /// Status polls allowed before the job is declared timed out.
    pub max_attempts: u32,
    /// Overall budget for upload + job creation + polling.
    pub deadline_secs: u64,
    /// Per-HTTP-request timeout.
    pub request_timeout_secs: u64,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.gladia.io".into(),
            api_key: None,
            diarization: false,
            translation: false,
            poll_interval_ms: 2_000,
            max_attempts: 60,
            deadline_secs: 300,
            request_timeout_secs: 30,
        }
    }
}

impl TranscriptionConfig {
    /// The credential to use: the environment first, then the config file.
    /// Empty strings count as absent.
    pub fn resolved_api_key(&self) -> Option<String> {
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.api_key.clone().filter(|k| !k.trim().is_empty()))
    }
}

// ---------------------------------------------------------------------------
// LinguisticConfig
// ---------------------------------------------------------------------------

/// Tuning constants of the transcript metrics.
///
/// None of these have a derivation behind them; they are kept configurable
/// so a recalibration does not need a code change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinguisticConfig {
    /// Window of the moving-average type/token ratio, in words.
    pub mattr_window: usize,
    /// `k` in `1 - min(1, variance / (mean * k))`; shared by every
    /// inverted-variance metric.
    pub variance_k: f32,
    /// Entropy (nats) of "typical natural text" word distributions.
    pub word_entropy_divisor: f32,
    /// Entropy (nats) of a typical noun distribution.
    pub topic_entropy_divisor: f32,
    /// Mean dependency depth that maps to a complexity of 1.0.
    pub depth_divisor: f32,
    /// Typical human filler/pause markers per word.
    pub pause_baseline: f32,
    /// Multiplier on the distance from `pause_baseline`.
    pub pause_scale: f32,
    /// Score returned when a transcript has no pause markers at all.
    pub pause_neutral: f32,
}

impl Default for LinguisticConfig {
    fn default() -> Self {
        Self {
            mattr_window: 50,
            variance_k: 2.0,
            word_entropy_divisor: 4.0,
            topic_entropy_divisor: 3.0,
            depth_divisor: 10.0,
            pause_baseline: 0.05,
            pause_scale: 10.0,
            pause_neutral: 0.5,
        }
    }
}

// ---------------------------------------------------------------------------
// ClassifierConfig
// ---------------------------------------------------------------------------

/// Pretrained sequence-classifier settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Load the classifier at start-up.  When disabled (or loading fails)
    /// the full fusion policy degrades to the coarse one.
    pub enabled: bool,
    /// Hugging Face repository id, or a local directory holding
    /// `config.json`, `tokenizer.json` and `model.safetensors`.
    pub model_id: String,
    pub revision: String,
    /// Longer inputs are truncated to this many tokens.
    pub max_tokens: usize,
    /// Output label read as "AI-generated".
    pub ai_label: usize,
    /// Output label read as the perplexity-proxy naturalness probability.
    pub naturalness_label: usize,
    pub use_gpu: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model_id: "bert-base-uncased".into(),
            revision: "main".into(),
            max_tokens: 512,
            ai_label: 1,
            naturalness_label: 1,
            use_gpu: false,
        }
    }
}

// ---------------------------------------------------------------------------
// FusionConfig
// ---------------------------------------------------------------------------

/// Weights of the full five-signal blend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FullWeights {
    pub repetition: f32,
    pub complexity: f32,
    pub consistency: f32,
    pub perplexity: f32,
    pub classifier: f32,
}

impl Default for FullWeights {
    fn default() -> Self {
        Self {
            repetition: 0.2,
            complexity: 0.2,
            consistency: 0.2,
            perplexity: 0.2,
            classifier: 0.2,
        }
    }
}

impl FullWeights {
    pub fn sum(&self) -> f32 {
        self.repetition + self.complexity + self.consistency + self.perplexity + self.classifier
    }
}

/// Weights of the coarse two-signal blend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoarseWeights {
    pub audio: f32,
    pub text: f32,
}

impl Default for CoarseWeights {
    fn default() -> Self {
        Self {
            audio: 0.6,
            text: 0.4,
        }
    }
}

/// Score fusion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    pub policy: FusionPolicy,
    pub coarse_weights: CoarseWeights,
    pub full_weights: FullWeights,
    /// Phrases counted (case-insensitively) by the keyword text heuristic.
    pub suspicious_keywords: Vec<String>,
    /// MFCC variance that maps to an audio score of 1.0.
    pub mfcc_variance_scale: f32,
    /// Scores above this are "strong" / "high".
    pub strong_threshold: f32,
    /// Scores above this (and not strong) are "moderate".
    pub moderate_threshold: f32,
    /// On a transcription timeout or provider failure, report an audio-only
    /// result instead of an error.
    pub fallback_to_coarse_on_transcription_error: bool,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            policy: FusionPolicy::default(),
            coarse_weights: CoarseWeights::default(),
            full_weights: FullWeights::default(),
            suspicious_keywords: vec![
                "furthermore".into(),
                "indeed".into(),
            ],
            mfcc_variance_scale: 5_000.0,
            strong_threshold: 0.8,
            moderate_threshold: 0.6,
            fallback_to_coarse_on_transcription_error: true,
        }
    }
}

// ---------------------------------------------------------------------------
// LoggingConfig
// ---------------------------------------------------------------------------

/// Default `env_logger` filter; `RUST_LOG` still wins when set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level configuration, serialised as `settings.toml`.
///
/// ```rust,no_run
/// use ai_voice_detector::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
/// config.validate().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub audio: AudioConfig,
    pub denoise: DenoiseConfig,
    pub features: FeatureConfig,
    pub transcription: TranscriptionConfig,
    pub linguistic: LinguisticConfig,
    pub classifier: ClassifierConfig,
    pub fusion: FusionConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values that would make a stage divide by zero or loop forever.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let zero_checks: [(&'static str, usize); 10] = [
            ("audio.target_sample_rate", self.audio.target_sample_rate as usize),
            ("audio.vad_frame_length", self.audio.vad_frame_length),
            ("audio.vad_hop_length", self.audio.vad_hop_length),
            ("denoise.n_fft", self.denoise.n_fft),
            ("denoise.hop_length", self.denoise.hop_length),
            ("features.mfcc_count", self.features.mfcc_count),
            ("features.hop_length", self.features.hop_length),
            ("features.n_fft", self.features.n_fft),
            ("features.n_mels", self.features.n_mels),
            ("transcription.max_attempts", self.transcription.max_attempts as usize),
        ];
        for (field, value) in zero_checks {
            if value == 0 {
                return Err(ConfigError::Zero { field });
            }
        }

        let fw = &self.fusion.full_weights;
        let cw = &self.fusion.coarse_weights;
        let weights = [
            ("fusion.coarse_weights.audio", cw.audio),
            ("fusion.coarse_weights.text", cw.text),
            ("fusion.full_weights.repetition", fw.repetition),
            ("fusion.full_weights.complexity", fw.complexity),
            ("fusion.full_weights.consistency", fw.consistency),
            ("fusion.full_weights.perplexity", fw.perplexity),
            ("fusion.full_weights.classifier", fw.classifier),
        ];
        for (field, value) in weights {
            if value < 0.0 {
                return Err(ConfigError::Negative { field, value });
            }
        }

        for (field, value) in [
            ("features.rolloff_percent", self.features.rolloff_percent),
            ("denoise.prop_decrease", self.denoise.prop_decrease),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfUnitRange { field, value });
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
