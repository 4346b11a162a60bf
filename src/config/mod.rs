//! Configuration module.
//!
//! Provides `AppConfig` (top-level settings), sub-configs for each pipeline
//! stage, `AppPaths` for cross-platform data directories, and TOML
//! persistence via `AppConfig::load` / `AppConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{
    AppConfig, AudioConfig, ClassifierConfig, CoarseWeights, ConfigError, DenoiseConfig,
    FeatureConfig, FullWeights, FusionConfig, FusionPolicy, LinguisticConfig, LoggingConfig,
    TranscriptionConfig, API_KEY_ENV,
};
