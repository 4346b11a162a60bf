//! End-to-end analysis of one recording.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ai_voice_detector::audio::AudioInput;
//! use ai_voice_detector::config::AppConfig;
//! use ai_voice_detector::detector::Detector;
//! use ai_voice_detector::transcription::GladiaClient;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = AppConfig::load()?;
//! let provider = Arc::new(GladiaClient::from_config(&config.transcription)?);
//! let detector = Detector::new(config, provider, None)?;
//!
//! let outcome = detector
//!     .analyze(AudioInput::from(std::path::Path::new("call.wav")), &CancellationToken::new())
//!     .await?;
//! if let Some(result) = outcome.result() {
//!     println!("{}", result.summary_report());
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod runner;

pub use error::{DetectionError, OutcomeKind};
pub use runner::{AnalysisOutcome, Detector};
