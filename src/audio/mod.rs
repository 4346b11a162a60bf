//! Audio front end: ingestion, noise suppression and voice-activity gating.
//!
//! # Pipeline
//!
//! ```text
//! file / samples → AudioIngestor (symphonia → stereo_to_mono → resample)
//!               → NoiseSuppressor (optional) → VoiceActivityGate → Signal
//! ```
//!
//! The canonical signal from ingestion is also encoded with [`encode_wav`]
//! and uploaded for transcription; the denoised, gated signal only feeds
//! acoustic feature extraction.

pub mod denoise;
pub mod ingest;
pub mod resample;
pub mod signal;
pub mod stft;
pub mod vad;
pub mod wav;

pub use denoise::NoiseSuppressor;
pub use ingest::{AudioError, AudioIngestor, SUPPORTED_EXTENSIONS};
pub use resample::{resample, stereo_to_mono};
pub use signal::{AudioInput, Signal};
pub use vad::{SpeechInterval, VoiceActivityGate};
pub use wav::encode_wav;
