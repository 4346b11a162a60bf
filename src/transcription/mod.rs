//! Remote transcription: provider contract, HTTP client and bounded poller.
//!
//! # Overview
//!
//! ```text
//! WAV working copy → Transcriber → TranscriptionProvider::upload
//!                                → TranscriptionProvider::start_job
//!                                → TranscriptionProvider::job_status (× ≤ max_attempts)
//!                                → Transcript
//! ```
//!
//! [`GladiaClient`] is the production provider.  Tests supply their own
//! [`TranscriptionProvider`] implementations.

pub mod gladia;
pub mod poller;
pub mod provider;
pub mod transcript;

pub use gladia::GladiaClient;
pub use poller::Transcriber;
pub use provider::{
    AudioHandle, JobHandle, JobOptions, JobStatus, TranscriptionError, TranscriptionProvider,
};
pub use transcript::Transcript;
