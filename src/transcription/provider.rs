//! Request/poll contract of a remote speech-to-text provider.
//!
//! [`TranscriptionProvider`] is the seam the detector talks to: upload the
//! working copy, start a job, then ask for its status until it is terminal.
//! Bounding that loop is [`Transcriber`]'s job, not the provider's.
//!
//! [`Transcriber`]: crate::transcription::Transcriber

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use super::transcript::Transcript;

// ---------------------------------------------------------------------------
// TranscriptionError
// ---------------------------------------------------------------------------

/// Errors raised while obtaining a transcript.
#[derive(Debug, Error)]
pub enum TranscriptionError {
    /// No API key in the config file or the environment.
    #[error("no transcription API key configured (set {key})", key = crate::config::API_KEY_ENV)]
    MissingApiKey,

    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// A single HTTP request exceeded its timeout.
    #[error("transcription request timed out")]
    RequestTimeout,

    /// The provider answered with a non-success status.
    #[error("provider returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The provider's response body was not what we expected.
    #[error("failed to parse provider response: {0}")]
    Parse(String),

    /// The job never reached a terminal state within the attempt budget.
    #[error("transcription not finished after {attempts} status checks")]
    Timeout { attempts: u32 },

    /// The provider reported the job as failed.
    #[error("provider reported a failed transcription: {payload}")]
    Failed { payload: serde_json::Value },

    /// Upload, job start and polling together exceeded the overall deadline.
    #[error("transcription exceeded the overall deadline of {0:?}")]
    DeadlineExceeded(Duration),

    #[error("transcription was cancelled")]
    Cancelled,
}

impl TranscriptionError {
    /// `true` for the variants that mean "ran out of time".
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::DeadlineExceeded(_) | Self::RequestTimeout
        )
    }
}

impl From<reqwest::Error> for TranscriptionError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TranscriptionError::RequestTimeout
        } else {
            TranscriptionError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Job handles
// ---------------------------------------------------------------------------

/// Where the provider stored an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioHandle {
    pub audio_url: String,
}

/// A started transcription job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    pub id: String,
    /// Status URL, when the provider hands one out.
    pub result_url: Option<String>,
}

/// Options sent with a new job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobOptions {
    pub diarization: bool,
    pub translation: bool,
}

/// One status check's answer.
#[derive(Debug, Clone, PartialEq)]
pub enum JobStatus {
    Pending,
    Completed(Transcript),
    /// Terminal failure with the provider's diagnostic payload.
    Failed(serde_json::Value),
}

// ---------------------------------------------------------------------------
// TranscriptionProvider trait
// ---------------------------------------------------------------------------

/// Async, thread-safe interface to a remote speech-to-text service.
///
/// Implementations must be `Send + Sync` so they can be held behind an
/// `Arc<dyn TranscriptionProvider>` and shared across analyses.
#[async_trait]
pub trait TranscriptionProvider: Send + Sync {
    /// Upload a WAV working copy and return its storage handle.
    async fn upload(&self, wav: Vec<u8>, file_name: &str) -> Result<AudioHandle, TranscriptionError>;

    /// Start a transcription job for an uploaded file.
    async fn start_job(
        &self,
        audio: &AudioHandle,
        options: JobOptions,
    ) -> Result<JobHandle, TranscriptionError>;

    /// Check a job once.  "Not ready yet" is `Ok(JobStatus::Pending)`.
    async fn job_status(&self, job: &JobHandle) -> Result<JobStatus, TranscriptionError>;
}

// Compile-time assertion: Box<dyn TranscriptionProvider> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn TranscriptionProvider>) {}
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_variants_are_timeouts() {
        assert!(TranscriptionError::Timeout { attempts: 3 }.is_timeout());
        assert!(TranscriptionError::DeadlineExceeded(Duration::from_secs(1)).is_timeout());
        assert!(TranscriptionError::RequestTimeout.is_timeout());
        assert!(!TranscriptionError::Cancelled.is_timeout());
        assert!(!TranscriptionError::Failed {
            payload: serde_json::json!({})
        }
        .is_timeout());
    }

    #[test]
    fn missing_key_message_names_the_variable() {
        let msg = TranscriptionError::MissingApiKey.to_string();
        assert!(msg.contains("GLADIA_API_KEY"));
    }
}
