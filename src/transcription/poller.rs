//! Bounded upload → start → poll driver around a [`TranscriptionProvider`].
//!
//! Three limits apply, whichever trips first:
//!
//! | Limit | Error |
//! |-------|-------|
//! | `max_attempts` status checks without a terminal state | [`TranscriptionError::Timeout`] |
//! | Overall deadline for the whole exchange | [`TranscriptionError::DeadlineExceeded`] |
//! | Caller cancellation | [`TranscriptionError::Cancelled`] |

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::TranscriptionConfig;

use super::provider::{JobHandle, JobOptions, JobStatus, TranscriptionError, TranscriptionProvider};
use super::transcript::Transcript;

/// File name given to the uploaded working copy.
pub const WORKING_COPY_NAME: &str = "working_copy.wav";

/// Drives one transcription to a terminal state within fixed limits.
#[derive(Clone)]
pub struct Transcriber {
    provider: Arc<dyn TranscriptionProvider>,
    options: JobOptions,
    poll_interval: Duration,
    max_attempts: u32,
    deadline: Duration,
}

impl Transcriber {
    pub fn new(provider: Arc<dyn TranscriptionProvider>, config: &TranscriptionConfig) -> Self {
        Self {
            provider,
            options: JobOptions {
                diarization: config.diarization,
                translation: config.translation,
            },
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            max_attempts: config.max_attempts.max(1),
            deadline: Duration::from_secs(config.deadline_secs),
        }
    }

    /// Override the polling limits; mostly useful for tests.
    pub fn with_limits(mut self, poll_interval: Duration, max_attempts: u32, deadline: Duration) -> Self {
        self.poll_interval = poll_interval;
        self.max_attempts = max_attempts.max(1);
        self.deadline = deadline;
        self
    }

    /// Upload `wav`, start a job and wait for its transcript.
    pub async fn transcribe(
        &self,
        wav: Vec<u8>,
        cancel: &CancellationToken,
    ) -> Result<Transcript, TranscriptionError> {
        tokio::select! {
            _ = cancel.cancelled() => {
                log::info!("transcription: cancelled");
                Err(TranscriptionError::Cancelled)
            }
            outcome = tokio::time::timeout(self.deadline, self.run(wav)) => match outcome {
                Ok(result) => result,
                Err(_) => {
                    log::warn!("transcription: deadline of {:?} exceeded", self.deadline);
                    Err(TranscriptionError::DeadlineExceeded(self.deadline))
                }
            },
        }
    }

    async fn run(&self, wav: Vec<u8>) -> Result<Transcript, TranscriptionError> {
        let audio = self.provider.upload(wav, WORKING_COPY_NAME).await?;
        let job = self.provider.start_job(&audio, self.options).await?;
        log::info!("transcription: job {} submitted", job.id);
        self.poll(&job).await
    }

    /// Check `job` at a fixed interval, at most `max_attempts` times.
    pub async fn poll(&self, job: &JobHandle) -> Result<Transcript, TranscriptionError> {
        for attempt in 1..=self.max_attempts {
            match self.provider.job_status(job).await? {
                JobStatus::Completed(transcript) => {
                    log::info!(
                        "transcription: job {} completed after {attempt} check(s), {} chars",
                        job.id,
                        transcript.text.len()
                    );
                    return Ok(transcript);
                }
                JobStatus::Failed(payload) => {
                    log::warn!("transcription: job {} failed: {payload}", job.id);
                    return Err(TranscriptionError::Failed { payload });
                }
                JobStatus::Pending => {
                    log::debug!(
                        "transcription: job {} pending ({attempt}/{})",
                        job.id,
                        self.max_attempts
                    );
                    if attempt < self.max_attempts {
                        tokio::time::sleep(self.poll_interval).await;
                    }
                }
            }
        }
        Err(TranscriptionError::Timeout {
            attempts: self.max_attempts,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
