//! Typed failures of one analysis and the outcome taxonomy callers branch on.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::audio::AudioError;
use crate::transcription::TranscriptionError;

/// Every way an analysis can end, successful or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    CannotDecode,
    NoSpeechDetected,
    TranscriptionTimeout,
    TranscriptionFailed,
    Cancelled,
    SucceededPartial,
    SucceededFull,
}

impl OutcomeKind {
    pub fn is_success(self) -> bool {
        matches!(
            self,
            Self::NoSpeechDetected | Self::SucceededPartial | Self::SucceededFull
        )
    }
}

impl std::fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::CannotDecode => "cannot decode input",
            Self::NoSpeechDetected => "no speech detected",
            Self::TranscriptionTimeout => "transcription timed out",
            Self::TranscriptionFailed => "transcription failed",
            Self::Cancelled => "cancelled",
            Self::SucceededPartial => "partial analysis",
            Self::SucceededFull => "full analysis",
        };
        f.write_str(label)
    }
}

/// An analysis that produced no result at all.
#[derive(Debug, Error)]
pub enum DetectionError {
    /// Unreadable, unsupported, oversized or empty media.
    #[error(transparent)]
    Audio(#[from] AudioError),

    /// Transcription failed and audio-only fallback is disabled.
    #[error(transparent)]
    Transcription(TranscriptionError),

    #[error("analysis was cancelled")]
    Cancelled,

    /// A blocking stage worker panicked.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<TranscriptionError> for DetectionError {
    fn from(e: TranscriptionError) -> Self {
        match e {
            TranscriptionError::Cancelled => DetectionError::Cancelled,
            other => DetectionError::Transcription(other),
        }
    }
}

impl From<tokio::task::JoinError> for DetectionError {
    fn from(e: tokio::task::JoinError) -> Self {
        DetectionError::Internal(e.to_string())
    }
}

impl DetectionError {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            // A worker panic can only come from the decode/DSP stages.
            Self::Audio(_) | Self::Internal(_) => OutcomeKind::CannotDecode,
            Self::Transcription(e) if e.is_timeout() => OutcomeKind::TranscriptionTimeout,
            Self::Transcription(_) => OutcomeKind::TranscriptionFailed,
            Self::Cancelled => OutcomeKind::Cancelled,
        }
    }
}
