//! Pretrained transcript classifier.
//!
//! [`TextClassifier`] is object-safe and `Send + Sync` so one loaded model
//! can sit behind an `Arc<dyn TextClassifier>` and serve concurrent
//! analyses; inference never mutates the model.
//!
//! [`BertTextClassifier`] is the candle-backed implementation.

pub mod bert;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use bert::{BertTextClassifier, ModelFiles};

// ---------------------------------------------------------------------------
// ClassifierError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ClassifierError {
    /// Model files could not be fetched or parsed.
    #[error("failed to load classifier: {0}")]
    Load(String),

    #[error("tokenization failed: {0}")]
    Tokenize(String),

    #[error("classifier inference failed: {0}")]
    Inference(String),
}

impl From<candle_core::Error> for ClassifierError {
    fn from(e: candle_core::Error) -> Self {
        ClassifierError::Inference(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// ClassifierOutput
// ---------------------------------------------------------------------------

/// The two transcript-level scores, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassifierOutput {
    /// Probability that the transcript was machine-generated.
    pub ai_probability: f32,
    /// Perplexity-style naturalness score.
    pub naturalness_score: f32,
}

// ---------------------------------------------------------------------------
// TextClassifier trait
// ---------------------------------------------------------------------------

/// Read-only sequence classifier over transcript text.
///
/// Each metric is one forward pass; text longer than the model window is
/// truncated, never rejected.
pub trait TextClassifier: Send + Sync {
    /// Probability of the "machine-generated" class.
    fn ai_probability(&self, text: &str) -> Result<f32, ClassifierError>;

    /// Probability of the "natural" class, used as the perplexity proxy.
    fn naturalness(&self, text: &str) -> Result<f32, ClassifierError>;

    fn classify(&self, text: &str) -> Result<ClassifierOutput, ClassifierError> {
        Ok(ClassifierOutput {
            ai_probability: self.ai_probability(text)?.clamp(0.0, 1.0),
            naturalness_score: self.naturalness(text)?.clamp(0.0, 1.0),
        })
    }
}

// Compile-time assertion: Box<dyn TextClassifier> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn TextClassifier>) {}
};

// ---------------------------------------------------------------------------
// MockClassifier  (test-only)
// ---------------------------------------------------------------------------

/// A test double returning fixed scores without loading any model.
#[cfg(test)]
pub struct MockClassifier {
    response: Result<ClassifierOutput, String>,
}

#[cfg(test)]
impl MockClassifier {
    pub fn ok(ai_probability: f32, naturalness_score: f32) -> Self {
        Self {
            response: Ok(ClassifierOutput {
                ai_probability,
                naturalness_score,
            }),
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            response: Err(message.into()),
        }
    }
}

#[cfg(test)]
impl TextClassifier for MockClassifier {
    fn ai_probability(&self, _text: &str) -> Result<f32, ClassifierError> {
        self.response
            .as_ref()
            .map(|o| o.ai_probability)
            .map_err(|e| ClassifierError::Inference(e.clone()))
    }

    fn naturalness(&self, _text: &str) -> Result<f32, ClassifierError> {
        self.response
            .as_ref()
            .map(|o| o.naturalness_score)
            .map_err(|e| ClassifierError::Inference(e.clone()))
    }
}
