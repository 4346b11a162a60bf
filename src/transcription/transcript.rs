//! Transcript value returned by a transcription provider.

use serde::{Deserialize, Serialize};

/// Plain text plus whatever segment/speaker metadata the provider attached.
///
/// Metadata is passed through untouched; analysis only reads `text`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl Transcript {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// `true` when the text has no non-whitespace characters.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}
