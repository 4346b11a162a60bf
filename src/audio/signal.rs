//! Canonical in-memory audio representation and the ingestion input variant.

use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Signal
// ---------------------------------------------------------------------------

/// Mono `f32` PCM samples at a known sample rate.
///
/// Every stage after ingestion receives a `Signal` at the configured target
/// rate and produces a new one; no stage edits samples in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl Signal {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// A zero-length signal, the "no speech" result of voice-activity gating.
    pub fn empty(sample_rate: u32) -> Self {
        Self::new(Vec::new(), sample_rate)
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds (`0.0` for a zero sample rate).
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Peak absolute amplitude.
    pub fn peak(&self) -> f32 {
        self.samples.iter().fold(0.0_f32, |acc, s| acc.max(s.abs()))
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }
}

// ---------------------------------------------------------------------------
// AudioInput
// ---------------------------------------------------------------------------

/// What the caller hands to the ingestor.
///
/// The variant is resolved once, in [`AudioIngestor::ingest`]; everything
/// downstream only ever sees a [`Signal`].
///
/// [`AudioIngestor::ingest`]: crate::audio::AudioIngestor::ingest
#[derive(Debug, Clone)]
pub enum AudioInput {
    /// An audio or video container on disk.
    Path(PathBuf),
    /// Already-decoded mono samples at `sample_rate` Hz.
    Samples { samples: Vec<f32>, sample_rate: u32 },
}

impl AudioInput {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    pub fn samples(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self::Samples {
            samples,
            sample_rate,
        }
    }

    /// Short description for log lines.
    pub fn describe(&self) -> String {
        match self {
            Self::Path(p) => p.display().to_string(),
            Self::Samples {
                samples,
                sample_rate,
            } => format!("<{} samples @ {sample_rate} Hz>", samples.len()),
        }
    }
}

impl From<PathBuf> for AudioInput {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&std::path::Path> for AudioInput {
    fn from(path: &std::path::Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}
