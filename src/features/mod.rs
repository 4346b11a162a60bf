//! Acoustic feature extraction.
//!
//! [`AcousticFeatureExtractor`] turns a speech-only [`Signal`] into a
//! [`FeatureBundle`]: an MFCC matrix plus three per-frame spectral series.
//! Every series shares one STFT hop, so all four have the same frame count.
//!
//! An empty signal yields [`AcousticFeatures::NoFeatures`] instead of an
//! error; downstream scoring treats it as "no acoustic evidence".
//!
//! [`Signal`]: crate::audio::Signal

pub mod extractor;
pub mod mel;
pub mod spectral;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use extractor::AcousticFeatureExtractor;

/// A bundle whose series disagree on frame count.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("feature `{feature}` has {got} frames, expected {expected}")]
pub struct FrameMismatch {
    pub feature: &'static str,
    pub expected: usize,
    pub got: usize,
}

// ---------------------------------------------------------------------------
// FeatureBundle
// ---------------------------------------------------------------------------

/// Frame-aligned acoustic features of one recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureBundle {
    /// `mfccs[coefficient][frame]`.
    mfccs: Vec<Vec<f32>>,
    spectral_centroid: Vec<f32>,
    spectral_bandwidth: Vec<f32>,
    spectral_rolloff: Vec<f32>,
}

impl FeatureBundle {
    /// Build a bundle, checking that every series has the same frame count.
    pub fn new(
        mfccs: Vec<Vec<f32>>,
        spectral_centroid: Vec<f32>,
        spectral_bandwidth: Vec<f32>,
        spectral_rolloff: Vec<f32>,
    ) -> Result<Self, FrameMismatch> {
        let expected = spectral_centroid.len();
        let check = |feature: &'static str, got: usize| {
            if got == expected {
                Ok(())
            } else {
                Err(FrameMismatch {
                    feature,
                    expected,
                    got,
                })
            }
        };
        for row in &mfccs {
            check("mfccs", row.len())?;
        }
        check("spectral_bandwidth", spectral_bandwidth.len())?;
        check("spectral_rolloff", spectral_rolloff.len())?;

        Ok(Self {
            mfccs,
            spectral_centroid,
            spectral_bandwidth,
            spectral_rolloff,
        })
    }

    pub fn mfccs(&self) -> &[Vec<f32>] {
        &self.mfccs
    }

    pub fn spectral_centroid(&self) -> &[f32] {
        &self.spectral_centroid
    }

    pub fn spectral_bandwidth(&self) -> &[f32] {
        &self.spectral_bandwidth
    }

    pub fn spectral_rolloff(&self) -> &[f32] {
        &self.spectral_rolloff
    }

    pub fn frame_count(&self) -> usize {
        self.spectral_centroid.len()
    }

    pub fn mfcc_count(&self) -> usize {
        self.mfccs.len()
    }

    /// Population variance over every element of the MFCC matrix.
    ///
    /// `0.0` for an empty matrix.
    pub fn mfcc_variance(&self) -> f32 {
        let n: usize = self.mfccs.iter().map(Vec::len).sum();
        if n == 0 {
            return 0.0;
        }
        let values = || self.mfccs.iter().flatten().map(|&v| v as f64);
        let mean = values().sum::<f64>() / n as f64;
        let var = values().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
        var as f32
    }
}

// ---------------------------------------------------------------------------
// AcousticFeatures
// ---------------------------------------------------------------------------

/// Result of feature extraction: a bundle, or the explicit "nothing to
/// measure" sentinel for an empty signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AcousticFeatures {
    NoFeatures,
    Extracted(FeatureBundle),
}

impl AcousticFeatures {
    pub fn bundle(&self) -> Option<&FeatureBundle> {
        match self {
            Self::Extracted(bundle) => Some(bundle),
            Self::NoFeatures => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::NoFeatures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn misaligned_series_are_rejected() {
        let err = FeatureBundle::new(
            vec![vec![0.0; 3]],
            vec![0.0; 3],
            vec![0.0; 2],
            vec![0.0; 3],
        )
        .unwrap_err();
        assert_eq!(err.feature, "spectral_bandwidth");
        assert_eq!(err.got, 2);
    }

    #[test]
    fn mfcc_variance_is_population_variance() {
        let bundle = FeatureBundle::new(
            vec![vec![-100.0, 100.0], vec![100.0, -100.0]],
            vec![0.0; 2],
            vec![0.0; 2],
            vec![0.0; 2],
        )
        .unwrap();
        assert!((bundle.mfcc_variance() - 10_000.0).abs() < 1e-2);
    }

    #[test]
    fn empty_matrix_has_zero_variance() {
        let bundle = FeatureBundle::new(Vec::new(), Vec::new(), Vec::new(), Vec::new()).unwrap();
        assert_eq!(bundle.mfcc_variance(), 0.0);
        assert_eq!(bundle.frame_count(), 0);
    }

    #[test]
    fn no_features_has_no_bundle() {
        assert!(AcousticFeatures::NoFeatures.bundle().is_none());
        assert!(AcousticFeatures::NoFeatures.is_empty());
    }
}
