//! MFCC and spectral-series extraction over one shared STFT.

use crate::audio::stft::{fft_frequencies, Stft};
use crate::audio::Signal;
use crate::config::FeatureConfig;

use super::mel::{dct_ortho, mel_filterbank, power_to_db};
use super::spectral;
use super::{AcousticFeatures, FeatureBundle};

const AMIN: f32 = 1e-10;
const TOP_DB: f32 = 80.0;

/// Computes a [`FeatureBundle`] from a speech-only signal.
///
/// # Example
///
/// ```rust
/// use ai_voice_detector::audio::Signal;
/// use ai_voice_detector::config::FeatureConfig;
/// use ai_voice_detector::features::{AcousticFeatureExtractor, AcousticFeatures};
///
/// let extractor = AcousticFeatureExtractor::new(&FeatureConfig::default());
/// let tone: Vec<f32> = (0..16_000).map(|i| (i as f32 * 0.1).sin()).collect();
///
/// let AcousticFeatures::Extracted(bundle) = extractor.extract(&Signal::new(tone, 16_000)) else {
///     panic!("tone should produce features");
/// };
/// assert_eq!(bundle.mfcc_count(), 13);
/// assert_eq!(bundle.frame_count(), 1 + 16_000 / 512);
/// ```
pub struct AcousticFeatureExtractor {
    stft: Stft,
    mfcc_count: usize,
    n_mels: usize,
    rolloff_percent: f32,
}

impl AcousticFeatureExtractor {
    pub fn new(config: &FeatureConfig) -> Self {
        Self {
            stft: Stft::new(config.n_fft, config.hop_length),
            mfcc_count: config.mfcc_count,
            n_mels: config.n_mels,
            rolloff_percent: config.rolloff_percent,
        }
    }

    /// Extract features, or [`AcousticFeatures::NoFeatures`] for an empty signal.
    pub fn extract(&self, signal: &Signal) -> AcousticFeatures {
        if signal.is_empty() {
            log::debug!("features: empty signal, no features");
            return AcousticFeatures::NoFeatures;
        }

        let spec = self.stft.forward(signal.samples());
        let magnitudes: Vec<Vec<f32>> = spec
            .iter()
            .map(|frame| frame.iter().map(|c| c.norm()).collect())
            .collect();

        let mfccs = self.mfccs(&magnitudes, signal.sample_rate());

        let freqs = fft_frequencies(signal.sample_rate(), self.stft.n_fft());
        let centroid = spectral::centroid(&magnitudes, &freqs);
        let bandwidth = spectral::bandwidth(&magnitudes, &freqs, &centroid);
        let rolloff = spectral::rolloff(&magnitudes, &freqs, self.rolloff_percent);

        match FeatureBundle::new(mfccs, centroid, bandwidth, rolloff) {
            Ok(bundle) => {
                log::debug!(
                    "features: {} frames, {} MFCCs, MFCC variance {:.2}",
                    bundle.frame_count(),
                    bundle.mfcc_count(),
                    bundle.mfcc_variance()
                );
                AcousticFeatures::Extracted(bundle)
            }
            // Every series is built from the same spectrogram, so this is
            // unreachable in practice; report it rather than panic.
            Err(e) => {
                log::warn!("features: {e}");
                AcousticFeatures::NoFeatures
            }
        }
    }

    /// `[coefficient][frame]` MFCC matrix from a magnitude spectrogram.
    fn mfccs(&self, magnitudes: &[Vec<f32>], sample_rate: u32) -> Vec<Vec<f32>> {
        let bank = mel_filterbank(sample_rate, self.stft.n_fft(), self.n_mels);

        // Mel power spectrogram, [frame][mel].
        let mut mel_power: Vec<Vec<f32>> = magnitudes
            .iter()
            .map(|frame| {
                bank.iter()
                    .map(|filter| filter.iter().zip(frame).map(|(w, m)| w * m * m).sum())
                    .collect()
            })
            .collect();
        power_to_db(&mut mel_power, AMIN, TOP_DB);

        let per_frame: Vec<Vec<f32>> = mel_power
            .iter()
            .map(|frame| dct_ortho(frame, self.mfcc_count))
            .collect();

        (0..self.mfcc_count)
            .map(|c| per_frame.iter().map(|frame| frame[c]).collect())
            .collect()
    }
}
