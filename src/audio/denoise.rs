//! Stationary spectral-gating noise suppression.
//!
//! The noise profile is estimated from the signal itself: for every
//! frequency bin, the gate opens only where the bin's level rises more than
//! `n_std_thresh` standard deviations above its mean level across all
//! frames.  The binary mask is smoothed over time before it is applied so
//! gating does not chatter frame to frame.
//!
//! Output length always equals input length; the input is never modified.

use crate::config::DenoiseConfig;

use super::signal::Signal;
use super::stft::Stft;

const AMIN: f32 = 1e-10;

/// Spectral-gating noise reducer built from a [`DenoiseConfig`].
pub struct NoiseSuppressor {
    stft: Stft,
    n_std_thresh: f32,
    prop_decrease: f32,
    smoothing_frames: usize,
}

impl NoiseSuppressor {
    pub fn new(config: &DenoiseConfig) -> Self {
        Self {
            stft: Stft::new(config.n_fft, config.hop_length),
            n_std_thresh: config.n_std_thresh,
            prop_decrease: config.prop_decrease,
            smoothing_frames: config.time_smoothing_frames,
        }
    }

    /// Return a noise-reduced copy of `signal` at the same rate and length.
    pub fn reduce(&self, signal: &Signal) -> Signal {
        if signal.is_empty() {
            return signal.clone();
        }

        let mut spec = self.stft.forward(signal.samples());
        let frames = spec.len();
        let bins = self.stft.bins();

        let db: Vec<Vec<f32>> = spec
            .iter()
            .map(|frame| frame.iter().map(|c| 20.0 * c.norm().max(AMIN).log10()).collect())
            .collect();

        // Per-bin threshold from the bin's own statistics.
        let thresholds: Vec<f32> = (0..bins)
            .map(|k| {
                let mean = db.iter().map(|f| f[k]).sum::<f32>() / frames as f32;
                let var = db.iter().map(|f| (f[k] - mean).powi(2)).sum::<f32>() / frames as f32;
                mean + self.n_std_thresh * var.sqrt()
            })
            .collect();

        let raw_mask: Vec<Vec<f32>> = db
            .iter()
            .map(|frame| {
                frame
                    .iter()
                    .zip(&thresholds)
                    .map(|(level, thresh)| if level > thresh { 1.0 } else { 0.0 })
                    .collect()
            })
            .collect();
        let mask = smooth_over_time(&raw_mask, self.smoothing_frames);

        for (frame, gains) in spec.iter_mut().zip(&mask) {
            for (bin, m) in frame.iter_mut().zip(gains) {
                let gain = m * self.prop_decrease + (1.0 - self.prop_decrease);
                *bin *= gain;
            }
        }

        let samples = self.stft.inverse(&spec, signal.len());
        log::debug!(
            "denoise: {} frames x {} bins, peak {:.4} -> {:.4}",
            frames,
            bins,
            signal.peak(),
            samples.iter().fold(0.0_f32, |acc, s| acc.max(s.abs()))
        );
        Signal::new(samples, signal.sample_rate())
    }
}

/// Centered moving average along the frame axis.
fn smooth_over_time(mask: &[Vec<f32>], width: usize) -> Vec<Vec<f32>> {
    if width <= 1 || mask.is_empty() {
        return mask.to_vec();
    }
    let frames = mask.len();
    let bins = mask[0].len();
    let before = (width - 1) / 2;
    let after = width - 1 - before;

    (0..frames)
        .map(|t| {
            let lo = t.saturating_sub(before);
            let hi = (t + after).min(frames - 1);
            let n = (hi - lo + 1) as f32;
            (0..bins)
                .map(|k| mask[lo..=hi].iter().map(|f| f[k]).sum::<f32>() / n)
                .collect()
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
