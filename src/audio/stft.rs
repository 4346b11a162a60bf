//! Short-time Fourier transform shared by noise suppression and feature
//! extraction.
//!
//! Frames are centered: the signal is zero-padded by `n_fft / 2` on both
//! sides, so frame `t` is centered on sample `t * hop` and a signal of `len`
//! samples always yields `1 + len / hop` frames.

use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

/// Periodic Hann window of length `n`.
pub fn hann_window(n: usize) -> Vec<f32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| 0.5 - 0.5 * (2.0 * std::f32::consts::PI * i as f32 / n as f32).cos())
        .collect()
}

/// Number of centered frames for a signal of `len` samples.
pub fn frame_count(len: usize, hop: usize) -> usize {
    if hop == 0 {
        return 0;
    }
    1 + len / hop
}

/// Bin center frequencies in Hz for an `n_fft`-point transform.
pub fn fft_frequencies(sample_rate: u32, n_fft: usize) -> Vec<f32> {
    let bins = n_fft / 2 + 1;
    (0..bins)
        .map(|k| k as f32 * sample_rate as f32 / n_fft as f32)
        .collect()
}

/// One-sided complex spectrogram, indexed `[frame][bin]`.
pub type Spectrogram = Vec<Vec<Complex<f32>>>;

/// Windowed, centered STFT with its inverse.
pub struct Stft {
    n_fft: usize,
    hop: usize,
    window: Vec<f32>,
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
}

impl Stft {
    /// `n_fft` and `hop` must be non-zero (checked by config validation).
    pub fn new(n_fft: usize, hop: usize) -> Self {
        let mut planner = FftPlanner::<f32>::new();
        Self {
            n_fft,
            hop,
            window: hann_window(n_fft),
            forward: planner.plan_fft_forward(n_fft),
            inverse: planner.plan_fft_inverse(n_fft),
        }
    }

    pub fn n_fft(&self) -> usize {
        self.n_fft
    }

    pub fn hop(&self) -> usize {
        self.hop
    }

    pub fn bins(&self) -> usize {
        self.n_fft / 2 + 1
    }

    /// Forward transform of `samples`.
    pub fn forward(&self, samples: &[f32]) -> Spectrogram {
        let frames = frame_count(samples.len(), self.hop);
        let half = (self.n_fft / 2) as isize;
        let bins = self.bins();
        let mut out = Vec::with_capacity(frames);
        let mut buffer = vec![Complex::new(0.0, 0.0); self.n_fft];

        for t in 0..frames {
            let start = (t * self.hop) as isize - half;
            for (i, slot) in buffer.iter_mut().enumerate() {
                let idx = start + i as isize;
                let sample = if idx >= 0 && (idx as usize) < samples.len() {
                    samples[idx as usize]
                } else {
                    0.0
                };
                *slot = Complex::new(sample * self.window[i], 0.0);
            }
            self.forward.process(&mut buffer);
            out.push(buffer[..bins].to_vec());
        }
        out
    }

    /// Inverse transform by weighted overlap-add, trimmed to `length` samples.
    ///
    /// Where the squared window sum is negligible (only possible at the
    /// padded edges) the output is left at zero.
    pub fn inverse(&self, spectrogram: &Spectrogram, length: usize) -> Vec<f32> {
        let half = self.n_fft / 2;
        let padded_len = self.n_fft + self.hop * spectrogram.len().saturating_sub(1);
        let mut acc = vec![0.0_f32; padded_len.max(length + self.n_fft)];
        let mut norm = vec![0.0_f32; acc.len()];
        let mut buffer = vec![Complex::new(0.0, 0.0); self.n_fft];
        let scale = 1.0 / self.n_fft as f32;

        for (t, frame) in spectrogram.iter().enumerate() {
            // Rebuild the full spectrum from the one-sided half.
            for (k, slot) in buffer.iter_mut().enumerate() {
                *slot = if k < frame.len() {
                    frame[k]
                } else {
                    frame[self.n_fft - k].conj()
                };
            }
            self.inverse.process(&mut buffer);

            let offset = t * self.hop;
            for (i, value) in buffer.iter().enumerate() {
                let w = self.window[i];
                acc[offset + i] += value.re * scale * w;
                norm[offset + i] += w * w;
            }
        }

        (0..length)
            .map(|i| {
                let j = i + half;
                if j < acc.len() && norm[j] > 1e-8 {
                    acc[j] / norm[j]
                } else {
                    0.0
                }
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
