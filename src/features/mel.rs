//! Slaney-style mel filterbank, log power scaling and the orthonormal DCT
//! that together turn a power spectrogram into MFCCs.

const MIN_LOG_HZ: f32 = 1_000.0;
const LINEAR_HZ_PER_MEL: f32 = 200.0 / 3.0;
const MIN_LOG_MEL: f32 = MIN_LOG_HZ / LINEAR_HZ_PER_MEL;

fn log_step() -> f32 {
    6.4_f32.ln() / 27.0
}

/// Hz to mel on the Slaney scale: linear below 1 kHz, logarithmic above.
pub fn hz_to_mel(hz: f32) -> f32 {
    if hz >= MIN_LOG_HZ {
        MIN_LOG_MEL + (hz / MIN_LOG_HZ).ln() / log_step()
    } else {
        hz / LINEAR_HZ_PER_MEL
    }
}

pub fn mel_to_hz(mel: f32) -> f32 {
    if mel >= MIN_LOG_MEL {
        MIN_LOG_HZ * (log_step() * (mel - MIN_LOG_MEL)).exp()
    } else {
        mel * LINEAR_HZ_PER_MEL
    }
}

/// Triangular filters spanning `0..sample_rate/2`, area-normalized.
///
/// Returns `n_mels` rows of `n_fft / 2 + 1` weights.
pub fn mel_filterbank(sample_rate: u32, n_fft: usize, n_mels: usize) -> Vec<Vec<f32>> {
    let bins = n_fft / 2 + 1;
    let fft_freqs: Vec<f32> = (0..bins)
        .map(|k| k as f32 * sample_rate as f32 / n_fft as f32)
        .collect();

    let max_mel = hz_to_mel(sample_rate as f32 / 2.0);
    let edges: Vec<f32> = (0..n_mels + 2)
        .map(|i| mel_to_hz(max_mel * i as f32 / (n_mels + 1) as f32))
        .collect();

    (0..n_mels)
        .map(|m| {
            let (lo, center, hi) = (edges[m], edges[m + 1], edges[m + 2]);
            let enorm = if hi > lo { 2.0 / (hi - lo) } else { 0.0 };
            fft_freqs
                .iter()
                .map(|&f| {
                    let lower = if center > lo { (f - lo) / (center - lo) } else { 0.0 };
                    let upper = if hi > center { (hi - f) / (hi - center) } else { 0.0 };
                    lower.min(upper).max(0.0) * enorm
                })
                .collect()
        })
        .collect()
}

/// Power in dB relative to 1.0, floored at `amin` and limited to `top_db`
/// below the overall maximum.
pub fn power_to_db(power: &mut [Vec<f32>], amin: f32, top_db: f32) {
    let mut max_db = f32::NEG_INFINITY;
    for row in power.iter_mut() {
        for value in row.iter_mut() {
            *value = 10.0 * value.max(amin).log10();
            max_db = max_db.max(*value);
        }
    }
    let floor = max_db - top_db;
    for row in power.iter_mut() {
        for value in row.iter_mut() {
            *value = value.max(floor);
        }
    }
}

/// First `n_out` coefficients of the orthonormal DCT-II of `input`.
pub fn dct_ortho(input: &[f32], n_out: usize) -> Vec<f32> {
    let n = input.len();
    if n == 0 {
        return vec![0.0; n_out];
    }
    let nf = n as f32;
    (0..n_out)
        .map(|k| {
            let sum: f32 = input
                .iter()
                .enumerate()
                .map(|(i, &x)| {
                    x * (std::f32::consts::PI * k as f32 * (2.0 * i as f32 + 1.0) / (2.0 * nf)).cos()
                })
                .sum();
            let scale = if k == 0 { (1.0 / nf).sqrt() } else { (2.0 / nf).sqrt() };
            sum * scale
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mel_scale_round_trips() {
        for hz in [0.0, 250.0, 999.0, 1_000.0, 4_000.0, 8_000.0] {
            let back = mel_to_hz(hz_to_mel(hz));
            assert!((back - hz).abs() < 0.05, "{hz} -> {back}");
        }
    }

    #[test]
    fn mel_scale_is_linear_below_1k() {
        assert!((hz_to_mel(200.0 / 3.0) - 1.0).abs() < 1e-5);
        assert!((hz_to_mel(1_000.0) - 15.0).abs() < 1e-5);
    }

    #[test]
    fn filterbank_shape_and_coverage() {
        let bank = mel_filterbank(16_000, 2048, 128);
        assert_eq!(bank.len(), 128);
        assert!(bank.iter().all(|row| row.len() == 1025));
        assert!(bank.iter().all(|row| row.iter().all(|w| *w >= 0.0)));
        assert!(bank.iter().all(|row| row.iter().any(|w| *w > 0.0)));
    }

    #[test]
    fn dct_of_constant_is_dc_only() {
        let out = dct_ortho(&[2.0; 8], 4);
        assert!((out[0] - 2.0 * 8.0_f32.sqrt()).abs() < 1e-4);
        assert!(out[1..].iter().all(|c| c.abs() < 1e-4));
    }

    #[test]
    fn power_to_db_clips_to_top_db() {
        let mut power = vec![vec![1.0, 1e-12]];
        power_to_db(&mut power, 1e-10, 80.0);
        assert!((power[0][0] - 0.0).abs() < 1e-5);
        assert!((power[0][1] + 80.0).abs() < 1e-4);
    }
}
