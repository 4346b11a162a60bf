//! Per-frame spectral shape descriptors over a magnitude spectrogram.
//!
//! A frame with no energy has centroid, bandwidth and rolloff of `0.0`.

/// Magnitude-weighted mean frequency of each frame.
pub fn centroid(magnitudes: &[Vec<f32>], freqs: &[f32]) -> Vec<f32> {
    magnitudes
        .iter()
        .map(|frame| {
            let total: f32 = frame.iter().sum();
            if total <= 0.0 {
                return 0.0;
            }
            frame.iter().zip(freqs).map(|(m, f)| m * f).sum::<f32>() / total
        })
        .collect()
}

/// Second-order spectral bandwidth around each frame's centroid.
pub fn bandwidth(magnitudes: &[Vec<f32>], freqs: &[f32], centroids: &[f32]) -> Vec<f32> {
    magnitudes
        .iter()
        .zip(centroids)
        .map(|(frame, &c)| {
            let total: f32 = frame.iter().sum();
            if total <= 0.0 {
                return 0.0;
            }
            let spread: f32 = frame
                .iter()
                .zip(freqs)
                .map(|(m, f)| (m / total) * (f - c).powi(2))
                .sum();
            spread.sqrt()
        })
        .collect()
}

/// Lowest frequency below which `roll_percent` of each frame's magnitude lies.
pub fn rolloff(magnitudes: &[Vec<f32>], freqs: &[f32], roll_percent: f32) -> Vec<f32> {
    magnitudes
        .iter()
        .map(|frame| {
            let total: f32 = frame.iter().sum();
            let threshold = roll_percent * total;
            let mut cumulative = 0.0_f32;
            for (m, f) in frame.iter().zip(freqs) {
                cumulative += m;
                if cumulative >= threshold {
                    return *f;
                }
            }
            freqs.last().copied().unwrap_or(0.0)
        })
        .collect()
}
