//! Channel mixing and sample-rate conversion.
//!
//! Every decoded source goes through the same two steps before any analysis:
//!
//! 1. [`stereo_to_mono`] downmixes interleaved channels by averaging.
//! 2. [`resample`] converts to the configured target rate with rubato's
//!    FFT resampler.

use rubato::{FftFixedInOut, Resampler};

use super::ingest::AudioError;

/// Input chunk handed to the FFT resampler per `process` call.
const CHUNK_FRAMES: usize = 1024;

// ---------------------------------------------------------------------------
// stereo_to_mono
// ---------------------------------------------------------------------------

/// Mix interleaved multi-channel audio down to mono by averaging all channels.
///
/// The output length is `samples.len() / channels`; a trailing partial frame
/// is dropped.  `channels == 0` yields an empty vector.
///
/// # Example
///
/// ```rust
/// use ai_voice_detector::audio::stereo_to_mono;
///
/// let stereo = vec![0.5_f32, -0.5, 0.2, 0.4]; // L R L R
/// let mono = stereo_to_mono(&stereo, 2);
/// assert_eq!(mono.len(), 2);
/// assert!((mono[0] - 0.0).abs() < 1e-6);
/// assert!((mono[1] - 0.3).abs() < 1e-6);
/// ```
pub fn stereo_to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    match channels {
        0 => Vec::new(),
        1 => samples.to_vec(),
        n => {
            let n = n as usize;
            samples
                .chunks_exact(n)
                .map(|frame| frame.iter().sum::<f32>() / n as f32)
                .collect()
        }
    }
}

// ---------------------------------------------------------------------------
// resample
// ---------------------------------------------------------------------------

/// Resample mono `samples` from `source_rate` to `target_rate` Hz.
///
/// Equal rates and empty input are returned unchanged.  Otherwise the output
/// has exactly `ceil(len * target_rate / source_rate)` samples: the
/// resampler's output delay is dropped from the front and the zero-padded
/// flush is cut from the back.
///
/// # Example
///
/// ```rust
/// use ai_voice_detector::audio::resample;
///
/// let hi = vec![0.0_f32; 4_800]; // 100 ms @ 48 kHz
/// let lo = resample(&hi, 48_000, 16_000).unwrap();
/// assert_eq!(lo.len(), 1_600);
/// ```
pub fn resample(samples: &[f32], source_rate: u32, target_rate: u32) -> Result<Vec<f32>, AudioError> {
    if source_rate == 0 || target_rate == 0 {
        return Err(AudioError::Resample(format!(
            "invalid rate conversion {source_rate} Hz -> {target_rate} Hz"
        )));
    }
    if source_rate == target_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let mut resampler = FftFixedInOut::<f32>::new(
        source_rate as usize,
        target_rate as usize,
        CHUNK_FRAMES,
        1,
    )
    .map_err(|e| AudioError::Resample(e.to_string()))?;

    let expected = (samples.len() as f64 * target_rate as f64 / source_rate as f64).ceil() as usize;
    let delay = resampler.output_delay();
    let mut out = Vec::with_capacity(expected + delay + resampler.output_frames_max());

    // Full chunks.
    let mut pos = 0;
    loop {
        let need = resampler.input_frames_next();
        if pos + need > samples.len() {
            break;
        }
        let chunk: [&[f32]; 1] = [&samples[pos..pos + need]];
        let frames = resampler
            .process(&chunk[..], None)
            .map_err(|e| AudioError::Resample(e.to_string()))?;
        out.extend_from_slice(&frames[0]);
        pos += need;
    }

    // Zero-padded remainder.
    if pos < samples.len() {
        let tail: [&[f32]; 1] = [&samples[pos..]];
        let frames = resampler
            .process_partial(Some(&tail[..]), None)
            .map_err(|e| AudioError::Resample(e.to_string()))?;
        out.extend_from_slice(&frames[0]);
    }

    // Flush until the delayed output covers the expected length.
    while out.len() < expected + delay {
        let frames = resampler
            .process_partial::<&[f32]>(None, None)
            .map_err(|e| AudioError::Resample(e.to_string()))?;
        if frames[0].is_empty() {
            break;
        }
        out.extend_from_slice(&frames[0]);
    }

    let mut out = out.split_off(delay.min(out.len()));
    out.truncate(expected);
    Ok(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // ---- stereo_to_mono ----------------------------------------------------

    #[test]
    fn stereo_to_mono_already_mono() {
        let input = vec![0.1_f32, 0.2, 0.3];
        assert_eq!(stereo_to_mono(&input, 1), input);
    }

    #[test]
    fn stereo_to_mono_two_channel() {
        let out = stereo_to_mono(&[1.0_f32, -1.0, 0.5, 0.5], 2);
        assert_eq!(out.len(), 2);
        assert!((out[0] - 0.0).abs() < 1e-6);
        assert!((out[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn stereo_to_mono_drops_partial_frame() {
        let out = stereo_to_mono(&[0.2_f32, 0.4, 0.6], 2);
        assert_eq!(out.len(), 1);
        assert!((out[0] - 0.3).abs() < 1e-6);
    }

    #[test]
    fn stereo_to_mono_zero_channels() {
        assert!(stereo_to_mono(&[1.0_f32, 2.0], 0).is_empty());
    }

    // ---- resample ----------------------------------------------------------

    #[test]
    fn same_rate_is_noop() {
        let input: Vec<f32> = (0..160).map(|i| i as f32 / 160.0).collect();
        assert_eq!(resample(&input, 16_000, 16_000).unwrap(), input);
    }

    #[test]
    fn empty_input_stays_empty() {
        assert!(resample(&[], 48_000, 16_000).unwrap().is_empty());
    }

    #[test]
    fn zero_rate_is_rejected() {
        assert!(matches!(
            resample(&[0.0; 10], 0, 16_000),
            Err(AudioError::Resample(_))
        ));
    }

    #[test]
    fn downsample_48k_output_length() {
        let out = resample(&vec![0.0_f32; 48_000], 48_000, 16_000).unwrap();
        assert_eq!(out.len(), 16_000);
    }

    #[test]
    fn downsample_44100_short_clip_length() {
        // Shorter than one resampler chunk: handled entirely by the flush path.
        let out = resample(&vec![0.0_f32; 441], 44_100, 16_000).unwrap();
        assert_eq!(out.len(), 160);
    }

    #[test]
    fn upsample_8k_output_length() {
        let out = resample(&vec![0.0_f32; 8_000], 8_000, 16_000).unwrap();
        assert_eq!(out.len(), 16_000);
    }

    #[test]
    fn sine_keeps_its_level_away_from_edges() {
        let rate = 48_000.0_f32;
        let input: Vec<f32> = (0..48_000)
            .map(|i| 0.5 * (2.0 * std::f32::consts::PI * 440.0 * i as f32 / rate).sin())
            .collect();
        let out = resample(&input, 48_000, 16_000).unwrap();

        let middle = &out[4_000..12_000];
        let rms = (middle.iter().map(|s| s * s).sum::<f32>() / middle.len() as f32).sqrt();
        let expected = 0.5 / 2.0_f32.sqrt();
        assert!((rms - expected).abs() < 0.02, "rms drifted: {rms}");
    }
}
