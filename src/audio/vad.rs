//! Energy-based voice-activity gating.
//!
//! [`VoiceActivityGate`] finds the non-silent intervals of a clip and
//! concatenates them, in order, into a new signal.  Everything else is
//! dropped.
//!
//! ## Algorithm
//!
//! The clip is cut into centered frames of `frame_length` samples every
//! `hop_length` samples (zero-padded at the edges).  A frame is non-silent
//! when its RMS power, in dB relative to the loudest frame, is above
//! `-threshold_db`.  Runs of non-silent frames become sample intervals
//! `[start * hop, min(end * hop, len))`.
//!
//! A clip whose loudest frame is below [`SILENCE_FLOOR_RMS`] has no
//! intervals at all; relative levels mean nothing without any energy.

use crate::config::AudioConfig;

use super::signal::Signal;

/// Absolute RMS below which a clip counts as digital silence (about -100 dBFS).
pub const SILENCE_FLOOR_RMS: f32 = 1e-5;

const AMIN: f32 = 1e-10;

/// Half-open sample range `[start, end)` containing speech.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeechInterval {
    pub start: usize,
    pub end: usize,
}

impl SpeechInterval {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

// ---------------------------------------------------------------------------
// VoiceActivityGate
// ---------------------------------------------------------------------------

/// Splits a clip on silence and keeps only the voiced parts.
///
/// # Example
///
/// ```rust
/// use ai_voice_detector::audio::{Signal, VoiceActivityGate};
///
/// let gate = VoiceActivityGate::new(20.0, 2048, 512);
///
/// // 1 s silence, 1 s tone, 1 s silence @ 16 kHz
/// let mut samples = vec![0.0_f32; 16_000];
/// samples.extend((0..16_000).map(|i| (i as f32 * 0.1).sin() * 0.5));
/// samples.extend(vec![0.0_f32; 16_000]);
///
/// let voiced = gate.apply(&Signal::new(samples, 16_000));
/// assert!(voiced.len() >= 16_000 && voiced.len() < 24_000);
/// ```
#[derive(Debug, Clone)]
pub struct VoiceActivityGate {
    threshold_db: f32,
    frame_length: usize,
    hop_length: usize,
}

impl VoiceActivityGate {
    /// `frame_length` and `hop_length` must be non-zero.
    pub fn new(threshold_db: f32, frame_length: usize, hop_length: usize) -> Self {
        Self {
            threshold_db,
            frame_length: frame_length.max(1),
            hop_length: hop_length.max(1),
        }
    }

    pub fn from_config(config: &AudioConfig) -> Self {
        Self::new(
            config.vad_threshold_db as f32,
            config.vad_frame_length,
            config.vad_hop_length,
        )
    }

    pub fn threshold_db(&self) -> f32 {
        self.threshold_db
    }

    /// Non-silent intervals of `samples`, in order, non-overlapping.
    pub fn split(&self, samples: &[f32]) -> Vec<SpeechInterval> {
        if samples.is_empty() {
            return Vec::new();
        }

        let rms = self.frame_rms(samples);
        let peak = rms.iter().copied().fold(0.0_f32, f32::max);
        if peak < SILENCE_FLOOR_RMS {
            return Vec::new();
        }

        let ref_db = 10.0 * (peak * peak).max(AMIN).log10();
        let voiced: Vec<bool> = rms
            .iter()
            .map(|r| 10.0 * (r * r).max(AMIN).log10() - ref_db > -self.threshold_db)
            .collect();

        let mut intervals = Vec::new();
        let mut run_start: Option<usize> = None;
        for (frame, &is_voiced) in voiced.iter().enumerate() {
            match (is_voiced, run_start) {
                (true, None) => run_start = Some(frame),
                (false, Some(start)) => {
                    intervals.push(self.to_samples(start, frame, samples.len()));
                    run_start = None;
                }
                _ => {}
            }
        }
        if let Some(start) = run_start {
            intervals.push(self.to_samples(start, voiced.len(), samples.len()));
        }

        intervals.retain(|iv| !iv.is_empty());
        intervals
    }

    /// Concatenate the voiced intervals of `signal` into a new signal.
    ///
    /// The result is empty when the clip has no voiced frame.
    pub fn apply(&self, signal: &Signal) -> Signal {
        let intervals = self.split(signal.samples());
        let total: usize = intervals.iter().map(SpeechInterval::len).sum();
        let mut out = Vec::with_capacity(total);
        for iv in &intervals {
            out.extend_from_slice(&signal.samples()[iv.start..iv.end]);
        }
        log::debug!(
            "vad: {} interval(s), kept {} of {} samples",
            intervals.len(),
            out.len(),
            signal.len()
        );
        Signal::new(out, signal.sample_rate())
    }

    fn frame_rms(&self, samples: &[f32]) -> Vec<f32> {
        let frames = 1 + samples.len() / self.hop_length;
        let half = (self.frame_length / 2) as isize;
        (0..frames)
            .map(|t| {
                let start = (t * self.hop_length) as isize - half;
                let lo = start.max(0) as usize;
                let hi = ((start + self.frame_length as isize).max(0) as usize).min(samples.len());
                let energy: f32 = if lo < hi {
                    samples[lo..hi].iter().map(|s| s * s).sum()
                } else {
                    0.0
                };
                (energy / self.frame_length as f32).sqrt()
            })
            .collect()
    }

    fn to_samples(&self, start_frame: usize, end_frame: usize, len: usize) -> SpeechInterval {
        SpeechInterval {
            start: (start_frame * self.hop_length).min(len),
            end: (end_frame * self.hop_length).min(len),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> VoiceActivityGate {
        VoiceActivityGate::new(20.0, 2048, 512)
    }

    fn tone(n: usize, amp: f32) -> Vec<f32> {
        (0..n).map(|i| (i as f32 * 0.2).sin() * amp).collect()
    }

    #[test]
    fn all_silence_returns_empty() {
        let out = gate().apply(&Signal::new(vec![0.0; 48_000], 16_000));
        assert!(out.is_empty());
    }

    #[test]
    fn noise_floor_only_returns_empty() {
        let out = gate().apply(&Signal::new(tone(16_000, 1e-7), 16_000));
        assert!(out.is_empty());
    }

    #[test]
    fn empty_input_returns_empty() {
        assert!(gate().split(&[]).is_empty());
    }

    #[test]
    fn constant_tone_is_kept_whole() {
        let samples = tone(16_000, 0.5);
        let intervals = gate().split(&samples);
        assert_eq!(intervals, vec![SpeechInterval { start: 0, end: 16_000 }]);
    }

    #[test]
    fn two_bursts_produce_two_ordered_intervals() {
        let mut samples = tone(16_000, 0.5);
        samples.extend(vec![0.0; 32_000]);
        samples.extend(tone(16_000, 0.5));

        let intervals = gate().split(&samples);
        assert_eq!(intervals.len(), 2);
        assert!(intervals[0].end <= intervals[1].start);
        assert_eq!(intervals[0].start, 0);
        assert_eq!(intervals[1].end, samples.len());
    }

    #[test]
    fn output_is_in_source_order() {
        let mut samples = vec![0.25_f32; 8_192];
        samples.extend(vec![0.0; 32_768]);
        samples.extend(vec![-0.25_f32; 8_192]);

        let out = gate().apply(&Signal::new(samples, 16_000));
        let first_negative = out.samples().iter().position(|&s| s < 0.0).unwrap();
        assert!(out.samples()[..first_negative].iter().all(|&s| s >= 0.0));
    }

    #[test]
    fn quiet_tail_below_threshold_is_dropped() {
        let mut samples = tone(16_384, 0.5);
        samples.extend(tone(16_384, 0.005)); // -40 dB relative
        let intervals = gate().split(&samples);
        assert_eq!(intervals.len(), 1);
        assert!(intervals[0].end < 20_000);
    }

    #[test]
    fn deterministic() {
        let mut samples = tone(10_000, 0.3);
        samples.extend(vec![0.0; 20_000]);
        samples.extend(tone(5_000, 0.6));
        assert_eq!(gate().split(&samples), gate().split(&samples));
    }
}
