//! Audio ingestion: decode any supported container into a canonical
//! [`Signal`] (mono, `f32`, target sample rate).
//!
//! | Input | Handling |
//! |-------|----------|
//! | File path | Extension whitelist, size cap, symphonia probe + decode |
//! | In-memory samples | Validated (non-zero rate, finite) and resampled |
//!
//! Anything else is rejected with [`AudioError::UnsupportedInput`]; a decoder
//! failure surfaces as [`AudioError::Decode`]; a result with no samples is
//! [`AudioError::EmptySignal`].

use std::fs::File;
use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use thiserror::Error;

use crate::config::AudioConfig;

use super::resample::{resample, stereo_to_mono};
use super::signal::{AudioInput, Signal};

/// File extensions accepted for ingestion (lowercase, without the dot).
///
/// Video containers are accepted for their audio track.
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "wav", "mp3", "m4a", "aac", "flac", "ogg", "mp4", "mov", "webm", "mkv",
];

// ---------------------------------------------------------------------------
// AudioError
// ---------------------------------------------------------------------------

/// Reason an input could not be turned into a canonical signal.
#[derive(Debug, Error)]
pub enum AudioError {
    /// The input kind, extension, or shape is not something we ingest.
    #[error("unsupported input: {0}")]
    UnsupportedInput(String),

    /// The container was recognized but could not be decoded.
    #[error("failed to decode audio: {0}")]
    Decode(String),

    /// Decoding succeeded but produced no samples.
    #[error("audio input contains no samples")]
    EmptySignal,

    /// Sample-rate conversion failed.
    #[error("resampling failed: {0}")]
    Resample(String),

    /// The file is larger than the configured cap.
    #[error("input file is {size} bytes (limit {limit} bytes)")]
    TooLarge { size: u64, limit: u64 },

    /// The signal is too long for a 32-bit WAV container.
    #[error("signal of {samples} samples does not fit a WAV file")]
    TooLong { samples: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// AudioIngestor
// ---------------------------------------------------------------------------

/// Turns an [`AudioInput`] into a canonical [`Signal`].
///
/// # Example
///
/// ```rust
/// use ai_voice_detector::audio::{AudioIngestor, AudioInput};
/// use ai_voice_detector::config::AudioConfig;
///
/// let ingestor = AudioIngestor::new(&AudioConfig::default());
/// let signal = ingestor
///     .ingest(AudioInput::samples(vec![0.1; 16_000], 16_000))
///     .unwrap();
/// assert_eq!(signal.sample_rate(), 16_000);
/// assert_eq!(signal.len(), 16_000);
/// ```
#[derive(Debug, Clone)]
pub struct AudioIngestor {
    target_rate: u32,
    max_file_bytes: u64,
}

impl AudioIngestor {
    pub fn new(config: &AudioConfig) -> Self {
        Self {
            target_rate: config.target_sample_rate,
            max_file_bytes: config.max_file_bytes,
        }
    }

    pub fn target_rate(&self) -> u32 {
        self.target_rate
    }

    /// Decode, downmix and resample `input`.
    pub fn ingest(&self, input: AudioInput) -> Result<Signal, AudioError> {
        log::debug!("ingest: {}", input.describe());
        let signal = match input {
            AudioInput::Path(path) => self.ingest_file(&path)?,
            AudioInput::Samples {
                samples,
                sample_rate,
            } => self.ingest_samples(samples, sample_rate)?,
        };
        log::info!(
            "ingest: {:.2}s @ {} Hz ({} samples)",
            signal.duration_secs(),
            signal.sample_rate(),
            signal.len()
        );
        Ok(signal)
    }

    fn ingest_samples(&self, samples: Vec<f32>, sample_rate: u32) -> Result<Signal, AudioError> {
        if sample_rate == 0 {
            return Err(AudioError::UnsupportedInput(
                "in-memory samples with a sample rate of 0".to_string(),
            ));
        }
        if samples.is_empty() {
            return Err(AudioError::EmptySignal);
        }
        if samples.iter().any(|s| !s.is_finite()) {
            return Err(AudioError::UnsupportedInput(
                "in-memory samples contain NaN or infinite values".to_string(),
            ));
        }
        let resampled = resample(&samples, sample_rate, self.target_rate)?;
        Ok(Signal::new(resampled, self.target_rate))
    }

    fn ingest_file(&self, path: &Path) -> Result<Signal, AudioError> {
        check_extension(path)?;

        let metadata = std::fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(AudioError::UnsupportedInput(format!(
                "{} is not a regular file",
                path.display()
            )));
        }
        if metadata.len() > self.max_file_bytes {
            return Err(AudioError::TooLarge {
                size: metadata.len(),
                limit: self.max_file_bytes,
            });
        }

        let decoded = decode_file(path)?;
        log::debug!(
            "ingest: decoded {} frames x {} ch @ {} Hz",
            decoded.samples.len() / decoded.channels.max(1) as usize,
            decoded.channels,
            decoded.sample_rate
        );

        let mono = stereo_to_mono(&decoded.samples, decoded.channels);
        if mono.is_empty() {
            return Err(AudioError::EmptySignal);
        }
        let resampled = resample(&mono, decoded.sample_rate, self.target_rate)?;
        Ok(Signal::new(resampled, self.target_rate))
    }
}

fn check_extension(path: &Path) -> Result<(), AudioError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .ok_or_else(|| {
            AudioError::UnsupportedInput(format!("{} has no file extension", path.display()))
        })?;
    if SUPPORTED_EXTENSIONS.contains(&ext.as_str()) {
        Ok(())
    } else {
        Err(AudioError::UnsupportedInput(format!(
            "unsupported file extension .{ext}"
        )))
    }
}

// ---------------------------------------------------------------------------
// symphonia decoding
// ---------------------------------------------------------------------------

struct Decoded {
    samples: Vec<f32>,
    channels: u16,
    sample_rate: u32,
}

fn decode_file(path: &Path) -> Result<Decoded, AudioError> {
    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| AudioError::Decode(e.to_string()))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AudioError::Decode("no audio track found".to_string()))?;
    let track_id = track.id;
    let params = track.codec_params.clone();

    let mut sample_rate = params.sample_rate.unwrap_or(0);
    let mut channels = params.channels.map(|c| c.count() as u16).unwrap_or(0);

    let mut decoder = symphonia::default::get_codecs()
        .make(&params, &DecoderOptions::default())
        .map_err(|e| AudioError::Decode(e.to_string()))?;

    let mut samples = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(AudioError::Decode(e.to_string())),
        };
        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(buffer) => {
                let spec = *buffer.spec();
                sample_rate = spec.rate;
                channels = spec.channels.count() as u16;
                let mut interleaved = SampleBuffer::<f32>::new(buffer.capacity() as u64, spec);
                interleaved.copy_interleaved_ref(buffer);
                samples.extend_from_slice(interleaved.samples());
            }
            // A corrupt packet is skipped; the rest of the stream may be fine.
            Err(SymphoniaError::DecodeError(msg)) => {
                log::warn!("ingest: skipping undecodable packet: {msg}");
            }
            Err(e) => return Err(AudioError::Decode(e.to_string())),
        }
    }

    if samples.is_empty() {
        return Err(AudioError::EmptySignal);
    }
    if sample_rate == 0 || channels == 0 {
        return Err(AudioError::Decode(
            "stream did not report a sample rate or channel layout".to_string(),
        ));
    }

    Ok(Decoded {
        samples,
        channels,
        sample_rate,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::wav::encode_wav;
    use tempfile::tempdir;

    fn ingestor() -> AudioIngestor {
        AudioIngestor::new(&AudioConfig::default())
    }

    #[test]
    fn samples_at_target_rate_pass_through() {
        let signal = ingestor()
            .ingest(AudioInput::samples(vec![0.2; 800], 16_000))
            .unwrap();
        assert_eq!(signal.len(), 800);
        assert_eq!(signal.samples()[0], 0.2);
    }

    #[test]
    fn samples_are_resampled_to_target() {
        let signal = ingestor()
            .ingest(AudioInput::samples(vec![0.0; 48_000], 48_000))
            .unwrap();
        assert_eq!(signal.sample_rate(), 16_000);
        assert_eq!(signal.len(), 16_000);
    }

    #[test]
    fn empty_samples_are_an_empty_signal() {
        let err = ingestor()
            .ingest(AudioInput::samples(Vec::new(), 16_000))
            .unwrap_err();
        assert!(matches!(err, AudioError::EmptySignal));
    }

    #[test]
    fn zero_rate_samples_are_unsupported() {
        let err = ingestor()
            .ingest(AudioInput::samples(vec![0.1; 10], 0))
            .unwrap_err();
        assert!(matches!(err, AudioError::UnsupportedInput(_)));
    }

    #[test]
    fn nan_samples_are_unsupported() {
        let err = ingestor()
            .ingest(AudioInput::samples(vec![0.1, f32::NAN], 16_000))
            .unwrap_err();
        assert!(matches!(err, AudioError::UnsupportedInput(_)));
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"hello").unwrap();
        let err = ingestor().ingest(AudioInput::path(&path)).unwrap_err();
        assert!(matches!(err, AudioError::UnsupportedInput(_)));
    }

    #[test]
    fn directory_is_unsupported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("folder.wav");
        std::fs::create_dir(&path).unwrap();
        let err = ingestor().ingest(AudioInput::path(&path)).unwrap_err();
        assert!(matches!(err, AudioError::UnsupportedInput(_)));
    }

    #[test]
    fn garbage_wav_fails_to_decode() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.wav");
        std::fs::write(&path, b"definitely not a riff header").unwrap();
        let err = ingestor().ingest(AudioInput::path(&path)).unwrap_err();
        assert!(matches!(err, AudioError::Decode(_)), "got {err:?}");
    }

    #[test]
    fn oversized_file_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("big.wav");
        std::fs::write(&path, vec![0u8; 2_048]).unwrap();
        let small = AudioIngestor::new(&AudioConfig {
            max_file_bytes: 1_024,
            ..AudioConfig::default()
        });
        let err = small.ingest(AudioInput::path(&path)).unwrap_err();
        assert!(matches!(err, AudioError::TooLarge { size: 2_048, limit: 1_024 }));
    }

    #[test]
    fn wav_file_round_trips_through_decoder() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let tone: Vec<f32> = (0..8_000).map(|i| (i as f32 * 0.05).sin() * 0.5).collect();
        std::fs::write(&path, encode_wav(&Signal::new(tone, 8_000)).unwrap()).unwrap();

        let signal = ingestor().ingest(AudioInput::path(&path)).unwrap();
        assert_eq!(signal.sample_rate(), 16_000);
        assert_eq!(signal.len(), 16_000);
        assert!(signal.peak() > 0.4);
    }
}
