//! Canonical working-copy encoder: 16-bit PCM mono RIFF/WAVE.
//!
//! The transcription provider receives this container regardless of what
//! the caller supplied, so uploads never depend on the source format.

use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};

use super::ingest::AudioError;
use super::signal::Signal;

const BITS_PER_SAMPLE: u16 = 16;
const CHANNELS: u16 = 1;
const BLOCK_ALIGN: u16 = CHANNELS * BITS_PER_SAMPLE / 8;
const HEADER_BYTES: u32 = 44;

/// Encode `signal` as a complete WAV file in memory.
pub fn encode_wav(signal: &Signal) -> Result<Vec<u8>, AudioError> {
    let mut out = Vec::with_capacity(HEADER_BYTES as usize + signal.len() * 2);
    write_wav(&mut out, signal)?;
    Ok(out)
}

/// Byte length of the `data` chunk for `samples` samples.
///
/// Fails when the chunk or the RIFF size field would overflow 32 bits.
fn data_len(samples: usize) -> Result<u32, AudioError> {
    u32::try_from(samples)
        .ok()
        .and_then(|n| n.checked_mul(u32::from(BLOCK_ALIGN)))
        .filter(|n| n.checked_add(HEADER_BYTES - 8).is_some())
        .ok_or(AudioError::TooLong { samples })
}

/// Stream `signal` as WAV into any writer.
pub fn write_wav<W: Write>(writer: &mut W, signal: &Signal) -> Result<(), AudioError> {
    let data_len = data_len(signal.len())?;
    let byte_rate = signal.sample_rate() * u32::from(BLOCK_ALIGN);

    writer.write_all(b"RIFF")?;
    writer.write_u32::<LittleEndian>(data_len + HEADER_BYTES - 8)?;
    writer.write_all(b"WAVE")?;

    writer.write_all(b"fmt ")?;
    writer.write_u32::<LittleEndian>(16)?;
    writer.write_u16::<LittleEndian>(1)?; // PCM
    writer.write_u16::<LittleEndian>(CHANNELS)?;
    writer.write_u32::<LittleEndian>(signal.sample_rate())?;
    writer.write_u32::<LittleEndian>(byte_rate)?;
    writer.write_u16::<LittleEndian>(BLOCK_ALIGN)?;
    writer.write_u16::<LittleEndian>(BITS_PER_SAMPLE)?;

    writer.write_all(b"data")?;
    writer.write_u32::<LittleEndian>(data_len)?;
    for &sample in signal.samples() {
        writer.write_i16::<LittleEndian>(to_pcm16(sample))?;
    }
    Ok(())
}

fn to_pcm16(sample: f32) -> i16 {
    let clamped = if sample.is_finite() { sample.clamp(-1.0, 1.0) } else { 0.0 };
    (clamped * i16::MAX as f32).round() as i16
}
