//! Detect whether a voice recording was produced by a speech synthesizer
//! rather than a human speaker.
//!
//! Acoustic features of the recording and linguistic features of its
//! transcript are scored independently and fused into one confidence in
//! `[0, 1]`.  [`detector::Detector`] runs the whole pipeline; the modules
//! below are usable on their own.

pub mod audio;
pub mod classifier;
pub mod config;
pub mod detector;
pub mod features;
pub mod fusion;
pub mod linguistic;
pub mod transcription;
