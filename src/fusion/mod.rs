//! Score fusion.
//!
//! Independent per-signal scores are blended by a [`FusionPolicy`]:
//!
//! ```text
//! coarse: final = clamp(0.6·audio + 0.4·text, 0, 1)
//! full:   final = clamp(Σ 0.2·{repetition, complexity, consistency,
//!                              perplexity, classifier}, 0, 1)
//! ```
//!
//! Every contributing signal is banded for the report; see [`Band`].

pub mod band;
pub mod engine;
pub mod result;
pub mod signals;

pub use crate::config::FusionPolicy;
pub use band::{Band, BandThresholds, SignalScore};
pub use engine::{FusedScore, ScoreFusionEngine};
pub use result::{DetectionResult, TextStatus, KEY_INDICATOR_THRESHOLD};
pub use signals::{audio_score, keyword_score, CoarseSignals, FullSignals};
