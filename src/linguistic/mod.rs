//! Transcript analysis.
//!
//! Two independent consumers read the transcript:
//!
//! * [`LinguisticAnalyzer`] produces the nine-metric
//!   [`LinguisticFeatureSet`] rendered in the detailed report.
//! * [`TextHeuristics`] produces the repetition, complexity and consistency
//!   scores used by the full fusion policy.
//!
//! Both are pure, allocation-local and safe to share across threads.

pub mod heuristics;
pub mod lexicon;
pub mod metrics;
pub mod similarity;
pub mod syntax;
pub mod text;

pub use heuristics::{TextHeuristicScores, TextHeuristics};
pub use metrics::{inverted_variance, LinguisticAnalyzer, LinguisticFeatureSet};
pub use text::{clean_transcript, normalize_for_heuristics, Document, Sentence, Token, TokenKind};
