//! Score analysis run between parsing and event extraction
//!
//! - [`repeats`]: unroll a score into performance order
//! - [`key`]: windowed key estimation
//! - [`tempo`]: offsets to timestamps

pub mod key;
pub mod repeats;
pub mod tempo;

pub use key::{add_measure_weights, estimate_key, KeyAnalyzer, PitchClassWeights};
pub use repeats::{expand_score, ExpandError};
pub use tempo::{TempoMap, DEFAULT_TEMPO};
