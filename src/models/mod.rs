//! Models module for the MusicXML → XES converter
//!
//! This module contains the score model the parser produces and the
//! pitch/key value types the extractor works with, plus the event log
//! the extractor hands to the XES writer.

pub mod event_log;
pub mod key;
pub mod pitch;
pub mod score;
pub mod tonic;

// Re-export commonly used types
pub use event_log::{AttributeValue, Attributes, Event, EventLog, EventType, Lifecycle, Trace};
pub use key::{Key, Mode};
pub use pitch::Pitch;
pub use score::*;
pub use tonic::Tonic;
