//! MusicXML to XES event log converter
//!
//! Reads MusicXML scores (`.musicxml`, `.xml`, compressed `.mxl`), unrolls
//! their repeats and turns notes, measures, intervals or key changes into
//! events of an IEEE XES log for process mining.
//!
//! ```text
//! input dir ─► [batch] ─► load_score ─► expand_score ─► extract ─► write_xes ─► validate_xes
//! ```

pub mod analysis;
pub mod batch;
pub mod config;
pub mod converters;
pub mod error;
pub mod extract;
pub mod models;

pub use batch::{convert_file, run, write_report, FileReport, FileStatus, RunReport};
pub use config::{Config, ConfigError, Granularity};
pub use error::{ConversionError, ConversionResult};
