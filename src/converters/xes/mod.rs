//! XES event log output
//!
//! [`write_xes`] serializes an [`EventLog`](crate::models::EventLog) as IEEE XES
//! 1849-2016 XML with the Concept, Time and Lifecycle extensions;
//! [`validate_xes`] reads a written file back and checks it against the log.

mod validate;
mod writer;

pub use validate::{validate_xes, validate_xes_file};
pub use writer::{format_timestamp, write_xes, write_xes_file, write_xes_string};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum XesError {
    #[error("xes write error: {0}")]
    Write(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid xes: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, XesError>;
