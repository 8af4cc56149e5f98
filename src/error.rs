//! Top-level error type of the conversion library

use std::path::PathBuf;

use thiserror::Error;

use crate::analysis::ExpandError;
use crate::config::ConfigError;
use crate::converters::musicxml::ParseError;
use crate::converters::xes::XesError;

#[derive(Debug, Error)]
pub enum ConversionError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("cannot parse score: {0}")]
    Parse(#[from] ParseError),

    #[error("cannot expand repeats: {0}")]
    Expand(#[from] ExpandError),

    #[error(transparent)]
    Xes(#[from] XesError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot serialize report: {0}")]
    Report(#[from] serde_json::Error),
}

pub type ConversionResult<T> = Result<T, ConversionError>;
