//! Error types for MusicXML loading
//!
//! Every variant is fatal for the file being loaded; the batch runner turns
//! them into a skipped-file warning.

use thiserror::Error;

/// MusicXML loading errors
#[derive(Debug, Clone, Error)]
pub enum ParseError {
    /// File could not be read
    #[error("I/O error: {0}")]
    Io(String),

    /// Compressed .mxl container is broken or holds no score
    #[error("Invalid MXL archive: {0}")]
    Archive(String),

    /// XML is malformed (not well-formed)
    #[error("Invalid XML: {0}")]
    InvalidXml(String),

    /// MusicXML format not supported (e.g., timewise instead of partwise)
    #[error("Unsupported MusicXML format: {0}")]
    UnsupportedFormat(String),

    /// Required structural element is missing
    #[error("Missing required element: {0}")]
    MissingRequiredElement(String),

    /// Element content could not be interpreted
    #[error("Invalid value '{value}' for element '{element}'")]
    InvalidValue { element: String, value: String },
}

impl From<std::io::Error> for ParseError {
    fn from(e: std::io::Error) -> Self {
        ParseError::Io(e.to_string())
    }
}

impl From<zip::result::ZipError> for ParseError {
    fn from(e: zip::result::ZipError) -> Self {
        ParseError::Archive(e.to_string())
    }
}
