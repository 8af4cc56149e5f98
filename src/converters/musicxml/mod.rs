//! MusicXML reader
//!
//! Loads `.mxl`, `.musicxml` and `.xml` files into the score model.
//!
//! # Architecture
//!
//! ```text
//! .mxl (zip) / .musicxml
//!   ↓ [archive: unzip + decode]
//! MusicXML string
//!   ↓ [parser: roxmltree]
//! Score (parts → measures → timed elements)
//! ```

pub mod archive;
pub mod errors;
pub mod parser;

use std::path::Path;

pub use archive::{is_musicxml_path, read_musicxml_file};
pub use errors::ParseError;
pub use parser::{parse_musicxml, ParseResult};

use crate::models::Score;

/// Load the score stored at `path`; the score is named after the file stem
pub fn load_score(path: &Path) -> ParseResult<Score> {
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("score")
        .to_string();
    let xml = read_musicxml_file(path)?;
    let score = parse_musicxml(&xml, &name)?;
    log::debug!(
        "loaded {} with {} part(s), {} measure(s) in the first part",
        path.display(),
        score.parts.len(),
        score.parts.first().map(|p| p.measures.len()).unwrap_or(0)
    );
    Ok(score)
}
