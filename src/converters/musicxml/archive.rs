//! Reading MusicXML text from disk
//!
//! `.mxl` files are zip containers; the score is the rootfile named in
//! `META-INF/container.xml`, or failing that the first `.xml` entry outside
//! `META-INF/`.

use std::io::{Cursor, Read};
use std::path::Path;

use roxmltree::Document;
use zip::ZipArchive;

use super::errors::ParseError;

/// File extensions the scanner accepts, compared case-insensitively
pub const MUSICXML_EXTENSIONS: [&str; 3] = ["mxl", "musicxml", "xml"];

pub fn is_musicxml_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| MUSICXML_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

/// Read the MusicXML document behind `path` as text
pub fn read_musicxml_file(path: &Path) -> Result<String, ParseError> {
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");
    if ext.eq_ignore_ascii_case("mxl") {
        let data = std::fs::read(path)?;
        return read_mxl_bytes(&data);
    }
    let data = std::fs::read(path)?;
    decode_text(&data)
}

/// Extract the score document from compressed MusicXML bytes
pub fn read_mxl_bytes(data: &[u8]) -> Result<String, ParseError> {
    let mut archive = ZipArchive::new(Cursor::new(data))?;

    let container_xml = match archive.by_name("META-INF/container.xml") {
        Ok(mut container) => {
            let mut xml = Vec::new();
            container.read_to_end(&mut xml)?;
            Some(decode_text(&xml)?)
        }
        Err(_) => None,
    };

    if let Some(container_xml) = container_xml {
        let rootfile = Document::parse(&container_xml).ok().and_then(|doc| {
            doc.descendants()
                .find(|node| node.has_tag_name("rootfile"))
                .and_then(|node| node.attribute("full-path"))
                .map(str::to_string)
        });
        if let Some(full_path) = rootfile {
            if let Ok(mut entry) = archive.by_name(&full_path) {
                let mut xml = Vec::new();
                entry.read_to_end(&mut xml)?;
                return decode_text(&xml);
            }
            log::debug!("rootfile {} listed in container.xml is missing", full_path);
        }
    }

    for idx in 0..archive.len() {
        let mut entry = archive.by_index(idx)?;
        let name = entry.name().to_string();
        if (name.ends_with(".xml") || name.ends_with(".musicxml")) && !name.starts_with("META-INF/") {
            let mut xml = Vec::new();
            entry.read_to_end(&mut xml)?;
            return decode_text(&xml);
        }
    }

    Err(ParseError::Archive("no MusicXML document in archive".to_string()))
}

/// Decode UTF-8 (with or without BOM) or UTF-16 with BOM
fn decode_text(data: &[u8]) -> Result<String, ParseError> {
    match data {
        [0xEF, 0xBB, 0xBF, rest @ ..] => String::from_utf8(rest.to_vec())
            .map_err(|e| ParseError::InvalidXml(format!("invalid UTF-8: {}", e))),
        [0xFF, 0xFE, rest @ ..] => decode_utf16(rest, u16::from_le_bytes),
        [0xFE, 0xFF, rest @ ..] => decode_utf16(rest, u16::from_be_bytes),
        _ => String::from_utf8(data.to_vec())
            .map_err(|e| ParseError::InvalidXml(format!("invalid UTF-8: {}", e))),
    }
}

fn decode_utf16(data: &[u8], to_unit: fn([u8; 2]) -> u16) -> Result<String, ParseError> {
    let units: Vec<u16> = data.chunks_exact(2).map(|c| to_unit([c[0], c[1]])).collect();
    String::from_utf16(&units).map_err(|e| ParseError::InvalidXml(format!("invalid UTF-16: {}", e)))
}
