//! Converting a directory of MusicXML files
//!
//! Files are handled one at a time in name order. A file that cannot be
//! loaded or unrolled is copied to `<output>/exceptions/` and the run moves
//! on; only configuration and directory errors stop it.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::analysis::expand_score;
use crate::config::Config;
use crate::converters::musicxml::{is_musicxml_path, load_score};
use crate::converters::xes::{validate_xes_file, write_xes_file};
use crate::error::{ConversionError, ConversionResult};
use crate::extract::extract;

/// Outcome of one input file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Converted,
    /// Output already present and `force` not set
    AlreadyProcessed,
    TooLarge,
    Unparseable,
    Unexpandable,
    WriteFailed,
    /// Written, but the re-read file did not match the log
    ValidationFailed,
}

impl FileStatus {
    pub fn is_failure(&self) -> bool {
        !matches!(self, FileStatus::Converted | FileStatus::AlreadyProcessed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileReport {
    pub file: String,
    pub status: FileStatus,
    pub cases: usize,
    pub events: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FileReport {
    fn new(path: &Path, status: FileStatus) -> Self {
        Self {
            file: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            status,
            cases: 0,
            events: 0,
            message: None,
        }
    }

    fn with_message(mut self, message: impl ToString) -> Self {
        self.message = Some(message.to_string());
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub config: Config,
    pub files: Vec<FileReport>,
}

impl RunReport {
    pub fn count(&self, status: FileStatus) -> usize {
        self.files.iter().filter(|f| f.status == status).count()
    }

    pub fn good(&self) -> usize {
        self.count(FileStatus::Converted)
    }

    pub fn bad(&self) -> usize {
        self.files.iter().filter(|f| f.status.is_failure()).count()
    }
}

/// MusicXML files directly inside `dir`, sorted by file name
pub fn scan_input_dir(dir: &Path) -> ConversionResult<Vec<PathBuf>> {
    let io_error = |source| ConversionError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();
        if !path.is_file() {
            continue;
        }
        if is_musicxml_path(&path) {
            files.push(path);
        } else {
            log::debug!("ignoring {}", path.display());
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Convert every MusicXML file of the input directory
pub fn run(config: &Config) -> ConversionResult<RunReport> {
    config.validate()?;
    let files = scan_input_dir(&config.input_dir)?;
    log::info!(
        "converting {} file(s) from {} into {}",
        files.len(),
        config.input_dir.display(),
        config.output_dir.display()
    );

    let mut report = RunReport {
        config: config.clone(),
        files: Vec::with_capacity(files.len()),
    };
    for path in &files {
        let entry = convert_file(path, config);
        log::info!(
            "{}: {:?} ({} good, {} bad so far)",
            entry.file,
            entry.status,
            report.good() + usize::from(entry.status == FileStatus::Converted),
            report.bad() + usize::from(entry.status.is_failure())
        );
        report.files.push(entry);
    }

    log::info!(
        "done: {} converted, {} failed, {} already processed",
        report.good(),
        report.bad(),
        report.count(FileStatus::AlreadyProcessed)
    );
    Ok(report)
}

/// Convert a single file into `<output>/<stem>.xes`
pub fn convert_file(path: &Path, config: &Config) -> FileReport {
    let output = config.output_path(path);
    if !config.force && output.exists() {
        log::info!("{} already processed", path.display());
        return FileReport::new(path, FileStatus::AlreadyProcessed);
    }

    if let Some(max_size) = config.max_file_size {
        match fs::metadata(path) {
            Ok(meta) if meta.len() > max_size => {
                log::warn!("{} is larger than {} bytes", path.display(), max_size);
                set_aside(path, &config.large_files_dir());
                return FileReport::new(path, FileStatus::TooLarge)
                    .with_message(format!("{} bytes", meta.len()));
            }
            Ok(_) => {}
            Err(e) => log::warn!("cannot stat {}: {}", path.display(), e),
        }
    }

    let score = match load_score(path) {
        Ok(score) => score,
        Err(e) => {
            log::warn!("no parsing: {}: {}", path.display(), e);
            set_aside(path, &config.exceptions_dir());
            return FileReport::new(path, FileStatus::Unparseable).with_message(e);
        }
    };

    let expanded = match expand_score(&score) {
        Ok(expanded) => expanded,
        Err(e) => {
            log::warn!("not expandable: {}: {}", path.display(), e);
            set_aside(path, &config.exceptions_dir());
            return FileReport::new(path, FileStatus::Unexpandable).with_message(e);
        }
    };

    let log = extract(&expanded, config);
    let mut entry = FileReport::new(path, FileStatus::Converted);
    entry.cases = log.traces.len();
    entry.events = log.event_count();

    if let Err(e) = write_xes_file(&log, &output) {
        log::warn!("cannot write {}: {}", output.display(), e);
        entry.status = FileStatus::WriteFailed;
        return entry.with_message(e);
    }

    if let Err(e) = validate_xes_file(&output, &log) {
        log::warn!("validation failed for {}: {}", output.display(), e);
        entry.status = FileStatus::ValidationFailed;
        return entry.with_message(e);
    }

    log::debug!(
        "{} -> {} ({} case(s), {} event(s))",
        path.display(),
        output.display(),
        entry.cases,
        entry.events
    );
    entry
}

/// Copy a rejected input into `dir` for inspection
fn set_aside(path: &Path, dir: &Path) {
    let Some(name) = path.file_name() else {
        return;
    };
    let copied = fs::create_dir_all(dir).and_then(|_| fs::copy(path, dir.join(name)));
    if let Err(e) = copied {
        log::warn!("cannot copy {} to {}: {}", path.display(), dir.display(), e);
    }
}

/// Write `report` as pretty JSON
pub fn write_report(report: &RunReport, path: &Path) -> ConversionResult<()> {
    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json + "\n").map_err(|source| ConversionError::Io {
        path: path.to_path_buf(),
        source,
    })
}
