//! Run configuration
//!
//! Built once from the command line and passed by reference to every stage.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::models::Lifecycle;

/// What one logical event stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    /// One event per note pitch (and per rest with `include_rests`)
    #[default]
    Note,
    /// One event per measure holding at least one note-level event
    Measure,
    /// One event per pair of adjacent notes
    Interval,
    /// One event per run of measures sharing an estimated key
    HarmonyShift,
}

impl Granularity {
    /// Pick the granularity from the mutually exclusive mode flags
    pub fn from_flags(
        measure_as_event: bool,
        intervals: bool,
        harmony_shift_as_event: bool,
    ) -> Result<Self, ConfigError> {
        let selected: Vec<(&str, Granularity)> = [
            (measure_as_event, "--measure_as_event", Granularity::Measure),
            (intervals, "--intervals", Granularity::Interval),
            (harmony_shift_as_event, "--harmony_shift_as_event", Granularity::HarmonyShift),
        ]
        .into_iter()
        .filter(|(on, _, _)| *on)
        .map(|(_, flag, granularity)| (flag, granularity))
        .collect();

        match selected.as_slice() {
            [] => Ok(Granularity::Note),
            [(_, granularity)] => Ok(*granularity),
            flags => Err(ConfigError::ConflictingGranularity(
                flags.iter().map(|(flag, _)| *flag).collect::<Vec<_>>().join(", "),
            )),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("input directory {0} does not exist")]
    InputDirMissing(PathBuf),

    #[error("input path {0} is not a directory")]
    InputNotDirectory(PathBuf),

    #[error("cannot create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("at least one lifecycle (start, complete) is required")]
    NoLifecycles,

    #[error("only one extraction granularity may be chosen, got {0}")]
    ConflictingGranularity(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Deduplicated, start before complete
    pub lifecycles: Vec<Lifecycle>,
    pub granularity: Granularity,
    pub show_octave: bool,
    pub include_rests: bool,
    pub multi_case: bool,
    pub lead_part_only: bool,
    /// Convert inputs whose output file already exists
    pub force: bool,
    /// Inputs larger than this many bytes are set aside
    pub max_file_size: Option<u64>,
}

impl Config {
    /// Defaults: note events, `complete` lifecycle only, one case per piece
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            lifecycles: vec![Lifecycle::Complete],
            granularity: Granularity::Note,
            show_octave: false,
            include_rests: false,
            multi_case: false,
            lead_part_only: false,
            force: false,
            max_file_size: None,
        }
    }

    pub fn with_lifecycles(mut self, lifecycles: &[Lifecycle]) -> Result<Self, ConfigError> {
        self.lifecycles = normalize_lifecycles(lifecycles)?;
        Ok(self)
    }

    pub fn with_granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }

    /// Check the input directory and create the output directory if needed
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.input_dir.exists() {
            return Err(ConfigError::InputDirMissing(self.input_dir.clone()));
        }
        if !self.input_dir.is_dir() {
            return Err(ConfigError::InputNotDirectory(self.input_dir.clone()));
        }
        if self.lifecycles.is_empty() {
            return Err(ConfigError::NoLifecycles);
        }
        std::fs::create_dir_all(&self.output_dir).map_err(|source| ConfigError::OutputDir {
            path: self.output_dir.clone(),
            source,
        })
    }

    /// Where unparseable or unexpandable inputs are copied
    pub fn exceptions_dir(&self) -> PathBuf {
        self.output_dir.join("exceptions")
    }

    /// Where inputs over `max_file_size` are copied
    pub fn large_files_dir(&self) -> PathBuf {
        self.exceptions_dir().join("large_files")
    }

    /// Output file for the input at `path`
    pub fn output_path(&self, path: &Path) -> PathBuf {
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("score");
        self.output_dir.join(format!("{}.xes", stem))
    }
}

/// Drop duplicates and order start before complete
pub fn normalize_lifecycles(lifecycles: &[Lifecycle]) -> Result<Vec<Lifecycle>, ConfigError> {
    let mut phases = lifecycles.to_vec();
    phases.sort();
    phases.dedup();
    if phases.is_empty() {
        return Err(ConfigError::NoLifecycles);
    }
    Ok(phases)
}
