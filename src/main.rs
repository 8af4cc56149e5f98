use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use mxl2xes::models::Lifecycle;
use mxl2xes::{batch, Config, Granularity};

#[derive(Parser, Debug)]
#[command(name = "mxl2xes")]
#[command(about = "Convert MusicXML scores into XES event logs", long_about = None)]
struct Args {
    /// Folder containing .mxl/.musicxml/.xml files
    #[arg(long = "input_dir")]
    input_dir: PathBuf,

    /// Folder for the .xes files (created if missing)
    #[arg(long = "output_dir")]
    output_dir: PathBuf,

    /// Comma-separated lifecycle phases: start, complete or both
    #[arg(long, value_delimiter = ',', default_value = "complete")]
    lifecycles: Vec<Lifecycle>,

    /// One event per measure instead of per note
    #[arg(long = "measure_as_event")]
    measure_as_event: bool,

    /// Include the octave in pitch names and use full interval sizes
    #[arg(long = "show_octave")]
    show_octave: bool,

    /// Emit events for rests
    #[arg(long = "include_rests")]
    include_rests: bool,

    /// Name events after the interval to the previous note
    #[arg(long)]
    intervals: bool,

    /// One event per run of measures in the same estimated key
    #[arg(long = "harmony_shift_as_event")]
    harmony_shift_as_event: bool,

    /// One case per part instead of one per piece
    #[arg(long = "multi_case")]
    multi_case: bool,

    /// Only convert the first part of every piece
    #[arg(long = "lead_part_only")]
    lead_part_only: bool,

    /// Convert files whose .xes already exists
    #[arg(long)]
    force: bool,

    /// Set aside files larger than this many bytes
    #[arg(long = "max_file_size")]
    max_file_size: Option<u64>,

    /// Write a JSON run report to this path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Write log records to this file instead of stderr
    #[arg(long = "log_file")]
    log_file: Option<PathBuf>,
}

impl Args {
    fn to_config(&self) -> Result<Config> {
        let granularity = Granularity::from_flags(
            self.measure_as_event,
            self.intervals,
            self.harmony_shift_as_event,
        )?;
        let config = Config {
            show_octave: self.show_octave,
            include_rests: self.include_rests,
            multi_case: self.multi_case,
            lead_part_only: self.lead_part_only,
            force: self.force,
            max_file_size: self.max_file_size,
            ..Config::new(&self.input_dir, &self.output_dir)
        }
        .with_granularity(granularity)
        .with_lifecycles(&self.lifecycles)?;
        Ok(config)
    }
}

fn init_logging(log_file: Option<&PathBuf>) -> Result<()> {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(path) = log_file {
        let file = File::create(path)
            .with_context(|| format!("Failed to create log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_ref())?;

    let config = args.to_config()?;
    let report = batch::run(&config)?;

    if let Some(path) = &args.report {
        batch::write_report(&report, path)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
    }

    Ok(())
}
