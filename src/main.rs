//! Kart Scoreboard Reader
//!
//! Reads lap-time tables from photos of kart track scoreboards: OCR text
//! boxes are clustered into driver columns, manual corrections are applied
//! and lap times are written out as CSV.

mod config;
mod error;
mod ocr;
mod output;
mod paths;
mod pipeline;
mod table;

use anyhow::{anyhow, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use crate::config::ScoreboardConfig;
use crate::error::TableError;
use crate::ocr::{DetectionSource, TesseractEngine};
use crate::table::LapRecord;

/// Logs a message to stderr and the log file with timestamp.
///
/// stdout is left for table output.
pub fn log(msg: &str) {
    let timestamp = Local::now().format("%H:%M:%S%.3f");
    let line = format!("[{}] {}\n", timestamp, msg);
    eprint!("{}", line);
    let log_path = paths::get_logs_dir().join("kart_scoreboard.log");
    if let Ok(mut file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        let _ = file.write_all(line.as_bytes());
    }
}

/// Reconstruct lap-time tables from scoreboard images
#[derive(Parser, Debug)]
#[command(name = "kart-scoreboard")]
#[command(about = "Reads kart lap times from scoreboard images", long_about = None)]
struct Args {
    /// Config file (defaults to config.json next to the executable)
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// Pixel distance below which box x-coordinates form one column
    #[arg(short = 't', long, global = true)]
    column_threshold: Option<i32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read the lap table of one heat
    Read {
        /// Scoreboard image
        image: PathBuf,

        /// Heat label written into every record
        #[arg(long)]
        heat: String,

        /// Write CSV here instead of stdout
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Write per-driver lap statistics as JSON
        #[arg(long)]
        summary: Option<PathBuf>,
    },

    /// Read several heats concurrently, given as HEAT=IMAGE
    Batch {
        #[arg(required = true)]
        heats: Vec<String>,

        /// Write CSV here instead of stdout
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Write per-driver lap statistics as JSON
        #[arg(long)]
        summary: Option<PathBuf>,

        /// Worker threads (defaults to the config value)
        #[arg(short = 'w', long)]
        workers: Option<usize>,
    },

    /// Print clustered and corrected columns row by row
    Columns {
        /// Scoreboard image
        image: PathBuf,

        /// Only print this row
        #[arg(short = 'r', long)]
        row: Option<usize>,
    },

    /// Locate Tesseract and fetch missing language data
    Setup,
}

fn main() -> Result<()> {
    // Set up panic hook to log panics
    std::panic::set_hook(Box::new(|panic_info| {
        let msg = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        let location = if let Some(loc) = panic_info.location() {
            format!(" at {}:{}:{}", loc.file(), loc.line(), loc.column())
        } else {
            String::new()
        };
        log(&format!("[PANIC]{} {}", location, msg));
    }));

    let args = Args::parse();

    // Ensure output directories exist
    if let Err(e) = paths::ensure_directories() {
        eprintln!("Warning: failed to create log directory: {}", e);
    }

    let workers = match &args.command {
        Command::Batch { workers, .. } => *workers,
        _ => None,
    };
    let config =
        config::load_config(args.config.as_deref())?.with_overrides(args.column_threshold, workers);

    match args.command {
        Command::Read {
            image,
            heat,
            csv,
            summary,
        } => {
            let mut engine = TesseractEngine::new(&config)?;
            let table = pipeline::read_heat(&mut engine, &image, &heat, &config)?;
            if table.is_empty() {
                log(&format!("{}: no lap times found in {}", table.heat, image.display()));
            }
            if !table.skipped.is_empty() {
                let skipped: Vec<String> = table
                    .skipped
                    .iter()
                    .map(|s| format!("{} {:?}", s.column, s.header.as_deref().unwrap_or("")))
                    .collect();
                log(&format!(
                    "{}: columns without a driver header: {}",
                    table.heat,
                    skipped.join(", ")
                ));
            }
            write_outputs(&table.records, csv, summary)
        }
        Command::Batch {
            heats, csv, summary, ..
        } => run_batch_command(&config, &heats, csv, summary, || TesseractEngine::new(&config)),
        Command::Columns { image, row } => {
            let mut engine = TesseractEngine::new(&config)?;
            let columns = pipeline::read_scores(&mut engine, &image, &config)?;
            for line in table::format_row_wise(&columns, row) {
                println!("{}", line);
            }
            Ok(())
        }
        Command::Setup => {
            let tesseract =
                ocr::ensure_tesseract(config.tesseract_path.as_deref(), &config.languages)?;
            log(&format!(
                "Tesseract ready: {} (tessdata: {})",
                tesseract.executable.display(),
                tesseract.tessdata.display()
            ));
            Ok(())
        }
    }
}

/// Short description of why a heat failed.
fn failure_kind(err: &anyhow::Error) -> &'static str {
    match err.downcast_ref::<TableError>() {
        Some(e) if e.is_out_of_range() => "correction index out of range",
        Some(e) if e.is_parse() => "malformed corrections file",
        Some(TableError::Format { .. }) => "unreadable lap time",
        Some(_) => "corrections file unreadable",
        None => "read failed",
    }
}

/// Reads all heats, writes the records of those that succeeded, then fails
/// if any heat did not.
fn run_batch_command<S, F>(
    config: &ScoreboardConfig,
    heat_args: &[String],
    csv: Option<PathBuf>,
    summary: Option<PathBuf>,
    make_source: F,
) -> Result<()>
where
    S: DetectionSource + Send,
    F: FnMut() -> Result<S>,
{
    let heats = heat_args
        .iter()
        .map(|arg| pipeline::parse_heat_arg(arg))
        .collect::<Result<Vec<_>>>()?;
    let total = heats.len();

    let outcomes = pipeline::run_batch(heats, config, config.workers, make_source)?;

    let mut records = Vec::new();
    let mut failed = Vec::new();
    for outcome in outcomes {
        match outcome.result {
            Ok(table) => records.extend(table.records),
            Err(e) => {
                log(&format!(
                    "{} ({}) skipped, {}: {:#}",
                    outcome.heat,
                    outcome.image_path.display(),
                    failure_kind(&e),
                    e
                ));
                failed.push(outcome.heat);
            }
        }
    }

    write_outputs(&records, csv, summary)?;

    if !failed.is_empty() {
        return Err(anyhow!(
            "{} of {} heats failed: {}",
            failed.len(),
            total,
            failed.join(", ")
        ));
    }
    Ok(())
}

fn write_outputs(
    records: &[LapRecord],
    csv: Option<PathBuf>,
    summary: Option<PathBuf>,
) -> Result<()> {
    match csv {
        Some(path) => {
            output::write_csv(&path, records)?;
            log(&format!("{} lap records saved: {}", records.len(), path.display()));
        }
        None => output::write_records(std::io::stdout().lock(), records)?,
    }

    if let Some(path) = summary {
        output::export_to_json(&output::summarize(records), &path)?;
        log(&format!("Lap summary JSON saved: {}", path.display()));
    }

    Ok(())
}
