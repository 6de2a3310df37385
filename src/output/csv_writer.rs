//! CSV writer for lap tables.
//!
//! Each row contains: heat, driver, kart, lap number, formatted lap time and
//! the lap time in seconds.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::table::LapRecord;

/// CSV header row.
const CSV_HEADER: &str = "heat,driver,kart,lap,time,seconds";

/// Quotes a field if it contains a delimiter, quote or newline.
fn escape_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Formats one record as a CSV line (no trailing newline).
pub fn format_record(record: &LapRecord) -> String {
    format!(
        "{},{},{},{},{},{:.3}",
        escape_field(&record.heat),
        escape_field(&record.driver),
        escape_field(&record.kart),
        record.lap,
        record.time,
        record.time.as_secs_f64(),
    )
}

/// Writes header plus one row per record to any writer.
pub fn write_records<W: Write>(mut out: W, records: &[LapRecord]) -> Result<()> {
    writeln!(out, "{}", CSV_HEADER).context("Failed to write CSV header")?;
    for record in records {
        writeln!(out, "{}", format_record(record)).context("Failed to write CSV row")?;
    }
    out.flush().context("Failed to flush CSV output")?;
    Ok(())
}

/// Writes the records to `path`, replacing any existing file.
pub fn write_csv(path: &Path, records: &[LapRecord]) -> Result<()> {
    let file = File::create(path)
        .context(format!("Failed to create CSV file: {}", path.display()))?;
    write_records(BufWriter::new(file), records)
}
