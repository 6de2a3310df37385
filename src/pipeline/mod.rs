//! Per-image pipeline: image → detections → columns → corrections → lap table.
//!
//! This module provides:
//! - Single image processing with a caller-supplied detection source
//! - A work queue and worker pool for processing several heats at once

pub mod queue;
pub mod worker;

pub use queue::{create_work_queue, parse_heat_arg, HeatWorkItem};
pub use worker::run_batch;

use anyhow::{Context, Result};
use std::path::Path;

use crate::config::ScoreboardConfig;
use crate::error::TableError;
use crate::ocr::{Detection, DetectionSource};
use crate::table::{apply_corrections, assemble_heat, extract_columns, Column, HeatTable, RowParser};

/// Clusters detections and overlays the image's corrections file, if any.
pub fn columns_from_detections(
    detections: Vec<Detection>,
    image_path: &Path,
    config: &ScoreboardConfig,
) -> Result<Vec<Column>, TableError> {
    let mut columns = extract_columns(detections, config.column_threshold);
    apply_corrections(image_path, &config.corrections_suffix, &mut columns)?;
    Ok(columns)
}

/// Loads the image, runs OCR and returns the corrected columns.
pub fn read_scores<S: DetectionSource + ?Sized>(
    source: &mut S,
    image_path: &Path,
    config: &ScoreboardConfig,
) -> Result<Vec<Column>> {
    let img = image::open(image_path)
        .context(format!("Failed to open image: {}", image_path.display()))?;

    let detections = source
        .detect(&img)
        .context(format!("OCR failed for {}", image_path.display()))?;

    let columns = columns_from_detections(detections, image_path, config)?;
    crate::log(&format!(
        "{}: {} columns (threshold {})",
        image_path.display(),
        columns.len(),
        config.column_threshold
    ));
    Ok(columns)
}

/// Reads one heat's lap table from a scoreboard image.
///
/// Any error leaves nothing behind: the table is only returned once every
/// column has been parsed.
pub fn read_heat<S: DetectionSource + ?Sized>(
    source: &mut S,
    image_path: &Path,
    heat: &str,
    config: &ScoreboardConfig,
) -> Result<HeatTable> {
    let columns = read_scores(source, image_path, config)?;
    let parser = RowParser::new(config.driver_aliases.clone())?;
    let table = assemble_heat(&columns, heat, &parser)
        .context(format!("Failed to build lap table for {}", heat))?;

    crate::log(&format!(
        "{}: {} lap records, {} columns skipped",
        heat,
        table.len(),
        table.skipped.len()
    ));
    Ok(table)
}
