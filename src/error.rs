//! Error types for scoreboard table reconstruction.
//!
//! Everything here aborts the current image. Header mismatches are not errors;
//! they are reported through `HeatTable::skipped` instead.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TableError {
    /// A lap cell did not split into two or three integer fields.
    #[error("invalid lap time format: '{text}'")]
    Format { text: String },

    /// A correction names a column that clustering did not produce.
    #[error("correction references column {column}, but only {columns} columns exist")]
    ColumnOutOfRange { column: usize, columns: usize },

    /// A correction names a row past the end of its column.
    #[error("correction references row {row} in column {column}, but the column has {rows} rows")]
    RowOutOfRange {
        column: usize,
        row: usize,
        rows: usize,
    },

    /// The corrections file exists but is not valid JSON for the expected schema.
    #[error("failed to parse corrections file {path}")]
    CorrectionsParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A key or index in the corrections file is not a non-negative integer.
    #[error("invalid index '{key}' in corrections file {path}")]
    CorrectionsKey { path: PathBuf, key: String },

    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TableError {
    /// True for the index errors raised while overlaying corrections.
    pub fn is_out_of_range(&self) -> bool {
        matches!(
            self,
            TableError::ColumnOutOfRange { .. } | TableError::RowOutOfRange { .. }
        )
    }

    /// True when the corrections resource itself is malformed.
    pub fn is_parse(&self) -> bool {
        matches!(
            self,
            TableError::CorrectionsParse { .. } | TableError::CorrectionsKey { .. }
        )
    }
}
