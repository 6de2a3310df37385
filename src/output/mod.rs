//! Lap table output.
//!
//! This module provides:
//! - CSV writing of assembled lap records
//! - Per-driver lap statistics
//! - JSON export of statistics

pub mod csv_writer;
pub mod export;
pub mod statistics;

pub use csv_writer::{write_csv, write_records};
pub use export::export_to_json;
pub use statistics::{summarize, LapSummary};
