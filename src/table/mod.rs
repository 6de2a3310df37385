//! Scoreboard table reconstruction.
//!
//! Detections are clustered into columns, manual corrections are overlaid,
//! and each column's header and lap cells are parsed into `LapRecord`s.

pub mod assemble;
pub mod cluster;
pub mod corrections;
pub mod display;
pub mod parse;
pub mod record;

pub use assemble::{assemble_heat, HeatTable};
pub use cluster::{extract_columns, Column};
pub use corrections::apply_corrections;
pub use display::format_row_wise;
pub use parse::RowParser;
pub use record::{LapRecord, LapTime};
