use super::{Column, LapRecord, RowParser};
use crate::error::TableError;

/// A column left out of the table because its first cell is not a
/// `<kart>: <driver>` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedColumn {
    /// Index in left-to-right column order
    pub column: usize,
    /// Text of the first cell, `None` for an empty column
    pub header: Option<String>,
}

/// All lap records read from one scoreboard image.
#[derive(Debug, Clone, Default)]
pub struct HeatTable {
    pub heat: String,
    /// Column order, then lap order
    pub records: Vec<LapRecord>,
    pub skipped: Vec<SkippedColumn>,
}

impl HeatTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Parses every column and concatenates the records.
///
/// No sorting, deduplication or cross-column checks happen here. A lap cell
/// that fails to parse aborts the whole heat.
pub fn assemble_heat(
    columns: &[Column],
    heat: &str,
    parser: &RowParser,
) -> Result<HeatTable, TableError> {
    let mut table = HeatTable {
        heat: heat.to_string(),
        ..Default::default()
    };

    for (idx, column) in columns.iter().enumerate() {
        match parser.parse_column(column, heat)? {
            Some(records) => table.records.extend(records),
            None => {
                let header = column.first().map(|c| c.text.clone());
                crate::log(&format!(
                    "Skipping column {} in {}: header {:?} is not '<kart>: <driver>'",
                    idx, heat, header
                ));
                table.skipped.push(SkippedColumn {
                    column: idx,
                    header,
                });
            }
        }
    }

    Ok(table)
}
