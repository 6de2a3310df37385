//! Manual corrections overlaid on clustered columns.
//!
//! A corrections file sits next to its image and addresses cells by position:
//!
//! ```json
//! { "2": { "delete": ["0", 5], "3": "1.02.345" } }
//! ```
//!
//! Within a column, deletions run first, from the highest row down, so each
//! one removes the cell that was originally at that row. Replacement rows
//! then index into the column with those cells already removed.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::Column;
use crate::error::TableError;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawIndex {
    Int(u64),
    Str(String),
}

#[derive(Deserialize)]
struct RawColumnCorrection {
    #[serde(default)]
    delete: Vec<RawIndex>,
    #[serde(flatten)]
    replace: BTreeMap<String, String>,
}

/// Edits for one column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnCorrection {
    /// Rows to remove, as clustered.
    pub delete: Vec<usize>,
    /// Row after deletions → replacement text; the cell keeps its bounding box.
    pub replace: BTreeMap<usize, String>,
}

/// All edits for one image, keyed by column index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Corrections {
    pub columns: BTreeMap<usize, ColumnCorrection>,
}

fn parse_index(key: &str, path: &Path) -> Result<usize, TableError> {
    key.trim()
        .parse::<usize>()
        .map_err(|_| TableError::CorrectionsKey {
            path: path.to_path_buf(),
            key: key.to_string(),
        })
}

impl ColumnCorrection {
    /// Deletion rows, highest first, without duplicates.
    fn delete_rows(&self) -> Vec<usize> {
        let mut rows = self.delete.clone();
        rows.sort_unstable_by(|a, b| b.cmp(a));
        rows.dedup();
        rows
    }
}

impl Corrections {
    /// Parses a corrections document. `path` is only used in error messages.
    pub fn from_json(json: &str, path: &Path) -> Result<Self, TableError> {
        let raw: BTreeMap<String, RawColumnCorrection> =
            serde_json::from_str(json).map_err(|source| TableError::CorrectionsParse {
                path: path.to_path_buf(),
                source,
            })?;

        let mut columns = BTreeMap::new();
        for (column_key, raw_column) in raw {
            let column = parse_index(&column_key, path)?;

            let mut delete = Vec::with_capacity(raw_column.delete.len());
            for index in raw_column.delete {
                let row = match index {
                    RawIndex::Int(row) => usize::try_from(row).map_err(|_| {
                        TableError::CorrectionsKey {
                            path: path.to_path_buf(),
                            key: row.to_string(),
                        }
                    })?,
                    RawIndex::Str(key) => parse_index(&key, path)?,
                };
                delete.push(row);
            }

            let mut replace = BTreeMap::new();
            for (row_key, text) in raw_column.replace {
                replace.insert(parse_index(&row_key, path)?, text);
            }

            columns.insert(column, ColumnCorrection { delete, replace });
        }

        Ok(Self { columns })
    }

    /// Loads corrections from `path`. A missing file means no corrections.
    pub fn load(path: &Path) -> Result<Option<Self>, TableError> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(path).map_err(|source| TableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents, path).map(Some)
    }

    /// Checks every referenced column and row against the current layout.
    fn validate(&self, columns: &[Column]) -> Result<(), TableError> {
        for (&column_idx, correction) in &self.columns {
            let column = columns
                .get(column_idx)
                .ok_or(TableError::ColumnOutOfRange {
                    column: column_idx,
                    columns: columns.len(),
                })?;

            let deleted = correction.delete_rows();
            if let Some(&row) = deleted.first() {
                if row >= column.len() {
                    return Err(TableError::RowOutOfRange {
                        column: column_idx,
                        row,
                        rows: column.len(),
                    });
                }
            }

            let remaining = column.len() - deleted.len();
            if let Some(&row) = correction.replace.keys().next_back() {
                if row >= remaining {
                    return Err(TableError::RowOutOfRange {
                        column: column_idx,
                        row,
                        rows: remaining,
                    });
                }
            }
        }
        Ok(())
    }

    /// Applies all edits in place.
    ///
    /// Indices are validated before anything changes, so on error `columns`
    /// is left exactly as it was.
    pub fn apply(&self, columns: &mut [Column]) -> Result<(), TableError> {
        self.validate(columns)?;

        for (&column_idx, correction) in &self.columns {
            let column = &mut columns[column_idx];

            for row in correction.delete_rows() {
                let removed = column.remove(row);
                crate::log(&format!(
                    "Removing row {} in column {} with value '{}'",
                    row, column_idx, removed.text
                ));
            }

            for (&row, new_value) in &correction.replace {
                let cell = &mut column[row];
                crate::log(&format!(
                    "Applied correction in row {}, column {}, replace '{}' with '{}'",
                    row, column_idx, cell.text, new_value
                ));
                cell.text = new_value.clone();
            }
        }

        Ok(())
    }
}

/// Looks up the corrections file for `image_path` and applies it. Returns the
/// corrections path when one was found and applied.
pub fn apply_corrections(
    image_path: &Path,
    suffix: &str,
    columns: &mut [Column],
) -> Result<Option<PathBuf>, TableError> {
    let corrections_path = crate::paths::get_corrections_path(image_path, suffix);
    match Corrections::load(&corrections_path)? {
        Some(corrections) => {
            crate::log(&format!(
                "Applying corrections from {}",
                corrections_path.display()
            ));
            corrections.apply(columns)?;
            Ok(Some(corrections_path))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::Quad;
    use crate::table::cluster::Cell;
    use tempfile::tempdir;

    fn column(texts: &[&str]) -> Column {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| Cell::new(Quad::from_rect(100, i as i32 * 20, 60, 20), *t))
            .collect()
    }

    fn texts(column: &Column) -> Vec<&str> {
        column.iter().map(|c| c.text.as_str()).collect()
    }

    fn parse(json: &str) -> Result<Corrections, TableError> {
        Corrections::from_json(json, Path::new("heat-corrections.json"))
    }

    #[test]
    fn test_parse_string_and_integer_indices() {
        let corrections = parse(r#"{"0": {"delete": ["1", 3], "2": "59.123"}}"#).unwrap();

        let col = &corrections.columns[&0];
        assert_eq!(col.delete, vec![1, 3]);
        assert_eq!(col.replace.get(&2).map(String::as_str), Some("59.123"));
    }

    #[test]
    fn test_parse_rejects_non_integer_keys() {
        let err = parse(r#"{"first": {"delete": [0]}}"#).unwrap_err();
        assert!(err.is_parse());
        assert!(matches!(err, TableError::CorrectionsKey { ref key, .. } if key == "first"));

        let err = parse(r#"{"0": {"delete": ["x"]}}"#).unwrap_err();
        assert!(err.is_parse());
    }

    #[test]
    fn test_parse_rejects_invalid_json() {
        assert!(matches!(
            parse("{ broken").unwrap_err(),
            TableError::CorrectionsParse { .. }
        ));
        // Replacement text must be a string
        assert!(parse(r#"{"0": {"1": 42}}"#).unwrap_err().is_parse());
        // Negative row
        assert!(parse(r#"{"0": {"delete": [-1]}}"#).unwrap_err().is_parse());
    }

    #[test]
    fn test_single_deletion_touches_only_its_column() {
        let mut columns = vec![column(&["3: Bob", "1.00.000", "1.01.000"]), column(&["4: Eve", "58.000"])];
        let corrections = parse(r#"{"0": {"delete": ["1"]}}"#).unwrap();

        corrections.apply(&mut columns).unwrap();

        assert_eq!(texts(&columns[0]), vec!["3: Bob", "1.01.000"]);
        assert_eq!(texts(&columns[1]), vec!["4: Eve", "58.000"]);
    }

    #[test]
    fn test_reapplying_deletion_is_out_of_range() {
        let mut columns = vec![column(&["3: Bob", "1.00.000", "1.01.000"])];
        let corrections = parse(r#"{"0": {"delete": [2]}}"#).unwrap();

        corrections.apply(&mut columns).unwrap();
        assert_eq!(columns[0].len(), 2);

        let err = corrections.apply(&mut columns).unwrap_err();
        assert!(err.is_out_of_range());
        assert!(matches!(
            err,
            TableError::RowOutOfRange { column: 0, row: 2, rows: 2 }
        ));
        assert_eq!(columns[0].len(), 2);
    }

    #[test]
    fn test_multiple_deletions_use_original_positions() {
        let mut columns = vec![column(&["a", "b", "c", "d", "e"])];
        let corrections = parse(r#"{"0": {"delete": ["0", "2", "3"]}}"#).unwrap();

        corrections.apply(&mut columns).unwrap();

        assert_eq!(texts(&columns[0]), vec!["b", "e"]);
    }

    #[test]
    fn test_replacement_keeps_box() {
        let mut columns = vec![column(&["7: Alice", "1.2345"])];
        let original_box = columns[0][1].bbox;
        let corrections = parse(r#"{"0": {"1": "1.23.45"}}"#).unwrap();

        corrections.apply(&mut columns).unwrap();

        assert_eq!(columns[0][1].text, "1.23.45");
        assert_eq!(columns[0][1].bbox, original_box);
    }

    #[test]
    fn test_replacement_indexes_column_after_deletions() {
        let mut columns = vec![column(&["3: Bob", "1.00.000", "junk", "1.0l.000"])];
        let corrections = parse(r#"{"0": {"delete": [2], "2": "1.01.000"}}"#).unwrap();

        corrections.apply(&mut columns).unwrap();

        assert_eq!(texts(&columns[0]), vec!["3: Bob", "1.00.000", "1.01.000"]);
    }

    #[test]
    fn test_replacement_past_shortened_column_is_out_of_range() {
        let mut columns = vec![column(&["h", "x", "y", "z"])];
        let corrections = parse(r#"{"0": {"delete": [1, 1], "3": "fixed"}}"#).unwrap();

        let err = corrections.apply(&mut columns).unwrap_err();

        assert!(matches!(
            err,
            TableError::RowOutOfRange { column: 0, row: 3, rows: 3 }
        ));
        assert_eq!(texts(&columns[0]), vec!["h", "x", "y", "z"]);
    }

    #[test]
    fn test_invalid_column_leaves_layout_untouched() {
        let mut columns = vec![column(&["h", "x", "y"])];
        let corrections = parse(r#"{"0": {"delete": [1]}, "5": {"delete": [0]}}"#).unwrap();

        let err = corrections.apply(&mut columns).unwrap_err();

        assert!(matches!(
            err,
            TableError::ColumnOutOfRange { column: 5, columns: 1 }
        ));
        assert_eq!(texts(&columns[0]), vec!["h", "x", "y"]);
    }

    #[test]
    fn test_missing_file_is_noop() {
        let dir = tempdir().unwrap();
        let image = dir.path().join("heat1.png");
        let mut columns = vec![column(&["h", "x"])];

        let applied = apply_corrections(&image, "-corrections.json", &mut columns).unwrap();

        assert!(applied.is_none());
        assert_eq!(texts(&columns[0]), vec!["h", "x"]);
    }

    #[test]
    fn test_sidecar_file_applied() {
        let dir = tempdir().unwrap();
        let image = dir.path().join("heat1.png");
        std::fs::write(
            dir.path().join("heat1-corrections.json"),
            r#"{"0": {"delete": ["1"]}}"#,
        )
        .unwrap();
        let mut columns = vec![column(&["h", "x", "y"])];

        let applied = apply_corrections(&image, "-corrections.json", &mut columns).unwrap();

        assert_eq!(applied, Some(dir.path().join("heat1-corrections.json")));
        assert_eq!(texts(&columns[0]), vec!["h", "y"]);
    }
}
