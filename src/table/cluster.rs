//! Spatial clustering of detections into scoreboard columns.
//!
//! Boxes of one visual column rarely share an exact x-coordinate because
//! glyph widths vary, so nearby x-coordinates are chained together: each
//! coordinate is compared with the one before it, not with the first of its
//! group. Many evenly spaced columns closer than the threshold will
//! therefore collapse into one; such groups are logged.

use std::collections::BTreeMap;

use crate::ocr::{Detection, Quad};

/// A detection assigned to a column, confidence dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub bbox: Quad,
    pub text: String,
}

impl Cell {
    pub fn new(bbox: Quad, text: impl Into<String>) -> Self {
        Self {
            bbox,
            text: text.into(),
        }
    }
}

/// Cells of one scoreboard column, top to bottom.
pub type Column = Vec<Cell>;

/// Buckets detections by the exact x of their top-left corner.
///
/// Each cell keeps its detection index so later sorts can break ties by
/// detection order within a bucket.
fn group_by_x(detections: Vec<Detection>) -> BTreeMap<i32, Vec<(usize, Cell)>> {
    let mut buckets: BTreeMap<i32, Vec<(usize, Cell)>> = BTreeMap::new();
    for (idx, detection) in detections.into_iter().enumerate() {
        let x = detection.bbox.top_left().x;
        buckets
            .entry(x)
            .or_default()
            .push((idx, Cell::new(detection.bbox, detection.text)));
    }
    buckets
}

/// Chains ascending x-coordinates into groups.
///
/// A key joins the current group when it is strictly closer than `threshold`
/// to the previous key.
pub fn merge_keys(keys: impl IntoIterator<Item = i32>, threshold: i32) -> Vec<Vec<i32>> {
    let mut sorted: Vec<i32> = keys.into_iter().collect();
    sorted.sort_unstable();
    sorted.dedup();

    let mut groups: Vec<Vec<i32>> = Vec::new();
    let mut current: Vec<i32> = Vec::new();

    for key in sorted {
        if let Some(&prev) = current.last() {
            if key - prev >= threshold {
                groups.push(std::mem::take(&mut current));
            }
        }
        current.push(key);
    }

    if !current.is_empty() {
        groups.push(current);
    }
    groups
}

/// Collects the cells of each key group and orders them by top-left y.
/// Equal y falls back to bucket x, then detection order.
fn merge_columns(
    groups: &[Vec<i32>],
    mut buckets: BTreeMap<i32, Vec<(usize, Cell)>>,
    threshold: i32,
) -> Vec<Column> {
    let mut columns = Vec::with_capacity(groups.len());

    for group in groups {
        if let (Some(first), Some(last)) = (group.first(), group.last()) {
            if last - first >= threshold && threshold > 0 {
                crate::log(&format!(
                    "Column at x={}..{} spans {} px, wider than the threshold of {}; \
                     neighbouring columns may have been merged",
                    first,
                    last,
                    last - first,
                    threshold
                ));
            }
        }

        let mut cells: Vec<(usize, Cell)> = group
            .iter()
            .flat_map(|x| buckets.remove(x).unwrap_or_default())
            .collect();
        cells.sort_by_key(|(idx, cell)| {
            let corner = cell.bbox.top_left();
            (corner.y, corner.x, *idx)
        });

        columns.push(cells.into_iter().map(|(_, cell)| cell).collect());
    }

    columns
}

/// Clusters raw detections into columns, left to right, each ordered top to
/// bottom.
pub fn extract_columns(detections: Vec<Detection>, threshold: i32) -> Vec<Column> {
    let buckets = group_by_x(detections);
    let groups = merge_keys(buckets.keys().copied(), threshold);
    merge_columns(&groups, buckets, threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(x: i32, y: i32, text: &str) -> Detection {
        Detection::new(Quad::from_rect(x, y, 60, 20), text, 0.9)
    }

    fn texts(column: &Column) -> Vec<&str> {
        column.iter().map(|c| c.text.as_str()).collect()
    }

    #[test]
    fn test_same_x_single_column_sorted_by_y() {
        let detections = vec![
            det(100, 50, "c"),
            det(100, 10, "a"),
            det(100, 30, "b"),
        ];

        let columns = extract_columns(detections, 30);

        assert_eq!(columns.len(), 1);
        assert_eq!(texts(&columns[0]), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_gap_at_threshold_not_merged() {
        let detections = vec![
            det(100, 10, "left"),
            det(130, 10, "right"),
            det(200, 10, "far"),
        ];

        let columns = extract_columns(detections, 30);

        assert_eq!(columns.len(), 3);
        assert_eq!(texts(&columns[0]), vec!["left"]);
        assert_eq!(texts(&columns[1]), vec!["right"]);
        assert_eq!(texts(&columns[2]), vec!["far"]);
    }

    #[test]
    fn test_jittered_x_merged() {
        let detections = vec![
            det(103, 30, "1.00.000"),
            det(100, 10, "3: Bob"),
            det(98, 50, "1.01.000"),
            det(250, 10, "4: Eve"),
        ];

        let columns = extract_columns(detections, 30);

        assert_eq!(columns.len(), 2);
        assert_eq!(texts(&columns[0]), vec!["3: Bob", "1.00.000", "1.01.000"]);
        assert_eq!(texts(&columns[1]), vec!["4: Eve"]);
    }

    #[test]
    fn test_chained_keys_merge_beyond_threshold() {
        // 0 -> 20 -> 40: each step < 30 even though the spread is 40
        let groups = merge_keys([40, 0, 20, 100], 30);
        assert_eq!(groups, vec![vec![0, 20, 40], vec![100]]);
    }

    #[test]
    fn test_zero_threshold_only_exact_matches() {
        let detections = vec![det(10, 0, "a"), det(11, 0, "b"), det(10, 5, "c")];

        let columns = extract_columns(detections, 0);

        assert_eq!(columns.len(), 2);
        assert_eq!(texts(&columns[0]), vec!["a", "c"]);
        assert_eq!(texts(&columns[1]), vec!["b"]);
    }

    #[test]
    fn test_equal_y_ordered_by_x_then_detection() {
        let detections = vec![
            det(105, 10, "right"),
            det(100, 10, "left"),
            det(100, 10, "left again"),
            det(100, 40, "below"),
        ];

        let columns = extract_columns(detections, 30);

        assert_eq!(
            texts(&columns[0]),
            vec!["left", "left again", "right", "below"]
        );
    }

    #[test]
    fn test_empty_input() {
        assert!(extract_columns(Vec::new(), 30).is_empty());
        assert!(merge_keys(Vec::new(), 30).is_empty());
    }

    #[test]
    fn test_cell_keeps_box() {
        let columns = extract_columns(vec![det(7, 9, "x")], 30);
        assert_eq!(columns[0][0].bbox, Quad::from_rect(7, 9, 60, 20));
    }
}
