use super::Column;

/// Renders clustered columns row by row, for checking clustering and
/// authoring corrections files. Columns shorter than the row show `-`.
///
/// With `row` set, only that row is rendered.
pub fn format_row_wise(columns: &[Column], row: Option<usize>) -> Vec<String> {
    let rows = columns.iter().map(|c| c.len()).max().unwrap_or(0);

    (0..rows)
        .filter(|r| row.is_none_or(|only| only == *r))
        .map(|r| {
            let values = columns
                .iter()
                .map(|c| c.get(r).map(|cell| cell.text.as_str()).unwrap_or("-"))
                .collect::<Vec<_>>()
                .join(" | ");
            format!("{:>3}: {}", r, values)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::Quad;
    use crate::table::cluster::Cell;

    fn column(texts: &[&str]) -> Column {
        texts
            .iter()
            .map(|t| Cell::new(Quad::from_rect(0, 0, 1, 1), *t))
            .collect()
    }

    #[test]
    fn test_rows_padded_for_short_columns() {
        let columns = vec![column(&["3: Bob", "1.00.000"]), column(&["4: Eve"])];

        let lines = format_row_wise(&columns, None);

        assert_eq!(lines, vec!["  0: 3: Bob | 4: Eve", "  1: 1.00.000 | -"]);
    }

    #[test]
    fn test_single_row() {
        let columns = vec![column(&["a", "b", "c"]), column(&["d", "e"])];

        assert_eq!(format_row_wise(&columns, Some(1)), vec!["  1: b | e"]);
        assert!(format_row_wise(&columns, Some(7)).is_empty());
    }

    #[test]
    fn test_no_columns() {
        assert!(format_row_wise(&[], None).is_empty());
    }
}
