use regex::Regex;
use std::collections::BTreeMap;

use super::{Column, LapRecord, LapTime};
use crate::error::TableError;

/// Column header: kart number, colon, space, driver name ("7: Alice").
const HEADER_PATTERN: &str = r"^(\d+): (\S+)";

/// Kart and driver taken from a column's header cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub kart: String,
    pub driver: String,
}

/// Parses lap time text.
///
/// The text is split on '.', ' ' and ':' with empty pieces dropped. Three
/// fields are minutes, seconds and milliseconds; two fields are seconds and
/// milliseconds.
pub fn parse_lap_time(text: &str) -> Result<LapTime, TableError> {
    let format_error = || TableError::Format {
        text: text.to_string(),
    };

    let fields = text
        .split(['.', ' ', ':'])
        .filter(|p| !p.is_empty())
        .map(|p| p.parse::<u32>().map_err(|_| format_error()))
        .collect::<Result<Vec<u32>, TableError>>()?;

    match fields.as_slice() {
        [minutes, seconds, millis] => Ok(LapTime::new(*minutes, *seconds, *millis)),
        [seconds, millis] => Ok(LapTime::new(0, *seconds, *millis)),
        _ => Err(format_error()),
    }
}

/// Turns one clustered column into lap records.
pub struct RowParser {
    header_regex: Regex,
    driver_aliases: BTreeMap<String, String>,
}

impl RowParser {
    pub fn new(driver_aliases: BTreeMap<String, String>) -> Result<Self, regex::Error> {
        Ok(Self {
            header_regex: Regex::new(HEADER_PATTERN)?,
            driver_aliases,
        })
    }

    /// Extracts kart and driver, with the driver name passed through the
    /// alias table. Returns `None` when the text does not look like a header.
    pub fn parse_header(&self, text: &str) -> Option<Header> {
        let caps = self.header_regex.captures(text)?;
        let kart = caps[1].to_string();
        let driver = caps[2].to_string();
        let driver = self.driver_aliases.get(&driver).cloned().unwrap_or(driver);
        Some(Header { kart, driver })
    }

    /// Parses every cell below the header into a `LapRecord`, lap numbers
    /// counting from 1.
    ///
    /// Returns `Ok(None)` when the column is empty or its first cell is not a
    /// header; a lap cell that fails to parse is an error.
    pub fn parse_column(
        &self,
        column: &Column,
        heat: &str,
    ) -> Result<Option<Vec<LapRecord>>, TableError> {
        let Some((header_cell, laps)) = column.split_first() else {
            return Ok(None);
        };
        let Some(header) = self.parse_header(&header_cell.text) else {
            return Ok(None);
        };

        let mut records = Vec::with_capacity(laps.len());
        for (lap, cell) in (1u32..).zip(laps) {
            records.push(LapRecord {
                heat: heat.to_string(),
                driver: header.driver.clone(),
                kart: header.kart.clone(),
                lap,
                time: parse_lap_time(&cell.text)?,
            });
        }

        Ok(Some(records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::Quad;
    use crate::table::cluster::Cell;

    fn parser() -> RowParser {
        RowParser::new(BTreeMap::from([(
            "Hoestru".to_string(),
            "Hoestrup".to_string(),
        )]))
        .unwrap()
    }

    fn column(texts: &[&str]) -> Column {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| Cell::new(Quad::from_rect(100, i as i32 * 20, 60, 20), *t))
            .collect()
    }

    #[test]
    fn test_parse_three_fields() {
        assert_eq!(parse_lap_time("1.23.456").unwrap(), LapTime::new(1, 23, 456));
    }

    #[test]
    fn test_parse_two_fields() {
        assert_eq!(parse_lap_time("23.456").unwrap(), LapTime::new(0, 23, 456));
    }

    #[test]
    fn test_parse_delimiter_agnostic() {
        assert_eq!(parse_lap_time("1:23:456").unwrap(), LapTime::new(1, 23, 456));
        assert_eq!(parse_lap_time("1:23.456").unwrap(), LapTime::new(1, 23, 456));
        assert_eq!(parse_lap_time("1. 23 .456").unwrap(), LapTime::new(1, 23, 456));
    }

    #[test]
    fn test_parse_no_range_validation() {
        assert_eq!(parse_lap_time("75.000").unwrap(), LapTime::new(0, 75, 0));
    }

    #[test]
    fn test_parse_wrong_field_count() {
        let err = parse_lap_time("12").unwrap_err();
        assert!(matches!(err, TableError::Format { ref text } if text == "12"));
        assert!(parse_lap_time("1.2.3.4").is_err());
        assert!(parse_lap_time("").is_err());
        assert!(parse_lap_time("...").is_err());
    }

    #[test]
    fn test_parse_non_numeric_field() {
        let err = parse_lap_time("1.2a.456").unwrap_err();
        assert_eq!(err.to_string(), "invalid lap time format: '1.2a.456'");
    }

    #[test]
    fn test_header_extracted() {
        let header = parser().parse_header("7: Alice").unwrap();
        assert_eq!(header.kart, "7");
        assert_eq!(header.driver, "Alice");
    }

    #[test]
    fn test_header_takes_first_token() {
        let header = parser().parse_header("12: Anna Berg").unwrap();
        assert_eq!(header.kart, "12");
        assert_eq!(header.driver, "Anna");
    }

    #[test]
    fn test_header_mismatch() {
        let parser = parser();
        assert!(parser.parse_header("Alice").is_none());
        assert!(parser.parse_header("7:Alice").is_none());
        assert!(parser.parse_header(" 7: Alice").is_none());
    }

    #[test]
    fn test_driver_alias_applied() {
        let header = parser().parse_header("5: Hoestru").unwrap();
        assert_eq!(header.driver, "Hoestrup");
    }

    #[test]
    fn test_parse_column_numbers_laps() {
        let records = parser()
            .parse_column(&column(&["3: Bob", "1.00.000", "59.500"]), "Heat 1")
            .unwrap()
            .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].lap, 1);
        assert_eq!(records[0].time, LapTime::new(1, 0, 0));
        assert_eq!(records[1].lap, 2);
        assert_eq!(records[1].time, LapTime::new(0, 59, 500));
        assert!(records.iter().all(|r| r.heat == "Heat 1" && r.driver == "Bob" && r.kart == "3"));
    }

    #[test]
    fn test_parse_column_without_header_skipped() {
        let parser = parser();
        assert!(parser.parse_column(&column(&["Alice", "1.00.000"]), "h").unwrap().is_none());
        assert!(parser.parse_column(&Vec::new(), "h").unwrap().is_none());
    }

    #[test]
    fn test_parse_column_header_only() {
        let records = parser().parse_column(&column(&["3: Bob"]), "h").unwrap().unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_parse_column_bad_lap_is_error() {
        let err = parser()
            .parse_column(&column(&["3: Bob", "1.00.000", "12"]), "h")
            .unwrap_err();
        assert!(matches!(err, TableError::Format { .. }));
    }
}
