//! JSON export for lap summaries.

use super::LapSummary;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Export summaries to a JSON file.
///
/// The output is pretty-printed for human readability.
pub fn export_to_json(summaries: &[LapSummary], output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(summaries)
        .context("Failed to serialize lap summaries to JSON")?;

    let mut file = File::create(output_path)
        .context(format!("Failed to create JSON file: {}", output_path.display()))?;

    file.write_all(json.as_bytes())
        .context("Failed to write JSON data")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_export_to_json() {
        let summaries = vec![LapSummary {
            heat: "Heat 1".to_string(),
            driver: "Bob".to_string(),
            kart: "3".to_string(),
            laps: 5,
            best: 58.5,
            worst: 62.0,
            mean: 60.0,
            median: 60.0,
            std_dev: 1.25,
            quartile_1: 59.0,
            quartile_3: 61.0,
        }];

        let dir = tempdir().unwrap();
        let path = dir.path().join("summary.json");

        export_to_json(&summaries, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"driver\": \"Bob\""));
        assert!(content.contains("\"laps\": 5"));
        assert!(content.contains("\"best\": 58.5"));
    }
}
