//! Configuration for scoreboard reading.
//!
//! Loads settings from config.json. Provides the clustering threshold, the
//! Tesseract invocation parameters, the corrections sidecar suffix and the
//! driver name alias table.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Complete scoreboard configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScoreboardConfig {
    /// Pixel distance below which two box x-coordinates belong to the same column
    #[serde(default = "default_column_threshold")]
    pub column_threshold: i32,
    /// Word merge distance, in multiples of the line height
    #[serde(default = "default_width_ths")]
    pub width_ths: f32,
    /// Tesseract language codes, joined with '+' on the command line
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
    /// Characters Tesseract may recognize
    #[serde(default = "default_char_whitelist")]
    pub char_whitelist: String,
    /// Tesseract page segmentation mode (11 = sparse text)
    #[serde(default = "default_page_seg_mode")]
    pub page_seg_mode: u8,
    /// Explicit Tesseract executable, skipping the search
    #[serde(default)]
    pub tesseract_path: Option<std::path::PathBuf>,
    /// Appended to the image stem to find its corrections file
    #[serde(default = "default_corrections_suffix")]
    pub corrections_suffix: String,
    /// Misrecognized driver name → actual driver name
    #[serde(default = "default_driver_aliases")]
    pub driver_aliases: BTreeMap<String, String>,
    /// Worker threads used for batch processing
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_column_threshold() -> i32 {
    30
}

fn default_width_ths() -> f32 {
    // "Hoestrup" is long and runs into the next column; 0.35 keeps them apart
    0.35
}

fn default_languages() -> Vec<String> {
    vec!["eng".to_string(), "dan".to_string()]
}

fn default_char_whitelist() -> String {
    "abcdefghijklmnopqrstuvxyzABCDEFGHIJKLMNOPQRSTUVXYZ1234567890:. ".to_string()
}

fn default_page_seg_mode() -> u8 {
    11
}

fn default_corrections_suffix() -> String {
    "-corrections.json".to_string()
}

fn default_driver_aliases() -> BTreeMap<String, String> {
    BTreeMap::from([("Hoestru".to_string(), "Hoestrup".to_string())])
}

fn default_workers() -> usize {
    4
}

impl Default for ScoreboardConfig {
    fn default() -> Self {
        Self {
            column_threshold: default_column_threshold(),
            width_ths: default_width_ths(),
            languages: default_languages(),
            char_whitelist: default_char_whitelist(),
            page_seg_mode: default_page_seg_mode(),
            tesseract_path: None,
            corrections_suffix: default_corrections_suffix(),
            driver_aliases: default_driver_aliases(),
            workers: default_workers(),
        }
    }
}

impl ScoreboardConfig {
    /// Replaces file values with those given on the command line.
    pub fn with_overrides(mut self, column_threshold: Option<i32>, workers: Option<usize>) -> Self {
        if let Some(threshold) = column_threshold {
            self.column_threshold = threshold;
        }
        if let Some(workers) = workers {
            self.workers = workers;
        }
        self
    }
}

/// Loads configuration.
///
/// With an explicit path, read and parse failures are errors. Otherwise
/// config.json next to the executable is tried and defaults are used when it
/// is missing or unreadable.
pub fn load_config(explicit: Option<&Path>) -> Result<ScoreboardConfig> {
    if let Some(path) = explicit {
        let contents = fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;
        let config = serde_json::from_str(&contents)
            .context(format!("Failed to parse config file: {}", path.display()))?;
        crate::log(&format!("Config loaded from {}", path.display()));
        return Ok(config);
    }

    let config_path = crate::paths::get_default_config_path();
    crate::log(&format!("Looking for config at: {}", config_path.display()));

    if config_path.exists() {
        match fs::read_to_string(&config_path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    crate::log("Config loaded from config.json");
                    return Ok(config);
                }
                Err(e) => {
                    crate::log(&format!(
                        "Failed to parse config.json: {}. Using defaults.",
                        e
                    ));
                }
            },
            Err(e) => {
                crate::log(&format!(
                    "Failed to read config.json: {}. Using defaults.",
                    e
                ));
            }
        }
    } else {
        crate::log("config.json not found. Using default config.");
    }

    Ok(ScoreboardConfig::default())
}
