use anyhow::{anyhow, Context, Result};
use image::DynamicImage;
use std::path::PathBuf;
use std::process::Command;
use tempfile::NamedTempFile;

use super::setup::{find_tessdata_dir, find_tesseract_executable};
use super::{Detection, DetectionSource, Quad};
use crate::config::ScoreboardConfig;

/// A single word from Tesseract's TSV output.
#[derive(Debug, Clone)]
struct TsvWord {
    left: i32,
    top: i32,
    width: i32,
    height: i32,
    confidence: f32,
    text: String,
}

impl TsvWord {
    fn right(&self) -> i32 {
        self.left + self.width
    }

    fn bottom(&self) -> i32 {
        self.top + self.height
    }
}

/// Detection source backed by the `tesseract` executable.
pub struct TesseractEngine {
    executable: PathBuf,
    tessdata: PathBuf,
    languages: String,
    page_seg_mode: u8,
    char_whitelist: String,
    width_ths: f32,
}

impl TesseractEngine {
    /// Locates Tesseract and its language data according to `config`.
    pub fn new(config: &ScoreboardConfig) -> Result<Self> {
        let executable = find_tesseract_executable(config.tesseract_path.as_deref())?;
        let tessdata = find_tessdata_dir(&config.languages)?;

        Ok(Self {
            executable,
            tessdata,
            languages: config.languages.join("+"),
            page_seg_mode: config.page_seg_mode,
            char_whitelist: config.char_whitelist.clone(),
            width_ths: config.width_ths,
        })
    }
}

impl DetectionSource for TesseractEngine {
    fn detect(&mut self, img: &DynamicImage) -> Result<Vec<Detection>> {
        // Save image to temporary file
        let temp_input = NamedTempFile::with_suffix(".png")?;
        img.save(temp_input.path())
            .context("Failed to write temporary OCR input")?;

        // Tesseract appends .tsv to the output base
        let temp_output = NamedTempFile::new()?;
        let output_base = temp_output.path().to_string_lossy().to_string();

        let output = Command::new(&self.executable)
            .arg(temp_input.path())
            .arg(&output_base)
            .arg("--tessdata-dir")
            .arg(&self.tessdata)
            .arg("-l")
            .arg(&self.languages)
            .arg("--psm")
            .arg(self.page_seg_mode.to_string())
            .arg("-c")
            .arg(format!("tessedit_char_whitelist={}", self.char_whitelist))
            .arg("-c")
            .arg("preserve_interword_spaces=1")
            .arg("tsv")
            .output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("Tesseract failed: {}", stderr));
        }

        let tsv_path = format!("{}.tsv", output_base);
        let tsv_content = std::fs::read_to_string(&tsv_path)
            .map_err(|e| anyhow!("Failed to read Tesseract output: {}", e))?;
        let _ = std::fs::remove_file(&tsv_path);

        let detections = parse_tsv_detections(&tsv_content, self.width_ths);
        let mean_confidence = detections.iter().map(|d| d.confidence).sum::<f32>()
            / detections.len().max(1) as f32;
        crate::log(&format!(
            "Tesseract returned {} detections ({}x{} image, mean confidence {:.2})",
            detections.len(),
            img.width(),
            img.height(),
            mean_confidence
        ));
        Ok(detections)
    }
}

/// Parses Tesseract TSV output into line-level detections.
///
/// Words on the same Tesseract line are merged left to right while the gap
/// between them is at most `width_ths` times the taller word's height. This
/// keeps "7: Alice" together while splitting text that belongs to
/// neighbouring scoreboard columns.
pub fn parse_tsv_detections(tsv: &str, width_ths: f32) -> Vec<Detection> {
    let mut lines: Vec<((i32, i32, i32, i32), Vec<TsvWord>)> = Vec::new();

    for line in tsv.lines().skip(1) {
        // Skip header
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 12 {
            continue;
        }

        // TSV fields: level, page_num, block_num, par_num, line_num, word_num,
        //             left, top, width, height, conf, text
        let level: i32 = fields[0].parse().unwrap_or(-1);
        if level != 5 {
            continue;
        }

        let text = fields[11].trim();
        let conf: f32 = fields[10].parse().unwrap_or(-1.0);
        if text.is_empty() || conf < 0.0 {
            continue;
        }

        let key = (
            fields[1].parse().unwrap_or(-1),
            fields[2].parse().unwrap_or(-1),
            fields[3].parse().unwrap_or(-1),
            fields[4].parse().unwrap_or(-1),
        );
        let word = TsvWord {
            left: fields[6].parse().unwrap_or(0),
            top: fields[7].parse().unwrap_or(0),
            width: fields[8].parse().unwrap_or(0),
            height: fields[9].parse().unwrap_or(0),
            confidence: conf,
            text: text.to_string(),
        };

        match lines.iter_mut().find(|(k, _)| *k == key) {
            Some((_, words)) => words.push(word),
            None => lines.push((key, vec![word])),
        }
    }

    let mut detections = Vec::new();
    for (_, mut words) in lines {
        words.sort_by_key(|w| w.left);

        let mut group: Vec<TsvWord> = Vec::new();
        for word in words {
            if let Some(last) = group.last() {
                let gap = (word.left - last.right()) as f32;
                let height = last.height.max(word.height) as f32;
                if gap > width_ths * height {
                    detections.push(merge_words(&group));
                    group.clear();
                }
            }
            group.push(word);
        }
        if !group.is_empty() {
            detections.push(merge_words(&group));
        }
    }

    detections
}

/// Union box, space-joined text, mean confidence scaled to 0.0..1.0.
fn merge_words(words: &[TsvWord]) -> Detection {
    let left = words.iter().map(|w| w.left).min().unwrap_or(0);
    let top = words.iter().map(|w| w.top).min().unwrap_or(0);
    let right = words.iter().map(|w| w.right()).max().unwrap_or(left);
    let bottom = words.iter().map(|w| w.bottom()).max().unwrap_or(top);

    let text = words
        .iter()
        .map(|w| w.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let confidence =
        words.iter().map(|w| w.confidence).sum::<f32>() / words.len().max(1) as f32 / 100.0;

    Detection::new(
        Quad::from_rect(left, top, right - left, bottom - top),
        text,
        confidence,
    )
}
