pub mod engine;
pub mod setup;

pub use engine::TesseractEngine;
pub use setup::ensure_tesseract;

use anyhow::Result;
use image::DynamicImage;

/// A pixel position in image coordinates (origin top-left, y grows downwards).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// Quadrilateral bounding box, corners clockwise from top-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quad(pub [Point; 4]);

impl Quad {
    /// Builds an axis-aligned box from a left/top corner and its size.
    pub fn from_rect(left: i32, top: i32, width: i32, height: i32) -> Self {
        let right = left + width;
        let bottom = top + height;
        Quad([
            Point { x: left, y: top },
            Point { x: right, y: top },
            Point { x: right, y: bottom },
            Point { x: left, y: bottom },
        ])
    }

    pub fn top_left(&self) -> Point {
        self.0[0]
    }
}

/// One piece of recognized text with its box and engine confidence (0.0 to 1.0).
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub bbox: Quad,
    pub text: String,
    pub confidence: f32,
}

impl Detection {
    pub fn new(bbox: Quad, text: impl Into<String>, confidence: f32) -> Self {
        Self {
            bbox,
            text: text.into(),
            confidence,
        }
    }
}

/// Anything that turns a scoreboard image into raw text detections.
///
/// The engine is owned by the caller and passed into the pipeline, so a
/// batch can give every worker its own instance and tests can use a fake.
pub trait DetectionSource {
    /// Returns the detections found in `img`, in no particular order.
    fn detect(&mut self, img: &DynamicImage) -> Result<Vec<Detection>>;
}
