//! Work queue for passing heats to the batch workers.
//!
//! Uses std::sync::mpsc. The batch runner queues every heat up front and
//! drops the sender; workers drain the queue until it closes.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Local};
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};

/// A heat waiting to be read.
#[derive(Debug, Clone)]
pub struct HeatWorkItem {
    /// Position in the batch, used to restore input order
    pub index: usize,
    /// Heat label supplied by the caller
    pub heat: String,
    /// Path to the scoreboard image
    pub image_path: PathBuf,
    /// When the item was queued
    pub queued_at: DateTime<Local>,
}

impl HeatWorkItem {
    pub fn new(index: usize, heat: impl Into<String>, image_path: PathBuf) -> Self {
        Self {
            index,
            heat: heat.into(),
            image_path,
            queued_at: Local::now(),
        }
    }
}

/// Creates a new work queue.
///
/// The channel is unbounded; the whole batch is queued before workers start.
pub fn create_work_queue() -> (Sender<HeatWorkItem>, Receiver<HeatWorkItem>) {
    channel()
}

/// Parses a `HEAT=IMAGE` command line argument.
pub fn parse_heat_arg(arg: &str) -> Result<(String, PathBuf)> {
    let (heat, image) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("Expected HEAT=IMAGE, got '{}'", arg))?;

    let heat = heat.trim();
    let image = image.trim();
    if heat.is_empty() || image.is_empty() {
        return Err(anyhow!("Expected HEAT=IMAGE, got '{}'", arg));
    }

    Ok((heat.to_string(), PathBuf::from(image)))
}
