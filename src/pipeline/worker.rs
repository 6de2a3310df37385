//! Batch workers for reading several heats concurrently.
//!
//! Every worker owns its own detection source and pulls heats from a shared
//! queue. Heats are independent; a failing heat is reported in its outcome
//! and does not stop the others.

use anyhow::{anyhow, Result};
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Mutex;
use std::thread;

use super::{create_work_queue, HeatWorkItem};
use super::read_heat;
use crate::config::ScoreboardConfig;
use crate::ocr::DetectionSource;
use crate::table::HeatTable;

/// Result of reading one heat.
#[derive(Debug)]
pub struct HeatOutcome {
    pub index: usize,
    pub heat: String,
    pub image_path: PathBuf,
    pub result: Result<HeatTable>,
}

/// Runs one worker loop.
///
/// Processes items until the queue is closed and empty. Blocks, so it should
/// be run on a dedicated thread.
pub fn run_heat_worker<S: DetectionSource>(
    worker_id: usize,
    receiver: &Mutex<Receiver<HeatWorkItem>>,
    mut source: S,
    config: &ScoreboardConfig,
    results: Sender<HeatOutcome>,
) {
    crate::log(&format!("Heat worker {} started", worker_id));

    loop {
        let next = match receiver.lock() {
            Ok(guard) => guard.recv(),
            Err(_) => {
                crate::log(&format!("Heat worker {}: queue lock poisoned, exiting", worker_id));
                break;
            }
        };

        let Ok(item) = next else {
            // Channel closed, all heats handed out
            break;
        };

        crate::log(&format!(
            "Heat worker {}: reading {} ({}), queued at {}",
            worker_id,
            item.heat,
            item.image_path.display(),
            item.queued_at.format("%H:%M:%S")
        ));

        let result = read_heat(&mut source, &item.image_path, &item.heat, config);
        if let Err(e) = &result {
            crate::log(&format!(
                "Heat worker {}: {} failed: {:#}",
                worker_id, item.heat, e
            ));
        }

        let outcome = HeatOutcome {
            index: item.index,
            heat: item.heat,
            image_path: item.image_path,
            result,
        };
        if results.send(outcome).is_err() {
            crate::log(&format!("Heat worker {}: result channel closed", worker_id));
            break;
        }
    }

    crate::log(&format!("Heat worker {} finished", worker_id));
}

/// Reads every `(heat, image)` pair using up to `workers` threads.
///
/// `make_source` is called once per worker before any thread starts, so a
/// source that cannot be created fails the batch up front. Outcomes are
/// returned in input order.
pub fn run_batch<S, F>(
    heats: Vec<(String, PathBuf)>,
    config: &ScoreboardConfig,
    workers: usize,
    mut make_source: F,
) -> Result<Vec<HeatOutcome>>
where
    S: DetectionSource + Send,
    F: FnMut() -> Result<S>,
{
    let total = heats.len();
    let workers = workers.clamp(1, total.max(1));

    let sources = (0..workers)
        .map(|_| make_source())
        .collect::<Result<Vec<S>>>()?;

    let (sender, receiver) = create_work_queue();
    for (index, (heat, image_path)) in heats.into_iter().enumerate() {
        sender
            .send(HeatWorkItem::new(index, heat, image_path))
            .map_err(|_| anyhow!("Heat queue closed unexpectedly"))?;
    }
    drop(sender);

    let receiver = Mutex::new(receiver);
    let (result_tx, result_rx) = channel();

    thread::scope(|scope| {
        for (worker_id, source) in sources.into_iter().enumerate() {
            let receiver = &receiver;
            let result_tx = result_tx.clone();
            scope.spawn(move || run_heat_worker(worker_id, receiver, source, config, result_tx));
        }
    });
    drop(result_tx);

    let mut outcomes: Vec<HeatOutcome> = result_rx.into_iter().collect();
    outcomes.sort_by_key(|o| o.index);

    if outcomes.len() != total {
        return Err(anyhow!(
            "Only {} of {} heats were processed",
            outcomes.len(),
            total
        ));
    }

    Ok(outcomes)
}
