//! Per-driver lap time statistics.
//!
//! Calculates best, worst, mean, median, standard deviation and quartiles of
//! each driver's laps within a heat. All times are in seconds.

use serde::Serialize;

use crate::table::LapRecord;

/// Statistics for one driver in one heat.
#[derive(Debug, Clone, Serialize)]
pub struct LapSummary {
    pub heat: String,
    pub driver: String,
    pub kart: String,
    /// Number of laps
    pub laps: usize,
    /// Fastest lap
    pub best: f64,
    /// Slowest lap
    pub worst: f64,
    /// Arithmetic mean
    pub mean: f64,
    /// Median (middle value)
    pub median: f64,
    /// Standard deviation (population)
    pub std_dev: f64,
    /// First quartile (25th percentile)
    pub quartile_1: f64,
    /// Third quartile (75th percentile)
    pub quartile_3: f64,
}

/// Summarizes records per (heat, driver, kart), in order of first appearance.
pub fn summarize(records: &[LapRecord]) -> Vec<LapSummary> {
    let mut groups: Vec<(&LapRecord, Vec<f64>)> = Vec::new();

    for record in records {
        let existing = groups.iter_mut().find(|(first, _)| {
            first.heat == record.heat && first.driver == record.driver && first.kart == record.kart
        });
        match existing {
            Some((_, times)) => times.push(record.time.as_secs_f64()),
            None => groups.push((record, vec![record.time.as_secs_f64()])),
        }
    }

    groups
        .into_iter()
        .map(|(first, times)| calculate_summary(first, &times))
        .collect()
}

fn calculate_summary(first: &LapRecord, values: &[f64]) -> LapSummary {
    let count = values.len();

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mean = values.iter().sum::<f64>() / count as f64;

    // Standard deviation (population formula)
    let variance = values
        .iter()
        .map(|v| {
            let diff = v - mean;
            diff * diff
        })
        .sum::<f64>()
        / count as f64;

    LapSummary {
        heat: first.heat.clone(),
        driver: first.driver.clone(),
        kart: first.kart.clone(),
        laps: count,
        best: sorted[0],
        worst: sorted[count - 1],
        mean,
        median: calculate_median(&sorted),
        std_dev: variance.sqrt(),
        quartile_1: calculate_percentile(&sorted, 25.0),
        quartile_3: calculate_percentile(&sorted, 75.0),
    }
}

/// Calculate median from sorted values.
fn calculate_median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n % 2 == 0 {
        let mid = n / 2;
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[n / 2]
    }
}

/// Calculate percentile using linear interpolation.
fn calculate_percentile(sorted: &[f64], percentile: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n == 1 {
        return sorted[0];
    }

    // Index in range [0, n-1]
    let index = (percentile / 100.0) * (n - 1) as f64;
    let lower_idx = index.floor() as usize;
    let upper_idx = index.ceil() as usize;

    let lower = sorted[lower_idx];
    let upper = sorted[upper_idx];
    lower + (upper - lower) * index.fract()
}
