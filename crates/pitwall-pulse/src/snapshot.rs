//! Immutable per-tick views for display consumers.

use std::sync::Arc;

use pitwall_estimators::PitLapRecord;
use serde::Serialize;

/// Everything the estimators know after one tick.
///
/// Built whole and published through a watch channel, so a reader never sees
/// one estimator's output from a different tick than another's.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    /// Processed tick count since the engine started. 0 before the first sample.
    pub tick: u64,
    /// Ingest sequence number of the sample this snapshot was computed from.
    pub sample_sequence: u64,
    pub lap_pace: Vec<f64>,
    /// Shared with the previous snapshot while `lap_history_version` is unchanged.
    pub lap_history: Arc<Vec<Vec<f64>>>,
    pub lap_history_version: u64,
    /// Pace, falling back to the class estimate when no lap has been timed.
    pub average_lap_times: Vec<Option<f64>>,
    pub speeds: Vec<f64>,
    pub track_id: Option<String>,
    pub pit_entry_pct: Option<f64>,
    pub pit_exit_pct: Option<f64>,
    pub pit_laps: Vec<PitLapRecord>,
    pub pit_stop_durations: Vec<Option<f64>>,
}

impl MetricsSnapshot {
    pub fn car_count(&self) -> usize {
        self.lap_pace
            .len()
            .max(self.speeds.len())
            .max(self.pit_laps.len())
    }

    pub fn pace(&self, car: usize) -> f64 {
        self.lap_pace.get(car).copied().unwrap_or(0.0)
    }

    pub fn speed(&self, car: usize) -> f64 {
        self.speeds.get(car).copied().unwrap_or(0.0)
    }

    pub fn lap_history(&self, car: usize) -> &[f64] {
        self.lap_history.get(car).map_or(&[], Vec::as_slice)
    }

    pub fn pit_lap(&self, car: usize) -> Option<i32> {
        self.pit_laps.get(car).and_then(|record| record.pit_lap)
    }
}
