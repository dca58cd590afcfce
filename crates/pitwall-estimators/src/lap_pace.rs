//! Smoothed per-car lap pace.
//!
//! Each car keeps its last few completed lap times. Pace is the median of that
//! window after dropping laps far from the mean, so a single spin, pit lap or
//! tow lap does not drag the figure around.

use pitwall_telemetry::{BoundaryReset, SessionBoundary, SessionIdentity, ZeroIdPolicy};
use tracing::{debug, info};

use crate::history::{BoundedHistory, DEFAULT_HISTORY_WINDOW};
use crate::stats::{DEFAULT_OUTLIER_THRESHOLD, robust_pace};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LapPaceConfig {
    pub history_window: usize,
    pub outlier_threshold: f64,
}

impl Default for LapPaceConfig {
    fn default() -> Self {
        Self {
            history_window: DEFAULT_HISTORY_WINDOW,
            outlier_threshold: DEFAULT_OUTLIER_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LapPaceEstimator {
    config: LapPaceConfig,
    histories: Vec<BoundedHistory>,
    /// Last reported lap time per car. `None` until the first frame.
    last_reported: Option<Vec<f64>>,
    pace: Vec<f64>,
    version: u64,
    boundary: SessionBoundary,
}

impl LapPaceEstimator {
    pub fn new(config: LapPaceConfig) -> Self {
        Self {
            config,
            histories: Vec::new(),
            last_reported: None,
            pace: Vec::new(),
            version: 0,
            boundary: SessionBoundary::new(ZeroIdPolicy::ResetOnAnyChange),
        }
    }

    /// Feed one frame of `CarIdxLastLapTime`. Returns whether any history changed.
    pub fn update(&mut self, lap_times: &[f64]) -> bool {
        if lap_times.is_empty() {
            self.pace.clear();
            return false;
        }

        let window = self.config.history_window;
        let previous = self.last_reported.take();
        let mut changed = false;
        match previous.as_deref() {
            None => {
                self.histories = lap_times
                    .iter()
                    .map(|&lap| {
                        let mut history = BoundedHistory::new(window);
                        if lap > 0.0 {
                            history.push(lap);
                            changed = true;
                        }
                        history
                    })
                    .collect();
            }
            Some(previous) if previous.len() == lap_times.len() => {
                for (car, (&lap, &prev)) in lap_times.iter().zip(previous).enumerate() {
                    if lap > 0.0 && lap.total_cmp(&prev).is_ne() {
                        if let Some(history) = self.history_slot(car) {
                            history.push(lap);
                            changed = true;
                        }
                    }
                }
            }
            Some(previous) => {
                debug!(
                    previous = previous.len(),
                    current = lap_times.len(),
                    "Car count changed; taking frame as new lap time baseline"
                );
                if self.histories.len() < lap_times.len() {
                    self.histories
                        .resize_with(lap_times.len(), || BoundedHistory::new(window));
                }
            }
        }

        self.last_reported = Some(lap_times.to_vec());
        if changed {
            self.version = self.version.wrapping_add(1);
        }
        if changed || self.pace.len() != self.histories.len() {
            self.recompute_pace();
        }
        changed
    }

    /// Like [`update`](Self::update), resetting first when the session number moved.
    ///
    /// A frame that triggers the reset is not otherwise processed; the next one seeds.
    pub fn update_with_session(&mut self, lap_times: &[f64], session_num: Option<i32>) -> bool {
        if let Some(num) = session_num
            && self
                .observe_session(SessionIdentity::from_session_num(num))
                .is_some()
        {
            return false;
        }
        self.update(lap_times)
    }

    /// Check `identity` against the last observation and clear everything on a boundary.
    pub fn observe_session(&mut self, identity: SessionIdentity) -> Option<BoundaryReset> {
        let reset = self.boundary.observe(identity)?;
        info!(reason = %reset, "Resetting lap time history");
        self.clear_cars();
        Some(reset)
    }

    fn history_slot(&mut self, car: usize) -> Option<&mut BoundedHistory> {
        let window = self.config.history_window;
        if car >= self.histories.len() {
            self.histories
                .resize_with(car + 1, || BoundedHistory::new(window));
        }
        self.histories.get_mut(car)
    }

    fn recompute_pace(&mut self) {
        let threshold = self.config.outlier_threshold;
        self.pace = self
            .histories
            .iter()
            .map(|history| robust_pace(&history.to_vec(), threshold))
            .collect();
    }

    /// Pace for `car` in seconds, 0 when unknown.
    pub fn pace(&self, car: usize) -> f64 {
        self.pace.get(car).copied().unwrap_or(0.0)
    }

    pub fn paces(&self) -> &[f64] {
        &self.pace
    }

    pub fn history(&self, car: usize) -> Option<&BoundedHistory> {
        self.histories.get(car)
    }

    /// Every car's window, oldest lap first.
    pub fn histories(&self) -> Vec<Vec<f64>> {
        self.histories.iter().map(BoundedHistory::to_vec).collect()
    }

    /// Bumped whenever any car's history changes. Equal versions mean equal histories.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Pace if known, else the class estimate if positive.
    pub fn average_lap_time(&self, car: usize, class_estimate: Option<f64>) -> Option<f64> {
        let pace = self.pace(car);
        if pace > 0.0 {
            return Some(pace);
        }
        class_estimate.filter(|estimate| *estimate > 0.0)
    }

    fn clear_cars(&mut self) {
        self.histories.clear();
        self.last_reported = None;
        self.pace.clear();
        self.version = self.version.wrapping_add(1);
    }

    /// Forget all cars and the session identity.
    pub fn reset(&mut self) {
        self.clear_cars();
        self.boundary.reset();
    }
}

impl Default for LapPaceEstimator {
    fn default() -> Self {
        Self::new(LapPaceConfig::default())
    }
}
