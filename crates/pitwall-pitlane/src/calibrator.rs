//! Pit entry/exit detection from frame-over-frame pit-road transitions.
//!
//! A car crossing the pit entry line flips `CarIdxOnPitRoad` false→true; one
//! crossing the exit line flips it back. The first such crossing per track is
//! recorded and never overwritten. A car pulling out of its pit stall also flips
//! the flag false→true, which is why entries with a previous surface of
//! `InPitStall` are rejected.

use std::sync::Arc;

use pitwall_telemetry::{BoundaryReset, SessionBoundary, SessionIdentity, TrackSurface};
use tokio::sync::oneshot;
use tracing::{Instrument, debug, info, warn};

use crate::calibration::{PitLaneCalibration, PitLaneUpdate};
use crate::error::PitLaneResult;
use crate::persistence::PitLanePersistence;

/// Entries where both candidate and current position sit below this fraction are
/// assumed to have wrapped past the line between samples.
pub const DEFAULT_PIT_ENTRY_WRAP_GUARD: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibratorConfig {
    pub wrap_guard: f64,
}

impl Default for CalibratorConfig {
    fn default() -> Self {
        Self {
            wrap_guard: DEFAULT_PIT_ENTRY_WRAP_GUARD,
        }
    }
}

#[derive(Debug, Clone)]
struct TransitionFrame {
    on_pit_road: Vec<bool>,
    track_surface: Vec<i32>,
    position: Vec<f64>,
}

type LoadResult = PitLaneResult<Option<PitLaneCalibration>>;

pub struct PitLaneCalibrator {
    config: CalibratorConfig,
    persistence: Option<Arc<dyn PitLanePersistence>>,
    track_id: Option<String>,
    calibration: PitLaneCalibration,
    previous: Option<TransitionFrame>,
    loading: Option<oneshot::Receiver<LoadResult>>,
    boundary: SessionBoundary,
}

impl PitLaneCalibrator {
    pub fn new(config: CalibratorConfig) -> Self {
        Self {
            config,
            persistence: None,
            track_id: None,
            calibration: PitLaneCalibration::default(),
            previous: None,
            loading: None,
            boundary: SessionBoundary::default(),
        }
    }

    pub fn with_persistence(config: CalibratorConfig, persistence: Arc<dyn PitLanePersistence>) -> Self {
        Self {
            persistence: Some(persistence),
            ..Self::new(config)
        }
    }

    /// Switch to `track_id`. `None` resets the calibrator and makes detection inert.
    ///
    /// A new track drops baselines and in-memory values, then starts loading the
    /// persisted calibration. Nothing is recorded until that load completes.
    pub fn set_track(&mut self, track_id: Option<&str>) {
        let Some(track_id) = track_id else {
            if self.track_id.is_some() {
                info!("Track cleared; resetting pit lane calibration");
            }
            self.reset();
            return;
        };
        if self.track_id.as_deref() == Some(track_id) {
            return;
        }

        info!(track_id, "Track changed; loading pit lane data");
        self.track_id = Some(track_id.to_string());
        self.calibration = PitLaneCalibration::default();
        self.previous = None;
        self.loading = self.spawn_load(track_id);
    }

    fn spawn_load(&self, track_id: &str) -> Option<oneshot::Receiver<LoadResult>> {
        let store = Arc::clone(self.persistence.as_ref()?);
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!(track_id, "No async runtime; skipping pit lane data load");
            return None;
        };

        let (tx, rx) = oneshot::channel();
        let track_id = track_id.to_string();
        handle.spawn(async move {
            let result = store.get_pit_lane_data(&track_id).await;
            if tx.send(result).is_err() {
                debug!(track_id, "Pit lane data load finished after track change");
            }
        }
        .in_current_span());
        Some(rx)
    }

    fn poll_load(&mut self) {
        let Some(rx) = self.loading.as_mut() else {
            return;
        };
        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(oneshot::error::TryRecvError::Empty) => return,
            Err(oneshot::error::TryRecvError::Closed) => {
                warn!("Pit lane data load was cancelled");
                Ok(None)
            }
        };
        self.loading = None;
        self.apply_loaded(result);
    }

    fn apply_loaded(&mut self, result: LoadResult) {
        match result {
            Ok(Some(calibration)) => {
                info!(
                    track_id = ?self.track_id,
                    entry = ?calibration.pit_entry_pct,
                    exit = ?calibration.pit_exit_pct,
                    "Loaded pit lane data"
                );
                self.calibration = calibration;
            }
            Ok(None) => {
                debug!(track_id = ?self.track_id, "No stored pit lane data");
                self.calibration = PitLaneCalibration::default();
            }
            Err(e) => {
                warn!(track_id = ?self.track_id, error = %e, "Failed to load pit lane data");
                self.calibration = PitLaneCalibration::default();
            }
        }
    }

    /// Wait for an in-flight load to finish.
    pub async fn finish_loading(&mut self) {
        if let Some(rx) = self.loading.take() {
            let result = rx.await.unwrap_or(Ok(None));
            self.apply_loaded(result);
        }
    }

    /// Compare this frame with the previous one and record first entry/exit crossings.
    ///
    /// Returns the fields newly recorded by this frame; they have also been
    /// handed to the persistence collaborator.
    pub fn detect_transitions(
        &mut self,
        on_pit_road: &[bool],
        track_surface: &[i32],
        position: &[f64],
    ) -> PitLaneUpdate {
        if self.track_id.is_none() {
            return PitLaneUpdate::default();
        }
        self.poll_load();

        let current = TransitionFrame {
            on_pit_road: on_pit_road.to_vec(),
            track_surface: track_surface.to_vec(),
            position: position.to_vec(),
        };
        let Some(previous) = self.previous.replace(current) else {
            return PitLaneUpdate::default();
        };
        if self.loading.is_some() || self.calibration.is_complete() {
            return PitLaneUpdate::default();
        }

        let mut recorded = PitLaneUpdate::default();
        for (car, &is_on_pit_road) in on_pit_road.iter().enumerate() {
            let Some(&current_pos) = position.get(car) else {
                continue;
            };
            if !current_pos.is_finite() || current_pos < 0.0 {
                continue;
            }
            let Some(&was_on_pit_road) = previous.on_pit_road.get(car) else {
                continue;
            };

            if !was_on_pit_road && is_on_pit_road && self.calibration.pit_entry_pct.is_none() {
                let previous_surface = previous
                    .track_surface
                    .get(car)
                    .map_or(TrackSurface::NotInWorld, |&code| TrackSurface::from(code));
                // Leaving the stall is not a lane entry.
                if previous_surface != TrackSurface::InPitStall {
                    let entry_pct = previous
                        .position
                        .get(car)
                        .copied()
                        .filter(|pos| pos.is_finite() && *pos >= 0.0)
                        .unwrap_or(current_pos);
                    let guard = self.config.wrap_guard;
                    if entry_pct < guard && current_pos < guard {
                        debug!(
                            car,
                            entry_pct, current_pos, "Pit entry near start/finish suppressed"
                        );
                    } else {
                        info!(car, entry_pct, "Pit entry detected");
                        self.calibration.pit_entry_pct = Some(entry_pct);
                        recorded.pit_entry_pct = Some(entry_pct);
                    }
                }
            }

            if was_on_pit_road && !is_on_pit_road && self.calibration.pit_exit_pct.is_none() {
                info!(car, exit_pct = current_pos, "Pit exit detected");
                self.calibration.pit_exit_pct = Some(current_pos);
                recorded.pit_exit_pct = Some(current_pos);
            }
        }

        if !recorded.is_empty() {
            self.save(recorded);
        }
        recorded
    }

    fn save(&self, update: PitLaneUpdate) {
        let (Some(store), Some(track_id)) = (self.persistence.as_ref(), self.track_id.clone()) else {
            return;
        };
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!(track_id, "No async runtime; pit lane data not saved");
            return;
        };

        let store = Arc::clone(store);
        handle.spawn(async move {
            if let Err(e) = store.update_pit_lane_data(&track_id, update).await {
                warn!(track_id, error = %e, "Failed to save pit lane data");
            }
        }
        .in_current_span());
    }

    /// Drop baselines when the session identity moves; calibration is kept.
    pub fn observe_session(&mut self, identity: SessionIdentity) -> Option<BoundaryReset> {
        let reset = self.boundary.observe(identity)?;
        debug!(reason = %reset, "Dropping pit lane baselines");
        self.previous = None;
        Some(reset)
    }

    /// Forget entry/exit for the current track so they are detected again.
    pub fn clear_calibration(&mut self) {
        info!(track_id = ?self.track_id, "Clearing pit lane calibration");
        self.calibration = PitLaneCalibration::default();
        self.previous = None;
    }

    pub fn reset(&mut self) {
        self.track_id = None;
        self.calibration = PitLaneCalibration::default();
        self.previous = None;
        self.loading = None;
        self.boundary.reset();
    }

    pub fn track_id(&self) -> Option<&str> {
        self.track_id.as_deref()
    }

    pub fn calibration(&self) -> PitLaneCalibration {
        self.calibration
    }

    pub fn pit_entry_pct(&self) -> Option<f64> {
        self.calibration.pit_entry_pct
    }

    pub fn pit_exit_pct(&self) -> Option<f64> {
        self.calibration.pit_exit_pct
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_some()
    }

    pub fn has_baseline(&self) -> bool {
        self.previous.is_some()
    }
}

impl Default for PitLaneCalibrator {
    fn default() -> Self {
        Self::new(CalibratorConfig::default())
    }
}

impl std::fmt::Debug for PitLaneCalibrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PitLaneCalibrator")
            .field("config", &self.config)
            .field("track_id", &self.track_id)
            .field("calibration", &self.calibration)
            .field("loading", &self.loading.is_some())
            .field("has_baseline", &self.previous.is_some())
            .finish()
    }
}
