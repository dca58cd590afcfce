//! Composition root owning every estimator.
//!
//! The [`Engine`] is the only place estimator state is mutated. Bridges write
//! into the handles from [`Engine::handles`]; [`Engine::tick`] folds whatever
//! is newest into the estimators and publishes a [`MetricsSnapshot`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use anyhow::Context;
use pitwall_estimators::{LapPaceEstimator, PitLapTracker, SpeedEstimator};
use pitwall_pitlane::{JsonFilePitLaneStore, PitLaneCalibrator, PitLanePersistence};
use pitwall_telemetry::channels::{
    CAR_IDX_LAP, CAR_IDX_LAP_DIST_PCT, CAR_IDX_LAST_LAP_TIME, CAR_IDX_ON_PIT_ROAD,
    CAR_IDX_TRACK_SURFACE, SESSION_NUM, SESSION_STATE, SESSION_TIME, SESSION_UNIQUE_ID,
};
use pitwall_telemetry::{
    LatestSlot, RawTelemetrySample, SessionIdentity, SessionInfo, SessionState, TelemetryIngest,
};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::PulseError;
use crate::config::PulseConfig;
use crate::snapshot::MetricsSnapshot;

/// Last-value-wins inbox for session metadata.
#[derive(Clone, Default)]
pub struct SessionInbox {
    slot: Arc<LatestSlot<SessionInfo>>,
}

impl SessionInbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, info: SessionInfo) -> u64 {
        self.slot.publish(info)
    }

    pub fn latest(&self) -> Option<Arc<SessionInfo>> {
        self.slot.latest()
    }

    fn take_fresh(&self) -> Option<Arc<SessionInfo>> {
        self.slot.consume_fresh().map(|(_, info)| info)
    }

    fn clear(&self) {
        self.slot.clear();
    }
}

impl std::fmt::Debug for SessionInbox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionInbox")
            .field("sequence", &self.slot.sequence())
            .finish()
    }
}

/// Whether the simulator is running, as reported by the bridge.
///
/// Every running→stopped edge is counted; the engine resets once per edge on
/// its next tick.
#[derive(Debug, Default)]
pub struct SimRunning {
    running: AtomicBool,
    disconnects: AtomicU64,
}

impl SimRunning {
    pub fn set(&self, running: bool) {
        let was_running = self.running.swap(running, Ordering::AcqRel);
        if was_running && !running {
            self.disconnects.fetch_add(1, Ordering::AcqRel);
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn disconnects(&self) -> u64 {
        self.disconnects.load(Ordering::Acquire)
    }
}

/// Producer-side handles. Cheap to clone and usable from any thread.
#[derive(Debug, Clone)]
pub struct EngineHandles {
    pub ingest: TelemetryIngest,
    pub sessions: SessionInbox,
    pub running: Arc<SimRunning>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No sample has arrived yet.
    Idle,
    Processed,
    /// The simulator stopped; every store was cleared.
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PulseStats {
    pub processed_ticks: u64,
    pub idle_ticks: u64,
    pub resets: u64,
    pub skipped_lap_pace: u64,
    pub skipped_speed: u64,
    pub skipped_pit_laps: u64,
    pub skipped_pit_lane: u64,
    /// Raw samples replaced before any tick read them.
    pub overwritten_samples: u64,
}

pub struct Engine {
    config: PulseConfig,
    ingest: TelemetryIngest,
    sessions: SessionInbox,
    running: Arc<SimRunning>,
    seen_disconnects: u64,
    session_info: Option<Arc<SessionInfo>>,
    track_length_m: f64,
    lap_pace: LapPaceEstimator,
    speed: SpeedEstimator,
    pit_laps: PitLapTracker,
    calibrator: PitLaneCalibrator,
    lap_history: Arc<Vec<Vec<f64>>>,
    lap_history_version: Option<u64>,
    tick: u64,
    stats: PulseStats,
    snapshot_tx: watch::Sender<Arc<MetricsSnapshot>>,
    throttled_tx: watch::Sender<Option<Arc<RawTelemetrySample>>>,
}

impl Engine {
    /// Engine without calibration persistence.
    pub fn new(config: PulseConfig) -> Result<Self, PulseError> {
        config.validate()?;
        let calibrator = PitLaneCalibrator::new(config.calibrator());
        Ok(Self::build(config, calibrator))
    }

    pub fn with_persistence(
        config: PulseConfig,
        persistence: Arc<dyn PitLanePersistence>,
    ) -> Result<Self, PulseError> {
        config.validate()?;
        let calibrator = PitLaneCalibrator::with_persistence(config.calibrator(), persistence);
        Ok(Self::build(config, calibrator))
    }

    /// Engine backed by the JSON file named in `pit_lane_data_file`, if any.
    pub fn from_config(config: PulseConfig) -> anyhow::Result<Self> {
        config.validate().context("Invalid pulse config")?;
        let engine = match config.pit_lane_data_file.clone() {
            Some(path) => {
                info!(path = ?path, "Using pit lane data file");
                let store = Arc::new(JsonFilePitLaneStore::new(path));
                Self::with_persistence(config, store)?
            }
            None => Self::new(config)?,
        };
        Ok(engine)
    }

    fn build(config: PulseConfig, calibrator: PitLaneCalibrator) -> Self {
        let (snapshot_tx, _) = watch::channel(Arc::new(MetricsSnapshot::default()));
        let (throttled_tx, _) = watch::channel(None);
        Self {
            lap_pace: LapPaceEstimator::new(config.lap_pace()),
            speed: SpeedEstimator::new(config.history_window),
            pit_laps: PitLapTracker::new(config.pit_lap()),
            config,
            ingest: TelemetryIngest::new(),
            sessions: SessionInbox::new(),
            running: Arc::new(SimRunning::default()),
            seen_disconnects: 0,
            session_info: None,
            track_length_m: 0.0,
            calibrator,
            lap_history: Arc::new(Vec::new()),
            lap_history_version: None,
            tick: 0,
            stats: PulseStats::default(),
            snapshot_tx,
            throttled_tx,
        }
    }

    pub fn config(&self) -> &PulseConfig {
        &self.config
    }

    pub fn handles(&self) -> EngineHandles {
        EngineHandles {
            ingest: self.ingest.clone(),
            sessions: self.sessions.clone(),
            running: Arc::clone(&self.running),
        }
    }

    pub fn ingest(&self) -> &TelemetryIngest {
        &self.ingest
    }

    pub fn sessions(&self) -> &SessionInbox {
        &self.sessions
    }

    pub fn set_sim_running(&self, running: bool) {
        self.running.set(running);
    }

    pub fn snapshots(&self) -> watch::Receiver<Arc<MetricsSnapshot>> {
        self.snapshot_tx.subscribe()
    }

    /// The raw sample each tick processed, for consumers that only need 10 Hz data.
    pub fn throttled(&self) -> watch::Receiver<Option<Arc<RawTelemetrySample>>> {
        self.throttled_tx.subscribe()
    }

    pub fn latest_snapshot(&self) -> Arc<MetricsSnapshot> {
        Arc::clone(&self.snapshot_tx.borrow())
    }

    pub fn stats(&self) -> PulseStats {
        PulseStats {
            overwritten_samples: self.ingest.stats().overwritten_count,
            ..self.stats
        }
    }

    pub fn lap_pace(&self) -> &LapPaceEstimator {
        &self.lap_pace
    }

    pub fn speed(&self) -> &SpeedEstimator {
        &self.speed
    }

    pub fn pit_laps(&self) -> &PitLapTracker {
        &self.pit_laps
    }

    pub fn calibrator(&self) -> &PitLaneCalibrator {
        &self.calibrator
    }

    /// Run one pulse step over the newest sample.
    pub fn tick(&mut self) -> TickOutcome {
        let disconnects = self.running.disconnects();
        if disconnects != self.seen_disconnects {
            self.seen_disconnects = disconnects;
            self.reset_all();
            return TickOutcome::Reset;
        }

        if let Some(info) = self.sessions.take_fresh() {
            self.apply_session_info(info);
        }

        let Some((sequence, sample)) = self.ingest.slot().consume() else {
            self.stats.idle_ticks = self.stats.idle_ticks.saturating_add(1);
            return TickOutcome::Idle;
        };
        self.throttled_tx.send_replace(Some(Arc::clone(&sample)));

        if self.observe_session(&sample) {
            debug!("Session boundary frame only reseeds lap pace");
        } else {
            self.update_lap_pace(&sample);
        }
        self.update_speed(&sample);
        self.update_pit_laps(&sample);
        self.update_pit_lane(&sample);

        self.tick = self.tick.saturating_add(1);
        self.stats.processed_ticks = self.stats.processed_ticks.saturating_add(1);
        self.publish_snapshot(sequence);
        TickOutcome::Processed
    }

    fn apply_session_info(&mut self, info: Arc<SessionInfo>) {
        if self.calibrator.track_id() != info.track_id.as_deref() {
            info!(track_id = ?info.track_id, "Track changed");
        }
        self.calibrator.set_track(info.track_id.as_deref());

        self.track_length_m = match info.track_length_m() {
            Some(Ok(length)) => length,
            Some(Err(e)) => {
                warn!(error = %e, "Ignoring unparseable track length");
                0.0
            }
            None => 0.0,
        };
        self.session_info = Some(info);
    }

    /// Returns whether the lap pace and speed windows were cleared.
    fn observe_session(&mut self, sample: &RawTelemetrySample) -> bool {
        let identity = SessionIdentity {
            unique_id: sample.scalar_i32(SESSION_UNIQUE_ID),
            session_num: sample.scalar_i32(SESSION_NUM),
            session_time: sample.scalar_f64(SESSION_TIME),
        };
        self.calibrator.observe_session(identity);
        if self.lap_pace.observe_session(identity).is_some() {
            self.speed.reset();
            return true;
        }
        false
    }

    fn update_lap_pace(&mut self, sample: &RawTelemetrySample) {
        match sample.floats(CAR_IDX_LAST_LAP_TIME) {
            Some(lap_times) => {
                self.lap_pace.update(&lap_times);
            }
            None => {
                debug!(channel = CAR_IDX_LAST_LAP_TIME, "Skipping lap pace update");
                self.stats.skipped_lap_pace = self.stats.skipped_lap_pace.saturating_add(1);
            }
        }
    }

    fn update_speed(&mut self, sample: &RawTelemetrySample) {
        let positions = sample.floats(CAR_IDX_LAP_DIST_PCT);
        let session_time = sample.scalar_f64(SESSION_TIME);
        match (positions, session_time) {
            (Some(positions), Some(session_time)) => {
                self.speed
                    .update(&positions, self.track_length_m, session_time);
            }
            _ => {
                debug!("Skipping speed update");
                self.stats.skipped_speed = self.stats.skipped_speed.saturating_add(1);
            }
        }
    }

    fn update_pit_laps(&mut self, sample: &RawTelemetrySample) {
        let channels = (
            sample.bools(CAR_IDX_ON_PIT_ROAD),
            sample.ints(CAR_IDX_LAP),
            sample.scalar_i32(SESSION_UNIQUE_ID),
            sample.scalar_f64(SESSION_TIME),
            sample.ints(CAR_IDX_TRACK_SURFACE),
            sample.scalar_i32(SESSION_STATE),
        );
        let (
            Some(on_pit_road),
            Some(lap),
            Some(session_id),
            Some(session_time),
            Some(surface),
            Some(state),
        ) = channels
        else {
            debug!("Skipping pit lap update");
            self.stats.skipped_pit_laps = self.stats.skipped_pit_laps.saturating_add(1);
            return;
        };
        self.pit_laps.update(
            &on_pit_road,
            &lap,
            session_id,
            session_time.floor(),
            &surface,
            SessionState::from(state),
        );
    }

    fn update_pit_lane(&mut self, sample: &RawTelemetrySample) {
        let channels = (
            sample.bools(CAR_IDX_ON_PIT_ROAD),
            sample.ints(CAR_IDX_TRACK_SURFACE),
            sample.floats(CAR_IDX_LAP_DIST_PCT),
        );
        let (Some(on_pit_road), Some(surface), Some(position)) = channels else {
            debug!("Skipping pit lane detection");
            self.stats.skipped_pit_lane = self.stats.skipped_pit_lane.saturating_add(1);
            return;
        };
        if self.calibrator.track_id().is_none() {
            self.stats.skipped_pit_lane = self.stats.skipped_pit_lane.saturating_add(1);
            return;
        }
        self.calibrator
            .detect_transitions(&on_pit_road, &surface, &position);
    }

    fn publish_snapshot(&mut self, sample_sequence: u64) {
        let version = self.lap_pace.version();
        if self.lap_history_version != Some(version) {
            self.lap_history = Arc::new(self.lap_pace.histories());
            self.lap_history_version = Some(version);
        }

        let class_estimates = self
            .session_info
            .as_ref()
            .map_or(0, |info| info.class_est_lap_times.len());
        let cars = self.lap_pace.paces().len().max(class_estimates);
        let average_lap_times = (0..cars)
            .map(|car| {
                let estimate = self
                    .session_info
                    .as_ref()
                    .and_then(|info| info.class_est_lap_time(car));
                self.lap_pace.average_lap_time(car, estimate)
            })
            .collect();

        let snapshot = MetricsSnapshot {
            tick: self.tick,
            sample_sequence,
            lap_pace: self.lap_pace.paces().to_vec(),
            lap_history: Arc::clone(&self.lap_history),
            lap_history_version: version,
            average_lap_times,
            speeds: self.speed.speeds().to_vec(),
            track_id: self.calibrator.track_id().map(str::to_string),
            pit_entry_pct: self.calibrator.pit_entry_pct(),
            pit_exit_pct: self.calibrator.pit_exit_pct(),
            pit_laps: self.pit_laps.records().to_vec(),
            pit_stop_durations: self.pit_laps.pit_stop_durations(),
        };
        self.snapshot_tx.send_replace(Arc::new(snapshot));
    }

    /// Clear every store, as on a simulator disconnect.
    pub fn reset_all(&mut self) {
        info!("Simulator stopped, resetting all telemetry state");
        self.ingest.clear();
        self.sessions.clear();
        self.session_info = None;
        self.track_length_m = 0.0;
        self.lap_pace.reset();
        self.speed.reset();
        self.pit_laps.reset();
        self.calibrator.reset();
        self.lap_history = Arc::new(Vec::new());
        self.lap_history_version = None;
        self.stats.resets = self.stats.resets.saturating_add(1);
        self.throttled_tx.send_replace(None);
        self.snapshot_tx.send_replace(Arc::new(MetricsSnapshot {
            tick: self.tick,
            ..MetricsSnapshot::default()
        }));
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("tick", &self.tick)
            .field("track_id", &self.calibrator.track_id())
            .field("track_length_m", &self.track_length_m)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
