//! Pit-lap bookkeeping and pit-stop timing per car.

use pitwall_telemetry::{
    BoundaryReset, SessionBoundary, SessionIdentity, SessionState, TrackSurface, ZeroIdPolicy,
};
use serde::Serialize;
use tracing::{debug, info};

/// Stops longer than this are treated as a car parked in the garage.
pub const DEFAULT_MAX_PIT_STOP_SECS: f64 = 300.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitLapConfig {
    pub max_pit_stop_secs: f64,
    /// Session state code from which a session counts as finished.
    pub terminal_session_state: i32,
}

impl Default for PitLapConfig {
    fn default() -> Self {
        Self {
            max_pit_stop_secs: DEFAULT_MAX_PIT_STOP_SECS,
            terminal_session_state: SessionState::TERMINAL_CODE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PitLapRecord {
    /// Lap number on the last frame the car was on pit road.
    pub pit_lap: Option<i32>,
    pub car_lap: Option<i32>,
    pub previous_surface: Option<TrackSurface>,
    pub current_surface: Option<TrackSurface>,
    pub pit_entry_time: Option<f64>,
    pub pit_exit_time: Option<f64>,
    pub pit_entry_lap: Option<i32>,
    #[serde(skip)]
    was_on_pit_road: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct PitLapTracker {
    config: PitLapConfig,
    records: Vec<PitLapRecord>,
    session_time: f64,
    session_state: SessionState,
    boundary: SessionBoundary,
}

impl PitLapTracker {
    pub fn new(config: PitLapConfig) -> Self {
        Self {
            config,
            records: Vec::new(),
            session_time: 0.0,
            session_state: SessionState::Invalid,
            boundary: SessionBoundary::new(ZeroIdPolicy::IgnoreChangeFromZero),
        }
    }

    /// Apply one frame.
    ///
    /// A new session id (after a non-zero one) or a backwards session time
    /// clears every car and returns the reason; that frame only reseeds the
    /// identity.
    pub fn update(
        &mut self,
        on_pit_road: &[bool],
        lap: &[i32],
        session_id: i32,
        session_time: f64,
        track_surface: &[i32],
        session_state: SessionState,
    ) -> Option<BoundaryReset> {
        if let Some(reset) = self
            .boundary
            .observe(SessionIdentity::new(session_id, session_time))
        {
            info!(reason = %reset, "Resetting pit lap records");
            self.records.clear();
            self.session_time = session_time;
            self.session_state = session_state;
            return Some(reset);
        }

        let cars = on_pit_road.len().max(lap.len()).max(track_surface.len());
        if self.records.len() < cars {
            self.records.resize_with(cars, PitLapRecord::default);
        }

        for (car, &on_pit) in on_pit_road.iter().enumerate() {
            let car_lap = lap.get(car).copied();
            let Some(record) = self.records.get_mut(car) else {
                continue;
            };
            if on_pit && car_lap.is_some() {
                record.pit_lap = car_lap;
            }
            match (record.was_on_pit_road, on_pit) {
                (Some(false), true) => {
                    debug!(car, session_time, "Car entered pit road");
                    record.pit_entry_time = Some(session_time);
                    record.pit_exit_time = None;
                    record.pit_entry_lap = car_lap;
                }
                (Some(true), false) if record.pit_entry_time.is_some() => {
                    debug!(car, session_time, "Car left pit road");
                    record.pit_exit_time = Some(session_time);
                }
                _ => {}
            }
            record.was_on_pit_road = Some(on_pit);
        }

        for (car, record) in self.records.iter_mut().enumerate() {
            record.car_lap = lap.get(car).copied();
        }

        let terminal = self.is_terminal(session_state);
        for (car, &code) in track_surface.iter().enumerate() {
            let surface = TrackSurface::from(code);
            let Some(record) = self.records.get_mut(car) else {
                continue;
            };
            if record.current_surface != Some(surface)
                && !terminal
                && surface != TrackSurface::NotInWorld
            {
                record.previous_surface = record.current_surface;
                record.current_surface = Some(surface);
            }
        }

        if terminal {
            for record in &mut self.records {
                if record.pit_entry_time.is_some() && record.pit_exit_time.is_none() {
                    record.pit_entry_time = None;
                    record.pit_entry_lap = None;
                }
            }
        }

        self.session_time = session_time;
        self.session_state = session_state;
        None
    }

    fn is_terminal(&self, state: SessionState) -> bool {
        state.code() >= self.config.terminal_session_state
    }

    pub fn record(&self, car: usize) -> Option<&PitLapRecord> {
        self.records.get(car)
    }

    pub fn records(&self) -> &[PitLapRecord] {
        &self.records
    }

    pub fn pit_lap(&self, car: usize) -> Option<i32> {
        self.record(car)?.pit_lap
    }

    pub fn pit_laps(&self) -> Vec<Option<i32>> {
        self.records.iter().map(|record| record.pit_lap).collect()
    }

    pub fn car_laps(&self) -> Vec<Option<i32>> {
        self.records.iter().map(|record| record.car_lap).collect()
    }

    /// Whole seconds spent on pit road for the last or current stop.
    ///
    /// An ongoing stop is measured to the latest session time. Negative or
    /// over-long durations read as `None`.
    pub fn pit_stop_duration(&self, car: usize) -> Option<f64> {
        let record = self.record(car)?;
        let entry = record.pit_entry_time?;
        let end = match record.pit_exit_time {
            Some(exit) => exit,
            None if self.is_terminal(self.session_state) => return None,
            None => self.session_time,
        };

        let duration = (end - entry).floor();
        if duration < 0.0 || duration > self.config.max_pit_stop_secs {
            return None;
        }
        Some(duration)
    }

    pub fn pit_stop_durations(&self) -> Vec<Option<f64>> {
        (0..self.records.len())
            .map(|car| self.pit_stop_duration(car))
            .collect()
    }

    pub fn just_left_pit_stall(&self, car: usize) -> bool {
        self.record(car).is_some_and(|record| {
            record.previous_surface == Some(TrackSurface::InPitStall)
                && record.current_surface != Some(TrackSurface::InPitStall)
        })
    }

    pub fn just_left_track(&self, car: usize) -> bool {
        self.record(car).is_some_and(|record| {
            record.previous_surface == Some(TrackSurface::OnTrack)
                && record.current_surface != Some(TrackSurface::OnTrack)
        })
    }

    pub fn reset(&mut self) {
        self.records.clear();
        self.session_time = 0.0;
        self.session_state = SessionState::Invalid;
        self.boundary.reset();
    }
}

impl Default for PitLapTracker {
    fn default() -> Self {
        Self::new(PitLapConfig::default())
    }
}
