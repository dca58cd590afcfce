//! Telemetry sample builders.

use pitwall_telemetry::channels::{
    CAR_IDX_LAP, CAR_IDX_LAP_DIST_PCT, CAR_IDX_LAST_LAP_TIME, CAR_IDX_ON_PIT_ROAD,
    CAR_IDX_TRACK_SURFACE, SESSION_NUM, SESSION_STATE, SESSION_TIME, SESSION_UNIQUE_ID,
};
use pitwall_telemetry::{RawTelemetrySample, SessionInfo, SessionState, TrackSurface};

/// Fluent builder over [`RawTelemetrySample`].
#[derive(Debug, Clone, Default)]
pub struct SampleBuilder {
    sample: RawTelemetrySample,
}

impl SampleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session_time(mut self, seconds: f64) -> Self {
        self.sample.insert(SESSION_TIME, vec![seconds]);
        self
    }

    pub fn session_unique_id(mut self, id: i32) -> Self {
        self.sample.insert(SESSION_UNIQUE_ID, vec![id]);
        self
    }

    pub fn session_num(mut self, num: i32) -> Self {
        self.sample.insert(SESSION_NUM, vec![num]);
        self
    }

    pub fn session_state(mut self, state: SessionState) -> Self {
        self.sample.insert(SESSION_STATE, vec![state.code()]);
        self
    }

    pub fn last_lap_times(mut self, laps: impl Into<Vec<f64>>) -> Self {
        self.sample.insert(CAR_IDX_LAST_LAP_TIME, laps.into());
        self
    }

    pub fn lap_dist_pct(mut self, positions: impl Into<Vec<f64>>) -> Self {
        self.sample.insert(CAR_IDX_LAP_DIST_PCT, positions.into());
        self
    }

    pub fn on_pit_road(mut self, flags: impl Into<Vec<bool>>) -> Self {
        self.sample.insert(CAR_IDX_ON_PIT_ROAD, flags.into());
        self
    }

    pub fn track_surface(mut self, surfaces: &[TrackSurface]) -> Self {
        let codes: Vec<i32> = surfaces.iter().map(|s| s.code()).collect();
        self.sample.insert(CAR_IDX_TRACK_SURFACE, codes);
        self
    }

    pub fn laps(mut self, laps: impl Into<Vec<i32>>) -> Self {
        self.sample.insert(CAR_IDX_LAP, laps.into());
        self
    }

    pub fn build(self) -> RawTelemetrySample {
        self.sample
    }
}

/// A complete racing frame for `cars` cars spread evenly round the lap.
///
/// Every car is on track; `session_time` drives positions forward so
/// consecutive frames produce plausible speeds.
pub fn race_sample(cars: usize, session_time: f64) -> RawTelemetrySample {
    let spread = if cars == 0 { 0.0 } else { 1.0 / cars as f64 };
    let positions: Vec<f64> = (0..cars)
        .map(|car| (car as f64 * spread + session_time / 90.0).fract())
        .collect();
    let laps: Vec<i32> = (0..cars).map(|_| (session_time / 90.0) as i32).collect();
    let last_laps: Vec<f64> = (0..cars).map(|car| 90.0 + car as f64 * 0.1).collect();

    SampleBuilder::new()
        .session_time(session_time)
        .session_unique_id(1)
        .session_num(0)
        .session_state(SessionState::Racing)
        .last_lap_times(last_laps)
        .lap_dist_pct(positions)
        .on_pit_road(vec![false; cars])
        .track_surface(&vec![TrackSurface::OnTrack; cars])
        .laps(laps)
        .build()
}

/// The three pit-lane channels for one frame.
pub fn pit_frame(on_pit_road: &[bool], surfaces: &[i32], positions: &[f64]) -> RawTelemetrySample {
    RawTelemetrySample::new()
        .with_channel(CAR_IDX_ON_PIT_ROAD, on_pit_road.to_vec())
        .with_channel(CAR_IDX_TRACK_SURFACE, surfaces.to_vec())
        .with_channel(CAR_IDX_LAP_DIST_PCT, positions.to_vec())
}

/// Session metadata for a 5 km track.
pub fn session_info(track_id: &str) -> SessionInfo {
    SessionInfo {
        session_unique_id: Some(1),
        ..SessionInfo::for_track(track_id, "5.00 km")
    }
}
