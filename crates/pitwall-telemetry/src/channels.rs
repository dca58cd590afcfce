//! Channel names and enumerated codes reported by the simulator.

use serde::{Deserialize, Serialize};

pub const CAR_IDX_LAST_LAP_TIME: &str = "CarIdxLastLapTime";
pub const CAR_IDX_LAP_DIST_PCT: &str = "CarIdxLapDistPct";
pub const CAR_IDX_ON_PIT_ROAD: &str = "CarIdxOnPitRoad";
pub const CAR_IDX_TRACK_SURFACE: &str = "CarIdxTrackSurface";
pub const CAR_IDX_LAP: &str = "CarIdxLap";
pub const SESSION_TIME: &str = "SessionTime";
pub const SESSION_NUM: &str = "SessionNum";
pub const SESSION_UNIQUE_ID: &str = "SessionUniqueID";
pub const SESSION_STATE: &str = "SessionState";

/// Per-car track surface classification.
///
/// `ApproachingPits` is what the sim reports for the whole pit road, including the
/// exit lane, so a car crossing the pit exit line still reads `ApproachingPits` on
/// the frame where its on-pit-road flag drops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum TrackSurface {
    NotInWorld,
    OffTrack,
    InPitStall,
    ApproachingPits,
    OnTrack,
    Other(i32),
}

impl TrackSurface {
    pub fn code(self) -> i32 {
        match self {
            TrackSurface::NotInWorld => -1,
            TrackSurface::OffTrack => 0,
            TrackSurface::InPitStall => 1,
            TrackSurface::ApproachingPits => 2,
            TrackSurface::OnTrack => 3,
            TrackSurface::Other(code) => code,
        }
    }
}

impl From<i32> for TrackSurface {
    fn from(code: i32) -> Self {
        match code {
            -1 => TrackSurface::NotInWorld,
            0 => TrackSurface::OffTrack,
            1 => TrackSurface::InPitStall,
            2 => TrackSurface::ApproachingPits,
            3 => TrackSurface::OnTrack,
            other => TrackSurface::Other(other),
        }
    }
}

impl From<TrackSurface> for i32 {
    fn from(surface: TrackSurface) -> Self {
        surface.code()
    }
}

/// Session phase as reported by `SessionState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum SessionState {
    Invalid,
    GetInCar,
    Warmup,
    ParadeLaps,
    Racing,
    Checkered,
    CoolDown,
    Other(i32),
}

impl SessionState {
    /// First code at which a session is considered finished.
    pub const TERMINAL_CODE: i32 = 5;

    pub fn code(self) -> i32 {
        match self {
            SessionState::Invalid => 0,
            SessionState::GetInCar => 1,
            SessionState::Warmup => 2,
            SessionState::ParadeLaps => 3,
            SessionState::Racing => 4,
            SessionState::Checkered => 5,
            SessionState::CoolDown => 6,
            SessionState::Other(code) => code,
        }
    }
}

impl From<i32> for SessionState {
    fn from(code: i32) -> Self {
        match code {
            0 => SessionState::Invalid,
            1 => SessionState::GetInCar,
            2 => SessionState::Warmup,
            3 => SessionState::ParadeLaps,
            4 => SessionState::Racing,
            5 => SessionState::Checkered,
            6 => SessionState::CoolDown,
            other => SessionState::Other(other),
        }
    }
}

impl From<SessionState> for i32 {
    fn from(state: SessionState) -> Self {
        state.code()
    }
}
