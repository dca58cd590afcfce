//! Pit lane calibration for pitwall.
//!
//! [`PitLaneCalibrator`] watches pit-road transitions to learn where a track's
//! pit entry and exit lines sit, and hands each newly learned value to a
//! [`PitLanePersistence`] store keyed by track id.

#![deny(static_mut_refs)]

pub mod calibration;
pub mod calibrator;
pub mod error;
pub mod persistence;

pub use calibration::{PitLaneCalibration, PitLaneData, PitLaneUpdate};
pub use calibrator::{CalibratorConfig, DEFAULT_PIT_ENTRY_WRAP_GUARD, PitLaneCalibrator};
pub use error::{PitLaneResult, PitLaneStoreError};
pub use persistence::{
    InMemoryPitLaneStore, JsonFilePitLaneStore, PIT_LANE_DATA_FILE, PitLanePersistence,
};
