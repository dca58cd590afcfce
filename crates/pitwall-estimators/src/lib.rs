//! Windowed per-car estimators.
//!
//! Each estimator is a plain state object with a total `update` entry point.
//! They never panic on short, missing or inconsistent channel data; bad input
//! leaves state untouched or resets it.

#![deny(static_mut_refs)]

pub mod history;
pub mod lap_pace;
pub mod pit_lap;
pub mod speed;
pub mod stats;

pub use history::{BoundedHistory, DEFAULT_HISTORY_WINDOW};
pub use lap_pace::{LapPaceConfig, LapPaceEstimator};
pub use pit_lap::{DEFAULT_MAX_PIT_STOP_SECS, PitLapConfig, PitLapRecord, PitLapTracker};
pub use speed::SpeedEstimator;
pub use stats::{DEFAULT_OUTLIER_THRESHOLD, filter_outliers, median, robust_pace};
