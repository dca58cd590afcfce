//! Raw telemetry model for the pitwall estimators.
//!
//! The simulator bridge pushes keyed bags of per-car channels at up to 60 Hz.
//! This crate owns that sample model and the pieces every estimator shares:
//!
//! - [`sample`] - `RawTelemetrySample` and typed channel access
//! - [`channels`] - channel names plus track-surface and session-state codes
//! - [`slot`] - last-value-wins storage for bursty producers
//! - [`ingest`] - bridge-facing handle that merges partial samples
//! - [`session`] - session identity, boundary detection and session metadata

#![deny(static_mut_refs)]

pub mod channels;
pub mod ingest;
pub mod sample;
pub mod session;
pub mod slot;

pub use channels::{SessionState, TrackSurface};
pub use ingest::TelemetryIngest;
pub use sample::{ChannelData, RawTelemetrySample};
pub use session::{
    BoundaryReset, SessionBoundary, SessionIdentity, SessionInfo, ZeroIdPolicy,
    parse_track_length,
};
pub use slot::{LatestSlot, SlotStats};

use std::num::ParseFloatError;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid track length {raw:?}: {source}")]
    InvalidTrackLength {
        raw: String,
        #[source]
        source: ParseFloatError,
    },

    #[error("Track length {raw:?} is out of range")]
    TrackLengthOutOfRange { raw: String },

    #[error("Track length {raw:?} has unknown unit {unit:?}")]
    UnknownTrackLengthUnit { raw: String, unit: String },

    #[error("Failed to decode telemetry sample: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type TelemetryResult<T> = Result<T, TelemetryError>;
