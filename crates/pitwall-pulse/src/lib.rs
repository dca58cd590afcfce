//! Throttle pulse for the pitwall estimators.
//!
//! Telemetry arrives at up to 60 Hz; the estimators only need a fraction of
//! that. The [`Engine`] owns every estimator and runs them once per tick over
//! the newest sample, and [`ThrottlePulse`] drives that tick from a tokio
//! interval.
//!
//! ```rust,ignore
//! let engine = Engine::from_config(PulseConfig::load(path)?)?;
//! let handles = engine.handles();
//! let pulse = ThrottlePulse::spawn(engine)?;
//!
//! handles.ingest.push(sample);
//! let snapshot = pulse.snapshots().borrow().clone();
//! ```

#![deny(static_mut_refs)]

pub mod config;
pub mod engine;
pub mod pulse;
pub mod snapshot;

pub use config::{ConfigError, DEFAULT_CONFIG_YAML, PulseConfig};
pub use engine::{Engine, EngineHandles, PulseStats, SessionInbox, SimRunning, TickOutcome};
pub use pulse::{PulseHandle, ThrottlePulse};
pub use snapshot::MetricsSnapshot;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PulseError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Throttle pulse requires a tokio runtime: {0}")]
    RuntimeUnavailable(#[from] tokio::runtime::TryCurrentError),

    #[error("Throttle pulse task failed: {0}")]
    TaskFailed(String),
}

pub type PulseResult<T> = Result<T, PulseError>;
