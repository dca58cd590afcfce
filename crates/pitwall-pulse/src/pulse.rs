//! Fixed-cadence driver for [`Engine::tick`].

use std::sync::Arc;
use std::time::Duration;

use pitwall_telemetry::RawTelemetrySample;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{Instrument, debug, info};

use crate::engine::{Engine, EngineHandles, TickOutcome};
use crate::snapshot::MetricsSnapshot;
use crate::{PulseError, PulseResult};

pub struct ThrottlePulse;

impl ThrottlePulse {
    /// Move `engine` onto a task that ticks it at the configured rate.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(engine: Engine) -> PulseResult<PulseHandle> {
        let runtime = tokio::runtime::Handle::try_current()?;
        let period = engine.config().tick_period();
        let handles = engine.handles();
        let snapshots = engine.snapshots();
        let throttled = engine.throttled();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let task = runtime.spawn(run(engine, period, shutdown_rx).in_current_span());

        Ok(PulseHandle {
            handles,
            snapshots,
            throttled,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        })
    }
}

async fn run(mut engine: Engine, period: Duration, mut shutdown: oneshot::Receiver<()>) -> Engine {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    info!(period_ms = period.as_millis(), "Throttle pulse started");

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => break,
            _ = ticker.tick() => {
                if engine.tick() == TickOutcome::Reset {
                    debug!("Pulse tick reset all stores");
                }
            }
        }
    }

    info!(stats = ?engine.stats(), "Throttle pulse stopped");
    engine
}

/// Owner of a running pulse. Dropping it aborts the task.
pub struct PulseHandle {
    handles: EngineHandles,
    snapshots: watch::Receiver<Arc<MetricsSnapshot>>,
    throttled: watch::Receiver<Option<Arc<RawTelemetrySample>>>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<Engine>>,
}

impl PulseHandle {
    /// Producer handles for the telemetry and session bridges.
    pub fn bridge(&self) -> &EngineHandles {
        &self.handles
    }

    pub fn snapshots(&self) -> watch::Receiver<Arc<MetricsSnapshot>> {
        self.snapshots.clone()
    }

    pub fn throttled(&self) -> watch::Receiver<Option<Arc<RawTelemetrySample>>> {
        self.throttled.clone()
    }

    pub fn latest_snapshot(&self) -> Arc<MetricsSnapshot> {
        Arc::clone(&self.snapshots.borrow())
    }

    pub fn set_sim_running(&self, running: bool) {
        self.handles.running.set(running);
    }

    /// Stop ticking and hand the engine back.
    pub async fn shutdown(mut self) -> PulseResult<Engine> {
        if let Some(tx) = self.shutdown.take()
            && tx.send(()).is_err()
        {
            debug!("Throttle pulse already stopped");
        }
        let task = self
            .task
            .take()
            .ok_or_else(|| PulseError::TaskFailed("pulse task already taken".to_string()))?;
        task.await.map_err(|e| PulseError::TaskFailed(e.to_string()))
    }
}

impl Drop for PulseHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl std::fmt::Debug for PulseHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PulseHandle")
            .field("running", &self.task.is_some())
            .finish_non_exhaustive()
    }
}
