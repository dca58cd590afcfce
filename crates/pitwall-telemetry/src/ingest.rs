//! Bridge-facing ingestion handle.

use std::sync::Arc;

use tracing::trace;

use crate::sample::RawTelemetrySample;
use crate::slot::{LatestSlot, SlotStats};

/// Cloneable handle the telemetry bridge pushes samples into.
///
/// Every clone writes the same slot. Pushing never blocks on the estimators.
#[derive(Clone, Default)]
pub struct TelemetryIngest {
    slot: Arc<LatestSlot<RawTelemetrySample>>,
}

impl TelemetryIngest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current sample with a complete one.
    pub fn push(&self, sample: RawTelemetrySample) -> u64 {
        self.slot.publish(sample)
    }

    /// Overlay a partial sample on the last-known state.
    ///
    /// With nothing stored yet the partial becomes the state as-is.
    pub fn push_partial(&self, partial: RawTelemetrySample) -> u64 {
        self.slot.publish_with(move |previous| match previous {
            Some(base) => base.merged_with(&partial),
            None => {
                trace!(channels = partial.len(), "Partial sample arrived with no base state");
                partial
            }
        })
    }

    pub fn latest(&self) -> Option<Arc<RawTelemetrySample>> {
        self.slot.latest()
    }

    pub fn slot(&self) -> &LatestSlot<RawTelemetrySample> {
        &self.slot
    }

    pub fn clear(&self) {
        self.slot.clear();
    }

    pub fn stats(&self) -> SlotStats {
        self.slot.stats()
    }
}

impl std::fmt::Debug for TelemetryIngest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryIngest")
            .field("sequence", &self.slot.sequence())
            .finish()
    }
}
