//! Pit lane calibration values and partial updates.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Pit entry and exit positions for one track, as lap-distance fractions.
///
/// ```
/// use pitwall_pitlane::{PitLaneCalibration, PitLaneUpdate};
///
/// let mut calibration = PitLaneCalibration::default();
/// calibration.apply(PitLaneUpdate::entry(0.91));
/// calibration.apply(PitLaneUpdate::exit(0.08));
/// assert!(calibration.is_complete());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PitLaneCalibration {
    #[serde(default)]
    pub pit_entry_pct: Option<f64>,
    #[serde(default)]
    pub pit_exit_pct: Option<f64>,
}

impl PitLaneCalibration {
    pub fn new(pit_entry_pct: Option<f64>, pit_exit_pct: Option<f64>) -> Self {
        Self {
            pit_entry_pct,
            pit_exit_pct,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.pit_entry_pct.is_some() && self.pit_exit_pct.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.pit_entry_pct.is_none() && self.pit_exit_pct.is_none()
    }

    /// Overwrite the fields present in `update`.
    pub fn apply(&mut self, update: PitLaneUpdate) {
        if let Some(entry) = update.pit_entry_pct {
            self.pit_entry_pct = Some(entry);
        }
        if let Some(exit) = update.pit_exit_pct {
            self.pit_exit_pct = Some(exit);
        }
    }
}

/// Partial calibration update. Absent fields leave the stored value alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PitLaneUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pit_entry_pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pit_exit_pct: Option<f64>,
}

impl PitLaneUpdate {
    pub fn entry(pct: f64) -> Self {
        Self {
            pit_entry_pct: Some(pct),
            pit_exit_pct: None,
        }
    }

    pub fn exit(pct: f64) -> Self {
        Self {
            pit_entry_pct: None,
            pit_exit_pct: Some(pct),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pit_entry_pct.is_none() && self.pit_exit_pct.is_none()
    }
}

/// Every persisted track, keyed by track id.
pub type PitLaneData = BTreeMap<String, PitLaneCalibration>;
