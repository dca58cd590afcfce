//! Calibration persistence.
//!
//! All tracks share one JSON document. Reads never fail on a missing or
//! corrupt file; they see an empty map and the next write replaces it.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use anyhow::Context;
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::fs as async_fs;
use tracing::{debug, warn};

use crate::calibration::{PitLaneCalibration, PitLaneData, PitLaneUpdate};
use crate::error::{PitLaneResult, PitLaneStoreError};

/// File name used inside the data directory.
pub const PIT_LANE_DATA_FILE: &str = "pitLaneData.json";

/// Per-track calibration storage.
#[async_trait]
pub trait PitLanePersistence: Send + Sync {
    /// Stored calibration for `track_id`, `None` if the track was never saved.
    async fn get_pit_lane_data(&self, track_id: &str) -> PitLaneResult<Option<PitLaneCalibration>>;

    /// Merge `update` into the stored calibration for `track_id`.
    async fn update_pit_lane_data(&self, track_id: &str, update: PitLaneUpdate) -> PitLaneResult<()>;
}

fn validate_track_id(track_id: &str) -> PitLaneResult<()> {
    if track_id.trim().is_empty() {
        return Err(PitLaneStoreError::invalid_track_id(track_id));
    }
    Ok(())
}

/// JSON file store with atomic replace-on-write.
#[derive(Debug)]
pub struct JsonFilePitLaneStore {
    path: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

impl JsonFilePitLaneStore {
    /// Store backed by the exact file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Store backed by [`PIT_LANE_DATA_FILE`] inside `data_dir`, creating the directory.
    pub async fn open(data_dir: &Path) -> anyhow::Result<Self> {
        async_fs::create_dir_all(data_dir)
            .await
            .with_context(|| format!("Failed to create pit lane data directory: {data_dir:?}"))?;

        Ok(Self::new(data_dir.join(PIT_LANE_DATA_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every stored track. Missing or unreadable files read as empty.
    pub async fn read_all(&self) -> PitLaneData {
        let content = match async_fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return PitLaneData::new(),
            Err(e) => {
                warn!(path = ?self.path, error = %e, "Failed to read pit lane data; treating as empty");
                return PitLaneData::new();
            }
        };

        match serde_json::from_str(&content) {
            Ok(data) => data,
            Err(e) => {
                warn!(path = ?self.path, error = %e, "Invalid pit lane data; treating as empty");
                PitLaneData::new()
            }
        }
    }

    async fn write_all(&self, data: &PitLaneData) -> PitLaneResult<()> {
        let content = serde_json::to_string_pretty(data)?;
        let temp_path = self.path.with_extension("json.tmp");
        debug!(path = ?self.path, tracks = data.len(), "Writing pit lane data atomically");

        async_fs::write(&temp_path, content).await?;
        async_fs::rename(&temp_path, &self.path)
            .await
            .map_err(|source| PitLaneStoreError::AtomicWriteFailed {
                temp_path: temp_path.clone(),
                target_path: self.path.clone(),
                source,
            })?;
        Ok(())
    }
}

#[async_trait]
impl PitLanePersistence for JsonFilePitLaneStore {
    async fn get_pit_lane_data(&self, track_id: &str) -> PitLaneResult<Option<PitLaneCalibration>> {
        validate_track_id(track_id)?;
        Ok(self.read_all().await.get(track_id).copied())
    }

    async fn update_pit_lane_data(&self, track_id: &str, update: PitLaneUpdate) -> PitLaneResult<()> {
        validate_track_id(track_id)?;
        let _guard = self.write_lock.lock().await;

        let mut data = self.read_all().await;
        data.entry(track_id.to_string()).or_default().apply(update);
        self.write_all(&data).await?;

        debug!(track_id, ?update, "Pit lane data saved");
        Ok(())
    }
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct InMemoryPitLaneStore {
    data: Mutex<PitLaneData>,
    failing: AtomicBool,
    updates: AtomicU64,
}

impl InMemoryPitLaneStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every call fails until [`set_failing`](Self::set_failing)`(false)`.
    pub fn with_failure() -> Self {
        let store = Self::default();
        store.set_failing(true);
        store
    }

    pub fn with_track(self, track_id: impl Into<String>, calibration: PitLaneCalibration) -> Self {
        self.data.lock().insert(track_id.into(), calibration);
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> PitLaneData {
        self.data.lock().clone()
    }

    /// Number of successful updates.
    pub fn update_count(&self) -> u64 {
        self.updates.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> PitLaneResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PitLaneStoreError::unavailable("in-memory store set to fail"));
        }
        Ok(())
    }
}

#[async_trait]
impl PitLanePersistence for InMemoryPitLaneStore {
    async fn get_pit_lane_data(&self, track_id: &str) -> PitLaneResult<Option<PitLaneCalibration>> {
        self.check_available()?;
        validate_track_id(track_id)?;
        Ok(self.data.lock().get(track_id).copied())
    }

    async fn update_pit_lane_data(&self, track_id: &str, update: PitLaneUpdate) -> PitLaneResult<()> {
        self.check_available()?;
        validate_track_id(track_id)?;
        self.data
            .lock()
            .entry(track_id.to_string())
            .or_default()
            .apply(update);
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
