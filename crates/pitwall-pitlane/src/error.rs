//! Error types for calibration persistence

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PitLaneStoreError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid track ID: {0:?}")]
    InvalidTrackId(String),

    #[error("Atomic write failed: temp file at {temp_path}, target at {target_path}")]
    AtomicWriteFailed {
        temp_path: PathBuf,
        target_path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Raised by stores that are deliberately unavailable, e.g. in tests.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl PitLaneStoreError {
    pub fn invalid_track_id(track_id: impl Into<String>) -> Self {
        Self::InvalidTrackId(track_id.into())
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable(reason.into())
    }
}

pub type PitLaneResult<T> = Result<T, PitLaneStoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            PitLaneStoreError::invalid_track_id(" ").to_string(),
            "Invalid track ID: \" \""
        );
        assert_eq!(
            PitLaneStoreError::unavailable("offline").to_string(),
            "Store unavailable: offline"
        );
    }
}
