//! Convenience re-exports for common test utilities.
//!
//! ```rust,ignore
//! use pitwall_test_helpers::prelude::*;
//! ```

pub use crate::must::{must, must_some};
pub use crate::{assert_all_approx_eq, assert_approx_eq};

#[cfg(feature = "fixtures")]
pub use crate::fixtures::{SampleBuilder, pit_frame, race_sample, session_info};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;
