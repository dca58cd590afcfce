//! Shared test utilities for pitwall.
//!
//! # Modules
//!
//! - [`mod@must`] - Unwrap helpers with `#[track_caller]` and readable messages
//! - [`assertions`] - Float assertion macros
//! - [`fixtures`] - Telemetry sample builders
//! - [`prelude`] - Convenience re-exports
//!
//! ```rust,ignore
//! use pitwall_test_helpers::prelude::*;
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![allow(clippy::unwrap_used, clippy::panic)]

pub mod assertions;
pub mod must;
pub mod prelude;

#[cfg(feature = "fixtures")]
pub mod fixtures;

pub use must::*;
