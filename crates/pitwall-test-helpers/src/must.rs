//! Unwrap helpers for test code.
//!
//! Use these instead of `unwrap()`/`expect()` so failures point at the caller
//! and include the error value.

use std::fmt::Debug;

/// Unwrap a `Result`, panicking with the error on failure.
///
/// ```rust
/// use pitwall_test_helpers::must;
///
/// let value = must(Ok::<_, &str>(42));
/// assert_eq!(value, 42);
/// ```
///
/// # Panics
///
/// Panics if the result is `Err`.
#[track_caller]
pub fn must<T, E: Debug>(result: Result<T, E>) -> T {
    match result {
        Ok(v) => v,
        Err(e) => panic!("must: unexpected Err: {e:?}"),
    }
}

/// Unwrap an `Option`, panicking with `msg` if `None`.
///
/// # Panics
///
/// Panics if the option is `None`.
#[track_caller]
pub fn must_some<T>(option: Option<T>, msg: &str) -> T {
    match option {
        Some(v) => v,
        None => panic!("must_some: {msg}"),
    }
}
