//! Assertion macros for estimator output.

/// Assert that two floating-point values are approximately equal.
///
/// ```rust
/// use pitwall_test_helpers::assert_approx_eq;
///
/// assert_approx_eq!(90.05_f64, 90.0500001_f64, 1e-6);
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $tolerance:expr $(,)?) => {
        let left = $left;
        let right = $right;
        let tolerance = $tolerance;
        let diff = (left - right).abs();
        if !(diff <= tolerance) {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}`,\n  tolerance: `{:?}`",
                left, right, diff, tolerance
            );
        }
    };
    ($left:expr, $right:expr, $tolerance:expr, $($arg:tt)+) => {
        let left = $left;
        let right = $right;
        let tolerance = $tolerance;
        let diff = (left - right).abs();
        if !(diff <= tolerance) {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}`,\n  tolerance: `{:?}`: {}",
                left, right, diff, tolerance, format_args!($($arg)+)
            );
        }
    };
}

/// Assert that every element of a float slice matches the expected slice.
///
/// ```rust
/// use pitwall_test_helpers::assert_all_approx_eq;
///
/// assert_all_approx_eq!(&[1.0, 2.0], &[1.0, 2.0000001], 1e-6);
/// ```
#[macro_export]
macro_rules! assert_all_approx_eq {
    ($left:expr, $right:expr, $tolerance:expr $(,)?) => {
        let left: &[f64] = $left;
        let right: &[f64] = $right;
        if left.len() != right.len() {
            panic!(
                "assertion failed: length mismatch\n  left: `{:?}`,\n right: `{:?}`",
                left, right
            );
        }
        for (i, (l, r)) in left.iter().zip(right.iter()).enumerate() {
            let diff = (l - r).abs();
            if !(diff <= $tolerance) {
                panic!(
                    "assertion failed: element {} differs\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}`",
                    i, l, r, diff
                );
            }
        }
    };
}
