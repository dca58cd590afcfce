//! Scenario tests driving the estimators the way the pulse does.

use pitwall_estimators::{BoundedHistory, LapPaceEstimator, PitLapTracker, SpeedEstimator};
use pitwall_telemetry::{SessionIdentity, SessionState};
use pitwall_test_helpers::prelude::*;
use tracing_test::traced_test;

#[test]
fn test_pace_over_a_stint() {
    let mut estimator = LapPaceEstimator::default();
    for lap in [90.5, 89.8, 120.0, 90.2, 89.9] {
        estimator.update(&[lap, 0.0]);
    }

    assert_approx_eq!(estimator.pace(0), 90.05, 1e-9);
    assert_all_approx_eq!(
        &must_some(estimator.history(0), "car 0 history").to_vec(),
        &[90.5, 89.8, 120.0, 90.2, 89.9],
        0.0
    );
    assert_approx_eq!(estimator.pace(1), 0.0, 0.0);
}

#[test]
fn test_sixth_lap_evicts_first() {
    let mut estimator = LapPaceEstimator::default();
    for lap in [89.0, 92.0, 88.5, 91.5, 89.5, 90.0] {
        estimator.update(&[lap]);
    }

    let history = must_some(estimator.history(0), "history").to_vec();
    assert_all_approx_eq!(&history, &[92.0, 88.5, 91.5, 89.5, 90.0], 0.0);
}

#[test]
fn test_speed_across_start_finish() {
    let mut estimator = SpeedEstimator::default();
    estimator.update(&[0.95, 0.50], 5000.0, 10.0);
    estimator.update(&[0.05, 0.52], 5000.0, 12.0);

    assert_all_approx_eq!(estimator.speeds(), &[900.0, 180.0], 0.0);
}

#[test]
#[traced_test]
fn test_session_change_clears_every_estimator() {
    let mut pace = LapPaceEstimator::default();
    let mut speed = SpeedEstimator::default();
    let mut pits = PitLapTracker::default();

    pace.update_with_session(&[90.0], Some(1));
    pace.update_with_session(&[91.0], Some(1));
    speed.update(&[0.1], 5000.0, 500.0);
    speed.update(&[0.2], 5000.0, 501.0);
    pits.update(&[true], &[3], 11, 501.0, &[2], SessionState::Racing);

    pace.update_with_session(&[91.0], Some(2));
    speed.update(&[0.1], 5000.0, 3.0);
    pits.update(&[false], &[0], 12, 3.0, &[3], SessionState::GetInCar);

    assert!(pace.history(0).is_none());
    assert!(pace.paces().is_empty());
    assert_eq!(speed.history(0).map(BoundedHistory::len), Some(0));
    assert_approx_eq!(speed.speed(0), 0.0, 0.0);
    assert!(pits.records().is_empty());
    assert!(logs_contain("Resetting lap time history"));
    assert!(logs_contain("Resetting pit lap records"));
}

#[test]
fn test_observe_session_time_rewind_resets_pace() {
    let mut pace = LapPaceEstimator::default();
    pace.observe_session(SessionIdentity::new(5, 1200.0));
    pace.update(&[88.0]);

    assert!(pace.observe_session(SessionIdentity::new(5, 600.0)).is_some());
    assert!(pace.history(0).is_none());
}
