//! Property-based tests for the windowed estimators.

#[cfg(test)]
mod proptest_estimators {
    use pitwall_estimators::{
        BoundedHistory, DEFAULT_HISTORY_WINDOW, LapPaceEstimator, PitLapTracker, SpeedEstimator,
        robust_pace,
    };
    use pitwall_telemetry::SessionState;
    use proptest::prelude::*;

    fn lap_time() -> impl Strategy<Value = f64> {
        prop_oneof![
            8 => 60.0f64..200.0,
            1 => Just(0.0),
            1 => -5.0f64..0.0,
        ]
    }

    fn position() -> impl Strategy<Value = f64> {
        prop_oneof![
            8 => 0.0f64..1.0,
            1 => Just(-1.0),
            1 => Just(f64::NAN),
            1 => Just(f64::INFINITY),
            1 => Just(f64::NEG_INFINITY),
        ]
    }

    fn time_step() -> impl Strategy<Value = f64> {
        prop_oneof![
            8 => 0.01f64..5.0,
            1 => Just(0.0),
            1 => Just(f64::NAN),
            1 => Just(f64::INFINITY),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(300))]

        // --- History windows never exceed their bound ---

        #[test]
        fn lap_history_is_bounded(frames in prop::collection::vec(
            prop::collection::vec(lap_time(), 3), 1..60,
        )) {
            let mut estimator = LapPaceEstimator::default();
            for frame in &frames {
                estimator.update(frame);
            }
            for car in 0..3 {
                let len = estimator.history(car).map_or(0, BoundedHistory::len);
                prop_assert!(len <= DEFAULT_HISTORY_WINDOW, "car {} history {}", car, len);
            }
        }

        // --- Pace always lies within the window it was computed from ---

        #[test]
        fn pace_within_sample_range(laps in prop::collection::vec(60.0f64..200.0, 1..=5)) {
            let pace = robust_pace(&laps, 1.0);
            let min = laps.iter().copied().fold(f64::INFINITY, f64::min);
            let max = laps.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            prop_assert!(pace >= min && pace <= max, "pace {} outside [{}, {}]", pace, min, max);
        }

        // --- Repeating a frame never changes history ---

        #[test]
        fn repeated_frame_is_noop(frame in prop::collection::vec(lap_time(), 1..8)) {
            let mut estimator = LapPaceEstimator::default();
            estimator.update(&frame);
            let version = estimator.version();
            let histories = estimator.histories();

            prop_assert!(!estimator.update(&frame));
            prop_assert_eq!(estimator.version(), version);
            prop_assert_eq!(estimator.histories(), histories);
        }

        // --- Any position stream, including NaN and inf, gives finite non-negative speed ---

        #[test]
        fn speed_is_finite_and_non_negative(
            frames in prop::collection::vec(
                (prop::collection::vec(position(), 2), time_step()), 1..40,
            ),
            track in 500.0f64..25_000.0,
        ) {
            let mut estimator = SpeedEstimator::default();
            let mut clock = 100.0;
            for (positions, step) in &frames {
                let session_time = if step.is_finite() { clock + step } else { *step };
                if step.is_finite() {
                    clock += step;
                }
                estimator.update(positions, track, session_time);

                for &speed in estimator.speeds() {
                    prop_assert!(speed.is_finite(), "speed {}", speed);
                    prop_assert!(speed >= 0.0, "speed {}", speed);
                }
            }
        }

        // --- Arbitrary frames never panic the pit tracker ---

        #[test]
        fn pit_tracker_is_total(
            frames in prop::collection::vec((
                prop::collection::vec(any::<bool>(), 0..6),
                prop::collection::vec(-1i32..40, 0..6),
                0i32..3,
                0.0f64..1000.0,
                prop::collection::vec(-1i32..5, 0..6),
                0i32..7,
            ), 1..30),
        ) {
            let mut tracker = PitLapTracker::default();
            for (on_pit, laps, id, time, surfaces, state) in &frames {
                tracker.update(on_pit, laps, *id, *time, surfaces, SessionState::from(*state));
                for car in 0..tracker.records().len() {
                    if let Some(duration) = tracker.pit_stop_duration(car) {
                        prop_assert!((0.0..=300.0).contains(&duration));
                    }
                }
            }
        }
    }
}
