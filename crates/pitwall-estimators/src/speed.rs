//! Per-car speed from successive lap-distance samples.

use pitwall_telemetry::{SessionBoundary, SessionIdentity, ZeroIdPolicy};
use tracing::{debug, info};

use crate::history::{BoundedHistory, DEFAULT_HISTORY_WINDOW};

const MS_TO_KPH: f64 = 3.6;

#[derive(Debug, Clone)]
struct PositionFrame {
    positions: Vec<f64>,
    session_time: f64,
}

/// Moving-average speed per car, in whole km/h.
#[derive(Debug, Clone)]
pub struct SpeedEstimator {
    window: usize,
    histories: Vec<BoundedHistory>,
    previous: Option<PositionFrame>,
    speeds: Vec<f64>,
    boundary: SessionBoundary,
}

impl SpeedEstimator {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            histories: Vec::new(),
            previous: None,
            speeds: Vec::new(),
            boundary: SessionBoundary::new(ZeroIdPolicy::ResetOnAnyChange),
        }
    }

    /// Feed one frame of `CarIdxLapDistPct`. Returns whether any speed sample was taken.
    ///
    /// Without a usable track length or any positions every speed reads 0 and
    /// nothing is recorded.
    pub fn update(&mut self, positions: &[f64], track_length_m: f64, session_time: f64) -> bool {
        if positions.is_empty() || !track_length_m.is_finite() || track_length_m <= 0.0 {
            self.speeds = vec![0.0; positions.len()];
            return false;
        }
        if !session_time.is_finite() {
            debug!(session_time, "Speed sample without usable session time skipped");
            return false;
        }

        if let Some(reset) = self.boundary.observe(SessionIdentity::from_time(session_time)) {
            info!(reason = %reset, "Resetting speed history");
            self.clear_cars();
        }

        let mut sampled = false;
        match self.previous.as_ref() {
            Some(prev) if prev.positions.len() == positions.len() => {
                let delta_time = session_time - prev.session_time;
                if !delta_time.is_finite() || delta_time <= 0.0 {
                    debug!(delta_time, "Duplicate speed sample skipped");
                    return false;
                }
                for (car, (&current, &previous)) in positions.iter().zip(&prev.positions).enumerate() {
                    if !current.is_finite()
                        || !previous.is_finite()
                        || current < 0.0
                        || previous < 0.0
                    {
                        continue;
                    }
                    let mut delta_fraction = current - previous;
                    if delta_fraction < 0.0 {
                        delta_fraction += 1.0;
                    }
                    let distance = track_length_m * delta_fraction;
                    let speed_kph = distance / delta_time * MS_TO_KPH;
                    if let Some(history) = self.histories.get_mut(car) {
                        history.push(speed_kph);
                        sampled = true;
                    }
                }
            }
            _ => {}
        }

        if self.histories.len() != positions.len() {
            let window = self.window;
            self.histories
                .resize_with(positions.len(), || BoundedHistory::new(window));
        }
        self.previous = Some(PositionFrame {
            positions: positions.to_vec(),
            session_time,
        });
        self.speeds = self
            .histories
            .iter()
            .map(|history| history.mean().map_or(0.0, f64::round))
            .collect();
        sampled
    }

    /// Speed for `car` in km/h, 0 when unknown.
    pub fn speed(&self, car: usize) -> f64 {
        self.speeds.get(car).copied().unwrap_or(0.0)
    }

    pub fn speeds(&self) -> &[f64] {
        &self.speeds
    }

    pub fn history(&self, car: usize) -> Option<&BoundedHistory> {
        self.histories.get(car)
    }

    fn clear_cars(&mut self) {
        self.histories.clear();
        self.previous = None;
        self.speeds.clear();
    }

    pub fn reset(&mut self) {
        self.clear_cars();
        self.boundary.reset();
    }
}

impl Default for SpeedEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_around_speed() {
        let mut estimator = SpeedEstimator::default();
        assert!(!estimator.update(&[0.95], 5000.0, 100.0));
        assert!(estimator.update(&[0.05], 5000.0, 102.0));

        let speed = estimator.speed(0);
        assert!(speed.is_finite() && speed > 0.0);
        assert!((speed - 900.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_moving_average_is_rounded() {
        let mut estimator = SpeedEstimator::default();
        estimator.update(&[0.0], 1000.0, 0.0);
        // 10 m in 1 s = 36 km/h, then 20 m in 1 s = 72 km/h.
        estimator.update(&[0.01], 1000.0, 1.0);
        estimator.update(&[0.03], 1000.0, 2.0);

        assert!((estimator.speed(0) - 54.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_no_track_length_reads_zero() {
        let mut estimator = SpeedEstimator::default();
        estimator.update(&[0.1, 0.2], 0.0, 1.0);
        assert_eq!(estimator.speeds().len(), 2);
        assert!(estimator.speeds().iter().all(|s| s.abs() < f64::EPSILON));

        estimator.update(&[0.1], f64::NAN, 2.0);
        assert!(estimator.history(0).is_none());
    }

    #[test]
    fn test_duplicate_time_is_skipped() {
        let mut estimator = SpeedEstimator::default();
        estimator.update(&[0.10], 5000.0, 10.0);
        assert!(!estimator.update(&[0.20], 5000.0, 10.0));
        assert_eq!(estimator.history(0).map(BoundedHistory::len), Some(0));

        // Baseline still the first frame.
        assert!(estimator.update(&[0.11], 5000.0, 11.0));
        assert!((estimator.speed(0) - 180.0).abs() < 1e-6);
    }

    #[test]
    fn test_negative_positions_give_no_sample() {
        let mut estimator = SpeedEstimator::default();
        estimator.update(&[0.1, -1.0], 5000.0, 1.0);
        estimator.update(&[0.2, 0.5], 5000.0, 2.0);

        assert_eq!(estimator.history(0).map(BoundedHistory::len), Some(1));
        assert_eq!(estimator.history(1).map(BoundedHistory::len), Some(0));
        assert!(estimator.speed(1).abs() < f64::EPSILON);
    }

    #[test]
    fn test_non_finite_positions_give_no_sample() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let mut estimator = SpeedEstimator::default();
            estimator.update(&[0.10], 5000.0, 1.0);
            assert!(!estimator.update(&[bad], 5000.0, 2.0));
            assert_eq!(estimator.history(0).map(BoundedHistory::len), Some(0));

            // The bad frame is the next baseline; later clean frames recover.
            let mut position = 0.10;
            for step in 3..12 {
                position += 0.01;
                estimator.update(&[position], 5000.0, f64::from(step));
            }
            let speed = estimator.speed(0);
            assert!(speed.is_finite(), "speed after {bad} = {speed}");
            assert!((speed - 180.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_non_finite_session_time_is_never_a_baseline() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let mut estimator = SpeedEstimator::default();
            assert!(!estimator.update(&[0.10], 5000.0, bad));
            estimator.update(&[0.10], 5000.0, 1.0);
            assert!(!estimator.update(&[0.11], 5000.0, bad));
            assert!(estimator.update(&[0.12], 5000.0, 3.0));

            // 0.02 of 5 km in 2 s.
            assert!((estimator.speed(0) - 180.0).abs() < 1e-6, "after {bad}");
        }
    }

    #[test]
    fn test_time_regression_resets() {
        let mut estimator = SpeedEstimator::default();
        estimator.update(&[0.1], 5000.0, 50.0);
        estimator.update(&[0.2], 5000.0, 51.0);
        assert!(estimator.speed(0) > 0.0);

        assert!(!estimator.update(&[0.5], 5000.0, 5.0));
        assert!(estimator.speed(0).abs() < f64::EPSILON);
        assert_eq!(estimator.history(0).map(BoundedHistory::len), Some(0));
    }

    #[test]
    fn test_car_count_change_rebaselines() {
        let mut estimator = SpeedEstimator::default();
        estimator.update(&[0.1], 5000.0, 1.0);
        assert!(!estimator.update(&[0.2, 0.3], 5000.0, 2.0));
        assert!(estimator.update(&[0.21, 0.31], 5000.0, 3.0));
    }
}
