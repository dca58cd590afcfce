//! Fuzzes every estimator's update entry point with arbitrary channel data.
//!
//! Run with:
//!   cargo +nightly fuzz run fuzz_estimators
#![no_main]
use libfuzzer_sys::fuzz_target;
use pitwall_estimators::{LapPaceEstimator, PitLapTracker, SpeedEstimator};
use pitwall_pitlane::PitLaneCalibrator;
use pitwall_telemetry::SessionState;

fn floats(bytes: &[u8]) -> Vec<f64> {
    bytes
        .chunks_exact(8)
        .map(|chunk| {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(chunk);
            f64::from_le_bytes(raw)
        })
        .collect()
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }
    let (header, body) = data.split_at(4);
    let cars = usize::from(header.first().copied().unwrap_or(0) % 66);
    let state = SessionState::from(i32::from(header.get(1).copied().unwrap_or(0) % 8));

    let mut pace = LapPaceEstimator::default();
    let mut speed = SpeedEstimator::default();
    let mut pit_laps = PitLapTracker::default();
    let mut calibrator = PitLaneCalibrator::default();
    calibrator.set_track(Some("fuzz"));

    for (frame, chunk) in body.chunks(cars.max(1) * 8 + 8).enumerate() {
        let values = floats(chunk);
        let (time, positions) = values.split_first().map_or((0.0, &[][..]), |(t, p)| (*t, p));
        let on_pit: Vec<bool> = chunk.iter().map(|b| b & 1 == 1).take(cars).collect();
        let surfaces: Vec<i32> = chunk.iter().map(|b| i32::from(*b % 6) - 1).take(cars).collect();
        let laps: Vec<i32> = chunk.iter().map(|b| i32::from(*b)).take(cars).collect();

        pace.update(positions);
        speed.update(positions, 5000.0, time);
        pit_laps.update(&on_pit, &laps, (frame % 3) as i32, time, &surfaces, state);
        calibrator.detect_transitions(&on_pit, &surfaces, positions);

        for car in 0..cars {
            let _ = speed.speed(car);
            let _ = pace.average_lap_time(car, None);
            let _ = pit_laps.pit_stop_duration(car);
        }
    }
});
