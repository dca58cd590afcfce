//! Fuzzes raw sample decoding and typed channel access.
//!
//! Run with:
//!   cargo +nightly fuzz run fuzz_sample_decode
#![no_main]
use libfuzzer_sys::fuzz_target;
use pitwall_telemetry::RawTelemetrySample;
use pitwall_telemetry::channels::{CAR_IDX_LAP_DIST_PCT, CAR_IDX_ON_PIT_ROAD, SESSION_TIME};

fuzz_target!(|data: &[u8]| {
    let Ok(json) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(sample) = RawTelemetrySample::from_json(json) else {
        return;
    };
    let _ = sample.floats(CAR_IDX_LAP_DIST_PCT);
    let _ = sample.bools(CAR_IDX_ON_PIT_ROAD);
    let _ = sample.scalar_f64(SESSION_TIME);
    let _ = sample.merged_with(&sample);
});
