//! Fuzzes engine ticks over a stream of arbitrary JSON samples.
//!
//! Input is newline-separated JSON objects; each decodable line is pushed
//! (odd lines as partials) and followed by a tick.
//!
//! Run with:
//!   cargo +nightly fuzz run fuzz_engine_tick
#![no_main]
use libfuzzer_sys::fuzz_target;
use pitwall_pulse::{Engine, PulseConfig};
use pitwall_telemetry::{RawTelemetrySample, SessionInfo};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(mut engine) = Engine::new(PulseConfig::default()) else {
        return;
    };
    engine
        .sessions()
        .push(SessionInfo::for_track("fuzz", "4.2 km"));

    for (i, line) in text.lines().take(64).enumerate() {
        let Ok(sample) = RawTelemetrySample::from_json(line) else {
            continue;
        };
        if i % 2 == 0 {
            engine.ingest().push(sample);
        } else {
            engine.ingest().push_partial(sample);
        }
        let _ = engine.tick();
        if i % 7 == 6 {
            engine.set_sim_running(i % 14 != 13);
        }
    }
});
