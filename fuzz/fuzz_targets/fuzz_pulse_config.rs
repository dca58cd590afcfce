//! Fuzzes pulse configuration parsing and validation.
//!
//! Run with:
//!   cargo +nightly fuzz run fuzz_pulse_config
#![no_main]
use libfuzzer_sys::fuzz_target;
use pitwall_pulse::PulseConfig;

fuzz_target!(|data: &[u8]| {
    let Ok(yaml) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(config) = PulseConfig::from_yaml_str(yaml)
        && config.validate().is_ok()
    {
        assert!(config.tick_period().as_nanos() > 0);
        assert!(config.history_window > 0);
    }
});
