//! The pulse task on a paused tokio clock.

use std::sync::Arc;
use std::time::Duration;

use pitwall_pitlane::{InMemoryPitLaneStore, PitLaneCalibration};
use pitwall_pulse::{Engine, PulseConfig, PulseError, ThrottlePulse};
use pitwall_test_helpers::prelude::*;
use tracing_test::traced_test;

#[tokio::test(start_paused = true)]
async fn test_ticks_at_configured_rate() -> TestResult {
    let engine = Engine::new(PulseConfig::default())?;
    let pulse = ThrottlePulse::spawn(engine)?;
    pulse.bridge().ingest.push(race_sample(2, 10.0));

    // Ticks at 0, 100, ..., 1000 ms.
    tokio::time::sleep(Duration::from_millis(1050)).await;
    assert_eq!(pulse.latest_snapshot().tick, 11);

    let engine = pulse.shutdown().await?;
    assert_eq!(engine.stats().processed_ticks, 11);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_faster_rate_from_config() -> TestResult {
    let config = PulseConfig::from_yaml_str("tick_rate_hz: 20.0\n")?;
    let pulse = ThrottlePulse::spawn(Engine::new(config)?)?;
    pulse.bridge().ingest.push(race_sample(1, 10.0));

    tokio::time::sleep(Duration::from_millis(525)).await;
    assert_eq!(pulse.latest_snapshot().tick, 11);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_idle_until_first_sample() -> TestResult {
    let pulse = ThrottlePulse::spawn(Engine::new(PulseConfig::default())?)?;

    tokio::time::sleep(Duration::from_millis(350)).await;
    assert_eq!(pulse.latest_snapshot().tick, 0);

    let engine = pulse.shutdown().await?;
    let stats = engine.stats();
    assert_eq!(stats.idle_ticks, 4);
    assert_eq!(stats.processed_ticks, 0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_snapshot_receivers_see_each_tick() -> TestResult {
    let pulse = ThrottlePulse::spawn(Engine::new(PulseConfig::default())?)?;
    let mut snapshots = pulse.snapshots();
    pulse.bridge().ingest.push(race_sample(2, 10.0));

    snapshots.changed().await?;
    let first = snapshots.borrow_and_update().tick;
    snapshots.changed().await?;
    let second = snapshots.borrow_and_update().tick;
    assert_eq!(second, first + 1);

    let throttled = pulse.throttled();
    assert!(throttled.borrow().is_some());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_resets_on_next_tick() -> TestResult {
    let pulse = ThrottlePulse::spawn(Engine::new(PulseConfig::default())?)?;
    pulse.set_sim_running(true);
    pulse.bridge().sessions.push(session_info("219"));
    pulse.bridge().ingest.push(race_sample(2, 10.0));

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(pulse.latest_snapshot().track_id.as_deref(), Some("219"));

    pulse.set_sim_running(false);
    tokio::time::sleep(Duration::from_millis(100)).await;
    let snapshot = pulse.latest_snapshot();
    assert_eq!(snapshot.track_id, None);
    assert!(snapshot.lap_pace.is_empty());

    let engine = pulse.shutdown().await?;
    assert_eq!(engine.stats().resets, 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_persisted_calibration_reaches_snapshot() -> TestResult {
    let store = Arc::new(
        InMemoryPitLaneStore::new()
            .with_track("219", PitLaneCalibration::new(Some(0.92), Some(0.04))),
    );
    let engine = Engine::with_persistence(PulseConfig::default(), store)?;
    let pulse = ThrottlePulse::spawn(engine)?;
    pulse.bridge().sessions.push(session_info("219"));
    pulse.bridge().ingest.push(pit_frame(&[false], &[3], &[0.5]));

    tokio::time::sleep(Duration::from_millis(350)).await;
    let snapshot = pulse.latest_snapshot();
    assert_eq!(snapshot.pit_entry_pct, Some(0.92));
    assert_eq!(snapshot.pit_exit_pct, Some(0.04));
    Ok(())
}

#[tokio::test(start_paused = true)]
#[traced_test]
async fn test_shutdown_logs_and_returns_engine() -> TestResult {
    let pulse = ThrottlePulse::spawn(Engine::new(PulseConfig::default())?)?;
    let handles = pulse.bridge().clone();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let engine = pulse.shutdown().await?;
    assert!(logs_contain("Throttle pulse started"));
    assert!(logs_contain("Throttle pulse stopped"));

    // Bridges keep writing into the returned engine's slot.
    handles.ingest.push(race_sample(1, 1.0));
    assert!(engine.ingest().latest().is_some());
    Ok(())
}

#[test]
fn test_spawn_requires_runtime() -> TestResult {
    let engine = Engine::new(PulseConfig::default())?;
    let err = ThrottlePulse::spawn(engine).err();
    assert!(matches!(err, Some(PulseError::RuntimeUnavailable(_))));
    assert!(
        err.is_some_and(|e| e
            .to_string()
            .starts_with("Throttle pulse requires a tokio runtime: "))
    );
    Ok(())
}
