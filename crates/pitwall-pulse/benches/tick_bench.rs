//! Benchmarks for one engine tick over a full grid.

use criterion::{Criterion, criterion_group, criterion_main};
use pitwall_pulse::{Engine, PulseConfig};
use pitwall_test_helpers::prelude::{must, race_sample, session_info};
use std::hint::black_box;

const GRID: usize = 64;

fn bench_tick_64_cars(c: &mut Criterion) {
    let mut engine = must(Engine::new(PulseConfig::default()));
    engine.sessions().push(session_info("219"));

    // Pre-build a lap of frames so the bench measures ticking, not fixture setup.
    let frames: Vec<_> = (0..900).map(|i| race_sample(GRID, f64::from(i) * 0.1)).collect();
    let mut next = frames.iter().cycle();

    c.bench_function("tick_64_cars", |b| {
        b.iter(|| {
            if let Some(frame) = next.next() {
                engine.ingest().push(frame.clone());
            }
            black_box(engine.tick());
        });
    });
}

fn bench_idle_tick(c: &mut Criterion) {
    let mut engine = must(Engine::new(PulseConfig::default()));

    c.bench_function("idle_tick", |b| {
        b.iter(|| {
            black_box(engine.tick());
        });
    });
}

criterion_group!(benches, bench_tick_64_cars, bench_idle_tick);

criterion_main!(benches);
