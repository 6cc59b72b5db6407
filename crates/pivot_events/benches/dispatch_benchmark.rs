//! # Dispatch Benchmark
//!
//! Per-tick budget: a full cycle posts 14 phase events plus a handful of
//! packet events. Dispatch to a few dozen subscribers must stay in the
//! low microseconds.
//!
//! Run with: `cargo bench --package pivot_events`

// Benchmarks don't need docs
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pivot_events::{Event, EventBus, ModuleRegistry};

struct Probe {
    value: u64,
}

impl Event for Probe {
    const NAME: &'static str = "Bench.Probe";
    const CANCELLABLE: bool = true;
}

/// Benchmark: post with no subscribers (the common case for most hooks).
fn bench_post_empty(c: &mut Criterion) {
    let bus = EventBus::new();
    c.bench_function("post_no_subscribers", |b| {
        b.iter(|| black_box(bus.post(Probe { value: 1 })));
    });
}

/// Benchmark: post to N enabled module subscribers.
fn bench_post_fanout(c: &mut Criterion) {
    let mut group = c.benchmark_group("post_fanout");

    for count in [1_usize, 8, 32, 128] {
        let bus = EventBus::new();
        let registry = ModuleRegistry::new();
        for i in 0..count {
            let module = registry.register(format!("Module{i}")).unwrap();
            module.enable();
            bus.subscribe::<Probe, _>(&module, |e| e.value = e.value.wrapping_add(1));
        }

        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| black_box(bus.post(Probe { value: 0 }).value));
        });
    }

    group.finish();
}

/// Benchmark: half the owners disabled, so half are filtered.
fn bench_post_filtered(c: &mut Criterion) {
    let bus = EventBus::new();
    let registry = ModuleRegistry::new();
    for i in 0..64 {
        let module = registry.register(format!("Module{i}")).unwrap();
        module.set_enabled(i % 2 == 0);
        bus.subscribe::<Probe, _>(&module, |e| e.value += 1);
    }

    c.bench_function("post_64_half_disabled", |b| {
        b.iter(|| black_box(bus.post(Probe { value: 0 }).value));
    });
}

criterion_group!(benches, bench_post_empty, bench_post_fanout, bench_post_filtered);
criterion_main!(benches);
