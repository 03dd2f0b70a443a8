//! Benchmarks for the limited motion profile solver

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use drive_lib::motion::{MotionProfile, MotionQuantity};

// ---------------------------------------------------------------------------
// BENCHES
// ---------------------------------------------------------------------------

struct BenchQty;

impl MotionQuantity for BenchQty {
    const LABEL: &'static str = "bench";
}

fn profile(
    x: f64,
    v: f64,
    target_x: f64,
    max_v: f64,
    max_a: f64,
) -> MotionProfile<BenchQty> {
    let mut p = MotionProfile::<BenchQty>::new();
    p.x = x;
    p.v = v;
    p.target_x = target_x;
    p.max_fwd_v = max_v;
    p.max_rev_v = max_v;
    p.max_a = max_a;
    p
}

/// One solve of each characteristic trajectory shape.
fn bench_advance(c: &mut Criterion) {
    c.bench_function("advance cruise", |b| {
        b.iter(|| {
            let mut p = profile(-1.0, 1.5, 50.0, 3.5, 3.0);
            p.advance(black_box(0.01)).unwrap();
            black_box(p.x)
        })
    });

    c.bench_function("advance overshoot", |b| {
        b.iter(|| {
            let mut p = profile(-0.5, 3.5, 0.5, 3.5, 3.0);
            p.advance(black_box(0.01)).unwrap();
            black_box(p.x)
        })
    });

    c.bench_function("advance overspeed", |b| {
        b.iter(|| {
            let mut p = profile(1.5, -4.0, -2.0, 2.0, 4.0);
            p.advance(black_box(0.01)).unwrap();
            black_box(p.x)
        })
    });
}

/// A sustained run of small ticks, as the control loop produces.
fn bench_tick_stream(c: &mut Criterion) {
    c.bench_function("1000 ticks to target", |b| {
        b.iter(|| {
            let mut p = profile(0.0, 0.0, 10.0, 3.0, 2.0);
            for _ in 0..1000 {
                p.advance(black_box(0.01)).unwrap();
            }
            black_box(p.x)
        })
    });
}

criterion_group!(benches, bench_advance, bench_tick_stream);
criterion_main!(benches);
