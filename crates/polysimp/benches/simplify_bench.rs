//! Criterion benchmarks for Douglas–Peucker on jagged rings.
//! Focus sizes: n in {100, 1_000, 10_000, 100_000}.
//! Results: by default under target/criterion.

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use polysimp::rand::{draw_ring_radial, RadialCfg, ReplayToken, VertexCount};
use polysimp::simplify::simplify;

fn jagged(n: usize, seed: u64) -> polysimp::geom::Ring {
    let cfg = RadialCfg {
        vertex_count: VertexCount::Fixed(n),
        radial_jitter: 0.02,
        ..RadialCfg::default()
    };
    draw_ring_radial(cfg, ReplayToken { seed, index: 0 })
}

fn bench_simplify(c: &mut Criterion) {
    let mut group = c.benchmark_group("simplify");
    for &n in &[100usize, 1_000, 10_000, 100_000] {
        for &t in &[0.001f64, 0.01] {
            group.bench_with_input(BenchmarkId::new(format!("tol_{t}"), n), &n, |b, &n| {
                b.iter_batched(
                    || jagged(n, 43),
                    |ring| {
                        let _s = simplify(&ring, t).unwrap();
                    },
                    BatchSize::LargeInput,
                )
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_simplify);
criterion_main!(benches);
