//! Criterion benchmarks for the shapefile codec (in-memory encode/decode).
//! Focus sizes: ring length n in {100, 10_000, 100_000}.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use polysimp::geom::{FeatureRecord, ShapeKind};
use polysimp::rand::{draw_ring_radial, RadialCfg, ReplayToken, VertexCount};
use polysimp::shp::{decode, encode};

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("shp");
    for &n in &[100usize, 10_000, 100_000] {
        let cfg = RadialCfg {
            vertex_count: VertexCount::Fixed(n),
            ..RadialCfg::default()
        };
        let ring = draw_ring_radial(cfg, ReplayToken { seed: 44, index: 0 });
        let records = vec![FeatureRecord::polygon(ring, None)];
        group.bench_with_input(BenchmarkId::new("encode_polygon", n), &records, |b, recs| {
            b.iter(|| encode(recs, ShapeKind::Polygon).unwrap())
        });
        let bytes = encode(&records, ShapeKind::Polygon).unwrap().shp;
        group.bench_with_input(BenchmarkId::new("decode_polygon", n), &bytes, |b, bytes| {
            b.iter(|| decode(bytes).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_codec);
criterion_main!(benches);
