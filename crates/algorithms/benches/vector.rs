//! Benchmarks for the vector pipeline stages

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use geo::Point;
use svcarea_algorithms::vector::{buffer, reproject, union, BufferParams};
use svcarea_core::{Feature, FeatureCollection, CRS};

/// A jittered grid of points in Illinois East (US feet).
fn create_points(count: usize, spacing: f64) -> FeatureCollection {
    let side = (count as f64).sqrt().ceil() as usize;
    let features = (0..count)
        .map(|i| {
            let (row, col) = (i / side, i % side);
            let jitter = ((row * 7 + col * 13) % 100) as f64;
            Feature::new(Point::new(
                1_100_000.0 + col as f64 * spacing + jitter,
                1_850_000.0 + row as f64 * spacing - jitter,
            ))
        })
        .collect();
    FeatureCollection::new(CRS::from_epsg(3435), features)
}

fn bench_buffer(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer");

    for count in [100, 1_000, 10_000].iter() {
        let points = create_points(*count, 2_000.0);
        let params = BufferParams::new(5280.0);

        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, _| {
            b.iter(|| buffer(black_box(&points), &params).unwrap())
        });
    }

    group.finish();
}

fn bench_union(c: &mut Criterion) {
    let mut group = c.benchmark_group("union");
    group.sample_size(10);

    for count in [16, 64, 256].iter() {
        let buffers = buffer(&create_points(*count, 4_000.0), &BufferParams::new(2640.0)).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, _| {
            b.iter(|| union(black_box(&buffers)).unwrap())
        });
    }

    group.finish();
}

fn bench_reproject(c: &mut Criterion) {
    let points = create_points(10_000, 500.0);
    let target = CRS::wgs84();

    c.bench_function("reproject_10k_to_wgs84", |b| {
        b.iter(|| reproject(black_box(&points), &target).unwrap())
    });
}

criterion_group!(benches, bench_buffer, bench_union, bench_reproject);
criterion_main!(benches);
