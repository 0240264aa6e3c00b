//! Benchmarks for the point-in-polygon join and aggregation.
//!
//! Run with: `cargo bench --bench spatial_join_bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use aquaspatial::crs::Crs;
use aquaspatial::vector::{
    reproject_layer, spatial_join, sum_by_group, Feature, JoinSpec, OverlapPolicy, VectorLayer,
};
use geo::{point, polygon};

/// A `side` x `side` checkerboard of 1-degree square regions.
fn regions(side: usize) -> VectorLayer {
    let mut features = Vec::with_capacity(side * side);
    for i in 0..side {
        for j in 0..side {
            let (x, y) = (i as f64, j as f64);
            let square = polygon![
                (x: x, y: y), (x: x + 1.0, y: y), (x: x + 1.0, y: y + 1.0), (x: x, y: y + 1.0), (x: x, y: y)
            ];
            features.push(Feature::new(square).with_attribute("id", format!("r{i}_{j}").as_str()));
        }
    }
    VectorLayer::new("regions", features, Some(Crs::Geographic))
}

/// Deterministic pseudo-random points covering the regions.
fn points(n: usize, side: usize) -> VectorLayer {
    let features = (0..n)
        .map(|i| {
            let t = i as f64;
            let x = (t * 0.618_033_988_7).fract() * side as f64;
            let y = (t * 0.414_213_562_3).fract() * side as f64;
            Feature::new(point!(x: x, y: y)).with_attribute("pop", (i % 1000) as f64)
        })
        .collect();
    VectorLayer::new("cities", features, Some(Crs::Geographic))
}

fn bench_join(c: &mut Criterion) {
    let mut group = c.benchmark_group("spatial_join");
    let spec = JoinSpec::new("id", OverlapPolicy::FirstMatch);

    for (n_points, side) in [(1_000usize, 10usize), (10_000, 10), (10_000, 30)] {
        let polys = regions(side);
        let pts = points(n_points, side);
        group.bench_with_input(
            BenchmarkId::new("join", format!("{n_points}_points_{}_regions", side * side)),
            &(pts, polys),
            |b, (pts, polys)| b.iter(|| spatial_join(black_box(pts), black_box(polys), &spec)),
        );
    }

    group.finish();
}

fn bench_aggregate(c: &mut Criterion) {
    let spec = JoinSpec::new("id", OverlapPolicy::FirstMatch);
    let records = spatial_join(&points(10_000, 10), &regions(10), &spec).expect("join");

    c.bench_function("sum_by_group_10000", |b| {
        b.iter(|| sum_by_group(black_box(&records), "pop"))
    });
}

fn bench_reproject_layer(c: &mut Criterion) {
    let pts = points(10_000, 10);
    c.bench_function("reproject_10000_points_mollweide", |b| {
        b.iter(|| reproject_layer(black_box(&pts), Crs::Mollweide))
    });
}

criterion_group!(benches, bench_join, bench_aggregate, bench_reproject_layer);
criterion_main!(benches);
