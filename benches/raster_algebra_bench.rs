//! Benchmarks for raster algebra.
//!
//! Run with: `cargo bench --bench raster_algebra_bench`
//!
//! Add `--features parallel` to compare the rayon cell loops.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use aquaspatial::crs::Crs;
use aquaspatial::raster::{
    combine, mask, reclassify, CombineOp, GridGeometry, NoDataPolicy, RasterGrid, RasterStack,
    ReclassTable, Reprojector, ResamplingMethod,
};
use aquaspatial::vector::{Feature, VectorLayer};
use geo::polygon;

/// Synthetic SST field in Kelvin over a 1-degree box, with scattered no data.
fn sst_grid(n: usize, phase: f64) -> RasterGrid {
    let geometry = GridGeometry::new(-125.0, 50.0, 1.0 / n as f64, 1.0 / n as f64, n, n, Some(Crs::Geographic))
        .expect("valid geometry");
    let values = (0..n * n)
        .map(|i| {
            if i % 97 == 0 {
                None
            } else {
                let t = i as f64 * 0.001 + phase;
                Some(283.0 + 8.0 * t.sin())
            }
        })
        .collect();
    RasterGrid::new(geometry, values).expect("matching value count")
}

fn bench_cell_algebra(c: &mut Criterion) {
    let mut group = c.benchmark_group("cell_algebra");
    let table = ReclassTable::window(285.15, 291.15, 1.0).expect("valid window");

    for n in [128usize, 512, 1024] {
        let a = sst_grid(n, 0.0);
        let b = sst_grid(n, 0.7);

        group.bench_with_input(BenchmarkId::new("reclassify", format!("{n}x{n}")), &a, |bench, a| {
            bench.iter(|| reclassify(black_box(a), black_box(&table)))
        });

        group.bench_with_input(
            BenchmarkId::new("multiply", format!("{n}x{n}")),
            &(a.clone(), b.clone()),
            |bench, (a, b)| bench.iter(|| combine(black_box(a), black_box(b), CombineOp::Multiply)),
        );

        let stack = RasterStack::new(vec![a.clone(), b.clone(), sst_grid(n, 1.3)]).expect("aligned");
        group.bench_with_input(BenchmarkId::new("stack_mean", format!("{n}x{n}")), &stack, |bench, s| {
            bench.iter(|| s.mean(black_box(NoDataPolicy::Skip)))
        });
    }

    group.finish();
}

fn bench_mask(c: &mut Criterion) {
    let mut group = c.benchmark_group("mask");
    let boundary = VectorLayer::new(
        "eez",
        vec![Feature::new(polygon![
            (x: -125.0, y: 49.0), (x: -124.2, y: 49.1), (x: -124.5, y: 49.6),
            (x: -124.1, y: 49.9), (x: -125.0, y: 50.0), (x: -125.0, y: 49.0)
        ])],
        Some(Crs::Geographic),
    );

    for n in [128usize, 512] {
        let grid = sst_grid(n, 0.0);
        group.bench_with_input(BenchmarkId::new("polygon", format!("{n}x{n}")), &grid, |bench, g| {
            bench.iter(|| mask(black_box(g), black_box(&boundary)))
        });
    }

    group.finish();
}

fn bench_reproject(c: &mut Criterion) {
    let mut group = c.benchmark_group("reproject");
    group.sample_size(20);

    let grid = sst_grid(256, 0.0);
    for method in [ResamplingMethod::NearestNeighbor, ResamplingMethod::Bilinear] {
        group.bench_with_input(
            BenchmarkId::new("to_utm10", format!("{method:?}")),
            &method,
            |bench, &m| {
                bench.iter(|| {
                    Reprojector::new(black_box(&grid), m)
                        .to_crs(Crs::Utm { zone: 10, northern: true })
                        .run()
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_cell_algebra, bench_mask, bench_reproject);
criterion_main!(benches);
