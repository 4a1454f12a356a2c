//! Benchmarks for tile extraction and compositing

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use deepwater_tiling::{composite, extract_tiles, Tile};
use ndarray::Array3;

fn create_scene(size: usize) -> Array3<u8> {
    Array3::from_shape_fn((size, size, 3), |(r, c, b)| ((r * 7 + c * 13 + b) % 256) as u8)
}

fn bench_extract(c: &mut Criterion) {
    let mut group = c.benchmark_group("tiling/extract");
    for size in [512, 1024, 2048] {
        let scene = create_scene(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| extract_tiles(black_box(scene.view()), 64, "scene.tif").count())
        });
    }
    group.finish();
}

fn bench_composite(c: &mut Criterion) {
    let mut group = c.benchmark_group("tiling/composite");
    for size in [512, 1024, 2048] {
        let mask = Array3::from_shape_fn((size, size, 1), |(r, c, _)| ((r + c) % 2) as u8);
        let tiles: Vec<Tile<u8>> = extract_tiles(mask.view(), 64, "scene.tif").collect();
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| composite(black_box(&tiles).iter().map(Tile::patch), 64, (size, size)).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_extract, bench_composite);
criterion_main!(benches);
