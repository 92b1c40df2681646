#![allow(clippy::expect_used, clippy::unwrap_used, missing_docs)]
//! Benchmark for plot resolution and rasterization.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use trueno_plot::prelude::*;

fn dataset(size: usize) -> Arc<DataFrame> {
    let days = ["thu", "fri", "sat", "sun"];
    let total: Vec<f64> = (0..size)
        .map(|i| {
            let x = i as f64 / size as f64;
            (x * std::f64::consts::TAU).sin() * 20.0 + 30.0 + (i % 13) as f64
        })
        .collect();
    let tip: Vec<f64> = total.iter().enumerate().map(|(i, t)| t * 0.15 + (i % 7) as f64 * 0.1).collect();
    Arc::new(
        DataFrame::new()
            .with_column("day", (0..size).map(|i| days[i % days.len()]))
            .unwrap()
            .with_column("smoker", (0..size).map(|i| if i % 3 == 0 { "yes" } else { "no" }))
            .unwrap()
            .with_column("total", total)
            .unwrap()
            .with_column("tip", tip)
            .unwrap(),
    )
}

fn resolve_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");

    for size in [100, 1_000, 10_000] {
        let data = dataset(size);

        group.bench_with_input(BenchmarkId::new("count_dodge", size), &size, |b, _| {
            let plot = Plot::from_data(Arc::clone(&data))
                .var("x", "day")
                .var("color", "smoker")
                .add(Layer::new(Bar::new()).stat(Count::new()).with_move(Dodge::new()));
            b.iter(|| black_box(&plot).plot().unwrap());
        });

        group.bench_with_input(BenchmarkId::new("faceted_scatter", size), &size, |b, _| {
            let plot = Plot::from_data(Arc::clone(&data))
                .var("x", "total")
                .var("y", "tip")
                .var("color", "smoker")
                .facet(Facet::new().col("day"))
                .unwrap()
                .add(Layer::new(Dot::new()));
            b.iter(|| black_box(&plot).plot().unwrap());
        });
    }

    group.finish();
}

fn render_benchmark(c: &mut Criterion) {
    let plotter = Plot::from_data(dataset(1_000))
        .var("x", "total")
        .var("y", "tip")
        .add(Layer::new(Dot::new()))
        .add(Layer::new(Line::new()))
        .plot()
        .unwrap();

    c.bench_function("render_png_96dpi", |b| b.iter(|| plotter.to_png(black_box(96.0)).unwrap()));
}

criterion_group!(benches, resolve_benchmark, render_benchmark);
criterion_main!(benches);
