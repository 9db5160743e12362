//! Benchmarks for unit conversion.
//!
//! Run with: cargo bench --package units --bench conversion_benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;
use units::UnitSystem;

fn generate_temperatures(size: usize) -> Vec<f64> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen_range(-40.0..45.0)).collect()
}

// =============================================================================
// CONVERTER LOOKUP
// =============================================================================

fn bench_get_converter(c: &mut Criterion) {
    let units = UnitSystem::new().unwrap();
    let mut group = c.benchmark_group("get_converter");

    group.bench_function("identity", |b| {
        b.iter(|| black_box(units.get_converter(black_box("K"), black_box("K")).unwrap()))
    });
    group.bench_function("degC_to_K", |b| {
        b.iter(|| black_box(units.get_converter(black_box("degC"), black_box("K")).unwrap()))
    });
    group.bench_function("scale_offset", |b| {
        b.iter(|| black_box(units.convert(black_box("degC"), black_box("K")).unwrap()))
    });

    group.finish();
}

// =============================================================================
// BULK CONVERSION
// =============================================================================

fn bench_convert_slice(c: &mut Criterion) {
    let units = UnitSystem::new().unwrap();
    let general = units.get_converter("degC", "degF").unwrap();
    let linear = general.linearized().unwrap();

    let mut group = c.benchmark_group("convert_slice");
    for size in [1_000usize, 100_000, 1_000_000] {
        let data = generate_temperatures(size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("linear", size), &data, |b, data| {
            b.iter(|| {
                let mut values = data.clone();
                linear.convert_slice(&mut values);
                black_box(values)
            })
        });

        if size <= 100_000 {
            group.bench_with_input(BenchmarkId::new("registry", size), &data, |b, data| {
                b.iter(|| {
                    let mut values = data.clone();
                    general.convert_slice(&mut values);
                    black_box(values)
                })
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_get_converter, bench_convert_slice);
criterion_main!(benches);
