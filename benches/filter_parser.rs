//! Benchmarks for filter parsing and compilation.
//!
//! Benchmark targets:
//! - Simple filter parsing: <10us
//! - Complex filter parsing: <50us
//! - Compiling a parsed filter to SurrealQL: <10us

// Criterion macros generate items without docs - this is expected for benchmarks
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use std::time::Duration;

use surrealvec::FilterConverter;
use surrealvec::services::parse_filter_expression;
use surrealvec::storage::surrealql::SurrealFilterConverter;

// ============================================================================
// Filter Parser Benchmarks
// ============================================================================

/// Sample filters of varying complexity.
const SIMPLE_FILTER: &str = "genre == 'drama'";
const MEDIUM_FILTER: &str = "genre == 'drama' && year >= 2020 && lang in ['en', 'fr']";
const COMPLEX_FILTER: &str = "(genre == 'drama' || genre == 'thriller') && year >= 2020 \
    && NOT lang in ['de', 'it', 'es'] && meta.rating > 4.5 && (studio != 'none' || indie == true)";

fn bench_filter_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_parsing");
    group.measurement_time(Duration::from_secs(5));

    for (name, filter) in [
        ("simple", SIMPLE_FILTER),
        ("medium", MEDIUM_FILTER),
        ("complex", COMPLEX_FILTER),
    ] {
        group.bench_function(name, |b| {
            b.iter(|| parse_filter_expression(black_box(filter)));
        });
    }

    group.finish();
}

fn bench_filter_compilation(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_compilation");
    let converter = SurrealFilterConverter::new();

    for (name, filter) in [
        ("simple", SIMPLE_FILTER),
        ("medium", MEDIUM_FILTER),
        ("complex", COMPLEX_FILTER),
    ] {
        let Ok(expression) = parse_filter_expression(filter) else {
            continue;
        };
        group.bench_function(name, |b| {
            b.iter(|| converter.convert(black_box(&expression)));
        });
    }

    group.finish();
}

fn bench_chain_length(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_chain_length");
    let converter = SurrealFilterConverter::new();

    for terms in [1usize, 8, 32, 128] {
        let filter = (0..terms)
            .map(|i| format!("field_{i} == {i}"))
            .collect::<Vec<_>>()
            .join(" && ");

        group.throughput(Throughput::Elements(terms as u64));
        group.bench_with_input(BenchmarkId::new("parse_and_compile", terms), &filter, |b, f| {
            b.iter(|| {
                parse_filter_expression(black_box(f)).and_then(|expr| converter.convert(&expr))
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_filter_parsing,
    bench_filter_compilation,
    bench_chain_length
);
criterion_main!(benches);
