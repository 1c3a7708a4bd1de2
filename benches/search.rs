//! Benchmarks for search operations.
//!
//! Benchmark targets:
//! - Query building (embedding, filter, statement rendering): <1ms
//! - In-memory search over 1,000 documents: <20ms
//!
//! These benchmarks run the full store pipeline against the in-process
//! executor:
//! - Query embedding generation
//! - Filter compilation
//! - Statement rendering
//! - Brute-force nearest-neighbour search and row mapping

// Criterion macros generate items without docs - this is expected for benchmarks
// Benchmarks use expect/unwrap for simplicity - panics are acceptable in benchmarks
#![allow(missing_docs)]
#![allow(clippy::expect_used, clippy::unwrap_used)]

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::sync::Arc;
use std::time::Duration;

use surrealvec::embedding::FastEmbedEmbedder;
use surrealvec::storage::executor::InMemoryExecutor;
use surrealvec::{Document, SearchRequest, SurrealVectorStore, VectorStore};

// ============================================================================
// Helper Functions
// ============================================================================

const TOPICS: [&str; 8] = [
    "vector indexes in databases",
    "baking bread at home",
    "rust ownership and borrowing",
    "hiking trails in the alps",
    "distributed consensus protocols",
    "growing tomatoes on a balcony",
    "compilers and parser generators",
    "jazz piano improvisation",
];

/// Creates an in-memory store seeded with `count` documents.
fn seeded_store(count: usize) -> SurrealVectorStore {
    let store = SurrealVectorStore::builder(
        Arc::new(InMemoryExecutor::new()),
        Arc::new(FastEmbedEmbedder::new()),
    )
    .initialize_schema(true)
    .build()
    .expect("Failed to build store");

    let documents: Vec<Document> = (0..count)
        .map(|i| {
            Document::new(format!("{} (note {i})", TOPICS[i % TOPICS.len()]))
                .with_id(format!("doc{i}"))
                .with_metadata("year", 2000 + i64::try_from(i % 25).unwrap())
        })
        .collect();
    store.add_batched(&documents).expect("Failed to seed store");
    store
}

// ============================================================================
// Search Benchmarks
// ============================================================================

fn bench_query_building(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_building");
    let store = seeded_store(0);

    let plain = SearchRequest::new("vector databases");
    let filtered = SearchRequest::new("vector databases")
        .with_filter_text("year >= 2010 && NOT year in [2015, 2016]")
        .expect("valid filter");

    group.bench_function("plain", |b| {
        b.iter(|| store.build_search_query(black_box(&plain)));
    });
    group.bench_function("filtered", |b| {
        b.iter(|| store.build_search_query(black_box(&filtered)));
    });

    group.finish();
}

fn bench_search_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("search_scaling");
    group.measurement_time(Duration::from_secs(10));
    group.sample_size(20);

    for count in [100usize, 1_000] {
        let store = seeded_store(count);
        let request = SearchRequest::new("parsers for compilers").with_top_k(10);

        group.bench_with_input(BenchmarkId::new("similarity_search", count), &request, |b, r| {
            b.iter(|| store.similarity_search(black_box(r)).expect("search"));
        });
    }

    group.finish();
}

fn bench_filtered_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("filtered_search");
    let store = seeded_store(1_000);

    for (name, filter) in [
        ("selective", "year == 2003"),
        ("broad", "year >= 2001"),
        ("membership", "year in [2001, 2002, 2003, 2004]"),
    ] {
        let request = SearchRequest::new("hiking in the mountains")
            .with_filter_text(filter)
            .expect("valid filter");
        group.bench_function(name, |b| {
            b.iter(|| store.similarity_search(black_box(&request)).expect("search"));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_query_building,
    bench_search_scaling,
    bench_filtered_search
);
criterion_main!(benches);
