//! Vector store integration tests.
//!
//! Runs the store end to end against the in-process executor:
//! - Add/search round trips for every metric and index algorithm
//! - Delete, schema idempotency, and result-count boundaries
//! - Fail-fast `add` versus all-or-nothing `add_batched`
//! - Filters evaluated by the executor match the compiled text

// Integration tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::float_cmp
)]

use serde_json::json;
use std::sync::Arc;
use surrealvec::embedding::FastEmbedEmbedder;
use surrealvec::storage::executor::InMemoryExecutor;
use surrealvec::{
    Algorithm, Distance, Document, DocumentId, Embedder, Error, FilterExpression, SearchRequest,
    SurrealVectorStore, UpsertMode, VectorStore,
};

/// Embedder for stores whose documents and queries carry their own vectors.
struct FixedEmbedder {
    vector: Vec<f32>,
}

impl Embedder for FixedEmbedder {
    fn dimensions(&self) -> usize {
        self.vector.len()
    }

    fn embed(&self, _text: &str) -> surrealvec::Result<Vec<f32>> {
        Ok(self.vector.clone())
    }
}

const QUERY: [f32; 4] = [0.15, 0.25, 0.35, 0.45];

fn corpus() -> Vec<Document> {
    [
        ("d1", [0.1, 0.2, 0.3, 0.4]),
        ("d2", [0.2, 0.1, 0.4, 0.3]),
        ("d3", [0.4, 0.3, 0.2, 0.1]),
        ("d4", [0.3, 0.4, 0.1, 0.2]),
    ]
    .into_iter()
    .enumerate()
    .map(|(i, (id, embedding))| {
        Document::new(format!("document {id}"))
            .with_id(id)
            .with_metadata("rank", i64::try_from(i).unwrap())
            .with_metadata("lang", if i % 2 == 0 { "en" } else { "fr" })
            .with_embedding(embedding.to_vec())
    })
    .collect()
}

fn store_with(
    executor: &Arc<InMemoryExecutor>,
    distance: Distance,
    algorithm: Algorithm,
) -> SurrealVectorStore {
    SurrealVectorStore::builder(
        executor.clone(),
        Arc::new(FixedEmbedder {
            vector: QUERY.to_vec(),
        }),
    )
    .table_name("docs")
    .index_name("docs_embedding")
    .distance(distance)
    .algorithm(algorithm)
    .initialize_schema(true)
    .build()
    .expect("build store")
}

fn ids(results: &[surrealvec::RankedResult]) -> Vec<&str> {
    results.iter().map(|r| r.id.as_str()).collect()
}

#[test]
fn test_cosine_hnsw_scenario() {
    let executor = Arc::new(InMemoryExecutor::new());
    let store = store_with(&executor, Distance::Cosine, Algorithm::Hnsw);
    store.add(&corpus()).expect("add");

    let request = SearchRequest::new("query").with_top_k(2);
    let results = store
        .similarity_search_with_embedding(&QUERY, &request)
        .expect("search");

    assert_eq!(ids(&results), vec!["d1", "d2"]);
    assert!(results[0].score > results[1].score);
    assert!(results[0].score > 0.99);
    assert_eq!(results[0].metadata["distance"], json!(results[0].distance));

    let select = executor
        .executed_queries()
        .pop()
        .expect("search query");
    assert!(select.contains("WHERE embedding <|2,100|> $__embedding ORDER BY __score DESC LIMIT 2"));
    assert!(!select.contains(" AND ("));
}

#[test]
fn test_round_trip_returns_identical_document_first() {
    for (distance, algorithm) in [
        (Distance::Cosine, Algorithm::Hnsw),
        (Distance::Euclidean, Algorithm::Hnsw),
        (Distance::Manhattan, Algorithm::Mtree),
        (Distance::Cosine, Algorithm::Mtree),
    ] {
        let executor = Arc::new(InMemoryExecutor::new());
        let store = store_with(&executor, distance, algorithm);
        store.add(&corpus()).expect("add");

        let target = [0.4, 0.3, 0.2, 0.1];
        let results = store
            .similarity_search_with_embedding(&target, &SearchRequest::new("q"))
            .expect("search");

        assert_eq!(results[0].id.as_str(), "d3", "{distance} {algorithm}");
        assert_eq!(results[0].content, "document d3");
        assert_eq!(results[0].metadata["rank"], json!(2));
        assert!((results[0].score - 1.0).abs() < 1e-6, "{distance}: {}", results[0].score);
        assert!(results[0].distance.abs() < 1e-6);
    }
}

#[test]
fn test_delete_then_search_never_returns_id() {
    let executor = Arc::new(InMemoryExecutor::new());
    let store = store_with(&executor, Distance::Cosine, Algorithm::Hnsw);
    store.add(&corpus()).expect("add");

    store.delete(&[DocumentId::new("d1")]).expect("delete");

    let results = store
        .similarity_search_with_embedding(&QUERY, &SearchRequest::new("q").with_top_k(10))
        .expect("search");
    assert_eq!(results.len(), 3);
    assert!(!ids(&results).contains(&"d1"));
}

#[test]
fn test_ensure_schema_is_idempotent() {
    let executor = Arc::new(InMemoryExecutor::new());
    let store = store_with(&executor, Distance::Cosine, Algorithm::Hnsw);

    store.ensure_schema().expect("second call");
    store.ensure_schema().expect("third call");
    // A second store over the same table defines the same index again.
    let _again = store_with(&executor, Distance::Cosine, Algorithm::Hnsw);

    assert!(executor.has_index("docs_embedding"));
    let defines = executor
        .executed_queries()
        .iter()
        .filter(|q| q.starts_with("DEFINE INDEX IF NOT EXISTS docs_embedding"))
        .count();
    assert_eq!(defines, 4);
}

#[test]
fn test_top_k_one_and_empty_corpus() {
    let executor = Arc::new(InMemoryExecutor::new());
    let store = store_with(&executor, Distance::Cosine, Algorithm::Hnsw);

    let empty = store
        .similarity_search_with_embedding(&QUERY, &SearchRequest::new("q"))
        .expect("search empty corpus");
    assert!(empty.is_empty());

    store.add(&corpus()).expect("add");
    let one = store
        .similarity_search_with_embedding(&QUERY, &SearchRequest::new("q").with_top_k(1))
        .expect("search");
    assert_eq!(ids(&one), vec!["d1"]);
}

#[test]
fn test_filter_restricts_candidates() {
    let executor = Arc::new(InMemoryExecutor::new());
    let store = store_with(&executor, Distance::Cosine, Algorithm::Hnsw);
    store.add(&corpus()).expect("add");

    let request = SearchRequest::new("q")
        .with_top_k(2)
        .with_filter(FilterExpression::eq("lang", "fr"));
    let results = store
        .similarity_search_with_embedding(&QUERY, &request)
        .expect("search");
    assert_eq!(ids(&results), vec!["d2", "d4"]);

    let negated = SearchRequest::new("q")
        .with_top_k(4)
        .with_filter_text("NOT rank in [0, 1] && lang != 'xx'")
        .expect("filter");
    let results = store
        .similarity_search_with_embedding(&QUERY, &negated)
        .expect("search");
    assert_eq!(ids(&results), vec!["d4", "d3"]);

    let select = executor.executed_queries().pop().expect("query");
    assert!(select.contains("AND (rank NOT IN [0,1] AND lang != 'xx')"));
}

#[test]
fn test_ungrouped_mixed_filter_matches_rendered_text() {
    let executor = Arc::new(InMemoryExecutor::new());
    let store = store_with(&executor, Distance::Cosine, Algorithm::Hnsw);
    store.add(&corpus()).expect("add");

    // Built as (fr OR rank 0) AND en, rendered without parentheses.
    let filter = FilterExpression::eq("lang", "fr")
        .or(FilterExpression::eq("rank", 0))
        .and(FilterExpression::eq("lang", "en"));
    let request = SearchRequest::new("q").with_top_k(4).with_filter(filter);
    let results = store
        .similarity_search_with_embedding(&QUERY, &request)
        .expect("search");

    let select = executor.executed_queries().pop().expect("query");
    assert!(select.contains("AND (lang = 'fr' OR rank = 0 AND lang = 'en')"));
    // The text reads as fr OR (rank 0 AND en).
    assert_eq!(ids(&results), vec!["d1", "d2", "d4"]);
}

#[test]
fn test_threshold_drops_low_scores() {
    let executor = Arc::new(InMemoryExecutor::new());
    let store = store_with(&executor, Distance::Cosine, Algorithm::Hnsw);
    store.add(&corpus()).expect("add");

    let request = SearchRequest::new("q")
        .with_top_k(4)
        .with_similarity_threshold(0.9);
    let results = store
        .similarity_search_with_embedding(&QUERY, &request)
        .expect("search");
    assert_eq!(ids(&results), vec!["d1", "d2"]);
    assert!(results.iter().all(|r| r.score >= 0.9));
}

#[test]
fn test_upsert_modes() {
    let executor = Arc::new(InMemoryExecutor::new());
    let embedder = Arc::new(FixedEmbedder {
        vector: QUERY.to_vec(),
    });
    let content = SurrealVectorStore::builder(executor.clone(), embedder.clone())
        .table_name("docs")
        .build()
        .expect("build store");
    let merge = SurrealVectorStore::builder(executor.clone(), embedder)
        .table_name("docs")
        .upsert_mode(UpsertMode::Merge)
        .build()
        .expect("build store");

    content
        .add(&[Document::new("v1").with_id("a").with_metadata("keep", true)])
        .expect("add");
    merge
        .add(&[Document::new("v2").with_id("a").with_metadata("extra", 1)])
        .expect("merge");
    let record = executor.record("docs", "a").expect("record");
    assert_eq!(record["content"], json!("v2"));
    assert_eq!(record["keep"], json!(true));
    assert_eq!(record["extra"], json!(1));

    content.add(&[Document::new("v3").with_id("a")]).expect("replace");
    let record = executor.record("docs", "a").expect("record");
    assert_eq!(record["content"], json!("v3"));
    assert!(record.get("keep").is_none());
}

#[test]
fn test_add_batched_rolls_back_on_failure() {
    /// Reports unknown dimensions so the index is the only length check.
    struct Unchecked;
    impl Embedder for Unchecked {
        fn dimensions(&self) -> usize {
            0
        }
        fn embed(&self, _text: &str) -> surrealvec::Result<Vec<f32>> {
            Ok(QUERY.to_vec())
        }
    }

    let executor = Arc::new(InMemoryExecutor::new());
    let _indexed = store_with(&executor, Distance::Cosine, Algorithm::Hnsw);
    let store = SurrealVectorStore::builder(executor.clone(), Arc::new(Unchecked))
        .table_name("docs")
        .build()
        .expect("build store");

    let documents = vec![
        Document::new("ok").with_id("a"),
        Document::new("short").with_id("b").with_embedding(vec![1.0, 0.0]),
    ];

    let batched = store.add_batched(&documents);
    assert!(matches!(batched, Err(Error::ExecutionFailure { .. })));
    assert_eq!(executor.record_count("docs"), 0);

    let sequential = store.add(&documents);
    assert!(matches!(sequential, Err(Error::ExecutionFailure { .. })));
    assert_eq!(executor.record_count("docs"), 1);
}

#[test]
fn test_embeds_documents_without_vectors() {
    let executor = Arc::new(InMemoryExecutor::new());
    let store = SurrealVectorStore::builder(executor.clone(), Arc::new(FastEmbedEmbedder::new()))
        .table_name("notes")
        .initialize_schema(true)
        .build()
        .expect("build store");

    store
        .add(&[
            Document::new("SurrealDB stores vectors in HNSW indexes").with_id("db"),
            Document::new("Sourdough needs a long, slow rise").with_id("bread"),
        ])
        .expect("add");

    let record = executor.record("notes", "db").expect("record");
    assert_eq!(
        record["embedding"].as_array().map(Vec::len),
        Some(FastEmbedEmbedder::DEFAULT_DIMENSIONS)
    );

    let results = store
        .similarity_search(&SearchRequest::new("SurrealDB HNSW vectors").with_top_k(1))
        .expect("search");
    assert_eq!(ids(&results), vec!["db"]);
}

#[test]
fn test_unsupported_filter_fails_before_execution() {
    let executor = Arc::new(InMemoryExecutor::new());
    let store = store_with(&executor, Distance::Cosine, Algorithm::Hnsw);
    let executed = executor.executed_queries().len();

    let request = SearchRequest::new("q").with_filter(
        FilterExpression::eq("a", 1)
            .and(FilterExpression::eq("b", 2))
            .not(),
    );
    let result = store.similarity_search(&request);

    assert!(matches!(result, Err(Error::UnsupportedOperator { .. })));
    assert_eq!(executor.executed_queries().len(), executed);
}
