//! SurrealDB vector store.
//!
//! Documents live in one table, one record per document keyed by the document
//! id. Each record holds the content field, the embedding field and the
//! document metadata as top-level fields. Searches bind the query vector to a
//! parameter and rank with the nearest-neighbour operator:
//!
//! ```text
//! LET $__embedding = [0.1,0.2,0.3];
//! SELECT *, vector::similarity::cosine(embedding, $__embedding) AS __score,
//!     vector::distance::knn() AS __distance OMIT embedding
//!     FROM surrealvec_embedding
//!     WHERE embedding <|4,100|> $__embedding AND (year >= 2020)
//!     ORDER BY __score DESC LIMIT 4;
//! ```
//!
//! # Scores
//!
//! With `COSINE` the score is the cosine similarity. Other metrics score
//! `1 / (1 + distance)`, which keeps the ranking but is not a normalized
//! similarity, so thresholds are not comparable across metrics.

use super::row::{DISTANCE_COLUMN, RowMapper, SCORE_COLUMN};
use crate::config::VectorStoreConfig;
use crate::embedding::{BatchingStrategy, Embedder, TokenCountBatchingStrategy};
use crate::models::{
    DISTANCE_METADATA_KEY, Document, DocumentId, RankedResult, SIMILARITY_THRESHOLD_ACCEPT_ALL,
    SearchRequest,
};
use crate::storage::surrealql::{
    Algorithm, CompiledFilter, DefineIndexStatement, Distance, Ident, KnnCondition, LetStatement,
    OrderBy, Param, Projection, Query, RecordId, ScoreExpr, SelectStatement, Statement,
    SurrealFilterConverter, UpsertMode, VectorType, WhereClause, f32_to_json,
};
use crate::storage::traits::{FilterConverter, QueryExecutor, VectorStore};
use crate::{Error, Result};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

/// Parameter the query vector is bound to.
const QUERY_PARAM: &str = "__embedding";

/// Record fields metadata may not overwrite, besides the content and embedding fields.
const RESERVED_FIELDS: &[&str] = &["id"];

/// Metadata keys the search projection and row mapping would overwrite.
const RESULT_FIELDS: &[&str] = &[SCORE_COLUMN, DISTANCE_COLUMN, DISTANCE_METADATA_KEY];

/// A vector store over a SurrealDB table and vector index.
///
/// Built with [`SurrealVectorStore::builder`]. A built store has a valid
/// configuration and, when schema initialization is enabled, an index.
pub struct SurrealVectorStore {
    executor: Arc<dyn QueryExecutor>,
    embedder: Arc<dyn Embedder>,
    batching_strategy: Arc<dyn BatchingStrategy>,
    filter_converter: Arc<dyn FilterConverter>,
    index: Ident,
    table: Ident,
    content_field: Ident,
    embedding_field: Ident,
    vector_type: VectorType,
    distance: Distance,
    algorithm: Algorithm,
    ef: usize,
    upsert_mode: UpsertMode,
    initialize_schema: bool,
    efc: Option<usize>,
    m: Option<usize>,
    row_mapper: RowMapper,
}

impl SurrealVectorStore {
    /// Starts building a store over `executor`, embedding with `embedder`.
    #[must_use]
    pub fn builder(
        executor: Arc<dyn QueryExecutor>,
        embedder: Arc<dyn Embedder>,
    ) -> SurrealVectorStoreBuilder {
        SurrealVectorStoreBuilder {
            executor,
            embedder,
            batching_strategy: None,
            filter_converter: None,
            config: VectorStoreConfig::default(),
        }
    }

    /// Name of the vector index.
    #[must_use]
    pub fn index_name(&self) -> &str {
        self.index.as_str()
    }

    /// Table holding the documents.
    #[must_use]
    pub fn table_name(&self) -> &str {
        self.table.as_str()
    }

    /// Field holding the document text.
    #[must_use]
    pub fn content_field_name(&self) -> &str {
        self.content_field.as_str()
    }

    /// Field holding the embedding.
    #[must_use]
    pub fn embedding_field_name(&self) -> &str {
        self.embedding_field.as_str()
    }

    /// Index algorithm.
    #[must_use]
    pub const fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Distance metric.
    #[must_use]
    pub const fn distance(&self) -> Distance {
        self.distance
    }

    /// Element type of stored vectors.
    #[must_use]
    pub const fn vector_type(&self) -> VectorType {
        self.vector_type
    }

    /// HNSW search breadth.
    #[must_use]
    pub const fn ef(&self) -> usize {
        self.ef
    }

    /// Upsert mode.
    #[must_use]
    pub const fn upsert_mode(&self) -> UpsertMode {
        self.upsert_mode
    }

    /// Whether the index is defined when the store is built.
    #[must_use]
    pub const fn initialize_schema(&self) -> bool {
        self.initialize_schema
    }

    /// Inserts or replaces documents in one transaction.
    ///
    /// Unlike [`VectorStore::add`], either every document is written or none is.
    ///
    /// # Errors
    ///
    /// Returns an error if a document is invalid, embedding fails, or the
    /// transaction fails.
    #[instrument(skip(self, documents), fields(operation = "store.add_batched", count = documents.len()))]
    pub fn add_batched(&self, documents: &[Document]) -> Result<()> {
        if documents.is_empty() {
            return Ok(());
        }
        let start = Instant::now();
        let result = (|| {
            let statements = self
                .prepare_records(documents)?
                .into_iter()
                .map(|(target, data)| Statement::upsert(target, self.upsert_mode, data));
            let query = Query::transaction(statements);
            tracing::debug!(query = %query, "Submitting batched upsert");
            self.executor.execute(&query)?.check()
        })();

        record_write_metrics("add_batched", documents.len(), &result, start);
        result
    }

    /// Runs a search with a precomputed query embedding.
    ///
    /// # Errors
    ///
    /// Returns an error if the request or embedding is invalid, the filter
    /// cannot be compiled, execution fails, or the result set is malformed.
    #[instrument(skip(self, embedding, request), fields(operation = "store.search", top_k = request.top_k))]
    pub fn similarity_search_with_embedding(
        &self,
        embedding: &[f32],
        request: &SearchRequest,
    ) -> Result<Vec<RankedResult>> {
        let start = Instant::now();
        let result = self.search_with_embedding(embedding, request);

        let status = if result.is_ok() { "success" } else { "error" };
        metrics::counter!(
            "surrealvec_search_total",
            "distance" => self.distance.as_str(),
            "status" => status
        )
        .increment(1);
        metrics::histogram!("surrealvec_search_duration_ms")
            .record(start.elapsed().as_secs_f64() * 1000.0);
        if let Ok(results) = &result {
            metrics::histogram!("surrealvec_search_results").record(results.len() as f64);
        }

        result
    }

    /// Builds the `LET` + `SELECT` query for `request`, embedding its query text.
    ///
    /// Nothing is executed.
    ///
    /// # Errors
    ///
    /// Returns an error if the request is invalid, embedding fails, or the
    /// filter cannot be compiled.
    pub fn build_search_query(&self, request: &SearchRequest) -> Result<Query> {
        request.validate()?;
        let embedding = self.embedder.embed(&request.query)?;
        self.build_search_query_with_embedding(&embedding, request)
    }

    /// Builds the `LET` + `SELECT` query for `request` and a query embedding.
    ///
    /// # Errors
    ///
    /// Returns an error if the request or embedding is invalid, or the filter
    /// cannot be compiled.
    pub fn build_search_query_with_embedding(
        &self,
        embedding: &[f32],
        request: &SearchRequest,
    ) -> Result<Query> {
        request.validate()?;
        self.check_dimensions(embedding, "query embedding")?;

        let filter = request
            .filter
            .as_ref()
            .map(|expression| {
                self.filter_converter
                    .convert(expression)
                    .map(|text| CompiledFilter {
                        expression: expression.clone(),
                        text,
                    })
            })
            .transpose()?;

        let param = Param::new(Ident::new(QUERY_PARAM)?);
        let score = match self.distance {
            Distance::Cosine => ScoreExpr::CosineSimilarity {
                field: self.embedding_field.clone(),
                param: param.clone(),
            },
            Distance::Euclidean | Distance::Manhattan => ScoreExpr::InverseKnnDistance,
        };
        let knn = KnnCondition {
            field: self.embedding_field.clone(),
            k: request.top_k,
            ef: (self.algorithm == Algorithm::Hnsw).then_some(self.ef),
            param: param.clone(),
        };
        let score_alias = Ident::new(SCORE_COLUMN)?;

        let select = SelectStatement {
            projections: vec![
                Projection::All,
                Projection::Expr {
                    expr: score,
                    alias: score_alias.clone(),
                },
                Projection::Expr {
                    expr: ScoreExpr::KnnDistance,
                    alias: Ident::new(DISTANCE_COLUMN)?,
                },
            ],
            omit: vec![self.embedding_field.clone()],
            from: self.table.clone(),
            condition: Some(WhereClause {
                knn: Some(knn),
                filter,
            }),
            order_by: Some(OrderBy {
                field: score_alias,
                descending: true,
            }),
            limit: Some(request.top_k),
        };

        Ok(Query::new()
            .with(Statement::Let(LetStatement {
                param,
                vector: embedding.to_vec(),
            }))
            .with(Statement::Select(select)))
    }

    /// Returns the `DEFINE INDEX IF NOT EXISTS` statement for this store.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SchemaInitFailure`] if the embedder does not report
    /// its dimensions.
    pub fn define_index_statement(&self) -> Result<DefineIndexStatement> {
        let dimension = self.embedder.dimensions();
        if dimension == 0 {
            return Err(self.schema_failure("embedder does not report its dimensions"));
        }
        let hnsw = self.algorithm == Algorithm::Hnsw;
        Ok(DefineIndexStatement {
            if_not_exists: true,
            name: self.index.clone(),
            table: self.table.clone(),
            field: self.embedding_field.clone(),
            algorithm: self.algorithm,
            dimension,
            distance: self.distance,
            vector_type: self.vector_type,
            efc: self.efc.filter(|_| hnsw),
            m: self.m.filter(|_| hnsw),
        })
    }

    /// Defines the vector index if schema initialization is enabled.
    ///
    /// Safe to call repeatedly.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SchemaInitFailure`] if the index cannot be defined.
    #[instrument(skip(self), fields(operation = "store.ensure_schema", index = %self.index))]
    pub fn ensure_schema(&self) -> Result<()> {
        if !self.initialize_schema {
            tracing::debug!("Schema initialization disabled");
            return Ok(());
        }

        let result = (|| {
            let statement = self.define_index_statement()?;
            let query = Query::from(Statement::DefineIndex(statement));
            tracing::debug!(query = %query, "Defining vector index");
            self.executor
                .execute(&query)
                .and_then(|response| response.check())
                .map_err(|e| self.schema_failure(&e.to_string()))
        })();

        let status = if result.is_ok() { "success" } else { "error" };
        metrics::counter!("surrealvec_schema_init_total", "status" => status).increment(1);
        match &result {
            Ok(()) => tracing::info!(table = %self.table, "Vector index ready"),
            Err(e) => tracing::error!(error = %e, "Vector index initialization failed"),
        }
        result
    }

    fn search_with_embedding(
        &self,
        embedding: &[f32],
        request: &SearchRequest,
    ) -> Result<Vec<RankedResult>> {
        let query = self.build_search_query_with_embedding(embedding, request)?;
        tracing::debug!(query = %query, "Submitting similarity search");

        let mut response = self.executor.execute(&query)?;
        let rows = response.take(1)?;
        let mut results = self.row_mapper.map_rows(rows)?;

        // The accept-all floor keeps rows with negative cosine similarity.
        if request.similarity_threshold > SIMILARITY_THRESHOLD_ACCEPT_ALL {
            results.retain(|r| r.score >= request.similarity_threshold);
        }
        results.truncate(request.top_k);
        Ok(results)
    }

    /// Validates documents and assembles one record body per document, in order.
    fn prepare_records(&self, documents: &[Document]) -> Result<Vec<(RecordId, Map<String, Value>)>> {
        for document in documents {
            self.check_metadata_keys(document)?;
        }

        let missing: Vec<&Document> = documents.iter().filter(|d| d.embedding.is_none()).collect();
        let computed = if missing.is_empty() {
            Vec::new()
        } else {
            tracing::debug!(count = missing.len(), "Embedding documents");
            self.embedder
                .embed_documents(&missing, self.batching_strategy.as_ref())?
        };
        let mut computed = computed.into_iter();

        documents
            .iter()
            .map(|document| {
                let embedding = match &document.embedding {
                    Some(embedding) => embedding.clone(),
                    None => computed.next().ok_or_else(|| {
                        Error::Embedding("embedder returned too few embeddings".to_string())
                    })?,
                };
                self.check_dimensions(&embedding, &format!("embedding of document '{}'", document.id))?;

                let mut data = Map::new();
                data.insert(
                    self.content_field.as_str().to_string(),
                    Value::String(document.content.clone()),
                );
                data.insert(
                    self.embedding_field.as_str().to_string(),
                    Value::Array(embedding.into_iter().map(f32_to_json).collect()),
                );
                for (key, value) in &document.metadata {
                    data.insert(key.clone(), value.clone());
                }

                Ok((RecordId::new(self.table.clone(), document.id.as_str()), data))
            })
            .collect()
    }

    fn check_metadata_keys(&self, document: &Document) -> Result<()> {
        let reserved = [self.content_field.as_str(), self.embedding_field.as_str()];
        match document.metadata.keys().find(|k| {
            let key = k.as_str();
            RESERVED_FIELDS.contains(&key) || RESULT_FIELDS.contains(&key) || reserved.contains(&key)
        }) {
            Some(key) => Err(Error::InvalidInput(format!(
                "metadata key '{key}' of document '{}' collides with a record field",
                document.id
            ))),
            None => Ok(()),
        }
    }

    fn check_dimensions(&self, embedding: &[f32], what: &str) -> Result<()> {
        if embedding.is_empty() {
            return Err(Error::InvalidInput(format!("{what} is empty")));
        }
        if let Some(index) = embedding.iter().position(|v| !v.is_finite()) {
            return Err(Error::InvalidInput(format!(
                "{what} has a non-finite value at index {index}"
            )));
        }
        let expected = self.embedder.dimensions();
        if expected > 0 && embedding.len() != expected {
            return Err(Error::InvalidInput(format!(
                "{what} has {} dimensions, expected {expected}",
                embedding.len()
            )));
        }
        Ok(())
    }

    fn schema_failure(&self, cause: &str) -> Error {
        Error::SchemaInitFailure {
            index: self.index.as_str().to_string(),
            cause: cause.to_string(),
        }
    }
}

impl VectorStore for SurrealVectorStore {
    #[instrument(skip(self, documents), fields(operation = "store.add", count = documents.len()))]
    fn add(&self, documents: &[Document]) -> Result<()> {
        if documents.is_empty() {
            return Ok(());
        }
        let start = Instant::now();
        let result = (|| {
            for (target, data) in self.prepare_records(documents)? {
                tracing::debug!(target = %target, "Upserting document");
                self.executor.upsert(target, self.upsert_mode, data)?;
            }
            Ok(())
        })();

        record_write_metrics("add", documents.len(), &result, start);
        result
    }

    #[instrument(skip(self, ids), fields(operation = "store.delete", count = ids.len()))]
    fn delete(&self, ids: &[DocumentId]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let start = Instant::now();
        let targets = ids
            .iter()
            .map(|id| RecordId::new(self.table.clone(), id.as_str()))
            .collect();
        let result = self.executor.delete(targets);

        let status = if result.is_ok() { "success" } else { "error" };
        metrics::counter!("surrealvec_documents_deleted_total", "status" => status)
            .increment(ids.len() as u64);
        metrics::histogram!("surrealvec_write_duration_ms", "operation" => "delete")
            .record(start.elapsed().as_secs_f64() * 1000.0);
        result
    }

    #[instrument(skip(self, request), fields(operation = "store.similarity_search", top_k = request.top_k))]
    fn similarity_search(&self, request: &SearchRequest) -> Result<Vec<RankedResult>> {
        request.validate()?;
        let embedding = self.embedder.embed(&request.query)?;
        self.similarity_search_with_embedding(&embedding, request)
    }
}

fn record_write_metrics(operation: &'static str, count: usize, result: &Result<()>, start: Instant) {
    let status = if result.is_ok() { "success" } else { "error" };
    metrics::counter!(
        "surrealvec_documents_upserted_total",
        "operation" => operation,
        "status" => status
    )
    .increment(count as u64);
    metrics::histogram!("surrealvec_write_duration_ms", "operation" => operation)
        .record(start.elapsed().as_secs_f64() * 1000.0);
}

/// Builder for [`SurrealVectorStore`].
///
/// Blank names and a zero `ef` are ignored, keeping the previous value.
pub struct SurrealVectorStoreBuilder {
    executor: Arc<dyn QueryExecutor>,
    embedder: Arc<dyn Embedder>,
    batching_strategy: Option<Arc<dyn BatchingStrategy>>,
    filter_converter: Option<Arc<dyn FilterConverter>>,
    config: VectorStoreConfig,
}

impl SurrealVectorStoreBuilder {
    /// Replaces every store setting with `config`.
    #[must_use]
    pub fn config(mut self, config: VectorStoreConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the index name.
    #[must_use]
    pub fn index_name(mut self, name: impl Into<String>) -> Self {
        set_name(&mut self.config.index_name, name.into());
        self
    }

    /// Sets the table name.
    #[must_use]
    pub fn table_name(mut self, name: impl Into<String>) -> Self {
        set_name(&mut self.config.table_name, name.into());
        self
    }

    /// Sets the content field.
    #[must_use]
    pub fn content_field_name(mut self, name: impl Into<String>) -> Self {
        set_name(&mut self.config.content_field_name, name.into());
        self
    }

    /// Sets the embedding field.
    #[must_use]
    pub fn embedding_field_name(mut self, name: impl Into<String>) -> Self {
        set_name(&mut self.config.embedding_field_name, name.into());
        self
    }

    /// Sets the vector element type.
    #[must_use]
    pub const fn vector_type(mut self, vector_type: VectorType) -> Self {
        self.config.vector_type = vector_type;
        self
    }

    /// Sets the distance metric.
    #[must_use]
    pub const fn distance(mut self, distance: Distance) -> Self {
        self.config.distance = distance;
        self
    }

    /// Sets the index algorithm.
    #[must_use]
    pub const fn algorithm(mut self, algorithm: Algorithm) -> Self {
        self.config.algorithm = algorithm;
        self
    }

    /// Sets the HNSW search breadth. Zero is ignored.
    #[must_use]
    pub const fn ef(mut self, ef: usize) -> Self {
        if ef > 0 {
            self.config.ef = ef;
        }
        self
    }

    /// Sets the upsert mode.
    #[must_use]
    pub const fn upsert_mode(mut self, mode: UpsertMode) -> Self {
        self.config.upsert_mode = mode;
        self
    }

    /// Enables or disables index definition at build time.
    #[must_use]
    pub const fn initialize_schema(mut self, initialize: bool) -> Self {
        self.config.initialize_schema = initialize;
        self
    }

    /// Sets the HNSW construction breadth (`EFC`).
    #[must_use]
    pub const fn efc(mut self, efc: usize) -> Self {
        self.config.efc = Some(efc);
        self
    }

    /// Sets the HNSW links per node (`M`).
    #[must_use]
    pub const fn m(mut self, m: usize) -> Self {
        self.config.m = Some(m);
        self
    }

    /// Sets how documents are grouped for embedding.
    #[must_use]
    pub fn batching_strategy(mut self, strategy: Arc<dyn BatchingStrategy>) -> Self {
        self.batching_strategy = Some(strategy);
        self
    }

    /// Replaces the SurrealQL filter compiler.
    #[must_use]
    pub fn filter_converter(mut self, converter: Arc<dyn FilterConverter>) -> Self {
        self.filter_converter = Some(converter);
        self
    }

    /// Validates the configuration, builds the store and ensures its schema.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if a name is not an identifier or `ef`
    /// is zero, and [`Error::SchemaInitFailure`] if the index cannot be defined.
    pub fn build(self) -> Result<SurrealVectorStore> {
        let config = self.config;
        if config.ef == 0 {
            return Err(Error::InvalidInput("ef must be positive".to_string()));
        }
        let content_field = Ident::new(config.content_field_name)?;
        let embedding_field = Ident::new(config.embedding_field_name)?;
        if content_field == embedding_field {
            return Err(Error::InvalidInput(format!(
                "content and embedding fields must differ, both are '{content_field}'"
            )));
        }
        if RESERVED_FIELDS.contains(&content_field.as_str())
            || RESERVED_FIELDS.contains(&embedding_field.as_str())
        {
            return Err(Error::InvalidInput(
                "content and embedding fields may not be named 'id'".to_string(),
            ));
        }

        let store = SurrealVectorStore {
            executor: self.executor,
            embedder: self.embedder,
            batching_strategy: self
                .batching_strategy
                .unwrap_or_else(|| Arc::new(TokenCountBatchingStrategy::default())),
            filter_converter: self
                .filter_converter
                .unwrap_or_else(|| Arc::new(SurrealFilterConverter::new())),
            index: Ident::new(config.index_name)?,
            table: Ident::new(config.table_name)?,
            row_mapper: RowMapper::new(content_field.as_str(), embedding_field.as_str()),
            content_field,
            embedding_field,
            vector_type: config.vector_type,
            distance: config.distance,
            algorithm: config.algorithm,
            ef: config.ef,
            upsert_mode: config.upsert_mode,
            initialize_schema: config.initialize_schema,
            efc: config.efc,
            m: config.m,
        };
        tracing::debug!(
            table = %store.table,
            index = %store.index,
            distance = %store.distance,
            algorithm = %store.algorithm,
            "Vector store configured"
        );

        store.ensure_schema()?;
        Ok(store)
    }
}

fn set_name(target: &mut String, name: String) {
    if !name.trim().is_empty() {
        *target = name;
    }
}
