//! In-process SurrealQL interpreter.
//!
//! Executes the typed statements produced by the store against tables held in
//! memory, with brute-force nearest-neighbour search. It backs the CLI's
//! `--in-memory` mode, the integration tests and the benchmarks.
//!
//! Semantics follow the server closely enough for the store's statements:
//!
//! - `UPSERT ... CONTENT | REPLACE` replaces the record, `MERGE` merges top-level fields
//! - `DEFINE INDEX` without `IF NOT EXISTS` fails on a duplicate name
//! - writes of a vector whose length differs from an index's dimension fail
//! - kNN uses the distance of the index defined on the field (Euclidean without one)
//! - the metadata filter is applied before the K nearest rows are chosen
//! - ungrouped `AND`/`OR` chains bind `AND` tighter than `OR`, as the rendered text does
//! - a failed statement inside a transaction rolls the whole transaction back
//!
//! A failing statement outside a transaction does not stop later statements,
//! matching the server.

use crate::models::{ExpressionType, FilterExpression, FilterValue, Operand};
use crate::storage::surrealql::{
    DefineIndexStatement, Distance, Projection, Query, ScoreExpr, SelectStatement, Statement,
    UpsertMode, UpsertStatement, comparison_key, comparison_value, negate, negated_child,
};
use crate::storage::traits::{QueryExecutor, Response, StatementResult, StatementStatus};
use crate::Result;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

/// Message reported for statements discarded with a failed transaction.
const TRANSACTION_FAILED: &str = "The query was not executed due to a failed transaction";

type Record = Map<String, Value>;

/// Helper to acquire mutex lock with poison recovery.
fn acquire_lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("In-memory executor mutex was poisoned, recovering");
            metrics::counter!("surrealvec_mutex_poison_recovery_total").increment(1);
            poisoned.into_inner()
        },
    }
}

#[derive(Debug, Clone)]
struct IndexDefinition {
    table: String,
    field: String,
    dimension: usize,
    distance: Distance,
}

#[derive(Debug, Clone, Default)]
struct Tables {
    records: BTreeMap<String, BTreeMap<String, Record>>,
    indexes: BTreeMap<String, IndexDefinition>,
}

#[derive(Debug, Default)]
struct State {
    tables: Tables,
    log: Vec<String>,
}

/// Executes queries against in-process tables.
#[derive(Debug, Default)]
pub struct InMemoryExecutor {
    state: Mutex<State>,
}

impl InMemoryExecutor {
    /// Creates an empty executor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of records in `table`.
    #[must_use]
    pub fn record_count(&self, table: &str) -> usize {
        acquire_lock(&self.state)
            .tables
            .records
            .get(table)
            .map_or(0, BTreeMap::len)
    }

    /// Returns a copy of the record `table:key`, if present.
    #[must_use]
    pub fn record(&self, table: &str, key: &str) -> Option<Value> {
        acquire_lock(&self.state)
            .tables
            .records
            .get(table)
            .and_then(|t| t.get(key))
            .map(|r| Value::Object(r.clone()))
    }

    /// Returns true if an index named `name` is defined.
    #[must_use]
    pub fn has_index(&self, name: &str) -> bool {
        acquire_lock(&self.state).tables.indexes.contains_key(name)
    }

    /// Returns the rendered text of every executed query, oldest first.
    #[must_use]
    pub fn executed_queries(&self) -> Vec<String> {
        acquire_lock(&self.state).log.clone()
    }
}

impl QueryExecutor for InMemoryExecutor {
    fn execute(&self, query: &Query) -> Result<Response> {
        let text = query.to_string();
        tracing::debug!(statements = query.len(), query = %text, "Executing SurrealQL in memory");

        let mut state = acquire_lock(&self.state);
        state.log.push(text);

        let mut vars: HashMap<String, Vec<f64>> = HashMap::new();
        let mut results: Vec<StatementResult> = Vec::with_capacity(query.len());
        // Snapshot taken at BEGIN and the index of the BEGIN result.
        let mut transaction: Option<(Tables, usize)> = None;
        let mut transaction_failed = false;

        for statement in query.statements() {
            match statement {
                Statement::BeginTransaction => {
                    transaction = Some((state.tables.clone(), results.len()));
                    transaction_failed = false;
                    results.push(StatementResult::ok(Value::Null));
                },
                Statement::CommitTransaction => {
                    let failed = std::mem::take(&mut transaction_failed);
                    match transaction.take() {
                        Some((snapshot, start)) if failed => {
                            state.tables = snapshot;
                            discard_results(&mut results[start..]);
                            results.push(StatementResult::err(TRANSACTION_FAILED));
                        },
                        Some(_) => results.push(StatementResult::ok(Value::Null)),
                        None => results.push(StatementResult::err(
                            "Cannot COMMIT without starting a transaction",
                        )),
                    }
                },
                other if transaction_failed => {
                    tracing::trace!(statement = other.kind(), "Skipping statement in failed transaction");
                    results.push(StatementResult::err(TRANSACTION_FAILED));
                },
                other => match state.tables.apply(other, &mut vars) {
                    Ok(value) => results.push(StatementResult::ok(value)),
                    Err(message) => {
                        tracing::debug!(statement = other.kind(), error = %message, "Statement failed");
                        if transaction.is_some() {
                            transaction_failed = true;
                        }
                        results.push(StatementResult::err(message));
                    },
                },
            }
        }

        // A transaction left open is cancelled.
        if let Some((snapshot, start)) = transaction {
            state.tables = snapshot;
            discard_results(&mut results[start..]);
        }

        Ok(Response::new(results))
    }
}

fn discard_results(results: &mut [StatementResult]) {
    for result in results.iter_mut() {
        if result.status == StatementStatus::Ok {
            *result = StatementResult::err(TRANSACTION_FAILED);
        }
    }
}

impl Tables {
    fn apply(
        &mut self,
        statement: &Statement,
        vars: &mut HashMap<String, Vec<f64>>,
    ) -> std::result::Result<Value, String> {
        match statement {
            Statement::Let(let_statement) => {
                let vector = let_statement.vector.iter().map(|v| f64::from(*v)).collect();
                vars.insert(let_statement.param.name().to_string(), vector);
                Ok(Value::Null)
            },
            Statement::Upsert(upsert) => self.upsert(upsert),
            Statement::Delete(delete) => {
                for target in &delete.targets {
                    if let Some(table) = self.records.get_mut(target.table().as_str()) {
                        table.remove(target.key());
                    }
                }
                Ok(Value::Array(Vec::new()))
            },
            Statement::DefineIndex(define) => self.define_index(define),
            Statement::Select(select) => self.select(select, vars),
            Statement::BeginTransaction | Statement::CommitTransaction => Ok(Value::Null),
        }
    }

    fn upsert(&mut self, upsert: &UpsertStatement) -> std::result::Result<Value, String> {
        let table_name = upsert.target.table().as_str();
        for index in self.indexes.values().filter(|i| i.table == table_name) {
            if let Some(len) = upsert.data.get(&index.field).and_then(Value::as_array).map(Vec::len)
            {
                if len != index.dimension {
                    return Err(format!(
                        "Incorrect vector dimension ({len}). Expected a vector of {} dimension.",
                        index.dimension
                    ));
                }
            }
        }

        let table = self.records.entry(table_name.to_string()).or_default();
        let key = upsert.target.key().to_string();
        let mut record = match (upsert.mode, table.remove(&key)) {
            (UpsertMode::Merge, Some(mut existing)) => {
                for (field, value) in &upsert.data {
                    existing.insert(field.clone(), value.clone());
                }
                existing
            },
            _ => upsert.data.clone(),
        };
        record.insert("id".to_string(), Value::String(upsert.target.to_string()));
        table.insert(key, record.clone());
        Ok(Value::Array(vec![Value::Object(record)]))
    }

    fn define_index(&mut self, define: &DefineIndexStatement) -> std::result::Result<Value, String> {
        if self.indexes.contains_key(define.name.as_str()) {
            return if define.if_not_exists {
                Ok(Value::Null)
            } else {
                Err(format!("The index '{}' already exists", define.name))
            };
        }
        self.indexes.insert(
            define.name.to_string(),
            IndexDefinition {
                table: define.table.to_string(),
                field: define.field.to_string(),
                dimension: define.dimension,
                distance: define.distance,
            },
        );
        Ok(Value::Null)
    }

    fn metric_for(&self, table: &str, field: &str) -> Distance {
        self.indexes
            .values()
            .find(|i| i.table == table && i.field == field)
            .map_or(Distance::Euclidean, |i| i.distance)
    }

    fn select(
        &self,
        select: &SelectStatement,
        vars: &HashMap<String, Vec<f64>>,
    ) -> std::result::Result<Value, String> {
        let table = select.from.as_str();
        let mut rows: Vec<(&Record, Option<f64>)> = self
            .records
            .get(table)
            .map(|t| t.values().map(|r| (r, None)).collect())
            .unwrap_or_default();

        if let Some(condition) = &select.condition {
            // Evaluates the compiled expression tree rather than its rendered text.
            if let Some(filter) = &condition.filter {
                let mut kept = Vec::with_capacity(rows.len());
                for row in rows {
                    if matches_filter(&filter.expression, row.0)? {
                        kept.push(row);
                    }
                }
                rows = kept;
            }

            if let Some(knn) = &condition.knn {
                let query = lookup_param(vars, knn.param.name())?;
                let metric = self.metric_for(table, knn.field.as_str());
                let mut ranked: Vec<(&Record, Option<f64>)> = rows
                    .into_iter()
                    .filter_map(|(record, _)| {
                        let vector = record.get(knn.field.as_str()).and_then(as_vector)?;
                        (vector.len() == query.len())
                            .then(|| (record, Some(distance(metric, &vector, query))))
                    })
                    .collect();
                ranked.sort_by(|a, b| {
                    a.1.unwrap_or(f64::INFINITY)
                        .total_cmp(&b.1.unwrap_or(f64::INFINITY))
                });
                ranked.truncate(knn.k);
                rows = ranked;
            }
        }

        let mut output: Vec<Record> = Vec::with_capacity(rows.len());
        for (record, knn_distance) in rows {
            let mut projected = Record::new();
            for projection in &select.projections {
                match projection {
                    Projection::All => {
                        projected.extend(record.iter().map(|(k, v)| (k.clone(), v.clone())));
                    },
                    Projection::Field(field) => {
                        let value = record.get(field.as_str()).cloned().unwrap_or(Value::Null);
                        projected.insert(field.to_string(), value);
                    },
                    Projection::Expr { expr, alias } => {
                        let value = evaluate_score(expr, record, knn_distance, vars)?;
                        projected.insert(alias.to_string(), value);
                    },
                }
            }
            for field in &select.omit {
                projected.remove(field.as_str());
            }
            output.push(projected);
        }

        if let Some(order_by) = &select.order_by {
            let field = order_by.field.as_str();
            output.sort_by(|a, b| {
                let ordering = order_values(a.get(field), b.get(field));
                if order_by.descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            });
        }
        if let Some(limit) = select.limit {
            output.truncate(limit);
        }

        Ok(Value::Array(output.into_iter().map(Value::Object).collect()))
    }
}

fn lookup_param<'a>(
    vars: &'a HashMap<String, Vec<f64>>,
    name: &str,
) -> std::result::Result<&'a [f64], String> {
    vars.get(name)
        .map(Vec::as_slice)
        .ok_or_else(|| format!("Parameter '${name}' is not defined"))
}

fn evaluate_score(
    expr: &ScoreExpr,
    record: &Record,
    knn_distance: Option<f64>,
    vars: &HashMap<String, Vec<f64>>,
) -> std::result::Result<Value, String> {
    let value = match expr {
        ScoreExpr::CosineSimilarity { field, param } => {
            let query = lookup_param(vars, param.name())?;
            record
                .get(field.as_str())
                .and_then(as_vector)
                .filter(|v| v.len() == query.len())
                .map(|v| cosine_similarity(&v, query))
        },
        ScoreExpr::KnnDistance => knn_distance,
        ScoreExpr::InverseKnnDistance => knn_distance.map(|d| 1.0 / (1.0 + d)),
    };
    Ok(value
        .and_then(serde_json::Number::from_f64)
        .map_or(Value::Null, Value::Number))
}

fn as_vector(value: &Value) -> Option<Vec<f64>> {
    value.as_array()?.iter().map(Value::as_f64).collect()
}

fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

fn distance(metric: Distance, a: &[f64], b: &[f64]) -> f64 {
    match metric {
        Distance::Cosine => 1.0 - cosine_similarity(a, b),
        Distance::Euclidean => a
            .iter()
            .zip(b)
            .map(|(x, y)| (x - y).powi(2))
            .sum::<f64>()
            .sqrt(),
        Distance::Manhattan => a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum(),
    }
}

fn order_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a.and_then(Value::as_f64), b.and_then(Value::as_f64)) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => a.and_then(Value::as_str).cmp(&b.and_then(Value::as_str)),
    }
}

/// Evaluates a filter tree against a record.
fn matches_filter(expr: &FilterExpression, record: &Record) -> std::result::Result<bool, String> {
    match expr.kind {
        ExpressionType::And | ExpressionType::Or => matches_chain(expr, record),
        ExpressionType::Not => {
            let child = negated_child(expr).map_err(|e| e.to_string())?;
            let negated = negate(child.kind).map_err(|e| e.to_string())?;
            matches_filter(
                &FilterExpression::new(negated, child.left.clone(), child.right.clone()),
                record,
            )
        },
        kind => {
            let key = comparison_key(expr).map_err(|e| e.to_string())?;
            let expected = comparison_value(expr).map_err(|e| e.to_string())?;
            Ok(matches_comparison(kind, lookup(record, key), expected))
        },
    }
}

/// Evaluates an AND/OR chain the way SurrealQL reads its rendered text.
///
/// The compiler adds no parentheses, so nested ungrouped AND/OR nodes flatten
/// into one chain in which AND binds tighter than OR. Only `Group` operands
/// keep their own evaluation order.
fn matches_chain(expr: &FilterExpression, record: &Record) -> std::result::Result<bool, String> {
    let mut terms = Vec::new();
    let mut joiners = Vec::new();
    flatten_chain(expr, &mut terms, &mut joiners)?;

    let mut terms = terms.into_iter();
    let Some(first) = terms.next() else {
        return Ok(false);
    };
    let mut any = false;
    let mut all = matches_operand(first, record)?;
    for (joiner, term) in joiners.into_iter().zip(terms) {
        if joiner == ExpressionType::And {
            all = all && matches_operand(term, record)?;
        } else {
            any = any || all;
            all = matches_operand(term, record)?;
        }
    }
    Ok(any || all)
}

fn flatten_chain<'a>(
    expr: &'a FilterExpression,
    terms: &mut Vec<&'a Operand>,
    joiners: &mut Vec<ExpressionType>,
) -> std::result::Result<(), String> {
    let right = expr
        .right
        .as_ref()
        .ok_or_else(|| format!("{} requires two operands", expr.kind))?;
    flatten_operand(&expr.left, terms, joiners)?;
    joiners.push(expr.kind);
    flatten_operand(right, terms, joiners)
}

fn flatten_operand<'a>(
    operand: &'a Operand,
    terms: &mut Vec<&'a Operand>,
    joiners: &mut Vec<ExpressionType>,
) -> std::result::Result<(), String> {
    match operand {
        Operand::Expression(inner)
            if matches!(inner.kind, ExpressionType::And | ExpressionType::Or) =>
        {
            flatten_chain(inner, terms, joiners)
        },
        other => {
            terms.push(other);
            Ok(())
        },
    }
}

fn matches_operand(operand: &Operand, record: &Record) -> std::result::Result<bool, String> {
    match operand {
        Operand::Expression(inner) | Operand::Group(inner) => matches_filter(inner, record),
        Operand::Key(_) | Operand::Value(_) => {
            Err("boolean operands must be expressions".to_string())
        },
    }
}

fn lookup<'a>(record: &'a Record, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = record.get(parts.next()?)?;
    for part in parts {
        current = current.as_object()?.get(part)?;
    }
    Some(current)
}

fn matches_comparison(kind: ExpressionType, field: Option<&Value>, expected: &FilterValue) -> bool {
    let ordering = field.and_then(|f| compare(f, expected));
    match kind {
        ExpressionType::Eq => ordering == Some(Ordering::Equal),
        ExpressionType::Ne => ordering != Some(Ordering::Equal),
        ExpressionType::Lt => ordering == Some(Ordering::Less),
        ExpressionType::Lte => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
        ExpressionType::Gt => ordering == Some(Ordering::Greater),
        ExpressionType::Gte => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
        ExpressionType::In => contains(field, expected),
        ExpressionType::Nin => !contains(field, expected),
        ExpressionType::And | ExpressionType::Or | ExpressionType::Not => false,
    }
}

fn contains(field: Option<&Value>, expected: &FilterValue) -> bool {
    let Some(field) = field else {
        return false;
    };
    match expected {
        FilterValue::List(items) => items
            .iter()
            .any(|item| compare(field, item) == Some(Ordering::Equal)),
        scalar => compare(field, scalar) == Some(Ordering::Equal),
    }
}

#[allow(clippy::cast_precision_loss)]
fn compare(field: &Value, expected: &FilterValue) -> Option<Ordering> {
    match (field, expected) {
        (Value::Bool(a), FilterValue::Bool(b)) => Some(a.cmp(b)),
        (Value::Number(a), FilterValue::Int(b)) => match a.as_i64() {
            Some(a) => Some(a.cmp(b)),
            None => a.as_f64()?.partial_cmp(&(*b as f64)),
        },
        (Value::Number(a), FilterValue::Float(b)) => a.as_f64()?.partial_cmp(b),
        (Value::String(a), FilterValue::Text(b)) => Some(a.as_str().cmp(b.as_str())),
        (Value::String(a), FilterValue::DateTime(b)) => {
            let a = DateTime::parse_from_rfc3339(a).ok()?.with_timezone(&Utc);
            Some(a.cmp(b))
        },
        (Value::Array(a), FilterValue::List(b)) => {
            let equal = a.len() == b.len()
                && a
                    .iter()
                    .zip(b)
                    .all(|(x, y)| compare(x, y) == Some(Ordering::Equal));
            equal.then_some(Ordering::Equal)
        },
        _ => None,
    }
}
