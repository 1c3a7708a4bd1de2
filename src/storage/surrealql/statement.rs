//! Typed SurrealQL statements.
//!
//! The store never concatenates query text by hand. It builds a [`Query`] out
//! of [`Statement`] values, and the text sent over the wire is produced by the
//! `Display` implementations in this module. Executors that interpret queries
//! in-process (see [`crate::storage::executor::InMemoryExecutor`]) work on the
//! same values.
//!
//! # Example
//!
//! ```rust
//! use surrealvec::storage::surrealql::{Ident, Query, RecordId, Statement};
//!
//! # fn main() -> surrealvec::Result<()> {
//! let table = Ident::new("docs")?;
//! let query = Query::from(Statement::delete(vec![
//!     RecordId::new(table.clone(), "a"),
//!     RecordId::new(table, "b"),
//! ]));
//! assert_eq!(query.to_string(), "DELETE docs:⟨a⟩, docs:⟨b⟩;");
//! # Ok(())
//! # }
//! ```

use super::ident::{Ident, Param, RecordId};
use super::literal::{vector_literal, write_object};
use super::options::{Algorithm, Distance, UpsertMode, VectorType};
use crate::models::FilterExpression;
use std::fmt;

/// An ordered sequence of statements sent as one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    statements: Vec<Statement>,
}

impl Query {
    /// Creates an empty query.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            statements: Vec::new(),
        }
    }

    /// Appends a statement.
    #[must_use]
    pub fn with(mut self, statement: Statement) -> Self {
        self.statements.push(statement);
        self
    }

    /// Appends a statement in place.
    pub fn push(&mut self, statement: Statement) {
        self.statements.push(statement);
    }

    /// Wraps `statements` in `BEGIN TRANSACTION` / `COMMIT TRANSACTION`.
    #[must_use]
    pub fn transaction(statements: impl IntoIterator<Item = Statement>) -> Self {
        let mut query = Self::new().with(Statement::BeginTransaction);
        query.statements.extend(statements);
        query.with(Statement::CommitTransaction)
    }

    /// Returns the statements in order.
    #[must_use]
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// Returns the number of statements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    /// Returns true if the query holds no statements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

impl From<Statement> for Query {
    fn from(statement: Statement) -> Self {
        Self::new().with(statement)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, statement) in self.statements.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{statement};")?;
        }
        Ok(())
    }
}

/// A single SurrealQL statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `LET $param = [...]`.
    Let(LetStatement),
    /// `SELECT ...`.
    Select(SelectStatement),
    /// `UPSERT table:⟨id⟩ <mode> { ... }`.
    Upsert(UpsertStatement),
    /// `DELETE table:⟨a⟩, table:⟨b⟩`.
    Delete(DeleteStatement),
    /// `DEFINE INDEX ...`.
    DefineIndex(DefineIndexStatement),
    /// `BEGIN TRANSACTION`.
    BeginTransaction,
    /// `COMMIT TRANSACTION`.
    CommitTransaction,
}

impl Statement {
    /// Builds an `UPSERT` statement.
    #[must_use]
    pub const fn upsert(
        target: RecordId,
        mode: UpsertMode,
        data: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        Self::Upsert(UpsertStatement { target, mode, data })
    }

    /// Builds a `DELETE` statement over one or more records.
    #[must_use]
    pub const fn delete(targets: Vec<RecordId>) -> Self {
        Self::Delete(DeleteStatement { targets })
    }

    /// Short label used in logs and error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Let(_) => "LET",
            Self::Select(_) => "SELECT",
            Self::Upsert(_) => "UPSERT",
            Self::Delete(_) => "DELETE",
            Self::DefineIndex(_) => "DEFINE INDEX",
            Self::BeginTransaction => "BEGIN TRANSACTION",
            Self::CommitTransaction => "COMMIT TRANSACTION",
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Let(s) => s.fmt(f),
            Self::Select(s) => s.fmt(f),
            Self::Upsert(s) => s.fmt(f),
            Self::Delete(s) => s.fmt(f),
            Self::DefineIndex(s) => s.fmt(f),
            Self::BeginTransaction => f.write_str("BEGIN TRANSACTION"),
            Self::CommitTransaction => f.write_str("COMMIT TRANSACTION"),
        }
    }
}

/// Binds a vector to a query parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct LetStatement {
    /// Parameter being bound.
    pub param: Param,
    /// Bound vector.
    pub vector: Vec<f32>,
}

impl fmt::Display for LetStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LET {} = {}", self.param, vector_literal(&self.vector))
    }
}

/// A ranked vector query.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    /// Projected columns.
    pub projections: Vec<Projection>,
    /// Fields removed from the output rows.
    pub omit: Vec<Ident>,
    /// Source table.
    pub from: Ident,
    /// Optional `WHERE` clause.
    pub condition: Option<WhereClause>,
    /// Optional ordering.
    pub order_by: Option<OrderBy>,
    /// Optional row limit.
    pub limit: Option<usize>,
}

impl fmt::Display for SelectStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SELECT ")?;
        for (i, projection) in self.projections.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{projection}")?;
        }
        if !self.omit.is_empty() {
            f.write_str(" OMIT ")?;
            write_list(f, &self.omit)?;
        }
        write!(f, " FROM {}", self.from)?;
        if let Some(condition) = &self.condition {
            write!(f, " WHERE {condition}")?;
        }
        if let Some(order_by) = &self.order_by {
            write!(f, " ORDER BY {order_by}")?;
        }
        if let Some(limit) = self.limit {
            write!(f, " LIMIT {limit}")?;
        }
        Ok(())
    }
}

/// A projected column of a `SELECT`.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// `*`.
    All,
    /// A plain field.
    Field(Ident),
    /// `<expr> AS <alias>`.
    Expr {
        /// Computed expression.
        expr: ScoreExpr,
        /// Output column name.
        alias: Ident,
    },
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("*"),
            Self::Field(field) => write!(f, "{field}"),
            Self::Expr { expr, alias } => write!(f, "{expr} AS {alias}"),
        }
    }
}

/// Expressions computed per row of a vector query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScoreExpr {
    /// `vector::similarity::cosine(field, $param)`.
    CosineSimilarity {
        /// Stored vector field.
        field: Ident,
        /// Query vector parameter.
        param: Param,
    },
    /// `1 / (1 + vector::distance::knn())`.
    ///
    /// Maps a non-negative distance into `(0, 1]`. It preserves ranking but is
    /// not a normalized similarity.
    InverseKnnDistance,
    /// `vector::distance::knn()`.
    KnnDistance,
}

impl fmt::Display for ScoreExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CosineSimilarity { field, param } => {
                write!(f, "vector::similarity::cosine({field}, {param})")
            },
            Self::InverseKnnDistance => f.write_str("1 / (1 + vector::distance::knn())"),
            Self::KnnDistance => f.write_str("vector::distance::knn()"),
        }
    }
}

/// `WHERE <knn> AND (<filter>)`.
#[derive(Debug, Clone, PartialEq)]
pub struct WhereClause {
    /// Nearest-neighbour match operator.
    pub knn: Option<KnnCondition>,
    /// Compiled metadata filter.
    pub filter: Option<CompiledFilter>,
}

impl fmt::Display for WhereClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.knn, &self.filter) {
            (Some(knn), Some(filter)) => write!(f, "{knn} AND ({})", filter.text),
            (Some(knn), None) => write!(f, "{knn}"),
            (None, Some(filter)) => write!(f, "({})", filter.text),
            (None, None) => f.write_str("true"),
        }
    }
}

/// The `<|K,EF|>` / `<|K|>` nearest-neighbour operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnnCondition {
    /// Stored vector field.
    pub field: Ident,
    /// Number of neighbours.
    pub k: usize,
    /// HNSW search breadth. Absent for MTREE.
    pub ef: Option<usize>,
    /// Query vector parameter.
    pub param: Param,
}

impl fmt::Display for KnnCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ef {
            Some(ef) => write!(f, "{} <|{},{}|> {}", self.field, self.k, ef, self.param),
            None => write!(f, "{} <|{}|> {}", self.field, self.k, self.param),
        }
    }
}

/// A metadata filter in both tree and rendered form.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFilter {
    /// Source expression.
    pub expression: FilterExpression,
    /// Rendered SurrealQL condition.
    pub text: String,
}

/// `ORDER BY <field> [DESC]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// Sort column.
    pub field: Ident,
    /// Sort descending.
    pub descending: bool,
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.descending {
            write!(f, "{} DESC", self.field)
        } else {
            write!(f, "{} ASC", self.field)
        }
    }
}

/// Writes a record, keyed by id, with the given body.
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertStatement {
    /// Record being written.
    pub target: RecordId,
    /// How the body is applied.
    pub mode: UpsertMode,
    /// Record body, without the id.
    pub data: serde_json::Map<String, serde_json::Value>,
}

impl fmt::Display for UpsertStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut body = String::new();
        write_object(&mut body, self.data.iter());
        write!(f, "UPSERT {} {} {body}", self.target, self.mode)
    }
}

/// Removes records by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteStatement {
    /// Records to remove.
    pub targets: Vec<RecordId>,
}

impl fmt::Display for DeleteStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DELETE ")?;
        write_list(f, &self.targets)
    }
}

/// Declares a vector index over a table field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefineIndexStatement {
    /// Emit `IF NOT EXISTS`.
    pub if_not_exists: bool,
    /// Index name.
    pub name: Ident,
    /// Indexed table.
    pub table: Ident,
    /// Indexed vector field.
    pub field: Ident,
    /// Index algorithm.
    pub algorithm: Algorithm,
    /// Vector dimension.
    pub dimension: usize,
    /// Distance metric.
    pub distance: Distance,
    /// Vector element type.
    pub vector_type: VectorType,
    /// HNSW construction breadth.
    pub efc: Option<usize>,
    /// HNSW maximum connections per node.
    pub m: Option<usize>,
}

impl fmt::Display for DefineIndexStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DEFINE INDEX ")?;
        if self.if_not_exists {
            f.write_str("IF NOT EXISTS ")?;
        }
        write!(
            f,
            "{} ON {} FIELDS {} {} DIMENSION {} DIST {} TYPE {}",
            self.name,
            self.table,
            self.field,
            self.algorithm,
            self.dimension,
            self.distance,
            self.vector_type
        )?;
        if self.algorithm == Algorithm::Hnsw {
            if let Some(efc) = self.efc {
                write!(f, " EFC {efc}")?;
            }
            if let Some(m) = self.m {
                write!(f, " M {m}")?;
            }
        }
        Ok(())
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ident(name: &str) -> Ident {
        Ident::new(name).expect("valid ident")
    }

    fn param() -> Param {
        Param::new(ident("__embedding"))
    }

    fn search_select(ef: Option<usize>, filter: Option<CompiledFilter>) -> SelectStatement {
        SelectStatement {
            projections: vec![
                Projection::All,
                Projection::Expr {
                    expr: ScoreExpr::CosineSimilarity {
                        field: ident("embedding"),
                        param: param(),
                    },
                    alias: ident("__score"),
                },
                Projection::Expr {
                    expr: ScoreExpr::KnnDistance,
                    alias: ident("__distance"),
                },
            ],
            omit: vec![ident("embedding")],
            from: ident("docs"),
            condition: Some(WhereClause {
                knn: Some(KnnCondition {
                    field: ident("embedding"),
                    k: 3,
                    ef,
                    param: param(),
                }),
                filter,
            }),
            order_by: Some(OrderBy {
                field: ident("__score"),
                descending: true,
            }),
            limit: Some(3),
        }
    }

    #[test]
    fn test_select_hnsw_rendering() {
        assert_eq!(
            search_select(Some(100), None).to_string(),
            "SELECT *, vector::similarity::cosine(embedding, $__embedding) AS __score, \
             vector::distance::knn() AS __distance OMIT embedding FROM docs \
             WHERE embedding <|3,100|> $__embedding ORDER BY __score DESC LIMIT 3"
        );
    }

    #[test]
    fn test_select_mtree_with_filter_rendering() {
        let filter = CompiledFilter {
            expression: FilterExpression::eq("genre", "drama"),
            text: "genre = 'drama'".to_string(),
        };
        let rendered = search_select(None, Some(filter)).to_string();
        assert!(rendered.contains("WHERE embedding <|3|> $__embedding AND (genre = 'drama')"));
    }

    #[test]
    fn test_inverse_distance_rendering() {
        assert_eq!(
            ScoreExpr::InverseKnnDistance.to_string(),
            "1 / (1 + vector::distance::knn())"
        );
    }

    #[test]
    fn test_let_and_query_rendering() {
        let query = Query::new()
            .with(Statement::Let(LetStatement {
                param: param(),
                vector: vec![0.5, -1.0],
            }))
            .with(Statement::Select(search_select(Some(100), None)));
        let text = query.to_string();
        assert!(text.starts_with("LET $__embedding = [0.5,-1];\nSELECT *"));
        assert!(text.ends_with("LIMIT 3;"));
        assert_eq!(query.len(), 2);
    }

    #[test]
    fn test_upsert_rendering() {
        let mut data = serde_json::Map::new();
        data.insert("content".to_string(), json!("it's here"));
        data.insert("embedding".to_string(), json!([0.1, 0.2]));
        data.insert("year".to_string(), json!(2020));
        let statement = Statement::upsert(RecordId::new(ident("docs"), "d1"), UpsertMode::Content, data);
        assert_eq!(
            statement.to_string(),
            "UPSERT docs:⟨d1⟩ CONTENT { content: 'it\\'s here', embedding: [0.1,0.2], year: 2020 }"
        );
    }

    #[test]
    fn test_define_index_rendering() {
        let mut define = DefineIndexStatement {
            if_not_exists: true,
            name: ident("idx"),
            table: ident("docs"),
            field: ident("embedding"),
            algorithm: Algorithm::Hnsw,
            dimension: 384,
            distance: Distance::Cosine,
            vector_type: VectorType::F32,
            efc: None,
            m: None,
        };
        assert_eq!(
            define.to_string(),
            "DEFINE INDEX IF NOT EXISTS idx ON docs FIELDS embedding HNSW DIMENSION 384 DIST COSINE TYPE F32"
        );

        define.efc = Some(150);
        define.m = Some(12);
        assert!(define.to_string().ends_with("TYPE F32 EFC 150 M 12"));

        define.algorithm = Algorithm::Mtree;
        define.if_not_exists = false;
        assert_eq!(
            define.to_string(),
            "DEFINE INDEX idx ON docs FIELDS embedding MTREE DIMENSION 384 DIST COSINE TYPE F32"
        );
    }

    #[test]
    fn test_transaction_wraps_statements() {
        let query = Query::transaction(vec![Statement::delete(vec![RecordId::new(ident("docs"), "x")])]);
        assert_eq!(
            query.to_string(),
            "BEGIN TRANSACTION;\nDELETE docs:⟨x⟩;\nCOMMIT TRANSACTION;"
        );
    }
}
