//! SurrealQL generation.
//!
//! Identifiers, literals, typed statements and the filter compiler. Nothing in
//! this module talks to a database.

mod filter;
mod ident;
mod literal;
mod options;
mod statement;

pub use filter::{
    SurrealFilterConverter, comparison_key, comparison_value, negate, negated_child, render_value,
};
pub use ident::{Ident, Param, RecordId, is_field_path, is_identifier};
pub use literal::{f32_to_json, json_literal, quote_str, vector_literal};
pub use options::{Algorithm, Distance, UpsertMode, VectorType};
pub use statement::{
    CompiledFilter, DefineIndexStatement, DeleteStatement, KnnCondition, LetStatement, OrderBy,
    Projection, Query, ScoreExpr, SelectStatement, Statement, UpsertStatement, WhereClause,
};
