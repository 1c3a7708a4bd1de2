//! Filter expression compiler for SurrealQL.
//!
//! Renders a [`FilterExpression`] tree into the condition text placed after
//! the nearest-neighbour operator in a `WHERE` clause.
//!
//! | Node | Output |
//! |------|--------|
//! | `EQ`, `NE`, `LT`, `LTE`, `GT`, `GTE` | `key = v`, `key != v`, `key < v`, ... |
//! | `IN`, `NIN` | `key IN [a,b]`, `key NOT IN [a,b]` |
//! | `AND`, `OR` | `left AND right`, `left OR right` (no added parentheses) |
//! | `NOT` | the child comparison with its operator negated |
//! | `Group` operand | `(inner)` |
//!
//! `NOT` is supported only where an operator has a direct SurrealQL negation:
//! `EQ`/`NE` and `IN`/`NIN`. Anything else fails with
//! [`Error::UnsupportedOperator`].

use super::ident::is_field_path;
use super::literal::quote_str;
use crate::models::{ExpressionType, FilterExpression, FilterValue, Operand};
use crate::storage::traits::FilterConverter;
use crate::{Error, Result};
use chrono::SecondsFormat;

/// Compiles filter trees into SurrealQL condition text.
#[derive(Debug, Clone, Copy, Default)]
pub struct SurrealFilterConverter;

impl SurrealFilterConverter {
    /// Creates a converter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn render_expression(&self, expr: &FilterExpression) -> Result<String> {
        match expr.kind {
            ExpressionType::Not => self.render_not(expr),
            ExpressionType::And | ExpressionType::Or => {
                let right = required_right(expr)?;
                Ok(format!(
                    "{} {} {}",
                    self.render_boolean_operand(&expr.left, expr.kind)?,
                    operator_symbol(expr.kind),
                    self.render_boolean_operand(right, expr.kind)?
                ))
            },
            kind => {
                let key = comparison_key(expr)?;
                let value = comparison_value(expr)?;
                Ok(format!(
                    "{key} {} {}",
                    operator_symbol(kind),
                    render_value(value)?
                ))
            },
        }
    }

    fn render_boolean_operand(&self, operand: &Operand, kind: ExpressionType) -> Result<String> {
        match operand {
            Operand::Expression(inner) => self.render_expression(inner),
            Operand::Group(inner) => Ok(format!("({})", self.render_expression(inner)?)),
            Operand::Key(_) | Operand::Value(_) => Err(Error::InvalidInput(format!(
                "{kind} operands must be expressions"
            ))),
        }
    }

    fn render_not(&self, expr: &FilterExpression) -> Result<String> {
        let child = negated_child(expr)?;
        let negated = negate(child.kind)?;
        self.render_expression(&FilterExpression::new(
            negated,
            child.left.clone(),
            child.right.clone(),
        ))
    }
}

impl FilterConverter for SurrealFilterConverter {
    fn convert(&self, expression: &FilterExpression) -> Result<String> {
        self.render_expression(expression)
    }
}

/// Returns the operator that negates `kind`.
///
/// # Errors
///
/// Returns [`Error::UnsupportedOperator`] for operators without a direct
/// negation (`LT`, `LTE`, `GT`, `GTE`, `AND`, `OR`, `NOT`).
pub fn negate(kind: ExpressionType) -> Result<ExpressionType> {
    match kind {
        ExpressionType::Eq => Ok(ExpressionType::Ne),
        ExpressionType::Ne => Ok(ExpressionType::Eq),
        ExpressionType::In => Ok(ExpressionType::Nin),
        ExpressionType::Nin => Ok(ExpressionType::In),
        other => Err(Error::UnsupportedOperator {
            operator: other.to_string(),
            context: "NOT applies only to EQ, NE, IN and NIN".to_string(),
        }),
    }
}

/// Returns the comparison a `NOT` node wraps.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if the node has a right operand or its
/// left operand is not an expression, and [`Error::UnsupportedOperator`] if
/// the child is a parenthesized group.
pub fn negated_child(expr: &FilterExpression) -> Result<&FilterExpression> {
    if expr.right.is_some() {
        return Err(Error::InvalidInput("NOT takes a single operand".to_string()));
    }
    match &expr.left {
        Operand::Expression(child) => Ok(child),
        Operand::Group(_) => Err(Error::UnsupportedOperator {
            operator: "NOT".to_string(),
            context: "a parenthesized group cannot be negated".to_string(),
        }),
        Operand::Key(_) | Operand::Value(_) => Err(Error::InvalidInput(
            "NOT operand must be an expression".to_string(),
        )),
    }
}

/// Returns the key of a comparison node after validating it.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if the left operand is not a key or the
/// key is not a dotted identifier path.
pub fn comparison_key(expr: &FilterExpression) -> Result<&str> {
    match &expr.left {
        Operand::Key(key) if is_field_path(key) => Ok(key),
        Operand::Key(key) => Err(Error::InvalidInput(format!(
            "filter key '{key}' is not a valid field path"
        ))),
        _ => Err(Error::InvalidInput(format!(
            "{} requires a key on the left",
            expr.kind
        ))),
    }
}

/// Returns the value of a comparison node.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if the right operand is missing or is not a value.
pub fn comparison_value(expr: &FilterExpression) -> Result<&FilterValue> {
    match required_right(expr)? {
        Operand::Value(value) => Ok(value),
        _ => Err(Error::InvalidInput(format!(
            "{} requires a value on the right",
            expr.kind
        ))),
    }
}

fn required_right(expr: &FilterExpression) -> Result<&Operand> {
    expr.right
        .as_ref()
        .ok_or_else(|| Error::InvalidInput(format!("{} requires two operands", expr.kind)))
}

const fn operator_symbol(kind: ExpressionType) -> &'static str {
    match kind {
        ExpressionType::And => "AND",
        ExpressionType::Or => "OR",
        ExpressionType::Not => "NOT",
        ExpressionType::Eq => "=",
        ExpressionType::Ne => "!=",
        ExpressionType::Lt => "<",
        ExpressionType::Lte => "<=",
        ExpressionType::Gt => ">",
        ExpressionType::Gte => ">=",
        ExpressionType::In => "IN",
        ExpressionType::Nin => "NOT IN",
    }
}

/// Renders a filter value as a SurrealQL literal.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] for a NaN or infinite float, at any depth
/// of a list. SurrealQL has no literal for them.
pub fn render_value(value: &FilterValue) -> Result<String> {
    match value {
        FilterValue::Bool(b) => Ok(b.to_string()),
        FilterValue::Int(i) => Ok(i.to_string()),
        FilterValue::Float(f) if !f.is_finite() => Err(Error::InvalidInput(format!(
            "filter value {f} is not a finite number"
        ))),
        FilterValue::Float(f) => Ok(format!("{f:?}")),
        FilterValue::Text(s) => Ok(quote_str(s)),
        FilterValue::DateTime(dt) => Ok(format!(
            "d'{}'",
            dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
        )),
        FilterValue::List(items) => {
            let rendered = items.iter().map(render_value).collect::<Result<Vec<_>>>()?;
            Ok(format!("[{}]", rendered.join(",")))
        },
    }
}
