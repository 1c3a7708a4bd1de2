//! Portable metadata filter expressions.
//!
//! A filter is a binary tree: comparisons (`EQ`, `IN`, ...) hold a [`Operand::Key`]
//! on the left and a [`Operand::Value`] on the right, boolean nodes (`AND`, `OR`)
//! hold nested expressions, and `NOT` holds a single expression on the left.
//!
//! Trees are usually built with the helper constructors or parsed from text with
//! [`crate::services::parse_filter_expression`]:
//!
//! ```rust
//! use surrealvec::FilterExpression;
//!
//! let filter = FilterExpression::eq("genre", "drama")
//!     .and(FilterExpression::gte("year", 2020));
//! assert!(filter.right.is_some());
//! ```

use chrono::{DateTime, Utc};
use std::fmt;

/// Operator of a filter expression node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpressionType {
    /// Logical conjunction.
    And,
    /// Logical disjunction.
    Or,
    /// Negation of the single child comparison.
    Not,
    /// Equality.
    Eq,
    /// Inequality.
    Ne,
    /// Less than.
    Lt,
    /// Less than or equal.
    Lte,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Gte,
    /// Membership in a list.
    In,
    /// Non-membership in a list.
    Nin,
}

impl ExpressionType {
    /// Returns the operator name as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
            Self::Not => "NOT",
            Self::Eq => "EQ",
            Self::Ne => "NE",
            Self::Lt => "LT",
            Self::Lte => "LTE",
            Self::Gt => "GT",
            Self::Gte => "GTE",
            Self::In => "IN",
            Self::Nin => "NIN",
        }
    }

    /// Returns true for key/value comparison operators.
    #[must_use]
    pub const fn is_comparison(&self) -> bool {
        !matches!(self, Self::And | Self::Or | Self::Not)
    }
}

impl fmt::Display for ExpressionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A literal value on the right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// Boolean literal.
    Bool(bool),
    /// Integer literal.
    Int(i64),
    /// Floating point literal.
    Float(f64),
    /// String literal.
    Text(String),
    /// UTC timestamp literal.
    DateTime(DateTime<Utc>),
    /// Ordered list of literals.
    List(Vec<FilterValue>),
}

impl From<bool> for FilterValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for FilterValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for FilterValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for FilterValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for FilterValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<DateTime<Utc>> for FilterValue {
    fn from(v: DateTime<Utc>) -> Self {
        Self::DateTime(v)
    }
}

impl<T: Into<Self>> From<Vec<T>> for FilterValue {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

/// An operand of a filter expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A metadata field name (dotted paths address nested fields).
    Key(String),
    /// A literal value.
    Value(FilterValue),
    /// A nested expression.
    Expression(Box<FilterExpression>),
    /// A nested expression rendered inside parentheses.
    Group(Box<FilterExpression>),
}

/// A node of a filter expression tree.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterExpression {
    /// Operator of this node.
    pub kind: ExpressionType,
    /// Left operand (the key for comparisons, the child for `NOT`).
    pub left: Operand,
    /// Right operand. Absent for `NOT`.
    pub right: Option<Operand>,
}

impl FilterExpression {
    /// Creates a node from its parts.
    #[must_use]
    pub const fn new(kind: ExpressionType, left: Operand, right: Option<Operand>) -> Self {
        Self { kind, left, right }
    }

    fn comparison(kind: ExpressionType, key: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(
            kind,
            Operand::Key(key.into()),
            Some(Operand::Value(value.into())),
        )
    }

    /// `key = value`.
    #[must_use]
    pub fn eq(key: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::comparison(ExpressionType::Eq, key, value)
    }

    /// `key != value`.
    #[must_use]
    pub fn ne(key: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::comparison(ExpressionType::Ne, key, value)
    }

    /// `key < value`.
    #[must_use]
    pub fn lt(key: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::comparison(ExpressionType::Lt, key, value)
    }

    /// `key <= value`.
    #[must_use]
    pub fn lte(key: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::comparison(ExpressionType::Lte, key, value)
    }

    /// `key > value`.
    #[must_use]
    pub fn gt(key: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::comparison(ExpressionType::Gt, key, value)
    }

    /// `key >= value`.
    #[must_use]
    pub fn gte(key: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::comparison(ExpressionType::Gte, key, value)
    }

    /// `key IN [values]`.
    #[must_use]
    pub fn in_list<T: Into<FilterValue>>(key: impl Into<String>, values: Vec<T>) -> Self {
        Self::comparison(ExpressionType::In, key, FilterValue::from(values))
    }

    /// `key NOT IN [values]`.
    #[must_use]
    pub fn not_in<T: Into<FilterValue>>(key: impl Into<String>, values: Vec<T>) -> Self {
        Self::comparison(ExpressionType::Nin, key, FilterValue::from(values))
    }

    /// `self AND other`.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        Self::new(
            ExpressionType::And,
            Operand::Expression(Box::new(self)),
            Some(Operand::Expression(Box::new(other))),
        )
    }

    /// `self OR other`.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self::new(
            ExpressionType::Or,
            Operand::Expression(Box::new(self)),
            Some(Operand::Expression(Box::new(other))),
        )
    }

    /// `NOT self`.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::new(ExpressionType::Not, Operand::Expression(Box::new(self)), None)
    }

    /// `self AND (other)`.
    ///
    /// The right side renders parenthesized, which is how `a AND (b OR c)`
    /// shapes keep their meaning in the generated condition.
    #[must_use]
    pub fn and_group(self, other: Self) -> Self {
        Self::new(
            ExpressionType::And,
            Operand::Expression(Box::new(self)),
            Some(Operand::Group(Box::new(other))),
        )
    }

    /// `self OR (other)`.
    #[must_use]
    pub fn or_group(self, other: Self) -> Self {
        Self::new(
            ExpressionType::Or,
            Operand::Expression(Box::new(self)),
            Some(Operand::Group(Box::new(other))),
        )
    }
}
