//! Text-level services.
//!
//! Parsing of the portable filter syntax into [`crate::FilterExpression`] trees.

mod filter_parser;

pub use filter_parser::parse_filter_expression;
