//! Filter compiler trait.

use crate::Result;
use crate::models::FilterExpression;

/// Translates a portable [`FilterExpression`] into a backend's condition syntax.
///
/// Conversion is pure: the same tree always yields the same text, and errors
/// are reported before anything is sent to the backend.
pub trait FilterConverter: Send + Sync {
    /// Renders the expression as condition text.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::UnsupportedOperator`] for operators the backend
    /// cannot express and [`crate::Error::InvalidInput`] for malformed trees.
    fn convert(&self, expression: &FilterExpression) -> Result<String>;
}
