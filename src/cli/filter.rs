//! Render-filter CLI command.

use super::write_error;
use crate::services::parse_filter_expression;
use crate::storage::surrealql::SurrealFilterConverter;
use crate::storage::traits::FilterConverter;
use crate::Result;
use std::io::Write;

/// Parses filter text and prints the SurrealQL condition it compiles to.
///
/// # Errors
///
/// Returns [`crate::Error::InvalidInput`] if the text does not parse and
/// [`crate::Error::UnsupportedOperator`] if it cannot be expressed.
pub fn cmd_render_filter(text: &str, out: &mut dyn Write) -> Result<String> {
    let expression = parse_filter_expression(text)?;
    let condition = SurrealFilterConverter::new().convert(&expression)?;
    writeln!(out, "{condition}").map_err(write_error)?;
    Ok(condition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_render_filter() {
        let mut out = Vec::new();
        let condition = cmd_render_filter(
            "genre == 'drama' && (year >= 2020 || NOT lang in ['fr', 'de'])",
            &mut out,
        )
        .expect("render");
        assert_eq!(
            condition,
            "genre = 'drama' AND (year >= 2020 OR lang NOT IN ['fr','de'])"
        );
        assert_eq!(String::from_utf8(out).expect("utf8"), format!("{condition}\n"));
    }

    #[test]
    fn test_unsupported_negation() {
        let result = cmd_render_filter("NOT year < 2020", &mut Vec::new());
        assert!(matches!(result, Err(Error::UnsupportedOperator { .. })));
    }
}
