//! Fuzz testing for the filter parser and compiler.
//!
//! Uses proptest with adversarial inputs to find edge cases and crashes:
//! - Malformed inputs that might cause panics
//! - Boundary conditions
//! - Unicode edge cases
//! - Injection attempts
//! - Deep nesting

// Fuzz tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::uninlined_format_args
)]

use proptest::prelude::*;
use surrealvec::services::parse_filter_expression;
use surrealvec::storage::surrealql::SurrealFilterConverter;
use surrealvec::{Error, FilterConverter};

/// Parses and, when parsing succeeds, compiles the input.
fn parse_and_convert(input: &str) -> Option<surrealvec::Result<String>> {
    parse_filter_expression(input)
        .ok()
        .map(|expr| SurrealFilterConverter::new().convert(&expr))
}

// ============================================================================
// Fuzz Testing for the Filter Parser
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    /// Fuzz: Random ASCII strings should never panic.
    #[test]
    fn fuzz_random_ascii_no_panic(input in "[\\x00-\\x7F]{0,500}") {
        let _ = parse_and_convert(&input);
    }

    /// Fuzz: Random Unicode strings should never panic.
    #[test]
    fn fuzz_random_unicode_no_panic(input in "\\PC{0,200}") {
        let _ = parse_and_convert(&input);
    }

    /// Fuzz: Operator soup should not panic.
    #[test]
    fn fuzz_operator_soup_no_panic(input in "[=!<>&|()\\[\\], a-z0-9'\"]{0,200}") {
        let _ = parse_and_convert(&input);
    }

    /// Fuzz: Keyword soup should not panic.
    #[test]
    fn fuzz_keyword_soup_no_panic(
        words in prop::collection::vec(
            prop::sample::select(vec![
                "AND", "OR", "NOT", "IN", "NIN", "and", "not", "in", "(", ")", "[", "]",
                ",", "==", "!=", "<", "<=", ">", ">=", "&&", "||", "!", "a", "b.c", "1",
                "-2.5", "'x'", "true",
            ]),
            0..60
        )
    ) {
        let _ = parse_and_convert(&words.join(" "));
    }

    /// Fuzz: Null bytes in input should not panic.
    #[test]
    fn fuzz_null_bytes_no_panic(
        prefix in "[a-z]{0,10}",
        suffix in "[a-z]{0,10}"
    ) {
        let input = format!("{prefix} == '\0{suffix}'");
        let _ = parse_and_convert(&input);
    }

    /// Fuzz: Very long single token should not panic.
    #[test]
    fn fuzz_very_long_token_no_panic(len in 1000usize..10000) {
        let input = format!("{} == 1", "a".repeat(len));
        let _ = parse_and_convert(&input);
    }

    /// Fuzz: Numeric edge cases are either values or errors.
    #[test]
    fn fuzz_numbers_no_panic(number in "[-+.0-9eE_a-z]{1,40}") {
        let _ = parse_and_convert(&format!("n == {number}"));
        let _ = parse_and_convert(&format!("n in [{number}, {number}]"));
    }

    /// Fuzz: Strings with quotes and backslashes should not panic.
    #[test]
    fn fuzz_quoted_strings_no_panic(body in "['\"\\\\a-z ]{0,50}") {
        let _ = parse_and_convert(&format!("k == '{body}'"));
        let _ = parse_and_convert(&format!("k == \"{body}\""));
    }

    /// Fuzz: Nesting depth is bounded without overflowing the stack.
    #[test]
    fn fuzz_deep_nesting_no_panic(depth in 0usize..5000, open in "[(\\[]|NOT |! ") {
        let input = format!("{}a == 1", open.repeat(depth));
        let _ = parse_and_convert(&input);
    }

    /// Fuzz: Long AND/OR chains compile.
    #[test]
    fn fuzz_long_chains(terms in 1usize..200, use_and in any::<bool>()) {
        let joiner = if use_and { " && " } else { " || " };
        let input = vec!["k == 1"; terms].join(joiner);
        let compiled = parse_and_convert(&input).expect("chain parses").expect("chain compiles");
        let word = if use_and { " AND " } else { " OR " };
        prop_assert_eq!(compiled.matches(word).count(), terms - 1);
    }
}

// ============================================================================
// Adversarial Test Cases
// ============================================================================

#[cfg(test)]
mod adversarial_tests {
    use super::*;

    fn compile(input: &str) -> surrealvec::Result<String> {
        let expr = parse_filter_expression(input)?;
        SurrealFilterConverter::new().convert(&expr)
    }

    #[test]
    fn test_injection_in_values_is_escaped() {
        let compiled = compile(r"title == 'x\'; DELETE docs; --'").expect("compiles");
        assert_eq!(compiled, r"title = 'x\'; DELETE docs; --'");

        let compiled = compile(r#"title == "back\\slash""#).expect("compiles");
        assert_eq!(compiled, r"title = 'back\\slash'");
    }

    #[test]
    fn test_injection_in_keys_is_rejected() {
        let result = compile("'a; DELETE docs' == 1");
        assert!(matches!(result, Err(Error::InvalidInput(_))));

        let result = compile("'a b' == 1");
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_unicode_keys_are_rejected() {
        assert!(matches!(compile("ключ == 1"), Err(Error::InvalidInput(_))));
        assert!(matches!(compile("naïve == 1"), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_unicode_values_survive() {
        assert_eq!(compile("k == '日本語 ⟩'").expect("compiles"), "k = '日本語 ⟩'");
    }

    #[test]
    fn test_dotted_key_edge_cases() {
        assert_eq!(compile("a.b.c == 1").expect("compiles"), "a.b.c = 1");
        assert!(compile("a..b == 1").is_err());
        assert!(compile("a. == 1").is_err());
    }

    #[test]
    fn test_lone_operators() {
        for input in ["==", "!=", "&&", "||", "!", "NOT", "AND", "(", ")", "[", "]", ","] {
            assert!(compile(input).is_err(), "{input:?} should not compile");
        }
    }

    #[test]
    fn test_number_boundaries() {
        assert_eq!(
            compile(&format!("n == {}", i64::MAX)).expect("compiles"),
            format!("n = {}", i64::MAX)
        );
        assert_eq!(
            compile(&format!("n == {}", i64::MIN)).expect("compiles"),
            format!("n = {}", i64::MIN)
        );
        // Past i64 the value becomes a float.
        let overflow = compile("n == 9223372036854775808").expect("compiles");
        assert_ne!(overflow, "n = 9223372036854775808");
        assert!(compile("n == 1e999").is_err());
        assert!(compile("n == -").is_err());
    }

    #[test]
    fn test_negation_of_unsupported_shapes() {
        for input in [
            "NOT a < 1",
            "NOT a >= 1",
            "NOT (a == 1 && b == 2)",
            "NOT NOT a == 1",
            "NOT (a == 1) || NOT b < 2",
        ] {
            assert!(
                matches!(compile(input), Err(Error::UnsupportedOperator { .. })),
                "{input:?} should be unsupported"
            );
        }
    }
}
