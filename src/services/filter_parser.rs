//! Filter expression parser.
//!
//! Parses the portable filter syntax used by the CLI and by
//! [`crate::SearchRequest::with_filter_text`]:
//!
//! - `genre == 'drama'` - comparison (`==`, `!=`, `<`, `<=`, `>`, `>=`)
//! - `year in [2020, 2021]` - membership (`IN`, `NIN`, `NOT IN`)
//! - `a == 1 && b == 2`, `a == 1 AND b == 2` - conjunction
//! - `a == 1 || b == 2`, `a == 1 OR b == 2` - disjunction
//! - `NOT (a == 1)`, `!(a in [1, 2])` - negation
//! - `(a == 1 || b == 2) && c == 3` - grouping
//!
//! Keywords are case-insensitive. `AND` binds tighter than `OR`. Keys are
//! dotted identifiers (`meta.year`) or quoted strings.

use crate::models::{ExpressionType, FilterExpression, FilterValue, Operand};
use crate::{Error, Result};

/// Maximum nesting of groups and negations.
const MAX_DEPTH: usize = 64;

/// Parses filter text into a [`FilterExpression`].
///
/// Parentheses become [`Operand::Group`] nodes, except directly under a
/// negation (`NOT (x == 1)` negates the comparison itself) and around the
/// whole input.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] naming the byte offset of the problem.
///
/// # Examples
///
/// ```
/// use surrealvec::services::parse_filter_expression;
/// use surrealvec::FilterExpression;
///
/// let filter = parse_filter_expression("genre == 'drama' && year >= 2020")?;
/// assert_eq!(
///     filter,
///     FilterExpression::eq("genre", "drama").and(FilterExpression::gte("year", 2020))
/// );
/// # Ok::<(), surrealvec::Error>(())
/// ```
pub fn parse_filter_expression(input: &str) -> Result<FilterExpression> {
    let tokens = tokenize(input)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        end: input.len(),
    };
    let operand = parser.parse_or()?;
    if let Some(token) = parser.peek() {
        return Err(syntax_error(token.offset, "unexpected trailing input"));
    }
    Ok(into_expression(operand))
}

#[derive(Debug, Clone, PartialEq)]
enum TokenKind {
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Compare(ExpressionType),
    And,
    Or,
    Not,
    Word(String),
    Str(String),
    Number(String),
}

#[derive(Debug, Clone)]
struct Token {
    kind: TokenKind,
    offset: usize,
}

fn syntax_error(offset: usize, message: &str) -> Error {
    Error::InvalidInput(format!("filter syntax error at byte {offset}: {message}"))
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(offset, c)) = chars.peek() {
        let kind = match c {
            c if c.is_whitespace() => {
                chars.next();
                continue;
            },
            '(' => single(&mut chars, TokenKind::LParen),
            ')' => single(&mut chars, TokenKind::RParen),
            '[' => single(&mut chars, TokenKind::LBracket),
            ']' => single(&mut chars, TokenKind::RBracket),
            ',' => single(&mut chars, TokenKind::Comma),
            '=' | '!' | '<' | '>' => {
                chars.next();
                let followed_by_eq = chars.next_if(|&(_, next)| next == '=').is_some();
                match (c, followed_by_eq) {
                    ('=', true) => TokenKind::Compare(ExpressionType::Eq),
                    ('=', false) => return Err(syntax_error(offset, "expected '=='")),
                    ('!', true) => TokenKind::Compare(ExpressionType::Ne),
                    ('!', false) => TokenKind::Not,
                    ('<', true) => TokenKind::Compare(ExpressionType::Lte),
                    ('<', false) => TokenKind::Compare(ExpressionType::Lt),
                    ('>', true) => TokenKind::Compare(ExpressionType::Gte),
                    _ => TokenKind::Compare(ExpressionType::Gt),
                }
            },
            '&' | '|' => {
                chars.next();
                if chars.next_if(|&(_, next)| next == c).is_none() {
                    return Err(syntax_error(offset, "expected '&&' or '||'"));
                }
                if c == '&' { TokenKind::And } else { TokenKind::Or }
            },
            '\'' | '"' => TokenKind::Str(lex_string(&mut chars, offset)?),
            c if c.is_ascii_digit() || c == '-' || c == '+' || c == '.' => {
                let mut text = String::new();
                while let Some((_, d)) = chars.next_if(|&(_, d)| {
                    d.is_ascii_alphanumeric() || matches!(d, '.' | '-' | '+' | '_')
                }) {
                    text.push(d);
                }
                TokenKind::Number(text)
            },
            c if c.is_alphabetic() || c == '_' => {
                let mut word = String::new();
                while let Some((_, d)) =
                    chars.next_if(|&(_, d)| d.is_alphanumeric() || d == '_' || d == '.')
                {
                    word.push(d);
                }
                match word.to_ascii_uppercase().as_str() {
                    "AND" => TokenKind::And,
                    "OR" => TokenKind::Or,
                    "NOT" => TokenKind::Not,
                    _ => TokenKind::Word(word),
                }
            },
            other => {
                return Err(syntax_error(offset, &format!("unexpected character '{other}'")));
            },
        };
        tokens.push(Token { kind, offset });
    }
    Ok(tokens)
}

fn single(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    kind: TokenKind,
) -> TokenKind {
    chars.next();
    kind
}

fn lex_string(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
    offset: usize,
) -> Result<String> {
    let Some((_, quote)) = chars.next() else {
        return Err(syntax_error(offset, "expected a string"));
    };
    let mut value = String::new();
    loop {
        match chars.next() {
            Some((_, '\\')) => match chars.next() {
                Some((_, escaped)) => value.push(escaped),
                None => return Err(syntax_error(offset, "unterminated string")),
            },
            Some((_, c)) if c == quote => return Ok(value),
            Some((_, c)) => value.push(c),
            None => return Err(syntax_error(offset, "unterminated string")),
        }
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.peek().map(|t| &t.kind)
    }

    fn offset(&self) -> usize {
        self.peek().map_or(self.end, |t| t.offset)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> Result<()> {
        if self.peek_kind() == Some(kind) {
            self.pos += 1;
            Ok(())
        } else {
            Err(syntax_error(self.offset(), &format!("expected {what}")))
        }
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(syntax_error(self.offset(), "expression nested too deeply"));
        }
        Ok(())
    }

    fn parse_or(&mut self) -> Result<Operand> {
        let mut left = self.parse_and()?;
        while self.peek_kind() == Some(&TokenKind::Or) {
            self.pos += 1;
            let right = self.parse_and()?;
            left = binary(ExpressionType::Or, left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Operand> {
        let mut left = self.parse_unary()?;
        while self.peek_kind() == Some(&TokenKind::And) {
            self.pos += 1;
            let right = self.parse_unary()?;
            left = binary(ExpressionType::And, left, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Operand> {
        if self.peek_kind() == Some(&TokenKind::Not) {
            self.pos += 1;
            self.enter()?;
            let operand = self.parse_unary()?;
            self.depth -= 1;
            let negated = FilterExpression::new(
                ExpressionType::Not,
                Operand::Expression(Box::new(into_expression(operand))),
                None,
            );
            return Ok(Operand::Expression(Box::new(negated)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Operand> {
        if self.peek_kind() == Some(&TokenKind::LParen) {
            self.pos += 1;
            self.enter()?;
            let inner = self.parse_or()?;
            self.depth -= 1;
            self.expect(&TokenKind::RParen, "')'")?;
            return Ok(Operand::Group(Box::new(into_expression(inner))));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Operand> {
        let key_offset = self.offset();
        let key = match self.advance().map(|t| t.kind) {
            Some(TokenKind::Word(word) | TokenKind::Str(word)) => word,
            _ => return Err(syntax_error(key_offset, "expected a field name")),
        };

        let op_offset = self.offset();
        let kind = match self.advance().map(|t| t.kind) {
            Some(TokenKind::Compare(kind)) => kind,
            Some(TokenKind::Not) => {
                let in_offset = self.offset();
                match self.advance().map(|t| t.kind) {
                    Some(TokenKind::Word(w)) if w.eq_ignore_ascii_case("in") => ExpressionType::Nin,
                    _ => return Err(syntax_error(in_offset, "expected 'IN' after 'NOT'")),
                }
            },
            Some(TokenKind::Word(w)) if w.eq_ignore_ascii_case("in") => ExpressionType::In,
            Some(TokenKind::Word(w)) if w.eq_ignore_ascii_case("nin") => ExpressionType::Nin,
            _ => return Err(syntax_error(op_offset, "expected a comparison operator")),
        };

        if matches!(kind, ExpressionType::In | ExpressionType::Nin)
            && self.peek_kind() != Some(&TokenKind::LBracket)
        {
            return Err(syntax_error(self.offset(), "expected '[' to start a list"));
        }
        let value = self.parse_value()?;

        Ok(Operand::Expression(Box::new(FilterExpression::new(
            kind,
            Operand::Key(key),
            Some(Operand::Value(value)),
        ))))
    }

    fn parse_value(&mut self) -> Result<FilterValue> {
        let offset = self.offset();
        match self.advance().map(|t| t.kind) {
            Some(TokenKind::Str(s)) => Ok(FilterValue::Text(s)),
            Some(TokenKind::Number(text)) => parse_number(&text, offset),
            Some(TokenKind::Word(w)) if w.eq_ignore_ascii_case("true") => Ok(FilterValue::Bool(true)),
            Some(TokenKind::Word(w)) if w.eq_ignore_ascii_case("false") => {
                Ok(FilterValue::Bool(false))
            },
            Some(TokenKind::LBracket) => {
                self.enter()?;
                let mut items = Vec::new();
                if self.peek_kind() == Some(&TokenKind::RBracket) {
                    return Err(syntax_error(self.offset(), "list must not be empty"));
                }
                loop {
                    items.push(self.parse_value()?);
                    match self.advance().map(|t| t.kind) {
                        Some(TokenKind::Comma) => {},
                        Some(TokenKind::RBracket) => {
                            self.depth -= 1;
                            return Ok(FilterValue::List(items));
                        },
                        _ => return Err(syntax_error(self.offset(), "expected ',' or ']'")),
                    }
                }
            },
            _ => Err(syntax_error(offset, "expected a value")),
        }
    }
}

fn parse_number(text: &str, offset: usize) -> Result<FilterValue> {
    if let Ok(i) = text.parse::<i64>() {
        return Ok(FilterValue::Int(i));
    }
    match text.parse::<f64>() {
        Ok(f) if f.is_finite() => Ok(FilterValue::Float(f)),
        _ => Err(syntax_error(offset, &format!("invalid number '{text}'"))),
    }
}

fn binary(kind: ExpressionType, left: Operand, right: Operand) -> Operand {
    Operand::Expression(Box::new(FilterExpression::new(kind, left, Some(right))))
}

/// Unwraps an operand produced by the parser into an expression.
fn into_expression(operand: Operand) -> FilterExpression {
    match operand {
        Operand::Expression(expr) | Operand::Group(expr) => *expr,
        // Comparisons always produce expressions.
        Operand::Key(key) => FilterExpression::new(ExpressionType::Eq, Operand::Key(key), None),
        Operand::Value(value) => {
            FilterExpression::new(ExpressionType::Eq, Operand::Value(value), None)
        },
    }
}
