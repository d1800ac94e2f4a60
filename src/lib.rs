//! Data-binding expression engine for APL documents.
//!
//! Property strings in an APL document may embed expressions such as
//! `"${viewport.width > 500 ? 'wide' : 'narrow'}"`. This crate provides the pieces needed to
//! turn those strings into values:
//!
//! - [`object::Object`], the dynamically typed runtime value with its coercion, equality,
//!   truthiness and serialization rules
//! - [`parser`], a nom grammar for the embedded expression language that drives the
//!   operator-precedence stack machine in [`stack`]
//! - [`evaluator`], the template layer that merges literal text with evaluated expressions
//! - [`context::Context`], the binding environment that resolves symbols, resources and
//!   viewport-relative dimensions
//!
//! ```
//! use apl_databinding::{context::Context, evaluator::evaluate, object::Object};
//!
//! let context = Context::create_test_context();
//! context.put_constant("count", Object::from(3));
//! assert_eq!(evaluate(&context, "${count * 2}"), Object::from(6));
//! assert_eq!(evaluate(&context, "Items: ${count}"), Object::from("Items: 3"));
//! ```

use std::fmt;
use thiserror::Error;

/// Maximum nesting of expressions inside a single data-binding string.
/// Deeper input fails with [`ParseErrorKind::TooDeeplyNested`].
pub const MAX_PARSE_DEPTH: usize = 64;

/// Line and column (both 1-based) of a parse failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Position { line, column }
    }

    /// Compute the position of a byte offset within `input`. Columns count characters.
    pub fn from_offset(input: &str, offset: usize) -> Self {
        let offset = offset.min(input.len());
        let consumed = input.get(..offset).unwrap_or(input);
        let line = consumed.matches('\n').count() + 1;
        let line_start = consumed.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let column = consumed[line_start..].chars().count() + 1;
        Position { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// The grammar rule that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    InvalidNumberFormat,
    UnexpectedToken,
    UnexpectedTokenBeforeEof,
    ExpectedOperandAfterMultiplicative,
    ExpectedOperandAfterAdditive,
    ExpectedOperandAfterComparison,
    ExpectedOperandAfterEquality,
    ExpectedOperandAfterLogicalAnd,
    ExpectedOperandAfterLogicalOr,
    ExpectedOperandAfterNullc,
    ExpectedExpression,
    MalformedArray,
    UnterminatedSingleQuotedString,
    UnterminatedDoubleQuotedString,
    ExpectedMapValueAssignment,
    ExpectedMapAssignment,
    MalformedMap,
    MalformedTernaryExpression,
    ExpectedPostfixRightParen,
    ExpectedGroupEnd,
    ExpectedArrayAccessEnd,
    ExpectedDataBindingEnd,
    TooDeeplyNested,
}

impl ParseErrorKind {
    pub fn message(self) -> &'static str {
        match self {
            ParseErrorKind::InvalidNumberFormat => "Invalid number format",
            ParseErrorKind::UnexpectedToken => "Unexpected token",
            ParseErrorKind::UnexpectedTokenBeforeEof => "Unexpected token before end of string",
            ParseErrorKind::ExpectedOperandAfterMultiplicative => {
                "Expected an operand after a multiplicative operator"
            }
            ParseErrorKind::ExpectedOperandAfterAdditive => {
                "Expected an operand after an additive operator"
            }
            ParseErrorKind::ExpectedOperandAfterComparison => {
                "Expected an operand after a comparison operator"
            }
            ParseErrorKind::ExpectedOperandAfterEquality => {
                "Expected an operand after an equality operator"
            }
            ParseErrorKind::ExpectedOperandAfterLogicalAnd => "Expected an operand after '&&'",
            ParseErrorKind::ExpectedOperandAfterLogicalOr => "Expected an operand after '||'",
            ParseErrorKind::ExpectedOperandAfterNullc => "Expected an operand after '??'",
            ParseErrorKind::ExpectedExpression => "Expected an expression",
            ParseErrorKind::MalformedArray => "Malformed array",
            ParseErrorKind::UnterminatedSingleQuotedString => "Unterminated single-quoted string",
            ParseErrorKind::UnterminatedDoubleQuotedString => "Unterminated double-quoted string",
            ParseErrorKind::ExpectedMapValueAssignment => "Expected ':' after a map key",
            ParseErrorKind::ExpectedMapAssignment => "Expected a quoted key in a map",
            ParseErrorKind::MalformedMap => "Malformed map",
            ParseErrorKind::MalformedTernaryExpression => "Malformed ternary expression",
            ParseErrorKind::ExpectedPostfixRightParen => "Expected ')' to close the argument list",
            ParseErrorKind::ExpectedGroupEnd => "Expected ')' to close the group",
            ParseErrorKind::ExpectedArrayAccessEnd => "Expected ']' to close the index",
            ParseErrorKind::ExpectedDataBindingEnd => "Expected '}' to close the data binding",
            ParseErrorKind::TooDeeplyNested => "Expression nesting is too deep",
        }
    }
}

/// Structured parse error with source position
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at {position}")]
pub struct ParseError {
    pub position: Position,
    pub kind: ParseErrorKind,
    pub message: String,
}

impl ParseError {
    /// Build an error for `kind` at byte `offset` of `input`
    pub fn at(kind: ParseErrorKind, input: &str, offset: usize) -> Self {
        ParseError {
            position: Position::from_offset(input, offset),
            kind,
            message: kind.message().to_string(),
        }
    }
}

/// Error types for the engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("Color error: {0}")]
    Color(#[from] color::ColorError),
    #[error("Invalid dimension: '{0}'")]
    Dimension(String),
    #[error("JSON error: {0}")]
    Json(String),
    #[error("Unknown binding: {0}")]
    UnknownBinding(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(err.to_string())
    }
}

pub mod builtinops;
pub mod color;
pub mod context;
pub mod dependant;
pub mod dimension;
pub mod evaluator;
pub mod functions;
pub mod json;
pub mod node;
pub mod numberformat;
pub mod object;
pub mod objectdata;
pub mod parser;
pub mod primitives;
pub mod stack;

pub use context::Context;
pub use object::{Object, ObjectType};
