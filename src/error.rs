//! Error types for TOON lexing, parsing, and encoding.
//!
//! Two layers exist, mirroring the two ways things go wrong:
//!
//! - [`Error`]: entry-point failures that short-circuit a public operation
//!   (oversize input, malformed JSON handed to the encoder).
//! - [`ParseError`]: a diagnostic record accumulated inside a
//!   [`ParseResult`](crate::ParseResult) while lexing/parsing continues.
//!   Diagnostics never unwind; the parser records them and recovers.
//!
//! Every diagnostic carries an optional [`ErrorCode`] — a stable identifier
//! suitable for programmatic filtering — plus a human-readable message and
//! full position information.
//!
//! ## Examples
//!
//! ```rust
//! use toon_syntax::{parse, ErrorCode};
//!
//! let result = parse("name: \"John").unwrap();
//! assert!(result.has_errors());
//! assert!(result
//!     .errors
//!     .iter()
//!     .any(|e| e.code == Some(ErrorCode::UnterminatedString)));
//! ```

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Failures that abort a public operation before any result is produced.
#[derive(Debug, Error)]
pub enum Error {
    /// Source text longer than `max_input_size`.
    #[error("input is {size} bytes, which exceeds the maximum of {limit} bytes")]
    InputTooLarge { size: usize, limit: usize },

    /// The encoder's JSON input failed to decode.
    #[error("invalid JSON input: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Stable identifiers for every diagnostic the lexer and parser can record.
///
/// The numeric ranges group by stage: 1xxx lexical, 2xxx structural,
/// 3xxx array validation, 4xxx delimiter, 5xxx indentation, 9xxx internal
/// safety nets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorCode {
    // Lexical
    UnterminatedString,
    InvalidEscapeSequence,
    InvalidCharacter,
    StringTooLong,
    TokenLimitExceeded,
    // Structural
    ExpectedPropertyKey,
    ExpectedColon,
    ExpectedRightBracket,
    ExpectedRightBrace,
    ExpectedFieldName,
    ExpectedDelimiter,
    UnexpectedToken,
    UnexpectedEndOfInput,
    // Array validation
    ArraySizeMismatch,
    TableSizeMismatch,
    TableRowFieldMismatch,
    // Delimiter
    MixedDelimiters,
    DelimiterMarkerMisplaced,
    // Indentation
    UnexpectedIndentation,
    InconsistentIndentation,
    // Internal
    InfiniteLoopDetected,
}

impl ErrorCode {
    /// Numeric identifier, stable across releases.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        match self {
            ErrorCode::UnterminatedString => 1001,
            ErrorCode::InvalidEscapeSequence => 1002,
            ErrorCode::InvalidCharacter => 1003,
            ErrorCode::StringTooLong => 1004,
            ErrorCode::TokenLimitExceeded => 1005,
            ErrorCode::ExpectedPropertyKey => 2001,
            ErrorCode::ExpectedColon => 2002,
            ErrorCode::ExpectedRightBracket => 2003,
            ErrorCode::ExpectedRightBrace => 2004,
            ErrorCode::ExpectedFieldName => 2005,
            ErrorCode::ExpectedDelimiter => 2006,
            ErrorCode::UnexpectedToken => 2007,
            ErrorCode::UnexpectedEndOfInput => 2008,
            ErrorCode::ArraySizeMismatch => 3001,
            ErrorCode::TableSizeMismatch => 3002,
            ErrorCode::TableRowFieldMismatch => 3003,
            ErrorCode::MixedDelimiters => 4001,
            ErrorCode::DelimiterMarkerMisplaced => 4002,
            ErrorCode::UnexpectedIndentation => 5001,
            ErrorCode::InconsistentIndentation => 5002,
            ErrorCode::InfiniteLoopDetected => 9001,
        }
    }

    /// The identifier's name, as rendered in the canonical error string.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            ErrorCode::UnterminatedString => "UnterminatedString",
            ErrorCode::InvalidEscapeSequence => "InvalidEscapeSequence",
            ErrorCode::InvalidCharacter => "InvalidCharacter",
            ErrorCode::StringTooLong => "StringTooLong",
            ErrorCode::TokenLimitExceeded => "TokenLimitExceeded",
            ErrorCode::ExpectedPropertyKey => "ExpectedPropertyKey",
            ErrorCode::ExpectedColon => "ExpectedColon",
            ErrorCode::ExpectedRightBracket => "ExpectedRightBracket",
            ErrorCode::ExpectedRightBrace => "ExpectedRightBrace",
            ErrorCode::ExpectedFieldName => "ExpectedFieldName",
            ErrorCode::ExpectedDelimiter => "ExpectedDelimiter",
            ErrorCode::UnexpectedToken => "UnexpectedToken",
            ErrorCode::UnexpectedEndOfInput => "UnexpectedEndOfInput",
            ErrorCode::ArraySizeMismatch => "ArraySizeMismatch",
            ErrorCode::TableSizeMismatch => "TableSizeMismatch",
            ErrorCode::TableRowFieldMismatch => "TableRowFieldMismatch",
            ErrorCode::MixedDelimiters => "MixedDelimiters",
            ErrorCode::DelimiterMarkerMisplaced => "DelimiterMarkerMisplaced",
            ErrorCode::UnexpectedIndentation => "UnexpectedIndentation",
            ErrorCode::InconsistentIndentation => "InconsistentIndentation",
            ErrorCode::InfiniteLoopDetected => "InfiniteLoopDetected",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single diagnostic recorded during lexing or parsing.
///
/// The canonical string form is
/// `[Code] message (line L, column C, position P, length N)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseError {
    pub code: Option<ErrorCode>,
    pub message: String,
    /// 1-based line.
    pub line: usize,
    /// 1-based column.
    pub column: usize,
    /// 0-based byte offset.
    pub position: usize,
    /// Byte length of the offending range.
    pub length: usize,
}

impl ParseError {
    #[must_use]
    pub fn new(
        code: ErrorCode,
        message: impl Into<String>,
        line: usize,
        column: usize,
        position: usize,
        length: usize,
    ) -> Self {
        ParseError {
            code: Some(code),
            message: message.into(),
            line,
            column,
            position,
            length,
        }
    }

    /// A diagnostic with no stable code, used for one-off conditions such
    /// as converted panics.
    #[must_use]
    pub fn uncoded(message: impl Into<String>) -> Self {
        ParseError {
            code: None,
            message: message.into(),
            line: 1,
            column: 1,
            position: 0,
            length: 0,
        }
    }

    /// Builds a diagnostic located at `token`.
    #[must_use]
    pub fn at_token(code: ErrorCode, message: impl Into<String>, token: &crate::Token) -> Self {
        ParseError::new(
            code,
            message,
            token.line,
            token.column,
            token.offset,
            token.length,
        )
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(
                f,
                "[{}] {} (line {}, column {}, position {}, length {})",
                code, self.message, self.line, self.column, self.position, self.length
            ),
            None => write!(
                f,
                "{} (line {}, column {}, position {}, length {})",
                self.message, self.line, self.column, self.position, self.length
            ),
        }
    }
}
