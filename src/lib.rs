//! # toon_syntax
//!
//! A lexer, resilient parser, and canonical encoder for the TOON
//! (Token-Oriented Object Notation) format.
//!
//! ## What is TOON?
//!
//! TOON is a line-oriented, indentation-sensitive data format that is more
//! token-dense than JSON, aimed at feeding structured data to Large
//! Language Models. It keeps JSON's value model (objects, arrays, strings,
//! numbers, booleans, null) but drops most of the punctuation:
//!
//! ```text
//! name: Alice
//! tags[3]: reading,gaming,coding
//! users[2]{id,name}:
//!   1,Alice
//!   2,Bob
//! ```
//!
//! The `users` property above is a *table array*: the schema is declared
//! once and every record contributes one delimiter-separated row.
//!
//! ## Key Features
//!
//! - **Resilient parsing**: malformed input yields a partial syntax tree
//!   plus structured diagnostics instead of a single failure — exactly what
//!   editor tooling needs. The parser records, recovers, and continues.
//! - **Full-fidelity tokens**: every token carries its line, column, byte
//!   offset, and length; the token list is returned alongside the tree.
//! - **Canonical encoding**: JSON (with comments and trailing commas
//!   tolerated) is translated into TOON with deterministic quoting, number
//!   normalization (no exponents, `1.0` → `1`, `-0` → `0`), and automatic
//!   inline/expanded/table form selection.
//! - **Bounded resources**: input size, token count, token length, array
//!   size, and nesting depth are all capped and enforced.
//!
//! ## Parsing
//!
//! ```rust
//! use toon_syntax::parse;
//!
//! let result = parse("name: Alice\nage: 30").unwrap();
//! assert!(result.is_success());
//!
//! let doc = result.document.unwrap();
//! let props = doc.as_object_properties().unwrap();
//! assert_eq!(props[0].key, "name");
//! assert_eq!(props[0].value.as_str(), Some("Alice"));
//! ```
//!
//! Malformed input still produces a document:
//!
//! ```rust
//! use toon_syntax::{parse, ErrorCode};
//!
//! let result = parse("name: \"John\nage: 30").unwrap();
//! assert!(result.has_errors());
//! assert_eq!(result.errors[0].code, Some(ErrorCode::UnterminatedString));
//!
//! // The name property survived with the recovered value.
//! let doc = result.document.unwrap();
//! let props = doc.as_object_properties().unwrap();
//! assert_eq!(props[0].value.as_str(), Some("John"));
//! ```
//!
//! ## Encoding
//!
//! ```rust
//! use toon_syntax::encode;
//!
//! let json = r#"{"users":[{"id":1,"name":"Alice"},{"id":2,"name":"Bob"}]}"#;
//! let toon = encode(json).unwrap();
//! assert_eq!(toon, "users[2]{id,name}:\n  1,Alice\n  2,Bob");
//! ```
//!
//! ## Tokenizing
//!
//! ```rust
//! use toon_syntax::{tokenize, TokenKind};
//!
//! let result = tokenize("a: 1").unwrap();
//! assert_eq!(result.tokens.last().unwrap().kind, TokenKind::EndOfFile);
//! ```
//!
//! ## Concurrency
//!
//! Every entry point is a pure function of its inputs and options. Lexer
//! and parser instances own mutable cursors and are single-threaded, but
//! independent inputs can be processed on independent threads without any
//! coordination. The only shared state is a handful of compiled patterns,
//! read-only after first use.

pub mod ast;
pub mod encoder;
pub mod error;
pub mod lexer;
pub mod options;
pub mod parser;
pub mod token;

pub use ast::{AstNode, Property};
pub use encoder::Encoder;
pub use error::{Error, ErrorCode, ParseError, Result};
pub use lexer::{Lexer, TokenizeResult};
pub use options::{Delimiter, EncoderOptions, ParserOptions};
pub use parser::{ParseResult, ParseStatus, Parser};
pub use token::{Position, Span, Token, TokenKind};

use std::panic::{catch_unwind, AssertUnwindSafe};

/// Parses TOON source into a [`ParseResult`] with default options.
///
/// The parser is resilient: syntax errors are recorded in
/// [`ParseResult::errors`] and parsing continues, so a document is present
/// even for malformed input.
///
/// # Examples
///
/// ```rust
/// use toon_syntax::parse;
///
/// let result = parse("name: Alice").unwrap();
/// assert!(result.is_success());
/// ```
///
/// # Errors
///
/// Returns [`Error::InputTooLarge`] when the source exceeds
/// [`ParserOptions::max_input_size`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn parse(source: &str) -> Result<ParseResult> {
    parse_with_options(source, ParserOptions::default())
}

/// Parses TOON source with custom options.
///
/// # Errors
///
/// Returns [`Error::InputTooLarge`] when the source exceeds
/// `options.max_input_size`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn parse_with_options(source: &str, options: ParserOptions) -> Result<ParseResult> {
    check_input_size(source, &options)?;
    Ok(Parser::new(source, options).parse())
}

/// Parses TOON source, reporting failure as a flag instead of an error.
///
/// Returns `true` with the parse result for any parseable input — even one
/// that carries diagnostics. Returns `false` only for blank input,
/// oversized input, or a catastrophic internal failure; the accompanying
/// result then has [`ParseStatus::Failure`] and a single diagnostic naming
/// the condition.
///
/// # Examples
///
/// ```rust
/// use toon_syntax::try_parse;
///
/// let (ok, result) = try_parse("name: Alice");
/// assert!(ok && result.is_success());
///
/// let (ok, _) = try_parse("   ");
/// assert!(!ok);
/// ```
#[must_use]
pub fn try_parse(source: &str) -> (bool, ParseResult) {
    try_parse_with_options(source, ParserOptions::default())
}

/// [`try_parse`] with custom options.
#[must_use]
pub fn try_parse_with_options(source: &str, options: ParserOptions) -> (bool, ParseResult) {
    if source.trim().is_empty() {
        return (false, ParseResult::failure("source is blank"));
    }
    if source.len() > options.max_input_size {
        return (
            false,
            ParseResult::failure(format!(
                "input is {} bytes, which exceeds the maximum of {} bytes",
                source.len(),
                options.max_input_size
            )),
        );
    }

    // A panic inside the parser is a bug, but callers of try_parse asked
    // for a flag, not an unwind.
    match catch_unwind(AssertUnwindSafe(|| Parser::new(source, options).parse())) {
        Ok(result) => (true, result),
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unexpected internal failure".to_string());
            (false, ParseResult::failure(format!("parser panicked: {message}")))
        }
    }
}

/// Tokenizes TOON source with default options.
///
/// The returned token list always ends in exactly one
/// [`TokenKind::EndOfFile`]; lexical problems are reported in
/// [`TokenizeResult::errors`] rather than aborting the scan.
///
/// # Errors
///
/// Returns [`Error::InputTooLarge`] when the source exceeds
/// [`ParserOptions::max_input_size`].
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn tokenize(source: &str) -> Result<TokenizeResult> {
    tokenize_with_options(source, ParserOptions::default())
}

/// Tokenizes TOON source with custom options.
///
/// # Errors
///
/// Returns [`Error::InputTooLarge`] when the source exceeds
/// `options.max_input_size`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn tokenize_with_options(source: &str, options: ParserOptions) -> Result<TokenizeResult> {
    check_input_size(source, &options)?;
    Ok(Lexer::new(source, options).tokenize())
}

/// Encodes JSON text into canonical TOON with default options.
///
/// The input may contain `//` and `/* */` comments and trailing commas.
/// Object field order is preserved.
///
/// # Examples
///
/// ```rust
/// use toon_syntax::encode;
///
/// assert_eq!(encode(r#"{"a":1,"b":[1,2]}"#).unwrap(), "a: 1\nb[2]: 1,2");
/// ```
///
/// # Errors
///
/// Returns [`Error::Json`] when the input is not valid JSON.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn encode(json: &str) -> Result<String> {
    encode_with_options(json, EncoderOptions::default())
}

/// Encodes JSON text into TOON with custom options.
///
/// # Examples
///
/// ```rust
/// use toon_syntax::{encode_with_options, Delimiter, EncoderOptions};
///
/// let options = EncoderOptions::new().with_delimiter(Delimiter::Pipe);
/// assert_eq!(
///     encode_with_options(r#"{"tags":["a","b"]}"#, options).unwrap(),
///     "tags[2|]: a|b"
/// );
/// ```
///
/// # Errors
///
/// Returns [`Error::Json`] when the input is not valid JSON.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn encode_with_options(json: &str, options: EncoderOptions) -> Result<String> {
    Encoder::new(options).encode(json)
}

fn check_input_size(source: &str, options: &ParserOptions) -> Result<()> {
    if source.len() > options.max_input_size {
        return Err(Error::InputTooLarge {
            size: source.len(),
            limit: options.max_input_size,
        });
    }
    Ok(())
}
