//! Token and source-position model.
//!
//! The lexer produces a flat sequence of [`Token`]s, each carrying its kind,
//! its text, and where it came from. Positions are exposed both flattened on
//! the token (line/column/offset/length, convenient for diagnostics) and as
//! a [`Span`] (convenient for AST construction).
//!
//! Lines and columns are 1-based; byte offsets are 0-based. Columns count
//! characters, offsets and lengths count bytes.
//!
//! ## Examples
//!
//! ```rust
//! use toon_syntax::{tokenize, TokenKind};
//!
//! let result = tokenize("name: Alice").unwrap();
//! assert_eq!(result.tokens[0].kind, TokenKind::Identifier);
//! assert_eq!(result.tokens[0].text, "name");
//! assert_eq!(result.tokens[0].line, 1);
//! assert_eq!(result.tokens[0].column, 1);
//! assert_eq!(result.tokens.last().unwrap().kind, TokenKind::EndOfFile);
//! ```

use serde::Serialize;
use std::fmt;

/// A position in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    /// 1-based line number.
    pub line: usize,
    /// 1-based column, counted in characters.
    pub column: usize,
    /// 0-based byte offset.
    pub offset: usize,
}

impl Position {
    #[must_use]
    pub const fn new(line: usize, column: usize, offset: usize) -> Self {
        Position {
            line,
            column,
            offset,
        }
    }

    /// The start of any source text.
    #[must_use]
    pub const fn start() -> Self {
        Position {
            line: 1,
            column: 1,
            offset: 0,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A source range between two [`Position`]s, end-exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    #[must_use]
    pub const fn new(start: Position, end: Position) -> Self {
        Span { start, end }
    }

    /// A zero-width span at `pos`.
    #[must_use]
    pub const fn point(pos: Position) -> Self {
        Span {
            start: pos,
            end: pos,
        }
    }

    /// The smallest span covering both `self` and `other`.
    #[must_use]
    pub fn merge(self, other: Span) -> Span {
        let start = if self.start.offset <= other.start.offset {
            self.start
        } else {
            other.start
        };
        let end = if self.end.offset >= other.end.offset {
            self.end
        } else {
            other.end
        };
        Span { start, end }
    }

    /// Byte length of the span.
    #[must_use]
    pub fn len(&self) -> usize {
        self.end.offset.saturating_sub(self.start.offset)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The kind of a [`Token`].
///
/// `Indent` and `Dedent` are declared for forward compatibility but are not
/// currently produced; indentation travels as a leading `Whitespace` token
/// plus the column of the first non-whitespace token on the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TokenKind {
    /// Quoted-string content or a bare word in value position.
    String,
    Number,
    True,
    False,
    Null,
    /// Bare word followed by `:`, `[`, or `{` — a property key.
    Identifier,
    Colon,
    Comma,
    Pipe,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    Newline,
    Indent,
    Dedent,
    Whitespace,
    Comment,
    EndOfFile,
    Invalid,
}

impl TokenKind {
    /// Whether this kind can stand alone as a scalar value.
    #[must_use]
    pub const fn is_value(self) -> bool {
        matches!(
            self,
            TokenKind::String
                | TokenKind::Number
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null
                | TokenKind::Identifier
                | TokenKind::Invalid
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::String => "string",
            TokenKind::Number => "number",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Null => "null",
            TokenKind::Identifier => "identifier",
            TokenKind::Colon => "':'",
            TokenKind::Comma => "','",
            TokenKind::Pipe => "'|'",
            TokenKind::LeftBracket => "'['",
            TokenKind::RightBracket => "']'",
            TokenKind::LeftBrace => "'{'",
            TokenKind::RightBrace => "'}'",
            TokenKind::Newline => "newline",
            TokenKind::Indent => "indent",
            TokenKind::Dedent => "dedent",
            TokenKind::Whitespace => "whitespace",
            TokenKind::Comment => "comment",
            TokenKind::EndOfFile => "end of input",
            TokenKind::Invalid => "invalid token",
        };
        f.write_str(name)
    }
}

/// A single lexical token. Immutable once produced.
///
/// `text` holds the decoded value for quoted strings (escapes resolved,
/// quotes stripped) and the raw source slice for every other kind, so
/// `length` equals the raw byte length in all cases but may differ from
/// `text.len()` for quoted strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// 1-based line of the first character.
    pub line: usize,
    /// 1-based column of the first character.
    pub column: usize,
    /// 0-based byte offset of the first character.
    pub offset: usize,
    /// Byte length of the raw source slice.
    pub length: usize,
}

impl Token {
    #[must_use]
    pub fn new(
        kind: TokenKind,
        text: impl Into<String>,
        line: usize,
        column: usize,
        offset: usize,
        length: usize,
    ) -> Self {
        Token {
            kind,
            text: text.into(),
            line,
            column,
            offset,
            length,
        }
    }

    /// Position of the first character.
    #[must_use]
    pub const fn position(&self) -> Position {
        Position::new(self.line, self.column, self.offset)
    }

    /// Span of the raw source slice. The end column is approximated by byte
    /// length (exact for ASCII tokens); the parser derives exact spans from
    /// the source text it holds. A newline's end lands on the following
    /// line at column 1.
    #[must_use]
    pub fn span(&self) -> Span {
        let start = self.position();
        let end = if self.kind == TokenKind::Newline {
            Position::new(self.line + 1, 1, self.offset + self.length)
        } else {
            Position::new(
                self.line,
                self.column + self.length,
                self.offset + self.length,
            )
        };
        Span::new(start, end)
    }

    /// Byte offset one past the last character.
    #[must_use]
    pub const fn end_offset(&self) -> usize {
        self.offset + self.length
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?} at {}:{}", self.kind, self.text, self.line, self.column)
    }
}
