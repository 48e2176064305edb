//! The TOON lexer.
//!
//! Converts source text into a finite token sequence terminated by exactly
//! one [`TokenKind::EndOfFile`], together with any lexical errors. The
//! lexer never fails on input within the size bounds: malformed spans
//! become [`TokenKind::Invalid`] tokens and a diagnostic, and scanning
//! continues.
//!
//! Classification highlights:
//!
//! - Whitespace runs (spaces and tabs) become single `Whitespace` tokens,
//!   both at line starts and mid-line. Line indentation is derived from the
//!   leading run by the parser.
//! - A bare word is a keyword (`true`/`false`/`null`), an `Identifier` when
//!   the next non-blank character is `:`, `[`, or `{`, and a `String`
//!   otherwise. The word `-` is always an `Identifier` (the list-item
//!   marker).
//! - An integer with a redundant leading zero (`05`, `-01`) is not a TOON
//!   number and is reclassified as a `String`.
//!
//! ## Examples
//!
//! ```rust
//! use toon_syntax::{tokenize, TokenKind};
//!
//! let result = tokenize("users[2]{id,name}:").unwrap();
//! let kinds: Vec<TokenKind> = result.tokens.iter().map(|t| t.kind).collect();
//! assert_eq!(
//!     kinds,
//!     vec![
//!         TokenKind::Identifier,
//!         TokenKind::LeftBracket,
//!         TokenKind::Number,
//!         TokenKind::RightBracket,
//!         TokenKind::LeftBrace,
//!         TokenKind::String,
//!         TokenKind::Comma,
//!         TokenKind::String,
//!         TokenKind::RightBrace,
//!         TokenKind::Colon,
//!         TokenKind::EndOfFile,
//!     ]
//! );
//! ```

use crate::error::{ErrorCode, ParseError};
use crate::options::ParserOptions;
use crate::token::{Token, TokenKind};

/// The output of [`tokenize`](crate::tokenize): all tokens plus any lexical
/// diagnostics, side by side.
#[derive(Debug, Clone)]
pub struct TokenizeResult {
    pub tokens: Vec<Token>,
    pub errors: Vec<ParseError>,
}

impl TokenizeResult {
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Scanner state. One instance per input; not shareable across tasks, but
/// independent inputs may be lexed by independent instances in parallel.
pub struct Lexer<'a> {
    source: &'a str,
    options: ParserOptions,
    /// Byte offset of the next unread character.
    offset: usize,
    line: usize,
    column: usize,
    errors: Vec<ParseError>,
}

impl<'a> Lexer<'a> {
    #[must_use]
    pub fn new(source: &'a str, options: ParserOptions) -> Self {
        Lexer {
            source,
            options,
            offset: 0,
            line: 1,
            column: 1,
            errors: Vec::new(),
        }
    }

    /// Scans the whole input. Always returns a token list ending in exactly
    /// one `EndOfFile`, even when the token-count cap fires.
    #[must_use]
    pub fn tokenize(mut self) -> TokenizeResult {
        let mut tokens = Vec::new();

        while !self.at_end() {
            if tokens.len() >= self.options.max_token_count {
                self.errors.push(ParseError::new(
                    ErrorCode::TokenLimitExceeded,
                    format!(
                        "token count exceeds the maximum of {}",
                        self.options.max_token_count
                    ),
                    self.line,
                    self.column,
                    self.offset,
                    0,
                ));
                break;
            }
            tokens.push(self.next_token());
        }

        tokens.push(Token::new(
            TokenKind::EndOfFile,
            "",
            self.line,
            self.column,
            self.offset,
            0,
        ));

        TokenizeResult {
            tokens,
            errors: self.errors,
        }
    }

    fn at_end(&self) -> bool {
        self.offset >= self.source.len()
    }

    fn peek(&self) -> Option<char> {
        self.source[self.offset..].chars().next()
    }

    fn peek_next(&self) -> Option<char> {
        let mut iter = self.source[self.offset..].chars();
        iter.next()?;
        iter.next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.offset += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    /// Marks the start of a token: (line, column, offset).
    fn mark(&self) -> (usize, usize, usize) {
        (self.line, self.column, self.offset)
    }

    fn make_token(
        &mut self,
        kind: TokenKind,
        text: impl Into<String>,
        mark: (usize, usize, usize),
    ) -> Token {
        let (line, column, offset) = mark;
        let text = self.capped(text.into(), mark);
        Token::new(kind, text, line, column, offset, self.offset - offset)
    }

    /// Enforces the per-token character cap, truncating and recording a
    /// diagnostic on breach. The scan still consumes to the token's natural
    /// end so lexing stays aligned with the source.
    fn capped(&mut self, text: String, mark: (usize, usize, usize)) -> String {
        let cap = self.options.max_string_length;
        if text.chars().count() <= cap {
            return text;
        }
        let (line, column, offset) = mark;
        self.errors.push(ParseError::new(
            ErrorCode::StringTooLong,
            format!("token exceeds the maximum length of {cap} characters"),
            line,
            column,
            offset,
            self.offset - offset,
        ));
        text.chars().take(cap).collect()
    }

    fn next_token(&mut self) -> Token {
        let mark = self.mark();
        let ch = match self.peek() {
            Some(ch) => ch,
            None => return self.make_token(TokenKind::EndOfFile, "", mark),
        };

        match ch {
            ' ' | '\t' => self.scan_whitespace(mark),
            '\n' | '\r' => self.scan_newline(mark),
            '#' => self.scan_comment(mark),
            '/' if self.peek_next() == Some('/') => self.scan_comment(mark),
            ':' | ',' | '|' | '[' | ']' | '{' | '}' => self.scan_structural(ch, mark),
            '"' | '\'' => self.scan_quoted_string(ch, mark),
            '0'..='9' => self.scan_number(mark),
            '-' if matches!(self.peek_next(), Some('0'..='9')) => self.scan_number(mark),
            _ if ch.is_alphabetic() || ch == '_' => self.scan_bare_word(mark),
            _ if Self::is_unquoted_start(ch) => self.scan_unquoted_string(mark),
            _ => {
                self.advance();
                self.make_token(TokenKind::Invalid, ch, mark)
            }
        }
    }

    /// A character may open an unquoted string when it is neither
    /// whitespace nor structural/quoting punctuation. `-` qualifies only
    /// when not followed by a digit, which the dispatcher already ruled out.
    fn is_unquoted_start(ch: char) -> bool {
        !matches!(
            ch,
            ' ' | '\t' | '\n' | '\r'
                | ':' | ',' | '[' | ']' | '{' | '}'
                | '#' | '/' | '"' | '\'' | '\\'
                | '|'
        )
    }

    /// A character may continue an unquoted string. `'` is permitted inside
    /// even though it cannot open one.
    fn is_unquoted_body(ch: char) -> bool {
        !matches!(
            ch,
            ' ' | '\t' | '\n' | '\r'
                | ':' | ',' | '[' | ']' | '{' | '}'
                | '#' | '/' | '"' | '\\'
        )
    }

    fn scan_whitespace(&mut self, mark: (usize, usize, usize)) -> Token {
        let start = self.offset;
        while matches!(self.peek(), Some(' ' | '\t')) {
            self.advance();
        }
        let text = self.source[start..self.offset].to_string();
        self.make_token(TokenKind::Whitespace, text, mark)
    }

    fn scan_newline(&mut self, mark: (usize, usize, usize)) -> Token {
        let start = self.offset;
        if self.peek() == Some('\r') {
            self.advance();
            if self.peek() == Some('\n') {
                self.advance();
            } else {
                // Lone carriage return still terminates the line.
                self.line += 1;
                self.column = 1;
            }
        } else {
            self.advance();
        }
        let text = self.source[start..self.offset].to_string();
        self.make_token(TokenKind::Newline, text, mark)
    }

    fn scan_comment(&mut self, mark: (usize, usize, usize)) -> Token {
        let start = self.offset;
        while let Some(ch) = self.peek() {
            if ch == '\n' || ch == '\r' {
                break;
            }
            self.advance();
        }
        let text = self.source[start..self.offset].to_string();
        self.make_token(TokenKind::Comment, text, mark)
    }

    fn scan_structural(&mut self, ch: char, mark: (usize, usize, usize)) -> Token {
        self.advance();
        let kind = match ch {
            ':' => TokenKind::Colon,
            ',' => TokenKind::Comma,
            '|' => TokenKind::Pipe,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            '{' => TokenKind::LeftBrace,
            _ => TokenKind::RightBrace,
        };
        self.make_token(kind, ch, mark)
    }

    fn scan_quoted_string(&mut self, quote: char, mark: (usize, usize, usize)) -> Token {
        self.advance(); // opening quote
        let mut value = String::new();

        loop {
            match self.peek() {
                None | Some('\n') | Some('\r') => {
                    // The newline stays unconsumed so line structure survives.
                    self.errors.push(ParseError::new(
                        ErrorCode::UnterminatedString,
                        "unterminated string",
                        mark.0,
                        mark.1,
                        mark.2,
                        self.offset - mark.2,
                    ));
                    return self.make_token(TokenKind::Invalid, value, mark);
                }
                Some(ch) if ch == quote => {
                    self.advance();
                    return self.make_token(TokenKind::String, value, mark);
                }
                Some('\\') => {
                    self.advance();
                    match self.peek() {
                        Some('n') => {
                            self.advance();
                            value.push('\n');
                        }
                        Some('r') => {
                            self.advance();
                            value.push('\r');
                        }
                        Some('t') => {
                            self.advance();
                            value.push('\t');
                        }
                        Some('\\') => {
                            self.advance();
                            value.push('\\');
                        }
                        Some('"') => {
                            self.advance();
                            value.push('"');
                        }
                        Some('\'') if quote == '\'' => {
                            self.advance();
                            value.push('\'');
                        }
                        Some(other) => {
                            // Keep the literal characters so downstream
                            // parsing still sees the content.
                            let (line, column, offset) = (self.line, self.column - 1, self.offset - 1);
                            self.advance();
                            self.errors.push(ParseError::new(
                                ErrorCode::InvalidEscapeSequence,
                                format!("invalid escape sequence '\\{other}'"),
                                line,
                                column,
                                offset,
                                1 + other.len_utf8(),
                            ));
                            value.push('\\');
                            value.push(other);
                        }
                        None => {
                            self.errors.push(ParseError::new(
                                ErrorCode::UnterminatedString,
                                "unterminated string",
                                mark.0,
                                mark.1,
                                mark.2,
                                self.offset - mark.2,
                            ));
                            value.push('\\');
                            return self.make_token(TokenKind::Invalid, value, mark);
                        }
                    }
                }
                Some(ch) => {
                    self.advance();
                    value.push(ch);
                }
            }
        }
    }

    fn scan_number(&mut self, mark: (usize, usize, usize)) -> Token {
        let start = self.offset;
        if self.peek() == Some('-') {
            self.advance();
        }
        let int_start = self.offset;
        while matches!(self.peek(), Some('0'..='9')) {
            self.advance();
        }
        let int_len = self.offset - int_start;

        let mut is_integer = true;
        if self.peek() == Some('.') && matches!(self.peek_next(), Some('0'..='9')) {
            is_integer = false;
            self.advance();
            while matches!(self.peek(), Some('0'..='9')) {
                self.advance();
            }
        }

        if matches!(self.peek(), Some('e' | 'E')) && self.exponent_follows() {
            is_integer = false;
            self.advance();
            if matches!(self.peek(), Some('+' | '-')) {
                self.advance();
            }
            while matches!(self.peek(), Some('0'..='9')) {
                self.advance();
            }
        }

        let text = self.source[start..self.offset].to_string();

        // TOON forbids redundant leading zeros on integers; `05` is a string.
        let int_part = &self.source[int_start..int_start + int_len];
        if is_integer && int_part.len() > 1 && int_part.starts_with('0') {
            return self.make_token(TokenKind::String, text, mark);
        }

        self.make_token(TokenKind::Number, text, mark)
    }

    /// The exponent marker is only consumed when digits actually follow it,
    /// so `1e` lexes as a number and a bare word.
    fn exponent_follows(&self) -> bool {
        let mut iter = self.source[self.offset..].chars();
        iter.next(); // e/E
        match iter.next() {
            Some('+' | '-') => matches!(iter.next(), Some('0'..='9')),
            Some('0'..='9') => true,
            _ => false,
        }
    }

    fn scan_bare_word(&mut self, mark: (usize, usize, usize)) -> Token {
        let start = self.offset;
        while let Some(ch) = self.peek() {
            if ch.is_alphanumeric() || matches!(ch, '_' | '-' | '.' | '@') {
                self.advance();
            } else {
                break;
            }
        }
        let text = self.source[start..self.offset].to_string();

        match text.as_str() {
            "true" => return self.make_token(TokenKind::True, text, mark),
            "false" => return self.make_token(TokenKind::False, text, mark),
            "null" => return self.make_token(TokenKind::Null, text, mark),
            _ => {}
        }

        let kind = if self.key_follows() {
            TokenKind::Identifier
        } else {
            TokenKind::String
        };
        self.make_token(kind, text, mark)
    }

    /// Looks past inline blanks: a following `:`, `[`, or `{` makes the
    /// preceding word a property key.
    fn key_follows(&self) -> bool {
        for ch in self.source[self.offset..].chars() {
            match ch {
                ' ' | '\t' => continue,
                ':' | '[' | '{' => return true,
                _ => return false,
            }
        }
        false
    }

    fn scan_unquoted_string(&mut self, mark: (usize, usize, usize)) -> Token {
        let start = self.offset;
        while let Some(ch) = self.peek() {
            if Self::is_unquoted_body(ch) {
                self.advance();
            } else {
                break;
            }
        }
        let text = self.source[start..self.offset].to_string();

        // The list-item marker takes the key path even though it never has
        // a trailing colon.
        if text == "-" {
            return self.make_token(TokenKind::Identifier, text, mark);
        }
        self.make_token(TokenKind::String, text, mark)
    }
}
