//! The resilient TOON parser.
//!
//! Consumes the token sequence produced by the [`Lexer`](crate::Lexer) and
//! builds an [`AstNode::Document`]. The parser never gives up on an input:
//! every malformed construct records a [`ParseError`] and triggers local
//! recovery (skip to the next line, the next row, or the next candidate
//! property), so editor tooling always receives a partial tree plus the
//! full diagnostic list.
//!
//! Structure is carried by three cooperating mechanisms:
//!
//! - **Indentation baselines.** Each nested scope remembers the indent of
//!   its first line and compares every following line against it; there is
//!   no global indent stack.
//! - **Delimiter stack.** Initialized with comma; entering an array pushes
//!   the delimiter its header declares and leaving pops it. The active
//!   delimiter decides how cells are split and whether a tab is whitespace
//!   or a separator.
//! - **Loop watchdogs.** Every loop compares the cursor against its last
//!   iteration; a stuck loop records `InfiniteLoopDetected` and force-skips
//!   a token instead of spinning.
//!
//! ## Examples
//!
//! ```rust
//! use toon_syntax::parse;
//!
//! let result = parse("users[2]{id,name}:\n  1,Alice\n  2,Bob").unwrap();
//! assert!(result.is_success());
//! let doc = result.document.unwrap();
//! let props = doc.as_object_properties().unwrap();
//! let (schema, rows) = props[0].value.as_table().unwrap();
//! assert_eq!(schema, ["id", "name"]);
//! assert_eq!(rows.len(), 2);
//! ```

use crate::ast::{AstNode, Property};
use crate::error::{ErrorCode, ParseError};
use crate::lexer::Lexer;
use crate::options::{Delimiter, ParserOptions};
use crate::token::{Position, Span, Token, TokenKind};
use serde::Serialize;

/// Overall outcome of a parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParseStatus {
    /// At least one property and no diagnostics.
    Success,
    /// A document was built but it is empty or carries diagnostics.
    Partial,
    /// No document could be constructed.
    Failure,
}

/// Everything a parse produces: status, the (possibly partial) document,
/// the ordered diagnostics, and the token list so callers can correlate
/// positions.
#[derive(Debug, Clone)]
pub struct ParseResult {
    pub status: ParseStatus,
    pub document: Option<AstNode>,
    pub errors: Vec<ParseError>,
    pub tokens: Vec<Token>,
}

impl ParseResult {
    /// `true` iff the status is [`ParseStatus::Success`].
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == ParseStatus::Success
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// A `Failure` result carrying a single diagnostic, used when no
    /// document can be built at all.
    #[must_use]
    pub(crate) fn failure(message: impl Into<String>) -> Self {
        ParseResult {
            status: ParseStatus::Failure,
            document: None,
            errors: vec![ParseError::uncoded(message)],
            tokens: Vec::new(),
        }
    }
}

/// Parsed `[N]`/`[N|]`/`[N\t]` header notation.
#[derive(Debug, Clone)]
struct ArrayNotation {
    declared: Option<usize>,
    marker: Option<Delimiter>,
    span: Span,
}

/// Parsed `{f1,f2,…}` header schema.
#[derive(Debug, Clone)]
struct SchemaHeader {
    fields: Vec<String>,
    /// Delimiter implied by the separators between field names.
    inferred: Option<Delimiter>,
    span: Span,
}

/// Recursive-descent parser over the token stream. One instance per input.
pub struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    errors: Vec<ParseError>,
    delimiters: Vec<Delimiter>,
    options: ParserOptions,
    depth: usize,
}

impl<'a> Parser<'a> {
    /// Lexes `source` and prepares a parser over the result. Lexical
    /// diagnostics are carried into the final error list.
    #[must_use]
    pub fn new(source: &'a str, options: ParserOptions) -> Self {
        let lexed = Lexer::new(source, options).tokenize();
        Parser {
            source,
            tokens: lexed.tokens,
            pos: 0,
            errors: lexed.errors,
            delimiters: vec![Delimiter::Comma],
            options,
            depth: 0,
        }
    }

    /// Runs the parse to completion and assembles the result.
    #[must_use]
    pub fn parse(mut self) -> ParseResult {
        let document = self.parse_document();
        let mut errors = self.errors;
        errors.sort_by_key(|e| e.position);

        let property_count = document
            .as_object_properties()
            .map(|properties| properties.len())
            .unwrap_or(0);
        let status = if errors.is_empty() && property_count > 0 {
            ParseStatus::Success
        } else {
            ParseStatus::Partial
        };

        ParseResult {
            status,
            document: Some(document),
            errors,
            tokens: self.tokens,
        }
    }

    // ------------------------------------------------------------------
    // Token navigation
    // ------------------------------------------------------------------

    fn cur(&self) -> &Token {
        self.tokens
            .get(self.pos)
            .unwrap_or_else(|| self.tokens.last().expect("token list ends in EndOfFile"))
    }

    fn kind(&self) -> TokenKind {
        self.cur().kind
    }

    fn peek_kind(&self, ahead: usize) -> TokenKind {
        self.tokens
            .get(self.pos + ahead)
            .map_or(TokenKind::EndOfFile, |t| t.kind)
    }

    fn advance(&mut self) {
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn at_end(&self) -> bool {
        self.kind() == TokenKind::EndOfFile
    }

    fn raw_text(&self, token: &Token) -> &str {
        &self.source[token.offset..token.end_offset()]
    }

    fn token_end(&self, token: &Token) -> Position {
        if token.kind == TokenKind::Newline {
            return Position::new(token.line + 1, 1, token.end_offset());
        }
        let chars = self.raw_text(token).chars().count();
        Position::new(token.line, token.column + chars, token.end_offset())
    }

    fn token_span(&self, token: &Token) -> Span {
        Span::new(token.position(), self.token_end(token))
    }

    fn here(&self) -> Position {
        self.cur().position()
    }

    // ------------------------------------------------------------------
    // Diagnostics and recovery
    // ------------------------------------------------------------------

    fn record(&mut self, code: ErrorCode, message: impl Into<String>) {
        let token = self.cur().clone();
        self.errors
            .push(ParseError::at_token(code, message, &token));
    }

    fn record_at(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        self.errors.push(ParseError::new(
            code,
            message,
            span.start.line,
            span.start.column,
            span.start.offset,
            span.len(),
        ));
    }

    /// Skips to the end of the current line, leaving the newline for the
    /// enclosing loop.
    fn skip_to_line_end(&mut self) {
        while !matches!(self.kind(), TokenKind::Newline | TokenKind::EndOfFile) {
            self.advance();
        }
    }

    /// Loop watchdog: if an iteration consumed nothing, record the fact and
    /// skip one token so the parse always terminates.
    fn force_progress(&mut self, guard: usize) {
        if self.pos == guard && !self.at_end() {
            self.record(
                ErrorCode::InfiniteLoopDetected,
                "parser made no progress; skipping one token",
            );
            self.advance();
        }
    }

    // ------------------------------------------------------------------
    // Whitespace, lines, and indentation
    // ------------------------------------------------------------------

    /// Skips inline whitespace. With an active tab delimiter, runs that
    /// contain a tab are separators and are left in place.
    fn skip_spaces(&mut self, tab_is_delimiter: bool) {
        while self.kind() == TokenKind::Whitespace {
            if tab_is_delimiter && self.cur().text.contains('\t') {
                break;
            }
            self.advance();
        }
    }

    fn skip_inline_ws(&mut self) {
        self.skip_spaces(false);
    }

    /// Consumes blank lines and comment-only lines.
    fn skip_blank_lines(&mut self) {
        loop {
            match self.kind() {
                TokenKind::Newline | TokenKind::Comment => self.advance(),
                TokenKind::Whitespace => {
                    if matches!(
                        self.peek_kind(1),
                        TokenKind::Newline | TokenKind::Comment | TokenKind::EndOfFile
                    ) {
                        self.advance();
                    } else {
                        break;
                    }
                }
                _ => break,
            }
        }
    }

    /// Indent of the line the cursor sits at, without consuming anything.
    fn peek_line_indent(&self) -> usize {
        let token = self.cur();
        if token.kind == TokenKind::Whitespace {
            token.text.chars().count()
        } else {
            token.column.saturating_sub(1)
        }
    }

    /// Consumes the leading whitespace of the current line, recording a
    /// diagnostic for mixed tab/space leads, and returns the indent width.
    fn consume_indent(&mut self) -> usize {
        if self.kind() != TokenKind::Whitespace {
            return self.cur().column.saturating_sub(1);
        }
        let token = self.cur().clone();
        self.advance();
        if token.text.contains(' ') && token.text.contains('\t') {
            self.errors.push(ParseError::at_token(
                ErrorCode::InconsistentIndentation,
                "line indentation mixes tabs and spaces",
                &token,
            ));
        }
        token.text.chars().count()
    }

    // ------------------------------------------------------------------
    // Delimiters
    // ------------------------------------------------------------------

    fn active_delimiter(&self) -> Delimiter {
        *self.delimiters.last().unwrap_or(&Delimiter::Comma)
    }

    /// The delimiter a token represents, if any. A whitespace run counts as
    /// a tab separator only when it contains a tab character.
    fn delimiter_of(token: &Token) -> Option<Delimiter> {
        match token.kind {
            TokenKind::Comma => Some(Delimiter::Comma),
            TokenKind::Pipe => Some(Delimiter::Pipe),
            TokenKind::Whitespace if token.text.contains('\t') => Some(Delimiter::Tab),
            _ => None,
        }
    }

    /// Consumes the active delimiter if present; records `MixedDelimiters`
    /// and consumes anyway when a different delimiter stands in its place.
    /// Returns `true` when a separator was consumed.
    fn eat_delimiter(&mut self) -> bool {
        let active = self.active_delimiter();
        match Self::delimiter_of(self.cur()) {
            Some(found) if found == active => {
                self.advance();
                true
            }
            Some(found) if found != Delimiter::Tab || active == Delimiter::Tab => {
                // A tab run under a non-tab delimiter is plain whitespace,
                // handled by skip_spaces; anything else is a wrong separator.
                self.record(
                    ErrorCode::MixedDelimiters,
                    format!(
                        "'{}' used where '{}' is the active delimiter",
                        found.as_str().escape_debug(),
                        active.as_str().escape_debug()
                    ),
                );
                self.advance();
                true
            }
            _ => false,
        }
    }

    // ------------------------------------------------------------------
    // Document and properties
    // ------------------------------------------------------------------

    /// Parses the whole document: a sequence of properties at a shared
    /// baseline indent.
    pub(crate) fn parse_document(&mut self) -> AstNode {
        let start = self.here();
        let mut properties: Vec<Property> = Vec::new();
        let mut baseline: Option<usize> = None;

        loop {
            let guard = self.pos;
            self.skip_blank_lines();
            if self.at_end() {
                break;
            }

            let indent = self.consume_indent();
            match baseline {
                None => baseline = Some(indent),
                Some(expected) if indent > expected => self.record(
                    ErrorCode::UnexpectedIndentation,
                    format!("expected indent {expected}, found {indent}"),
                ),
                Some(expected) if indent < expected => self.record(
                    ErrorCode::InconsistentIndentation,
                    format!("line indent {indent} does not match the document level {expected}"),
                ),
                _ => {}
            }

            if let Some(property) = self.parse_property(indent) {
                properties.push(property);
            }
            self.force_progress(guard);
        }

        let span = match (properties.first(), properties.last()) {
            (Some(first), Some(last)) => first.span.merge(last.span),
            _ => Span::point(start),
        };
        AstNode::Document { properties, span }
    }

    /// Parses one `key [N]? {schema}? : value` property. Returns `None`
    /// after recording an error when no property could be formed; the
    /// cursor is then already past the malformed line.
    fn parse_property(&mut self, indent: usize) -> Option<Property> {
        let key_token = self.cur().clone();
        // Keywords are legal keys (`true: 1`); the lexer classifies them
        // before the identifier lookahead, so they arrive as keyword tokens.
        if !matches!(
            key_token.kind,
            TokenKind::Identifier
                | TokenKind::String
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null
        ) {
            self.record(
                ErrorCode::ExpectedPropertyKey,
                format!("expected a property key, found {}", key_token.kind),
            );
            self.skip_to_line_end();
            return None;
        }
        self.advance();
        let key_span = self.token_span(&key_token);

        self.skip_inline_ws();
        let notation = if self.kind() == TokenKind::LeftBracket {
            Some(self.parse_array_notation())
        } else {
            None
        };

        self.skip_inline_ws();
        let schema = if self.kind() == TokenKind::LeftBrace {
            let expected = notation.as_ref().and_then(|n| n.marker);
            Some(self.parse_schema(expected))
        } else {
            None
        };

        self.skip_inline_ws();
        if self.kind() != TokenKind::Colon {
            let message = if self.at_end() {
                "expected ':' after property key".to_string()
            } else {
                format!("expected ':' after property key, found {}", self.kind())
            };
            let code = if self.at_end() {
                ErrorCode::UnexpectedEndOfInput
            } else {
                ErrorCode::ExpectedColon
            };
            self.record(code, message);
            self.skip_to_line_end();
            return None;
        }
        let colon_end = self.token_end(&self.cur().clone());
        self.advance();

        let value = self.parse_property_value(indent, notation, schema, colon_end);
        let span = key_span.merge(value.span());

        Some(Property {
            key: key_token.text,
            key_span,
            indent,
            value,
            span,
        })
    }

    /// Dispatches on the three header signals (size, schema, token after
    /// the colon) to pick the value form.
    fn parse_property_value(
        &mut self,
        indent: usize,
        notation: Option<ArrayNotation>,
        schema: Option<SchemaHeader>,
        fallback: Position,
    ) -> AstNode {
        let delimiter = notation
            .as_ref()
            .and_then(|n| n.marker)
            .or_else(|| schema.as_ref().and_then(|s| s.inferred))
            .unwrap_or(Delimiter::Comma);
        let header_span = match (&notation, &schema) {
            (Some(n), Some(s)) => n.span.merge(s.span),
            (Some(n), None) => n.span,
            (None, Some(s)) => s.span,
            (None, None) => Span::point(fallback),
        };

        self.skip_inline_ws();
        // A trailing comment is trivia; the value still starts on the next line.
        let block_form = matches!(
            self.kind(),
            TokenKind::Newline | TokenKind::Comment | TokenKind::EndOfFile
        );

        if let Some(schema) = schema {
            let declared = notation.and_then(|n| n.declared);
            if !block_form {
                self.record(
                    ErrorCode::UnexpectedToken,
                    "table rows must start on a new line after the header",
                );
                self.skip_to_line_end();
            }
            return self.parse_table_array(indent, declared, schema.fields, delimiter, header_span);
        }

        if let Some(notation) = notation {
            if block_form {
                return self.parse_expanded_array(indent, notation.declared, delimiter, header_span);
            }
            return self.parse_inline_array(notation.declared, delimiter, header_span);
        }

        if block_form {
            // A header-less `key:` at end of input has neither an inline
            // value nor a block to open.
            if self.at_end() {
                self.record(ErrorCode::UnexpectedEndOfInput, "expected a value");
                return AstNode::Null {
                    raw: String::new(),
                    span: Span::point(fallback),
                };
            }
            return self.parse_nested_object(indent, fallback);
        }
        self.parse_scalar_value(fallback)
    }

    // ------------------------------------------------------------------
    // Array headers
    // ------------------------------------------------------------------

    /// Parses `[`, an optional size, an optional delimiter marker (tab run
    /// or `|`), and the closing `]`.
    fn parse_array_notation(&mut self) -> ArrayNotation {
        let open = self.cur().clone();
        self.advance();
        let start = open.position();
        let mut end = self.token_end(&open);

        let mut declared: Option<usize> = None;
        let mut marker: Option<Delimiter> = None;

        loop {
            let guard = self.pos;
            let token = self.cur().clone();
            match token.kind {
                TokenKind::RightBracket => {
                    end = self.token_end(&token);
                    self.advance();
                    break;
                }
                // A stray colon means the header was left unclosed; leave it
                // for the property so the value can still be parsed.
                TokenKind::Colon | TokenKind::Newline | TokenKind::EndOfFile => {
                    self.record(
                        ErrorCode::ExpectedRightBracket,
                        "expected ']' to close the array header",
                    );
                    break;
                }
                TokenKind::Number => {
                    if marker.is_some() {
                        self.errors.push(ParseError::at_token(
                            ErrorCode::DelimiterMarkerMisplaced,
                            "delimiter marker must follow the array size",
                            &token,
                        ));
                    }
                    match token.text.parse::<usize>() {
                        Ok(size) if size <= self.options.max_array_size => {
                            declared = Some(size);
                        }
                        Ok(size) => self.errors.push(ParseError::at_token(
                            ErrorCode::ArraySizeMismatch,
                            format!(
                                "declared size {size} exceeds the maximum of {}",
                                self.options.max_array_size
                            ),
                            &token,
                        )),
                        Err(_) => self.errors.push(ParseError::at_token(
                            ErrorCode::ArraySizeMismatch,
                            "declared size must be a non-negative integer",
                            &token,
                        )),
                    }
                    end = self.token_end(&token);
                    self.advance();
                }
                TokenKind::Pipe => {
                    marker = Some(Delimiter::Pipe);
                    end = self.token_end(&token);
                    self.advance();
                }
                TokenKind::Whitespace if token.text.contains('\t') => {
                    marker = Some(Delimiter::Tab);
                    end = self.token_end(&token);
                    self.advance();
                }
                TokenKind::Whitespace => self.advance(),
                _ => {
                    self.record(
                        ErrorCode::UnexpectedToken,
                        format!("unexpected {} in array header", token.kind),
                    );
                    self.advance();
                }
            }
            self.force_progress(guard);
        }

        ArrayNotation {
            declared,
            marker,
            span: Span::new(start, end),
        }
    }

    /// Parses `{f1,f2,…}`. The separator between field names fixes the
    /// table delimiter when the bracket header carried no marker.
    fn parse_schema(&mut self, expected: Option<Delimiter>) -> SchemaHeader {
        let open = self.cur().clone();
        self.advance();
        let start = open.position();
        let mut end = self.token_end(&open);

        let mut fields: Vec<String> = Vec::new();
        let mut inferred: Option<Delimiter> = None;
        let mut want_field = true;

        loop {
            let guard = self.pos;
            let token = self.cur().clone();
            match token.kind {
                TokenKind::RightBrace => {
                    end = self.token_end(&token);
                    self.advance();
                    break;
                }
                TokenKind::Colon | TokenKind::Newline | TokenKind::EndOfFile => {
                    self.record(
                        ErrorCode::ExpectedRightBrace,
                        "expected '}' to close the schema",
                    );
                    break;
                }
                _ if token.kind.is_value() && token.kind != TokenKind::Invalid => {
                    if !want_field {
                        self.record(
                            ErrorCode::ExpectedDelimiter,
                            "expected a delimiter between schema fields",
                        );
                    }
                    fields.push(token.text.clone());
                    end = self.token_end(&token);
                    want_field = false;
                    self.advance();
                }
                _ => {
                    let effective = expected.or(inferred);
                    match Self::delimiter_of(&token) {
                        // A tab run is only a separator while tabs can still
                        // be the delimiter here; otherwise it is blank space.
                        Some(Delimiter::Tab)
                            if !matches!(effective, None | Some(Delimiter::Tab)) =>
                        {
                            self.advance();
                        }
                        Some(found) => {
                            if want_field {
                                self.record(
                                    ErrorCode::ExpectedFieldName,
                                    "expected a field name before the delimiter",
                                );
                            }
                            match effective {
                                Some(active) if active != found => self.record(
                                    ErrorCode::MixedDelimiters,
                                    format!(
                                        "'{}' used where '{}' is the active delimiter",
                                        found.as_str().escape_debug(),
                                        active.as_str().escape_debug()
                                    ),
                                ),
                                _ => inferred = Some(found),
                            }
                            want_field = true;
                            self.advance();
                        }
                        None if token.kind == TokenKind::Whitespace => self.advance(),
                        None => {
                            self.record(
                                ErrorCode::ExpectedFieldName,
                                format!("expected a field name, found {}", token.kind),
                            );
                            self.advance();
                        }
                    }
                }
            }
            self.force_progress(guard);
        }

        if fields.is_empty() {
            self.record_at(
                ErrorCode::ExpectedFieldName,
                "schema declares no fields",
                Span::new(start, end),
            );
        }

        SchemaHeader {
            fields,
            inferred,
            span: Span::new(start, end),
        }
    }

    // ------------------------------------------------------------------
    // Scalars
    // ------------------------------------------------------------------

    fn scalar_from_token(&self, token: &Token) -> AstNode {
        let raw = self.raw_text(token).to_string();
        let span = self.token_span(token);
        match token.kind {
            TokenKind::Number => {
                let is_integer = !raw.contains(|c| matches!(c, '.' | 'e' | 'E'));
                let value = raw.parse::<f64>().unwrap_or_default();
                AstNode::Number {
                    value,
                    is_integer,
                    raw,
                    span,
                }
            }
            TokenKind::True => AstNode::Bool {
                value: true,
                raw,
                span,
            },
            TokenKind::False => AstNode::Bool {
                value: false,
                raw,
                span,
            },
            TokenKind::Null => AstNode::Null { raw, span },
            // String, Identifier, and recovered Invalid tokens all carry
            // their text as a string value.
            _ => AstNode::Str {
                value: token.text.clone(),
                raw,
                span,
            },
        }
    }

    /// Parses a simple scalar value: a run of value tokens joined by single
    /// spaces (`name: John Doe`). Stray `,`/`|` tokens are glued into the
    /// text without spaces so unquoted values like `a|b` survive; a `:` or
    /// bracket stops the run with a diagnostic and the collected prefix is
    /// kept.
    fn parse_scalar_value(&mut self, fallback: Position) -> AstNode {
        let run = self.collect_value_run(false);
        match run {
            Some(node) => {
                // Anything left before the newline is noise.
                if !matches!(
                    self.kind(),
                    TokenKind::Newline | TokenKind::Comment | TokenKind::EndOfFile
                ) {
                    self.record(
                        ErrorCode::UnexpectedToken,
                        format!("unexpected {} in property value", self.kind()),
                    );
                    self.skip_to_line_end();
                }
                node
            }
            None => {
                let code = if self.at_end() {
                    ErrorCode::UnexpectedEndOfInput
                } else {
                    ErrorCode::UnexpectedToken
                };
                self.record(code, "expected a value");
                if !matches!(
                    self.kind(),
                    TokenKind::Newline | TokenKind::Comment | TokenKind::EndOfFile
                ) {
                    self.skip_to_line_end();
                }
                AstNode::Null {
                    raw: String::new(),
                    span: Span::point(fallback),
                }
            }
        }
    }

    /// Collects a run of value tokens into one scalar node. Returns `None`
    /// when no value token was found.
    ///
    /// With `stop_at_delims` the run ends at any delimiter token (table
    /// cells); without it, stray `,`/`|` are glued in (document values and
    /// single-field table rows).
    fn collect_value_run(&mut self, stop_at_delims: bool) -> Option<AstNode> {
        let tab_is_delim = stop_at_delims && self.active_delimiter() == Delimiter::Tab;
        let mut first: Option<Token> = None;
        let mut last: Option<Token> = None;
        let mut text = String::new();
        let mut pending_space = false;
        let mut token_count = 0usize;

        loop {
            let token = self.cur().clone();
            match token.kind {
                TokenKind::Whitespace => {
                    if tab_is_delim && token.text.contains('\t') {
                        break;
                    }
                    if token_count > 0 {
                        pending_space = true;
                    }
                    self.advance();
                }
                TokenKind::Comma | TokenKind::Pipe => {
                    // Only the active delimiter ends a cell; a foreign
                    // delimiter character is part of the text.
                    if stop_at_delims
                        && Self::delimiter_of(&token) == Some(self.active_delimiter())
                    {
                        break;
                    }
                    if pending_space {
                        text.push(' ');
                        pending_space = false;
                    }
                    text.push_str(&token.text);
                    token_count += 1;
                    if first.is_none() {
                        first = Some(token.clone());
                    }
                    last = Some(token);
                    self.advance();
                }
                kind if kind.is_value() => {
                    if pending_space {
                        text.push(' ');
                        pending_space = false;
                    }
                    text.push_str(&token.text);
                    token_count += 1;
                    if first.is_none() {
                        first = Some(token.clone());
                    }
                    last = Some(token);
                    self.advance();
                }
                _ => break,
            }
        }

        let first = first?;
        let last = last.unwrap_or_else(|| first.clone());

        if token_count == 1 && first.kind.is_value() {
            return Some(self.scalar_from_token(&first));
        }

        let raw = self.source[first.offset..last.end_offset()].to_string();
        let span = Span::new(first.position(), self.token_end(&last));
        Some(AstNode::Str {
            value: text,
            raw,
            span,
        })
    }

    // ------------------------------------------------------------------
    // Nested objects
    // ------------------------------------------------------------------

    /// Parses the properties of a nested object at some indent deeper than
    /// `parent_indent`. The first child line fixes the baseline. An object
    /// with no child lines is empty.
    fn parse_nested_object(&mut self, parent_indent: usize, fallback: Position) -> AstNode {
        if self.enter_scope(parent_indent) {
            return AstNode::Object {
                properties: Vec::new(),
                span: Span::point(fallback),
            };
        }

        let mut properties: Vec<Property> = Vec::new();
        let mut baseline: Option<usize> = None;

        loop {
            let guard = self.pos;
            self.skip_blank_lines();
            if self.at_end() || self.peek_line_indent() <= parent_indent {
                break;
            }

            let indent = self.consume_indent();
            match baseline {
                None => baseline = Some(indent),
                Some(expected) if indent > expected => self.record(
                    ErrorCode::UnexpectedIndentation,
                    format!("expected indent {expected}, found {indent}"),
                ),
                Some(expected) if indent < expected => self.record(
                    ErrorCode::InconsistentIndentation,
                    format!("line indent {indent} does not match any enclosing level"),
                ),
                _ => {}
            }

            if let Some(property) = self.parse_property(indent) {
                properties.push(property);
            }
            self.force_progress(guard);
        }

        self.depth -= 1;
        let span = match (properties.first(), properties.last()) {
            (Some(first), Some(last)) => first.span.merge(last.span),
            _ => Span::point(fallback),
        };
        AstNode::Object { properties, span }
    }

    /// Depth accounting shared by every nested scope. Returns `true` when
    /// the depth limit is hit, in which case the whole block has been
    /// skipped and the scope must not be entered.
    fn enter_scope(&mut self, parent_indent: usize) -> bool {
        self.depth += 1;
        if self.depth <= self.options.max_nesting_depth {
            return false;
        }
        self.record(
            ErrorCode::UnexpectedIndentation,
            format!(
                "nesting depth exceeds the maximum of {}",
                self.options.max_nesting_depth
            ),
        );
        self.skip_block(parent_indent);
        self.depth -= 1;
        true
    }

    /// Consumes every following line deeper than `parent_indent`.
    fn skip_block(&mut self, parent_indent: usize) {
        loop {
            let guard = self.pos;
            self.skip_blank_lines();
            if self.at_end() || self.peek_line_indent() <= parent_indent {
                break;
            }
            self.skip_to_line_end();
            self.force_progress(guard);
        }
    }

    // ------------------------------------------------------------------
    // Inline arrays
    // ------------------------------------------------------------------

    /// Parses delimiter-separated single-token elements on the header line.
    fn parse_inline_array(
        &mut self,
        declared: Option<usize>,
        delimiter: Delimiter,
        header_span: Span,
    ) -> AstNode {
        self.delimiters.push(delimiter);
        let tab_is_delim = delimiter == Delimiter::Tab;
        let mut elements: Vec<AstNode> = Vec::new();
        let mut end = header_span.end;

        loop {
            let guard = self.pos;
            self.skip_spaces(tab_is_delim);
            let token = self.cur().clone();
            match token.kind {
                TokenKind::Newline | TokenKind::Comment | TokenKind::EndOfFile => break,
                kind if kind.is_value() => {
                    elements.push(self.scalar_from_token(&token));
                    end = self.token_end(&token);
                    self.advance();
                    self.skip_spaces(tab_is_delim);
                    if matches!(
                        self.kind(),
                        TokenKind::Newline | TokenKind::Comment | TokenKind::EndOfFile
                    ) {
                        break;
                    }
                    if !self.eat_delimiter() {
                        // Another value with no separator in between.
                        self.record(
                            ErrorCode::ExpectedDelimiter,
                            format!(
                                "expected '{}' between array elements",
                                delimiter.as_str().escape_debug()
                            ),
                        );
                    }
                }
                _ => {
                    if Self::delimiter_of(&token).is_some() {
                        // A separator where a value belongs: empty element.
                        elements.push(AstNode::Null {
                            raw: String::new(),
                            span: Span::point(token.position()),
                        });
                        self.eat_delimiter();
                    } else {
                        self.record(
                            ErrorCode::UnexpectedToken,
                            format!("unexpected {} in inline array", token.kind),
                        );
                        self.advance();
                    }
                }
            }
            self.force_progress(guard);
        }

        self.delimiters.pop();
        self.validate_array_size(declared, elements.len(), "element", header_span);

        AstNode::Array {
            declared_size: declared,
            elements,
            span: Span::new(header_span.start, end),
        }
    }

    fn validate_array_size(
        &mut self,
        declared: Option<usize>,
        actual: usize,
        unit: &str,
        span: Span,
    ) {
        let Some(declared) = declared else { return };
        if actual == declared {
            return;
        }
        let code = if unit == "row" {
            ErrorCode::TableSizeMismatch
        } else {
            ErrorCode::ArraySizeMismatch
        };
        let message = if actual == 0 {
            format!(
                "declared {declared} {unit}(s) but none were found; add them or set the size to 0"
            )
        } else if actual < declared {
            format!(
                "declared {declared} {unit}(s) but only {actual} found ({} missing); add the missing {unit}s or lower the declared size",
                declared - actual
            )
        } else {
            format!(
                "declared {declared} {unit}(s) but {actual} found ({} extra); remove the extra {unit}s or raise the declared size",
                actual - declared
            )
        };
        self.record_at(code, message, span);
    }

    // ------------------------------------------------------------------
    // Expanded arrays
    // ------------------------------------------------------------------

    /// Parses `-`-prefixed list items at the child indent.
    fn parse_expanded_array(
        &mut self,
        parent_indent: usize,
        declared: Option<usize>,
        delimiter: Delimiter,
        header_span: Span,
    ) -> AstNode {
        if self.enter_scope(parent_indent) {
            return AstNode::Array {
                declared_size: declared,
                elements: Vec::new(),
                span: header_span,
            };
        }
        self.delimiters.push(delimiter);

        let mut elements: Vec<AstNode> = Vec::new();
        let mut baseline: Option<usize> = None;
        let mut end = header_span.end;

        loop {
            let guard = self.pos;
            self.skip_blank_lines();
            if self.at_end() || self.peek_line_indent() <= parent_indent {
                break;
            }

            let indent = self.consume_indent();
            match baseline {
                None => baseline = Some(indent),
                Some(expected) if indent != expected => self.record(
                    ErrorCode::InconsistentIndentation,
                    format!("list item indented {indent}, expected {expected}"),
                ),
                _ => {}
            }

            let marker = self.cur().clone();
            if !(marker.kind == TokenKind::Identifier && marker.text == "-") {
                self.record(
                    ErrorCode::UnexpectedToken,
                    format!("expected '-' to begin a list item, found {}", marker.kind),
                );
                self.skip_to_line_end();
                self.force_progress(guard);
                continue;
            }
            self.advance();

            let item = self.parse_list_item(indent, &marker);
            end = end.max_by_offset(item.span().end);
            elements.push(item);
            self.force_progress(guard);
        }

        self.delimiters.pop();
        self.depth -= 1;
        self.validate_array_size(declared, elements.len(), "element", header_span);

        AstNode::Array {
            declared_size: declared,
            elements,
            span: Span::new(header_span.start, end),
        }
    }

    /// Parses what follows a `-` marker: a nested inline array, an object
    /// whose first property shares the hyphen line, or a scalar.
    fn parse_list_item(&mut self, hyphen_indent: usize, marker: &Token) -> AstNode {
        self.skip_inline_ws();
        let token = self.cur().clone();

        match token.kind {
            // A bare `-` line is an empty object item.
            TokenKind::Newline | TokenKind::Comment | TokenKind::EndOfFile => AstNode::Object {
                properties: Vec::new(),
                span: self.token_span(marker),
            },
            TokenKind::LeftBracket => {
                let notation = self.parse_array_notation();
                let delimiter = notation.marker.unwrap_or(Delimiter::Comma);
                self.skip_inline_ws();
                if self.kind() != TokenKind::Colon {
                    self.record(
                        ErrorCode::ExpectedColon,
                        "expected ':' after the nested array header",
                    );
                    self.skip_to_line_end();
                    return AstNode::Array {
                        declared_size: notation.declared,
                        elements: Vec::new(),
                        span: notation.span,
                    };
                }
                self.advance();
                self.skip_inline_ws();
                if matches!(self.kind(), TokenKind::Newline | TokenKind::EndOfFile) {
                    self.parse_expanded_array(
                        hyphen_indent,
                        notation.declared,
                        delimiter,
                        notation.span,
                    )
                } else {
                    self.parse_inline_array(notation.declared, delimiter, notation.span)
                }
            }
            _ if self.starts_object_item(&token) => {
                let content_indent = token.column.saturating_sub(1);
                self.parse_list_item_object(content_indent, marker)
            }
            _ => {
                let value = self.parse_scalar_value(self.token_end(marker));
                if !matches!(
                    self.kind(),
                    TokenKind::Newline | TokenKind::Comment | TokenKind::EndOfFile
                ) {
                    self.skip_to_line_end();
                }
                value
            }
        }
    }

    /// A list item opens an object when it begins with a property key: an
    /// identifier, or a string/keyword token followed by `:`/`[`/`{`.
    fn starts_object_item(&self, token: &Token) -> bool {
        match token.kind {
            TokenKind::Identifier => token.text != "-",
            TokenKind::String | TokenKind::True | TokenKind::False | TokenKind::Null => {
                let mut ahead = 1;
                loop {
                    match self.peek_kind(ahead) {
                        TokenKind::Whitespace => ahead += 1,
                        TokenKind::Colon | TokenKind::LeftBracket | TokenKind::LeftBrace => {
                            return true
                        }
                        _ => return false,
                    }
                }
            }
            _ => false,
        }
    }

    /// Parses an object list item: the first property sits on the hyphen
    /// line, continuation properties align to the item content column.
    /// The item object is a scope of its own, between the enclosing array
    /// and the object's properties.
    fn parse_list_item_object(&mut self, content_indent: usize, marker: &Token) -> AstNode {
        if self.enter_scope(marker.column.saturating_sub(1)) {
            return AstNode::Object {
                properties: Vec::new(),
                span: self.token_span(marker),
            };
        }

        let mut properties: Vec<Property> = Vec::new();
        if let Some(first) = self.parse_property(content_indent) {
            properties.push(first);
        }

        loop {
            let guard = self.pos;
            self.skip_blank_lines();
            if self.at_end() || self.peek_line_indent() < content_indent {
                break;
            }
            let indent = self.consume_indent();
            if indent > content_indent {
                self.record(
                    ErrorCode::UnexpectedIndentation,
                    format!("expected indent {content_indent}, found {indent}"),
                );
            }
            if let Some(property) = self.parse_property(indent) {
                properties.push(property);
            }
            self.force_progress(guard);
        }

        self.depth -= 1;
        let span = match (properties.first(), properties.last()) {
            (Some(first), Some(last)) => first.span.merge(last.span),
            _ => self.token_span(marker),
        };
        AstNode::Object { properties, span }
    }

    // ------------------------------------------------------------------
    // Table arrays
    // ------------------------------------------------------------------

    /// Parses table rows at the child indent, each row holding one cell per
    /// schema field, separated by the active delimiter.
    fn parse_table_array(
        &mut self,
        parent_indent: usize,
        declared: Option<usize>,
        schema: Vec<String>,
        delimiter: Delimiter,
        header_span: Span,
    ) -> AstNode {
        if self.enter_scope(parent_indent) {
            return AstNode::TableArray {
                declared_size: declared,
                schema,
                rows: Vec::new(),
                span: header_span,
            };
        }
        self.delimiters.push(delimiter);

        let mut rows: Vec<Vec<AstNode>> = Vec::new();
        let mut baseline: Option<usize> = None;
        let mut end = header_span.end;

        loop {
            let guard = self.pos;
            self.skip_blank_lines();
            if self.at_end() || self.peek_line_indent() <= parent_indent {
                break;
            }

            let indent = self.consume_indent();
            match baseline {
                None => baseline = Some(indent),
                Some(expected) if indent != expected => self.record(
                    ErrorCode::InconsistentIndentation,
                    format!("table row indented {indent}, expected {expected}"),
                ),
                _ => {}
            }

            let row_start = self.cur().clone();
            let row = self.parse_table_row(schema.len(), delimiter);
            if row.len() != schema.len() {
                self.errors.push(ParseError::at_token(
                    ErrorCode::TableRowFieldMismatch,
                    format!(
                        "row has {} cell(s) but the schema declares {} field(s)",
                        row.len(),
                        schema.len()
                    ),
                    &row_start,
                ));
            }
            if let Some(cell) = row.last() {
                end = end.max_by_offset(cell.span().end);
            }
            rows.push(row);
            self.force_progress(guard);
        }

        self.delimiters.pop();
        self.depth -= 1;
        self.validate_array_size(declared, rows.len(), "row", header_span);

        AstNode::TableArray {
            declared_size: declared,
            schema,
            rows,
            span: Span::new(header_span.start, end),
        }
    }

    /// Parses one table row. A single-field table consumes the whole line
    /// as one cell without looking for delimiters; otherwise cells are
    /// value runs split on the active delimiter.
    fn parse_table_row(&mut self, field_count: usize, delimiter: Delimiter) -> Vec<AstNode> {
        let mut cells: Vec<AstNode> = Vec::new();
        let tab_is_delim = delimiter == Delimiter::Tab;

        if field_count == 1 {
            let cell = self
                .collect_value_run(false)
                .unwrap_or_else(|| AstNode::Null {
                    raw: String::new(),
                    span: Span::point(self.here()),
                });
            cells.push(cell);
            if !matches!(
                self.kind(),
                TokenKind::Newline | TokenKind::Comment | TokenKind::EndOfFile
            ) {
                self.record(
                    ErrorCode::UnexpectedToken,
                    format!("unexpected {} in table row", self.kind()),
                );
                self.skip_to_line_end();
            }
            return cells;
        }

        loop {
            let guard = self.pos;
            self.skip_spaces(tab_is_delim);
            let cell = self
                .collect_value_run(true)
                .unwrap_or_else(|| AstNode::Null {
                    raw: String::new(),
                    span: Span::point(self.here()),
                });
            cells.push(cell);

            self.skip_spaces(tab_is_delim);
            match self.kind() {
                TokenKind::Newline | TokenKind::Comment | TokenKind::EndOfFile => {
                    if cells.len() < field_count {
                        self.record(
                            ErrorCode::ExpectedDelimiter,
                            format!(
                                "expected '{}' between row cells",
                                delimiter.as_str().escape_debug()
                            ),
                        );
                    }
                    break;
                }
                _ => {
                    if !self.eat_delimiter() {
                        self.record(
                            ErrorCode::UnexpectedToken,
                            format!("unexpected {} in table row", self.kind()),
                        );
                        self.advance();
                    }
                }
            }
            self.force_progress(guard);
        }

        cells
    }
}

/// Extension used to keep the running end position of growing spans.
trait MaxByOffset {
    fn max_by_offset(self, other: Self) -> Self;
}

impl MaxByOffset for Position {
    fn max_by_offset(self, other: Position) -> Position {
        if other.offset >= self.offset {
            other
        } else {
            self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> ParseResult {
        Parser::new(source, ParserOptions::default()).parse()
    }

    fn document_properties(result: &ParseResult) -> &[Property] {
        result
            .document
            .as_ref()
            .and_then(AstNode::as_object_properties)
            .expect("document")
    }

    #[test]
    fn test_simple_object() {
        let result = parse("name: John\nage: 30");
        assert!(result.is_success());
        let props = document_properties(&result);
        assert_eq!(props.len(), 2);
        assert_eq!(props[0].key, "name");
        assert_eq!(props[0].value.as_str(), Some("John"));
        assert_eq!(props[1].key, "age");
        match &props[1].value {
            AstNode::Number {
                value, is_integer, ..
            } => {
                assert_eq!(*value, 30.0);
                assert!(is_integer);
            }
            other => panic!("expected number, got {}", other.kind_name()),
        }
    }

    #[test]
    fn test_multiword_unquoted_value() {
        let result = parse("name: John Ronald Reuel Tolkien");
        assert!(result.is_success());
        let props = document_properties(&result);
        assert_eq!(props[0].value.as_str(), Some("John Ronald Reuel Tolkien"));
    }

    #[test]
    fn test_nested_object() {
        let result = parse("user:\n  name: Alice\n  role: admin\nactive: true");
        assert!(result.is_success());
        let props = document_properties(&result);
        assert_eq!(props.len(), 2);
        let inner = props[0].value.as_object_properties().expect("object");
        assert_eq!(inner.len(), 2);
        assert_eq!(inner[0].key, "name");
        assert_eq!(inner[1].value.as_str(), Some("admin"));
        assert_eq!(props[1].value.as_bool(), Some(true));
    }

    #[test]
    fn test_empty_nested_object() {
        let result = parse("meta:\nnext: 1");
        assert!(result.is_success());
        let props = document_properties(&result);
        let inner = props[0].value.as_object_properties().expect("object");
        assert!(inner.is_empty());
    }

    #[test]
    fn test_inline_array() {
        let result = parse("nums[3]: 1,2,3");
        assert!(result.is_success());
        let props = document_properties(&result);
        let (declared, elements) = props[0].value.as_array().expect("array");
        assert_eq!(declared, Some(3));
        assert_eq!(elements.len(), 3);
        assert_eq!(elements[2].as_f64(), Some(3.0));
    }

    #[test]
    fn test_pipe_inline_array() {
        let result = parse("tags[3|]: reading|gaming|coding");
        assert!(result.is_success());
        let props = document_properties(&result);
        let (declared, elements) = props[0].value.as_array().expect("array");
        assert_eq!(declared, Some(3));
        let values: Vec<&str> = elements.iter().filter_map(AstNode::as_str).collect();
        assert_eq!(values, ["reading", "gaming", "coding"]);
    }

    #[test]
    fn test_tab_inline_array() {
        let result = parse("nums[3\t]: 1\t2\t3");
        assert!(result.is_success(), "errors: {:?}", result.errors);
        let props = document_properties(&result);
        let (_, elements) = props[0].value.as_array().expect("array");
        assert_eq!(elements.len(), 3);
    }

    #[test]
    fn test_array_size_mismatch_hints() {
        let result = parse("nums[3]: 1,2");
        assert!(!result.is_success());
        let err = result
            .errors
            .iter()
            .find(|e| e.code == Some(ErrorCode::ArraySizeMismatch))
            .expect("size mismatch");
        assert!(err.message.contains("1 missing"));

        let result = parse("nums[1]: 1,2");
        let err = result
            .errors
            .iter()
            .find(|e| e.code == Some(ErrorCode::ArraySizeMismatch))
            .expect("size mismatch");
        assert!(err.message.contains("1 extra"));

        let result = parse("nums[2]:\nnext: 1");
        let err = result
            .errors
            .iter()
            .find(|e| e.code == Some(ErrorCode::ArraySizeMismatch))
            .expect("size mismatch");
        assert!(err.message.contains("none were found"));
    }

    #[test]
    fn test_table_array() {
        let result = parse("users[2]{id,name}:\n  1,Alice\n  2,Bob");
        assert!(result.is_success(), "errors: {:?}", result.errors);
        let props = document_properties(&result);
        match &props[0].value {
            AstNode::TableArray {
                declared_size,
                schema,
                rows,
                ..
            } => {
                assert_eq!(*declared_size, Some(2));
                assert_eq!(schema, &["id", "name"]);
                assert_eq!(rows.len(), 2);
                assert_eq!(rows[0][0].as_f64(), Some(1.0));
                assert_eq!(rows[0][1].as_str(), Some("Alice"));
                assert_eq!(rows[1][1].as_str(), Some("Bob"));
            }
            other => panic!("expected table, got {}", other.kind_name()),
        }
    }

    #[test]
    fn test_pipe_table_inferred_from_schema() {
        let result = parse("users[2]{id|name}:\n  1|Alice\n  2|Bob");
        assert!(result.is_success(), "errors: {:?}", result.errors);
        let props = document_properties(&result);
        let (schema, rows) = props[0].value.as_table().expect("table");
        assert_eq!(schema, ["id", "name"]);
        assert_eq!(rows[1][1].as_str(), Some("Bob"));
    }

    #[test]
    fn test_single_field_table_takes_whole_row() {
        let result = parse("notes[2]{text}:\n  first note, with comma\n  second");
        assert!(result.is_success(), "errors: {:?}", result.errors);
        let props = document_properties(&result);
        let (_, rows) = props[0].value.as_table().expect("table");
        assert_eq!(rows[0][0].as_str(), Some("first note, with comma"));
        assert_eq!(rows[1][0].as_str(), Some("second"));
    }

    #[test]
    fn test_short_row_records_field_mismatch() {
        let result = parse("users[2]{id,name}:\n  1,Alice\n  2");
        assert!(!result.is_success());
        assert!(result
            .errors
            .iter()
            .any(|e| e.code == Some(ErrorCode::ExpectedDelimiter)));
        assert!(result
            .errors
            .iter()
            .any(|e| e.code == Some(ErrorCode::TableRowFieldMismatch)));
        let props = document_properties(&result);
        let (_, rows) = props[0].value.as_table().expect("table");
        // The short row is kept short, not padded.
        assert_eq!(rows[1].len(), 1);
    }

    #[test]
    fn test_empty_table_with_zero_size_is_success() {
        let result = parse("users[0]{id,name}:\nnext: 1");
        assert!(result.is_success(), "errors: {:?}", result.errors);
    }

    #[test]
    fn test_table_size_mismatch() {
        let result = parse("users[3]{id,name}:\n  1,Alice");
        let err = result
            .errors
            .iter()
            .find(|e| e.code == Some(ErrorCode::TableSizeMismatch))
            .expect("table size mismatch");
        assert!(err.message.contains("2 missing"));
    }

    #[test]
    fn test_expanded_array_scalars() {
        let result = parse("items[2]:\n  - alpha\n  - beta two");
        assert!(result.is_success(), "errors: {:?}", result.errors);
        let props = document_properties(&result);
        let (_, elements) = props[0].value.as_array().expect("array");
        assert_eq!(elements[0].as_str(), Some("alpha"));
        assert_eq!(elements[1].as_str(), Some("beta two"));
    }

    #[test]
    fn test_expanded_array_objects() {
        let source = "people[2]:\n  - name: Alice\n    role: admin\n  - name: Bob\n    role: user";
        let result = parse(source);
        assert!(result.is_success(), "errors: {:?}", result.errors);
        let props = document_properties(&result);
        let (_, elements) = props[0].value.as_array().expect("array");
        assert_eq!(elements.len(), 2);
        let first = elements[0].as_object_properties().expect("object");
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].value.as_str(), Some("Alice"));
        assert_eq!(first[1].value.as_str(), Some("admin"));
    }

    #[test]
    fn test_expanded_item_nested_inline_array() {
        let result = parse("grid[2]:\n  - [2]: 1,2\n  - [2|]: a|b");
        assert!(result.is_success(), "errors: {:?}", result.errors);
        let props = document_properties(&result);
        let (_, elements) = props[0].value.as_array().expect("array");
        let (declared, inner) = elements[0].as_array().expect("inner array");
        assert_eq!(declared, Some(2));
        assert_eq!(inner.len(), 2);
        let (_, inner) = elements[1].as_array().expect("inner array");
        assert_eq!(inner[1].as_str(), Some("b"));
    }

    #[test]
    fn test_lone_dash_is_empty_object() {
        let result = parse("items[1]:\n  -");
        assert!(result.is_success(), "errors: {:?}", result.errors);
        let props = document_properties(&result);
        let (_, elements) = props[0].value.as_array().expect("array");
        let inner = elements[0].as_object_properties().expect("object");
        assert!(inner.is_empty());
    }

    #[test]
    fn test_unterminated_string_recovers() {
        let result = parse("name: \"John\nage: 30");
        assert!(result.has_errors());
        assert!(result
            .errors
            .iter()
            .any(|e| e.code == Some(ErrorCode::UnterminatedString) && e.line == 1));
        let props = document_properties(&result);
        assert_eq!(props.len(), 2);
        assert_eq!(props[0].key, "name");
        assert_eq!(props[0].value.as_str(), Some("John"));
        assert_eq!(props[1].key, "age");
    }

    #[test]
    fn test_missing_colon_recovers_to_next_property() {
        let result = parse("broken line here\ngood: 1");
        assert!(result.has_errors());
        assert!(result
            .errors
            .iter()
            .any(|e| e.code == Some(ErrorCode::ExpectedColon)));
        let props = document_properties(&result);
        assert_eq!(props.len(), 1);
        assert_eq!(props[0].key, "good");
    }

    #[test]
    fn test_missing_bracket_recovers() {
        let result = parse("nums[3: 1,2,3\nnext: ok");
        assert!(result
            .errors
            .iter()
            .any(|e| e.code == Some(ErrorCode::ExpectedRightBracket)));
        let props = document_properties(&result);
        assert!(props.iter().any(|p| p.key == "next"));
    }

    #[test]
    fn test_duplicate_keys_are_preserved() {
        let result = parse("a: 1\na: 2");
        assert!(result.is_success());
        let props = document_properties(&result);
        assert_eq!(props.len(), 2);
        assert_eq!(props[0].key, "a");
        assert_eq!(props[1].key, "a");
    }

    #[test]
    fn test_quoted_key() {
        let result = parse("\"my key\": 1");
        assert!(result.is_success(), "errors: {:?}", result.errors);
        let props = document_properties(&result);
        assert_eq!(props[0].key, "my key");
    }

    #[test]
    fn test_comments_and_blank_lines_are_skipped() {
        let result = parse("# heading\n\na: 1\n\n// note\nb: 2");
        assert!(result.is_success(), "errors: {:?}", result.errors);
        assert_eq!(document_properties(&result).len(), 2);
    }

    #[test]
    fn test_document_scalar_glues_pipes() {
        let result = parse("expr: a|b");
        assert!(result.is_success(), "errors: {:?}", result.errors);
        let props = document_properties(&result);
        assert_eq!(props[0].value.as_str(), Some("a|b"));
    }

    #[test]
    fn test_mixed_tabs_and_spaces_flagged() {
        let result = parse("a:\n \tb: 1");
        assert!(result
            .errors
            .iter()
            .any(|e| e.code == Some(ErrorCode::InconsistentIndentation)));
    }

    #[test]
    fn test_mixed_delimiters_flagged() {
        let result = parse("nums[3]: 1,2|3");
        assert!(result
            .errors
            .iter()
            .any(|e| e.code == Some(ErrorCode::MixedDelimiters)));
        let props = document_properties(&result);
        let (_, elements) = props[0].value.as_array().expect("array");
        assert_eq!(elements.len(), 3);
    }

    #[test]
    fn test_nesting_depth_enforced() {
        let options = ParserOptions::new().with_max_nesting_depth(2);
        let source = "a:\n  b:\n    c:\n      d: 1";
        let result = Parser::new(source, options).parse();
        assert!(result
            .errors
            .iter()
            .any(|e| e.code == Some(ErrorCode::UnexpectedIndentation)
                && e.message.contains("nesting depth")));
    }

    #[test]
    fn test_nesting_depth_enforced_through_list_item_objects() {
        // Array, keyed item object, nested array: three scopes, the same
        // accounting as three nested plain objects.
        let source = "a[1]:\n  - b[1]:\n      - c";

        let options = ParserOptions::new().with_max_nesting_depth(2);
        let result = Parser::new(source, options).parse();
        assert!(result
            .errors
            .iter()
            .any(|e| e.code == Some(ErrorCode::UnexpectedIndentation)
                && e.message.contains("nesting depth")));

        let options = ParserOptions::new().with_max_nesting_depth(3);
        let result = Parser::new(source, options).parse();
        assert!(result.is_success(), "errors: {:?}", result.errors);

        // A longer chain trips on the first scope past the cap, not later.
        let options = ParserOptions::new().with_max_nesting_depth(2);
        let source = "a[1]:\n  - b[1]:\n      - c[1]:\n          - d: 1";
        let result = Parser::new(source, options).parse();
        let depth_errors = result
            .errors
            .iter()
            .filter(|e| e.code == Some(ErrorCode::UnexpectedIndentation)
                && e.message.contains("nesting depth"))
            .count();
        assert_eq!(depth_errors, 1);
    }

    #[test]
    fn test_declared_size_over_limit() {
        let options = ParserOptions::new().with_max_array_size(10);
        let result = Parser::new("xs[999]: 1,2", options).parse();
        assert!(result
            .errors
            .iter()
            .any(|e| e.code == Some(ErrorCode::ArraySizeMismatch)
                && e.message.contains("maximum")));
    }

    #[test]
    fn test_errors_are_position_ordered() {
        let result = parse("bad line\nxs[2]: 1\nbad again");
        assert!(result.errors.len() >= 2);
        for pair in result.errors.windows(2) {
            assert!(pair[0].position <= pair[1].position);
        }
    }

    #[test]
    fn test_blank_source_yields_empty_partial_document() {
        let result = parse("");
        assert_eq!(result.status, ParseStatus::Partial);
        assert!(!result.has_errors());
        let props = document_properties(&result);
        assert!(props.is_empty());
    }

    #[test]
    fn test_spans_nest_within_parents() {
        let result = parse("user:\n  name: Alice\n  tags[2]: a,b");
        assert!(result.is_success(), "errors: {:?}", result.errors);
        let doc = result.document.as_ref().unwrap();
        let doc_span = doc.span();
        doc.walk(&mut |node| {
            let span = node.span();
            assert!(span.start.offset <= span.end.offset);
            assert!(doc_span.start.offset <= span.start.offset);
            assert!(span.end.offset <= doc_span.end.offset);
        });
    }

    #[test]
    fn test_schema_without_size() {
        let result = parse("rows{a,b}:\n  1,2");
        let props = document_properties(&result);
        let (schema, rows) = props[0].value.as_table().expect("table");
        assert_eq!(schema, ["a", "b"]);
        assert_eq!(rows.len(), 1);
        // No declared size, so no size validation fires.
        assert!(!result
            .errors
            .iter()
            .any(|e| e.code == Some(ErrorCode::TableSizeMismatch)));
    }

    #[test]
    fn test_email_value_stays_single_token() {
        let result = parse("email: alice@example.com");
        assert!(result.is_success());
        let props = document_properties(&result);
        assert_eq!(props[0].value.as_str(), Some("alice@example.com"));
    }
}
