//! The canonical TOON encoder.
//!
//! Translates a JSON-shaped value tree into TOON text, picking the most
//! compact representation for each array:
//!
//! - **Table form** for arrays of objects that share one ordered schema of
//!   scalar fields: `users[2]{id,name}:` followed by one cell row per record
//! - **Inline form** for all-primitive arrays: `nums[3]: 1,2,3`
//! - **Expanded form** for everything else: `items[2]:` followed by
//!   `- `-prefixed lines
//!
//! Strings are quoted only when leaving them bare would change their
//! meaning (whitespace, keywords, number shapes, structural characters, or
//! the active delimiter). Numbers are canonicalized: no exponents, no
//! trailing fractional zeros, `-0` becomes `0`.
//!
//! The input may be JSON with `//` and `/* */` comments and trailing
//! commas; a normalization pre-pass cleans it up before `serde_json`
//! decodes it. Object field order is preserved end to end.
//!
//! Output uses LF line endings with no trailing newline and no trailing
//! spaces.
//!
//! ## Examples
//!
//! ```rust
//! use toon_syntax::encode;
//!
//! let json = r#"{"users":[{"id":1,"name":"Alice"},{"id":2,"name":"Bob"}]}"#;
//! assert_eq!(encode(json).unwrap(), "users[2]{id,name}:\n  1,Alice\n  2,Bob");
//! ```

use crate::error::Result;
use crate::options::{Delimiter, EncoderOptions};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Keys matching this pattern are emitted bare; everything else is quoted.
static BARE_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_.]*$").expect("bare key pattern"));

/// Strings matching the canonical number shape must be quoted so they do
/// not decode as numbers.
static NUMBER_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?\d+(?:\.\d+)?(?:[eE][+-]?\d+)?$").expect("number pattern"));

/// Leading-zero integers (`05`) lex as strings, so string values of that
/// shape must be quoted to round-trip.
static LEADING_ZERO: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^0\d+$").expect("leading zero pattern"));

/// JSON → TOON encoder. One instance may encode any number of inputs.
pub struct Encoder {
    options: EncoderOptions,
}

impl Encoder {
    #[must_use]
    pub fn new(options: EncoderOptions) -> Self {
        Encoder { options }
    }

    /// Encodes a JSON document (JSON with comments and trailing commas is
    /// accepted) into canonical TOON text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) when the input is not
    /// valid JSON after comment and trailing-comma normalization.
    pub fn encode(&self, json: &str) -> Result<String> {
        let cleaned = normalize_json_input(json);
        let value: Value = serde_json::from_str(&cleaned)?;
        Ok(self.encode_value(&value))
    }

    /// Encodes an already-decoded JSON value tree.
    #[must_use]
    pub fn encode_value(&self, value: &Value) -> String {
        let mut lines: Vec<String> = Vec::new();
        match value {
            Value::Object(map) => self.emit_object(map, 0, &mut lines),
            // Non-object roots are wrapped under a synthesized key.
            Value::Array(_) => self.emit_property("", "items", value, 1, &mut lines),
            _ => self.emit_property("", "value", value, 1, &mut lines),
        }
        lines.join("\n")
    }

    fn indent(&self, depth: usize) -> String {
        " ".repeat(depth * self.options.indent_size)
    }

    fn emit_object(
        &self,
        map: &serde_json::Map<String, Value>,
        depth: usize,
        lines: &mut Vec<String>,
    ) {
        for (key, value) in map {
            self.emit_property(&self.indent(depth), key, value, depth + 1, lines);
        }
    }

    /// Emits one property. `prefix` is the already-built line lead (indent,
    /// possibly including a `- ` list marker); children land at
    /// `child_depth`.
    fn emit_property(
        &self,
        prefix: &str,
        key: &str,
        value: &Value,
        child_depth: usize,
        lines: &mut Vec<String>,
    ) {
        let key = self.format_key(key);
        match value {
            Value::Object(map) if map.is_empty() => lines.push(format!("{prefix}{key}:")),
            Value::Object(map) => {
                lines.push(format!("{prefix}{key}:"));
                self.emit_object(map, child_depth, lines);
            }
            Value::Array(array) => self.emit_array_property(prefix, &key, array, child_depth, lines),
            _ => lines.push(format!("{prefix}{key}: {}", self.format_scalar(value))),
        }
    }

    /// Emits `key[n]…` in whichever of the three array forms fits.
    fn emit_array_property(
        &self,
        prefix: &str,
        key: &str,
        array: &[Value],
        child_depth: usize,
        lines: &mut Vec<String>,
    ) {
        let n = array.len();
        let delimiter = self.options.delimiter;

        if n > 0 && self.options.use_table_arrays {
            if let Some(fields) = table_schema(array) {
                let header = fields
                    .iter()
                    .map(|f| self.format_key(f))
                    .collect::<Vec<_>>()
                    .join(delimiter.as_str());
                lines.push(format!("{prefix}{key}[{n}]{{{header}}}:"));
                let row_indent = self.indent(child_depth);
                for item in array {
                    if let Value::Object(map) = item {
                        let row = fields
                            .iter()
                            .map(|f| match map.get(f.as_str()) {
                                Some(cell) => self.format_scalar(cell),
                                None => "null".to_string(),
                            })
                            .collect::<Vec<_>>()
                            .join(delimiter.as_str());
                        lines.push(format!("{row_indent}{row}"));
                    }
                }
                return;
            }
        }

        if n > 0 && all_primitives(array) {
            let joined = array
                .iter()
                .map(|v| self.format_scalar(v))
                .collect::<Vec<_>>()
                .join(delimiter.as_str());
            lines.push(format!(
                "{prefix}{key}[{n}{}]: {joined}",
                delimiter.header_marker()
            ));
            return;
        }

        lines.push(format!("{prefix}{key}[{n}]:"));
        self.emit_list_items(array, child_depth, lines);
    }

    /// Emits `- ` list items at `depth`. Object items put their first field
    /// on the hyphen line; subsequent fields sit one level below the
    /// hyphen and their nested content one level below that.
    fn emit_list_items(&self, array: &[Value], depth: usize, lines: &mut Vec<String>) {
        for item in array {
            match item {
                Value::Object(map) if map.is_empty() => {
                    lines.push(format!("{}-", self.indent(depth)));
                }
                Value::Object(map) => {
                    let mut fields = map.iter();
                    if let Some((first_key, first_value)) = fields.next() {
                        let head = format!("{}- ", self.indent(depth));
                        self.emit_property(&head, first_key, first_value, depth + 2, lines);
                    }
                    for (key, value) in fields {
                        self.emit_property(&self.indent(depth + 1), key, value, depth + 2, lines);
                    }
                }
                Value::Array(inner) => {
                    let n = inner.len();
                    if n > 0 && all_primitives(inner) {
                        let joined = inner
                            .iter()
                            .map(|v| self.format_scalar(v))
                            .collect::<Vec<_>>()
                            .join(self.options.delimiter.as_str());
                        lines.push(format!(
                            "{}- [{n}{}]: {joined}",
                            self.indent(depth),
                            self.options.delimiter.header_marker()
                        ));
                    } else if n == 0 {
                        lines.push(format!("{}- [0]:", self.indent(depth)));
                    } else {
                        lines.push(format!("{}- [{n}]:", self.indent(depth)));
                        self.emit_list_items(inner, depth + 1, lines);
                    }
                }
                _ => lines.push(format!("{}- {}", self.indent(depth), self.format_scalar(item))),
            }
        }
    }

    fn format_key(&self, key: &str) -> String {
        if BARE_KEY.is_match(key) {
            key.to_string()
        } else {
            quote_string(key)
        }
    }

    fn format_scalar(&self, value: &Value) -> String {
        match value {
            Value::Null => "null".to_string(),
            Value::Bool(true) => "true".to_string(),
            Value::Bool(false) => "false".to_string(),
            Value::Number(number) => format_number(number),
            Value::String(text) => {
                if needs_quoting(text, self.options.delimiter) {
                    quote_string(text)
                } else {
                    text.clone()
                }
            }
            // Containers never reach scalar position.
            _ => "null".to_string(),
        }
    }
}

/// Whether a string value must be quoted to survive a round trip.
///
/// `#`, `/`, and `'` are included because they open comments and quoted
/// strings in the lexer; left bare they would swallow the rest of the
/// line or token.
fn needs_quoting(s: &str, delimiter: Delimiter) -> bool {
    s.is_empty()
        || s.chars().any(char::is_whitespace)
        || s == "true"
        || s == "false"
        || s == "null"
        || NUMBER_SHAPE.is_match(s)
        || LEADING_ZERO.is_match(s)
        || s.contains(|c| {
            matches!(
                c,
                ':' | '\\' | '"' | '[' | ']' | '{' | '}' | '\n' | '\r' | '\t' | '#' | '/' | '\''
            )
        })
        || s.contains(delimiter.as_char())
        || s.starts_with('-')
}

fn quote_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}

/// Formats a JSON number canonically: plain decimal notation, no exponent,
/// no trailing fractional zeros, `-0` normalized to `0`.
fn format_number(number: &serde_json::Number) -> String {
    if let Some(i) = number.as_i64() {
        return i.to_string();
    }
    if let Some(u) = number.as_u64() {
        return u.to_string();
    }
    canonicalize_decimal(&number.to_string())
}

/// Exact decimal-point shifting over the literal text. The shift is
/// clamped so a pathological exponent cannot allocate unbounded output.
fn canonicalize_decimal(raw: &str) -> String {
    const MAX_SHIFT: i64 = 1_000_000;

    let (negative, rest) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw),
    };

    let (mantissa, exponent) = match rest.find(|c| c == 'e' || c == 'E') {
        Some(idx) => {
            let exp = rest[idx + 1..]
                .parse::<i64>()
                .unwrap_or(0)
                .clamp(-MAX_SHIFT, MAX_SHIFT);
            (&rest[..idx], exp)
        }
        None => (rest, 0),
    };

    let (int_part, frac_part) = match mantissa.find('.') {
        Some(idx) => (&mantissa[..idx], &mantissa[idx + 1..]),
        None => (mantissa, ""),
    };

    let digits: String = int_part.chars().chain(frac_part.chars()).collect();
    if digits.is_empty() || digits.bytes().all(|b| b == b'0') {
        return "0".to_string();
    }
    let point = int_part.len() as i64 + exponent;

    let mut result = if point <= 0 {
        format!("0.{}{}", "0".repeat(point.unsigned_abs() as usize), digits)
    } else if point as usize >= digits.len() {
        let mut s = digits.clone();
        s.push_str(&"0".repeat(point as usize - digits.len()));
        s
    } else {
        format!("{}.{}", &digits[..point as usize], &digits[point as usize..])
    };

    if let Some(dot) = result.find('.') {
        let trimmed = result.trim_end_matches('0');
        result = if trimmed.len() <= dot + 1 {
            trimmed.trim_end_matches('.').to_string()
        } else {
            trimmed.to_string()
        };
    }

    // Shifting can leave redundant zeros in front of the integer part.
    let (int_text, frac_text) = match result.find('.') {
        Some(idx) => (&result[..idx], Some(result[idx..].to_string())),
        None => (result.as_str(), None),
    };
    let int_trimmed = int_text.trim_start_matches('0');
    let int_text = if int_trimmed.is_empty() { "0" } else { int_trimmed };
    result = match frac_text {
        Some(frac) => format!("{int_text}{frac}"),
        None => int_text.to_string(),
    };

    if negative && result != "0" {
        format!("-{result}")
    } else {
        result
    }
}

/// The ordered schema shared by every element, if the array qualifies for
/// table form: all objects, identical key sequences, scalar values only,
/// at least one field.
fn table_schema(array: &[Value]) -> Option<Vec<String>> {
    let first = array.first()?.as_object()?;
    if first.is_empty() {
        return None;
    }
    let fields: Vec<String> = first.keys().cloned().collect();
    for item in array {
        let object = item.as_object()?;
        if object.len() != fields.len() {
            return None;
        }
        for (key, field) in object.keys().zip(fields.iter()) {
            if key != field {
                return None;
            }
        }
        for value in object.values() {
            if value.is_object() || value.is_array() {
                return None;
            }
        }
    }
    Some(fields)
}

fn all_primitives(array: &[Value]) -> bool {
    array.iter().all(|v| !v.is_object() && !v.is_array())
}

/// Blanks `//` and `/* */` comments (string-aware) and removes trailing
/// commas, leaving offsets and line numbers as stable as possible so
/// `serde_json` errors still point at sensible places.
fn normalize_json_input(input: &str) -> String {
    strip_trailing_commas(&strip_comments(input))
}

fn strip_comments(input: &str) -> String {
    #[derive(PartialEq)]
    enum State {
        Normal,
        InString,
        Escape,
        LineComment,
        BlockComment,
    }

    let mut out = String::with_capacity(input.len());
    let mut state = State::Normal;
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        match state {
            State::Normal => match ch {
                '"' => {
                    state = State::InString;
                    out.push(ch);
                }
                '/' if chars.peek() == Some(&'/') => {
                    chars.next();
                    out.push_str("  ");
                    state = State::LineComment;
                }
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    out.push_str("  ");
                    state = State::BlockComment;
                }
                _ => out.push(ch),
            },
            State::InString => {
                out.push(ch);
                match ch {
                    '\\' => state = State::Escape,
                    '"' => state = State::Normal,
                    _ => {}
                }
            }
            State::Escape => {
                out.push(ch);
                state = State::InString;
            }
            State::LineComment => {
                if ch == '\n' {
                    out.push('\n');
                    state = State::Normal;
                } else {
                    out.push(' ');
                }
            }
            State::BlockComment => {
                if ch == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    out.push_str("  ");
                    state = State::Normal;
                } else if ch == '\n' {
                    out.push('\n');
                } else {
                    out.push(' ');
                }
            }
        }
    }
    out
}

fn strip_trailing_commas(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_string = false;
    let mut escaped = false;
    // A comma plus the blanks after it, held back until the next
    // significant character decides its fate.
    let mut pending: Option<String> = None;

    for ch in input.chars() {
        if in_string {
            out.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        if let Some(mut buffer) = pending.take() {
            if ch.is_whitespace() {
                buffer.push(ch);
                pending = Some(buffer);
                continue;
            }
            if matches!(ch, ']' | '}') {
                // Drop the comma, keep its whitespace.
                out.push_str(&buffer[1..]);
            } else {
                out.push_str(&buffer);
            }
            // Fall through to process `ch` normally.
        }

        match ch {
            ',' => pending = Some(",".to_string()),
            '"' => {
                in_string = true;
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }
    if let Some(buffer) = pending {
        out.push_str(&buffer);
    }
    out
}
