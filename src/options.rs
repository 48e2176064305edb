//! Configuration options for parsing and encoding.
//!
//! This module provides the tuning knobs of the crate:
//!
//! - [`ParserOptions`]: resource limits enforced by the lexer and parser
//! - [`EncoderOptions`]: output shape of the TOON encoder
//! - [`Delimiter`]: choice of delimiter for arrays and tables (comma, tab,
//!   or pipe)
//!
//! ## Examples
//!
//! ```rust
//! use toon_syntax::{encode_with_options, Delimiter, EncoderOptions, ParserOptions};
//!
//! // Pipe-delimited output
//! let options = EncoderOptions::new().with_delimiter(Delimiter::Pipe);
//! let toon = encode_with_options(r#"{"tags":["a","b"]}"#, options).unwrap();
//! assert_eq!(toon, "tags[2|]: a|b");
//!
//! // Tighter parser limits
//! let options = ParserOptions::new().with_max_input_size(1024);
//! assert_eq!(options.max_input_size, 1024);
//! ```

/// Delimiter choice for TOON arrays and tables.
///
/// The delimiter separates inline array elements and table row cells. Only
/// the active delimiter forces quoting of strings that contain it; the
/// other two remain safe unquoted.
///
/// # Examples
///
/// ```rust
/// use toon_syntax::Delimiter;
///
/// assert_eq!(Delimiter::Comma.as_str(), ",");
/// assert_eq!(Delimiter::Tab.as_str(), "\t");
/// assert_eq!(Delimiter::Pipe.as_str(), "|");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Delimiter {
    #[default]
    Comma,
    Tab,
    Pipe,
}

impl Delimiter {
    /// Returns the string representation of this delimiter.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Delimiter::Comma => ",",
            Delimiter::Tab => "\t",
            Delimiter::Pipe => "|",
        }
    }

    /// Returns the delimiter character.
    #[must_use]
    pub const fn as_char(&self) -> char {
        match self {
            Delimiter::Comma => ',',
            Delimiter::Tab => '\t',
            Delimiter::Pipe => '|',
        }
    }

    /// The marker placed inside an inline array header: `[3]`, `[3\t]`,
    /// `[3|]`. Comma, being the default, has no marker.
    #[must_use]
    pub const fn header_marker(&self) -> &'static str {
        match self {
            Delimiter::Comma => "",
            Delimiter::Tab => "\t",
            Delimiter::Pipe => "|",
        }
    }
}

/// Resource limits enforced while lexing and parsing.
///
/// All limits are monotone counters checked inside the hot loops; on breach
/// the component records a diagnostic and stops making forward progress on
/// the offending construct rather than failing the whole operation. The one
/// exception is `max_input_size`, which is checked at the entry point and
/// short-circuits with [`Error::InputTooLarge`](crate::Error::InputTooLarge).
///
/// # Examples
///
/// ```rust
/// use toon_syntax::ParserOptions;
///
/// let options = ParserOptions::new()
///     .with_max_nesting_depth(16)
///     .with_max_array_size(10_000);
/// assert_eq!(options.max_nesting_depth, 16);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct ParserOptions {
    /// Maximum source length in bytes. Checked before lexing starts.
    pub max_input_size: usize,
    /// Maximum nesting depth of objects, arrays, and tables.
    pub max_nesting_depth: usize,
    /// Maximum declared or actual array size.
    pub max_array_size: usize,
    /// Maximum number of tokens the lexer will emit.
    pub max_token_count: usize,
    /// Maximum length of a single token, in characters.
    pub max_string_length: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        ParserOptions {
            max_input_size: 10_485_760,
            max_nesting_depth: 100,
            max_array_size: 1_000_000,
            max_token_count: 1_000_000,
            max_string_length: 65_536,
        }
    }
}

impl ParserOptions {
    /// Creates the default limits (10 MiB input, depth 100, one million
    /// tokens and array elements, 64 KiB tokens).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_max_input_size(mut self, bytes: usize) -> Self {
        self.max_input_size = bytes;
        self
    }

    #[must_use]
    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    #[must_use]
    pub fn with_max_array_size(mut self, size: usize) -> Self {
        self.max_array_size = size;
        self
    }

    #[must_use]
    pub fn with_max_token_count(mut self, count: usize) -> Self {
        self.max_token_count = count;
        self
    }

    #[must_use]
    pub fn with_max_string_length(mut self, chars: usize) -> Self {
        self.max_string_length = chars;
        self
    }
}

/// Output options for the TOON encoder.
///
/// # Examples
///
/// ```rust
/// use toon_syntax::{Delimiter, EncoderOptions};
///
/// let options = EncoderOptions::new()
///     .with_indent_size(4)
///     .with_delimiter(Delimiter::Tab)
///     .with_table_arrays(false);
/// assert_eq!(options.indent_size, 4);
/// assert!(!options.use_table_arrays);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct EncoderOptions {
    /// Spaces per indent level.
    pub indent_size: usize,
    /// Allow table form for arrays of uniform records.
    pub use_table_arrays: bool,
    /// Document delimiter for inline arrays and table rows.
    pub delimiter: Delimiter,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        EncoderOptions {
            indent_size: 2,
            use_table_arrays: true,
            delimiter: Delimiter::default(),
        }
    }
}

impl EncoderOptions {
    /// Creates the default options (2-space indent, table arrays enabled,
    /// comma delimiter).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the indentation size (number of spaces per level).
    #[must_use]
    pub fn with_indent_size(mut self, indent_size: usize) -> Self {
        self.indent_size = indent_size;
        self
    }

    /// Enables or disables table-form emission for eligible arrays.
    #[must_use]
    pub fn with_table_arrays(mut self, use_table_arrays: bool) -> Self {
        self.use_table_arrays = use_table_arrays;
        self
    }

    /// Sets the document delimiter for inline arrays and table rows.
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: Delimiter) -> Self {
        self.delimiter = delimiter;
        self
    }
}
