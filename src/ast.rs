//! Abstract syntax tree for parsed TOON documents.
//!
//! The tree is a closed sum: [`AstNode`] has one variant per construct, and
//! every variant carries a [`Span`] locating it in the source. Properties
//! are kept in source order and duplicates are preserved; deciding what a
//! duplicate key means is left to callers.
//!
//! The document exclusively owns all descendant nodes. Nodes are created by
//! the parser and never mutated afterwards.
//!
//! ## Examples
//!
//! ```rust
//! use toon_syntax::{parse, AstNode};
//!
//! let result = parse("name: Alice\nage: 30").unwrap();
//! let doc = result.document.unwrap();
//! let props = doc.as_object_properties().unwrap();
//! assert_eq!(props[0].key, "name");
//! assert_eq!(props[0].value.as_str(), Some("Alice"));
//! assert_eq!(props[1].value.as_f64(), Some(30.0));
//! ```

use crate::token::Span;

/// A key/value pair inside a [`AstNode::Document`] or [`AstNode::Object`].
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    /// Decoded key text.
    pub key: String,
    /// Span of the key token.
    pub key_span: Span,
    /// Indentation width of the line the key starts on, in characters.
    pub indent: usize,
    /// The property's value: a scalar, object, array, or table array.
    pub value: AstNode,
    /// Span from the key through the end of the value.
    pub span: Span,
}

/// A node in the TOON syntax tree.
#[derive(Debug, Clone, PartialEq)]
pub enum AstNode {
    /// The root: an ordered sequence of properties.
    Document { properties: Vec<Property>, span: Span },
    /// A nested object.
    Object { properties: Vec<Property>, span: Span },
    /// An inline or expanded array. `declared_size` is the `N` from the
    /// `[N]` header, or `None` when the header carried no size.
    Array {
        declared_size: Option<usize>,
        elements: Vec<AstNode>,
        span: Span,
    },
    /// An array of uniform records: a schema declared once, one row of
    /// scalar cells per record. Short rows stay short; no padding happens.
    TableArray {
        declared_size: Option<usize>,
        schema: Vec<String>,
        rows: Vec<Vec<AstNode>>,
        span: Span,
    },
    /// A string scalar. `value` is the decoded text, `raw` the source slice.
    Str {
        value: String,
        raw: String,
        span: Span,
    },
    /// A numeric scalar. `is_integer` reflects the lexical shape: no
    /// decimal point and no exponent in `raw`.
    Number {
        value: f64,
        is_integer: bool,
        raw: String,
        span: Span,
    },
    Bool {
        value: bool,
        raw: String,
        span: Span,
    },
    Null { raw: String, span: Span },
}

impl AstNode {
    /// The node's source span.
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            AstNode::Document { span, .. }
            | AstNode::Object { span, .. }
            | AstNode::Array { span, .. }
            | AstNode::TableArray { span, .. }
            | AstNode::Str { span, .. }
            | AstNode::Number { span, .. }
            | AstNode::Bool { span, .. }
            | AstNode::Null { span, .. } => *span,
        }
    }

    /// A short name for the variant, for messages and debugging.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            AstNode::Document { .. } => "document",
            AstNode::Object { .. } => "object",
            AstNode::Array { .. } => "array",
            AstNode::TableArray { .. } => "table array",
            AstNode::Str { .. } => "string",
            AstNode::Number { .. } => "number",
            AstNode::Bool { .. } => "boolean",
            AstNode::Null { .. } => "null",
        }
    }

    /// Returns `true` for the document root.
    #[must_use]
    pub const fn is_document(&self) -> bool {
        matches!(self, AstNode::Document { .. })
    }

    /// Returns `true` for null scalars.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, AstNode::Null { .. })
    }

    /// Returns `true` for string, number, boolean, and null scalars.
    #[must_use]
    pub const fn is_scalar(&self) -> bool {
        matches!(
            self,
            AstNode::Str { .. } | AstNode::Number { .. } | AstNode::Bool { .. } | AstNode::Null { .. }
        )
    }

    /// The properties of a document or object, or `None`.
    #[must_use]
    pub fn as_object_properties(&self) -> Option<&[Property]> {
        match self {
            AstNode::Document { properties, .. } | AstNode::Object { properties, .. } => {
                Some(properties)
            }
            _ => None,
        }
    }

    /// Declared size and elements of an array, or `None`.
    #[must_use]
    pub fn as_array(&self) -> Option<(Option<usize>, &[AstNode])> {
        match self {
            AstNode::Array {
                declared_size,
                elements,
                ..
            } => Some((*declared_size, elements)),
            _ => None,
        }
    }

    /// Schema and rows of a table array, or `None`.
    #[must_use]
    pub fn as_table(&self) -> Option<(&[String], &[Vec<AstNode>])> {
        match self {
            AstNode::TableArray { schema, rows, .. } => Some((schema, rows)),
            _ => None,
        }
    }

    /// The decoded text of a string scalar, or `None`.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AstNode::Str { value, .. } => Some(value),
            _ => None,
        }
    }

    /// The numeric value of a number scalar, or `None`.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AstNode::Number { value, .. } => Some(*value),
            _ => None,
        }
    }

    /// The value of a boolean scalar, or `None`.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AstNode::Bool { value, .. } => Some(*value),
            _ => None,
        }
    }

    /// Walks the subtree depth-first, calling `visit` on every node.
    /// Parent links are not stored; a visitor that needs them can carry its
    /// own stack.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a AstNode)) {
        visit(self);
        match self {
            AstNode::Document { properties, .. } | AstNode::Object { properties, .. } => {
                for prop in properties {
                    prop.value.walk(visit);
                }
            }
            AstNode::Array { elements, .. } => {
                for element in elements {
                    element.walk(visit);
                }
            }
            AstNode::TableArray { rows, .. } => {
                for row in rows {
                    for cell in row {
                        cell.walk(visit);
                    }
                }
            }
            _ => {}
        }
    }
}
