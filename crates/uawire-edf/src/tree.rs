use std::fmt;
use std::str::FromStr;

use crate::codec;
use crate::error::{EdfError, Result};

/// The value carried by a single EDF element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// No value; the element carries structure only.
    None,
    /// A quoted string value, unescaped.
    Str(String),
    /// A 32-bit signed integer value.
    Int(i32),
}

/// Discriminant of [`Value`], used for type-mismatch reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    None,
    Str,
    Int,
}

impl Value {
    /// The kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::None => ValueKind::None,
            Value::Str(_) => ValueKind::Str,
            Value::Int(_) => ValueKind::Int,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValueKind::None => "none",
            ValueKind::Str => "string",
            ValueKind::Int => "integer",
        })
    }
}

/// One element of an EDF tree: a name, a typed value, and ordered children.
///
/// Child order is significant on the wire. Duplicate child names are legal;
/// [`child`](EdfData::child) returns the first match and
/// [`children_named`](EdfData::children_named) returns all of them in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdfData {
    name: String,
    value: Value,
    children: Vec<EdfData>,
}

impl EdfData {
    /// Create an element with a name and no value.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Value::None,
            children: Vec::new(),
        }
    }

    /// Create an element with a string value.
    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Value::Str(value.into()),
            children: Vec::new(),
        }
    }

    /// Create an element with an integer value.
    pub fn integer(name: impl Into<String>, value: i32) -> Self {
        Self {
            name: name.into(),
            value: Value::Int(value),
            children: Vec::new(),
        }
    }

    /// Element name. Empty for anonymous elements.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// ASCII-case-insensitive name check.
    ///
    /// Root-element classification uses this; child lookups match exactly.
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// The element's value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// The kind of value this element carries.
    pub fn kind(&self) -> ValueKind {
        self.value.kind()
    }

    /// The string value, or `TypeMismatch` if the element holds anything else.
    pub fn string_value(&self) -> Result<&str> {
        match &self.value {
            Value::Str(s) => Ok(s),
            other => Err(EdfError::TypeMismatch {
                expected: ValueKind::Str,
                found: other.kind(),
            }),
        }
    }

    /// The integer value, or `TypeMismatch` if the element holds anything else.
    pub fn integer_value(&self) -> Result<i32> {
        match &self.value {
            Value::Int(n) => Ok(*n),
            other => Err(EdfError::TypeMismatch {
                expected: ValueKind::Int,
                found: other.kind(),
            }),
        }
    }

    /// Append a child element.
    pub fn add_child(&mut self, child: EdfData) {
        self.children.push(child);
    }

    /// Append a string-valued child.
    pub fn add_string(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.children.push(EdfData::string(name, value));
    }

    /// Append an integer-valued child.
    pub fn add_integer(&mut self, name: impl Into<String>, value: i32) {
        self.children.push(EdfData::integer(name, value));
    }

    /// Builder form of [`add_child`](EdfData::add_child).
    pub fn with_child(mut self, child: EdfData) -> Self {
        self.add_child(child);
        self
    }

    /// Builder form of [`add_string`](EdfData::add_string).
    pub fn with_string(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.add_string(name, value);
        self
    }

    /// Builder form of [`add_integer`](EdfData::add_integer).
    pub fn with_integer(mut self, name: impl Into<String>, value: i32) -> Self {
        self.add_integer(name, value);
        self
    }

    /// All children in insertion order.
    pub fn children(&self) -> &[EdfData] {
        &self.children
    }

    /// First child with the given name (exact match), if any.
    pub fn child(&self, name: &str) -> Option<&EdfData> {
        self.children.iter().find(|child| child.name == name)
    }

    /// All children with the given name (exact match), in insertion order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a EdfData> + 'a {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// Render in compact wire form.
    pub fn to_wire(&self) -> String {
        codec::encode(self)
    }

    /// Render with CRLF line endings and two-space indentation per depth.
    pub fn to_pretty(&self) -> String {
        codec::encode_pretty(self)
    }
}

/// Compact wire form, identical to [`EdfData::to_wire`].
impl fmt::Display for EdfData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire())
    }
}

/// Parse exactly one tree from a string. Trailing non-whitespace is rejected.
impl FromStr for EdfData {
    type Err = EdfError;

    fn from_str(s: &str) -> Result<Self> {
        codec::decode_str(s)
    }
}
