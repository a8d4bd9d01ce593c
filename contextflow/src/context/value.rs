//! The value model stored in a [`Context`](super::Context).

use serde::{Deserialize, Serialize};
use std::fmt;

/// A formattable value: scalar, ordered sequence or ordered mapping.
///
/// Strings anywhere in the tree may carry `{placeholder}` tokens.
pub type Value = serde_json::Value;

/// A shape that a context value can be asserted to have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueShape {
    /// Anything, including null.
    Any,
    /// A string.
    String,
    /// A string, number or bool.
    Scalar,
    /// A keyed mapping.
    Mapping,
    /// An ordered sequence.
    Sequence,
    /// An ordered sequence whose items are all mappings.
    SequenceOfMappings,
    /// An ordered sequence whose items are all strings.
    SequenceOfStrings,
}

impl ValueShape {
    /// Returns the human-readable name used in error messages.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Any => "value",
            Self::String => "string",
            Self::Scalar => "scalar",
            Self::Mapping => "mapping",
            Self::Sequence => "sequence",
            Self::SequenceOfMappings => "sequence of mappings",
            Self::SequenceOfStrings => "sequence of strings",
        }
    }

    /// Returns true if `value` has this shape.
    #[must_use]
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Self::Any => true,
            Self::String => value.is_string(),
            Self::Scalar => value.is_string() || value.is_number() || value.is_boolean(),
            Self::Mapping => value.is_object(),
            Self::Sequence => value.is_array(),
            Self::SequenceOfMappings => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_object)),
            Self::SequenceOfStrings => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
        }
    }
}

impl fmt::Display for ValueShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Names the kind of a value for diagnostics.
#[must_use]
pub fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "mapping",
    }
}

/// Returns false for null and the empty string.
#[must_use]
pub fn has_value(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// Renders a value for embedding in surrounding text.
///
/// Null renders as the empty string and composites as compact JSON.
#[must_use]
pub fn to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}
