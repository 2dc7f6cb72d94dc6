//! Typed attribute values.
//!
//! Values are compared by content; the resolver deduplicates final
//! attribute values by equality.

use serde::{Deserialize, Serialize};

/// Marker for values that carry no usable content.
///
/// External sources (directories in particular) distinguish between an
/// attribute that is present with a null value and one that is present
/// with a zero-length value. Downstream definitions skip both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyKind {
    /// The source reported a null value.
    Null,
    /// The source reported a zero-length value.
    ZeroLength,
}

impl EmptyKind {
    /// Human-readable form used in log messages.
    #[must_use]
    pub const fn display_value(&self) -> &'static str {
        match self {
            Self::Null => "null value",
            Self::ZeroLength => "empty value",
        }
    }
}

/// A single value of an [`Attribute`](crate::Attribute).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeValue {
    /// A plain string value.
    String(String),
    /// A string value qualified by a scope (e.g. `jdoe` @ `example.org`).
    Scoped {
        /// The value part.
        value: String,
        /// The scope part, without any delimiter.
        scope: String,
    },
    /// An opaque binary value.
    Bytes(Vec<u8>),
    /// A present-but-empty marker value.
    Empty(EmptyKind),
}

impl AttributeValue {
    /// Creates a string value, mapping an empty input to the zero-length marker.
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            Self::Empty(EmptyKind::ZeroLength)
        } else {
            Self::String(value)
        }
    }

    /// Creates a scoped value.
    #[must_use]
    pub fn scoped(value: impl Into<String>, scope: impl Into<String>) -> Self {
        Self::Scoped {
            value: value.into(),
            scope: scope.into(),
        }
    }

    /// Returns the string content of this value, if it has one.
    ///
    /// Scoped values return the value part only.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) | Self::Scoped { value, .. } => Some(value),
            Self::Bytes(_) | Self::Empty(_) => None,
        }
    }

    /// Returns true if this is a present-but-empty marker.
    #[must_use]
    pub const fn is_empty_marker(&self) -> bool {
        matches!(self, Self::Empty(_))
    }

    /// Short name of the value variant, for diagnostics.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Scoped { .. } => "scoped",
            Self::Bytes(_) => "bytes",
            Self::Empty(_) => "empty",
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::string(value)
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::string(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_becomes_marker() {
        assert_eq!(
            AttributeValue::string(""),
            AttributeValue::Empty(EmptyKind::ZeroLength)
        );
    }

    #[test]
    fn scoped_value_exposes_value_part() {
        let value = AttributeValue::scoped("jdoe", "example.org");
        assert_eq!(value.as_str(), Some("jdoe"));
        assert_eq!(value.type_name(), "scoped");
    }

    #[test]
    fn values_serialize_with_snake_case_tags() {
        let scoped = AttributeValue::scoped("jdoe", "example.org");
        let json = serde_json::to_string(&scoped).unwrap();
        assert_eq!(json, r#"{"scoped":{"value":"jdoe","scope":"example.org"}}"#);

        let parsed: AttributeValue = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, scoped);

        let marker: AttributeValue = serde_json::from_str(r#"{"empty":"zero_length"}"#).unwrap();
        assert_eq!(marker, AttributeValue::Empty(EmptyKind::ZeroLength));
    }

    #[test]
    fn equal_values_compare_equal() {
        assert_eq!(AttributeValue::string("a"), AttributeValue::string("a"));
        assert_ne!(
            AttributeValue::string("a"),
            AttributeValue::scoped("a", "b")
        );
    }

    #[test]
    fn empty_markers_are_detected() {
        assert!(AttributeValue::Empty(EmptyKind::Null).is_empty_marker());
        assert!(!AttributeValue::string("x").is_empty_marker());
    }
}
