//! The attribute container.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::encoder::AttributeEncoder;
use crate::value::AttributeValue;

/// Errors raised when constructing an [`Attribute`].
#[derive(Debug, Error)]
pub enum AttributeError {
    /// The attribute identifier was empty or whitespace-only.
    #[error("attribute identifier may not be blank")]
    BlankId,
}

/// A named, multi-valued attribute.
///
/// Attributes are created fresh by each resolver plugin during a
/// resolution pass and never mutated once recorded in the work context.
/// The identifier is immutable after construction.
#[derive(Clone)]
pub struct Attribute {
    /// Unique identifier, trimmed and never blank.
    id: String,
    /// Values, in production order. Deduplication happens at finalize time.
    values: Vec<AttributeValue>,
    /// Localized human-readable names, keyed by language tag.
    display_names: HashMap<String, String>,
    /// Localized human-readable descriptions, keyed by language tag.
    display_descriptions: HashMap<String, String>,
    /// Encoders usable with this attribute.
    encoders: Vec<Arc<dyn AttributeEncoder>>,
}

impl Attribute {
    /// Creates an empty attribute with the given identifier.
    ///
    /// The identifier is trimmed before use.
    ///
    /// ## Errors
    ///
    /// Returns [`AttributeError::BlankId`] if the identifier is blank.
    pub fn new(id: impl AsRef<str>) -> Result<Self, AttributeError> {
        let id = id.as_ref().trim();
        if id.is_empty() {
            return Err(AttributeError::BlankId);
        }
        Ok(Self {
            id: id.to_string(),
            values: Vec::new(),
            display_names: HashMap::new(),
            display_descriptions: HashMap::new(),
            encoders: Vec::new(),
        })
    }

    /// Returns the unique identifier of this attribute.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the values of this attribute, in production order.
    #[must_use]
    pub fn values(&self) -> &[AttributeValue] {
        &self.values
    }

    /// Replaces the values of this attribute.
    pub fn set_values(&mut self, values: impl IntoIterator<Item = AttributeValue>) {
        self.values = values.into_iter().collect();
    }

    /// Appends a single value.
    pub fn push_value(&mut self, value: AttributeValue) {
        self.values.push(value);
    }

    /// Removes duplicate values, keeping the first occurrence of each.
    pub fn dedup_values(&mut self) {
        let mut seen = std::collections::HashSet::new();
        self.values.retain(|value| seen.insert(value.clone()));
    }

    /// Returns the localized display names.
    #[must_use]
    pub fn display_names(&self) -> &HashMap<String, String> {
        &self.display_names
    }

    /// Returns the localized display descriptions.
    #[must_use]
    pub fn display_descriptions(&self) -> &HashMap<String, String> {
        &self.display_descriptions
    }

    /// Replaces the display names, dropping blank keys and values.
    pub fn set_display_names(&mut self, names: impl IntoIterator<Item = (String, String)>) {
        self.display_names = checked_localized(names);
    }

    /// Replaces the display descriptions, dropping blank keys and values.
    pub fn set_display_descriptions(
        &mut self,
        descriptions: impl IntoIterator<Item = (String, String)>,
    ) {
        self.display_descriptions = checked_localized(descriptions);
    }

    /// Returns the encoders usable with this attribute.
    #[must_use]
    pub fn encoders(&self) -> &[Arc<dyn AttributeEncoder>] {
        &self.encoders
    }

    /// Replaces the encoders for this attribute.
    pub fn set_encoders(&mut self, encoders: Vec<Arc<dyn AttributeEncoder>>) {
        self.encoders = encoders;
    }
}

impl std::fmt::Debug for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attribute")
            .field("id", &self.id)
            .field("values", &self.values)
            .field("encoders", &self.encoders.len())
            .finish_non_exhaustive()
    }
}

impl PartialEq for Attribute {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.values == other.values
    }
}

impl Eq for Attribute {}

/// Strips blank keys and values from localized metadata, trimming values.
fn checked_localized(input: impl IntoIterator<Item = (String, String)>) -> HashMap<String, String> {
    input
        .into_iter()
        .filter_map(|(key, value)| {
            let key = key.trim();
            let value = value.trim();
            if key.is_empty() || value.is_empty() {
                None
            } else {
                Some((key.to_string(), value.to_string()))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_id_is_rejected() {
        assert!(Attribute::new("  ").is_err());
        assert!(Attribute::new("").is_err());
    }

    #[test]
    fn id_is_trimmed() {
        let attribute = Attribute::new("  uid  ").unwrap();
        assert_eq!(attribute.id(), "uid");
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let mut attribute = Attribute::new("mail").unwrap();
        attribute.set_values([
            AttributeValue::string("a@example.org"),
            AttributeValue::string("b@example.org"),
            AttributeValue::string("a@example.org"),
        ]);
        attribute.dedup_values();
        assert_eq!(
            attribute.values(),
            &[
                AttributeValue::string("a@example.org"),
                AttributeValue::string("b@example.org"),
            ]
        );
    }

    #[test]
    fn blank_display_entries_are_dropped() {
        let mut attribute = Attribute::new("uid").unwrap();
        attribute.set_display_names([
            ("en".to_string(), "User ID".to_string()),
            ("de".to_string(), "   ".to_string()),
            ("  ".to_string(), "nope".to_string()),
        ]);
        assert_eq!(attribute.display_names().len(), 1);
        assert_eq!(
            attribute.display_names().get("en").map(String::as_str),
            Some("User ID")
        );
    }
}
