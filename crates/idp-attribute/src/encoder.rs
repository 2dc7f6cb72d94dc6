//! Protocol-agnostic attribute encoding seam.
//!
//! Actual wire marshalling (SAML assertions and the like) lives with the
//! protocol layers. This crate only defines the contract and a neutral
//! encoded form that those layers consume.

use std::fmt::Debug;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::attribute::Attribute;

/// Errors raised while encoding an attribute.
#[derive(Debug, Error)]
pub enum EncodingError {
    /// The attribute contained a value the encoder cannot represent.
    #[error("encoder '{encoder}' cannot represent value of type {value_type}")]
    UnsupportedValue {
        /// Name of the encoder that failed.
        encoder: String,
        /// Variant name of the offending value.
        value_type: &'static str,
    },

    /// The attribute had no values to encode.
    #[error("attribute '{attribute_id}' has no values to encode")]
    NoValues {
        /// Identifier of the empty attribute.
        attribute_id: String,
    },
}

/// A protocol-neutral encoded attribute: a wire name plus string pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedAttribute {
    /// The name of the attribute on the wire.
    pub name: String,
    /// Encoded values as name-qualified strings.
    pub values: Vec<String>,
}

/// Encodes an [`Attribute`] into a protocol-specific form.
pub trait AttributeEncoder: Send + Sync + Debug {
    /// The protocol this encoder serves (e.g. `"urn:oasis:names:tc:SAML:2.0"`).
    fn protocol(&self) -> &str;

    /// Encodes the given attribute.
    ///
    /// ## Errors
    ///
    /// Returns an error if the attribute cannot be represented by this
    /// encoder.
    fn encode(&self, attribute: &Attribute) -> Result<EncodedAttribute, EncodingError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::AttributeValue;

    #[derive(Debug)]
    struct StringEncoder {
        wire_name: String,
    }

    impl AttributeEncoder for StringEncoder {
        fn protocol(&self) -> &str {
            "test"
        }

        fn encode(&self, attribute: &Attribute) -> Result<EncodedAttribute, EncodingError> {
            let mut values = Vec::new();
            for value in attribute.values() {
                match value.as_str() {
                    Some(s) => values.push(s.to_string()),
                    None => {
                        return Err(EncodingError::UnsupportedValue {
                            encoder: self.wire_name.clone(),
                            value_type: value.type_name(),
                        })
                    }
                }
            }
            if values.is_empty() {
                return Err(EncodingError::NoValues {
                    attribute_id: attribute.id().to_string(),
                });
            }
            Ok(EncodedAttribute {
                name: self.wire_name.clone(),
                values,
            })
        }
    }

    #[test]
    fn string_values_encode() {
        let mut attribute = Attribute::new("uid").unwrap();
        attribute.push_value(AttributeValue::string("jdoe"));

        let encoder = StringEncoder {
            wire_name: "urn:test:uid".to_string(),
        };
        let encoded = encoder.encode(&attribute).unwrap();
        assert_eq!(encoded.name, "urn:test:uid");
        assert_eq!(encoded.values, vec!["jdoe".to_string()]);
    }

    #[test]
    fn valueless_attribute_is_an_error() {
        let attribute = Attribute::new("uid").unwrap();
        let encoder = StringEncoder {
            wire_name: "urn:test:uid".to_string(),
        };
        assert!(encoder.encode(&attribute).is_err());
    }
}
