//! # idp-attribute
//!
//! Attribute value model for the IdP attribute resolution engine.
//!
//! This crate provides the leaf data types consumed by the resolver:
//! typed attribute values, the [`Attribute`] container, and the
//! protocol-agnostic encoder seam.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod attribute;
pub mod encoder;
pub mod value;

pub use attribute::{Attribute, AttributeError};
pub use encoder::{AttributeEncoder, EncodedAttribute, EncodingError};
pub use value::{AttributeValue, EmptyKind};
