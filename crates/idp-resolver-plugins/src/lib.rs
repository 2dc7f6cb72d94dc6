//! # idp-resolver-plugins
//!
//! Stock resolver plugins: the attribute definitions and data
//! connectors an operator composes into a resolution graph. External
//! source integrations (directories, databases) plug in behind the
//! [`SearchExecutor`](dc::SearchExecutor) seam.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod ad;
pub mod dc;
pub mod principal;

pub use ad::{
    MappedAttributeDefinition, PrescopedAttributeDefinition, RegexSplitAttributeDefinition,
    ScopedAttributeDefinition, SimpleAttributeDefinition, TemplateAttributeDefinition,
};
pub use dc::{SearchDataConnector, SearchExecutor, StaticDataConnector};
pub use principal::DirectPrincipalDecoder;

use idp_attribute::Attribute;
use idp_resolver_spi::{ResolutionError, ResolutionResult};

/// Creates the output attribute for a plugin.
///
/// Plugin constructors reject blank ids, so this only fails on misuse.
pub(crate) fn output_attribute(plugin_id: &str) -> ResolutionResult<Attribute> {
    Attribute::new(plugin_id)
        .map_err(|error| ResolutionError::plugin(plugin_id, error.to_string()))
}
