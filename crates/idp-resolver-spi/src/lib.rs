//! # idp-resolver-spi
//!
//! Plugin contracts for the IdP attribute resolver.
//!
//! This crate defines the capability traits implemented by resolver
//! plugins ([`AttributeDefinition`], [`DataConnector`]), the per-request
//! contexts that carry resolution state, and the dependency-support
//! helpers plugins use to read their inputs from the work context.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod context;
pub mod dependency;
pub mod error;
pub mod plugin;
pub mod principal;
pub mod support;
pub mod work_context;

pub use context::{CanonicalizationContext, ResolutionContext};
pub use dependency::PluginDependency;
pub use error::{InitializationError, ResolutionError, ResolutionResult};
pub use plugin::{
    ActivationCondition, AttributeDefinition, ConnectorSettings, DataConnector,
    DefinitionSettings, PluginSettings, ResolverPlugin,
};
pub use principal::PrincipalDecoder;
pub use work_context::{ResolvedConnector, ResolvedDefinition, WorkContext};

/// Current time as epoch milliseconds, the clock used for connector
/// failure timestamps.
#[must_use]
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
