//! # idp-resolver
//!
//! The dependency-graph attribute resolution engine.
//!
//! [`AttributeResolver`] orchestrates topological resolution of the
//! configured plugin graph for one request: the graph is validated at
//! construction (reference, cycle, and failover checks), each requested
//! attribute definition is resolved on demand with per-request
//! memoization, data-connector failures trigger failover substitution
//! and a no-retry window, and the final attribute set is stripped of
//! dependency-only, empty, and duplicate values.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod resolver;
mod validation;

pub use resolver::AttributeResolver;

pub use idp_resolver_spi::{InitializationError, ResolutionError, ResolutionResult};
