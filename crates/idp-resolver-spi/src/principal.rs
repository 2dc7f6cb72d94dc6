//! Principal canonicalization hook.

use std::fmt::Debug;

use crate::context::CanonicalizationContext;
use crate::error::ResolutionResult;

/// Maps an inbound subject identity to a canonical principal name.
///
/// An optional collaborator of the resolver, consulted outside the
/// attribute dependency graph; no dependency resolution is involved.
pub trait PrincipalDecoder: Send + Sync + Debug {
    /// Canonicalizes the inbound subject.
    ///
    /// Returns `Ok(None)` when this decoder has no mapping for the
    /// subject.
    ///
    /// ## Errors
    ///
    /// Returns a [`ResolutionError`](crate::ResolutionError) if the
    /// decoding attempt itself fails.
    fn canonicalize(&self, context: &CanonicalizationContext) -> ResolutionResult<Option<String>>;

    /// Returns whether this decoder has any usable connectors behind it.
    fn has_valid_connectors(&self) -> bool;
}
