//! Resolution error types.
//!
//! Two taxonomies: [`InitializationError`] is fatal and construction
//! time (a resolver or plugin that fails to initialize never becomes
//! usable); [`ResolutionError`] is per-request and flows through the
//! per-plugin propagate/swallow machinery.

use thiserror::Error;

/// Result type alias for resolution operations.
pub type ResolutionResult<T> = Result<T, ResolutionError>;

/// Fatal configuration errors raised while constructing a resolver or
/// one of its plugins.
#[derive(Debug, Error)]
pub enum InitializationError {
    /// Two attribute definitions share an identifier.
    #[error("duplicate attribute definition with id '{0}'")]
    DuplicateDefinition(String),

    /// Two data connectors share an identifier.
    #[error("duplicate data connector with id '{0}'")]
    DuplicateConnector(String),

    /// A dependency references a plugin that does not exist.
    #[error("plugin '{plugin_id}' has a dependency on plugin '{dependency_id}' which doesn't exist")]
    MissingDependency {
        /// Identifier of the dependent plugin.
        plugin_id: String,
        /// The referenced identifier that matched nothing.
        dependency_id: String,
    },

    /// A connector's failover references a connector that does not exist.
    #[error("data connector '{connector_id}' names failover connector '{failover_id}' which doesn't exist")]
    MissingFailover {
        /// Identifier of the connector declaring the failover.
        connector_id: String,
        /// The failover identifier that matched nothing.
        failover_id: String,
    },

    /// The dependency graph (or a failover chain) contains a cycle.
    #[error("plugin '{plugin_id}' participates in a circular dependency")]
    CircularDependency {
        /// Identifier of a plugin on the cycle.
        plugin_id: String,
    },

    /// A plugin was configured inconsistently.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl InitializationError {
    /// Creates an invalid-configuration error.
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration(message.into())
    }
}

/// Errors that can occur while resolving attributes for one request.
#[derive(Debug, Error)]
pub enum ResolutionError {
    /// General plugin failure (external source errors end up here).
    #[error("plugin '{plugin_id}' failed to resolve: {message}")]
    Plugin {
        /// Identifier of the failing plugin.
        plugin_id: String,
        /// Description of the failure.
        message: String,
    },

    /// A connector configured to treat an empty result as an error found
    /// nothing.
    #[error("data connector '{connector_id}' returned no results")]
    NoResults {
        /// Identifier of the connector.
        connector_id: String,
    },

    /// A connector configured to treat an ambiguous result as an error
    /// found more than one.
    #[error("data connector '{connector_id}' returned {count} results where one was expected")]
    MultipleResults {
        /// Identifier of the connector.
        connector_id: String,
        /// Number of results actually returned.
        count: usize,
    },

    /// A plugin received an input value of a type it cannot process.
    #[error("plugin '{plugin_id}' only supports {expected} values, got {actual}")]
    UnsupportedValueType {
        /// Identifier of the plugin.
        plugin_id: String,
        /// The value type the plugin supports.
        expected: &'static str,
        /// The value type actually received.
        actual: &'static str,
    },

    /// A dependency on a data connector did not name a source attribute.
    #[error(
        "dependency of '{plugin_id}' on data connector '{connector_id}' must name a source attribute"
    )]
    MissingSourceAttribute {
        /// Identifier of the dependent plugin.
        plugin_id: String,
        /// Identifier of the connector the dependency points at.
        connector_id: String,
    },

    /// A result for this plugin was already recorded in the work context.
    #[error("result for plugin '{plugin_id}' has already been recorded")]
    AlreadyResolved {
        /// Identifier of the plugin.
        plugin_id: String,
    },

    /// A connector is inside its no-retry window and has no failover path.
    #[error("data connector '{connector_id}' failed recently and is not being retried yet")]
    ConnectorSuspended {
        /// Identifier of the suspended connector.
        connector_id: String,
    },

    /// A failover substitution referenced a connector result that was
    /// never recorded.
    #[error("failover connector '{connector_id}' has no recorded resolution")]
    FailoverNotResolved {
        /// Identifier of the failover connector.
        connector_id: String,
    },
}

impl ResolutionError {
    /// Creates a general plugin failure.
    #[must_use]
    pub fn plugin(plugin_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Plugin {
            plugin_id: plugin_id.into(),
            message: message.into(),
        }
    }

    /// Returns true for the configured result-shape errors.
    ///
    /// These are operator-declared conditions (`NoResults`,
    /// `MultipleResults`), not connector outages, so they never arm the
    /// no-retry window.
    #[must_use]
    pub const fn is_result_shape(&self) -> bool {
        matches!(self, Self::NoResults { .. } | Self::MultipleResults { .. })
    }
}
