//! Resolver plugin capability traits.
//!
//! Plugins are request-agnostic singletons shared across all concurrent
//! resolutions. All per-request state lives in the
//! [`WorkContext`](crate::WorkContext); the one cross-request mutable
//! field is a connector's last-failure timestamp, held in an atomic.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use idp_attribute::Attribute;

use crate::context::ResolutionContext;
use crate::dependency::PluginDependency;
use crate::error::ResolutionResult;
use crate::work_context::WorkContext;

/// Predicate deciding whether a plugin participates in a given request.
///
/// The predicate is infallible by construction; a condition that cannot
/// be evaluated must be expressed as one that returns `false`.
pub type ActivationCondition = Arc<dyn Fn(&ResolutionContext) -> bool + Send + Sync>;

/// Settings common to every resolver plugin.
#[derive(Clone)]
pub struct PluginSettings {
    /// Stable unique identifier.
    id: String,
    /// Declared dependencies on other plugins.
    dependencies: Vec<PluginDependency>,
    /// Whether a resolution failure aborts the whole request.
    propagate_resolution_errors: bool,
    /// Optional per-request activation predicate.
    activation_condition: Option<ActivationCondition>,
}

impl PluginSettings {
    /// Creates settings for the given plugin identifier.
    ///
    /// Failures propagate by default and no activation condition is set.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            dependencies: Vec::new(),
            propagate_resolution_errors: true,
            activation_condition: None,
        }
    }

    /// Adds a single dependency declaration.
    #[must_use]
    pub fn with_dependency(mut self, dependency: PluginDependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    /// Replaces the dependency declarations.
    #[must_use]
    pub fn with_dependencies(mut self, dependencies: Vec<PluginDependency>) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Sets whether resolution failures abort the whole request.
    #[must_use]
    pub fn propagate_resolution_errors(mut self, propagate: bool) -> Self {
        self.propagate_resolution_errors = propagate;
        self
    }

    /// Sets the activation condition.
    #[must_use]
    pub fn with_activation_condition(mut self, condition: ActivationCondition) -> Self {
        self.activation_condition = Some(condition);
        self
    }

    /// Returns the plugin identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the declared dependencies.
    #[must_use]
    pub fn dependencies(&self) -> &[PluginDependency] {
        &self.dependencies
    }

    /// Returns whether failures propagate.
    #[must_use]
    pub const fn propagates_resolution_errors(&self) -> bool {
        self.propagate_resolution_errors
    }

    /// Evaluates the activation condition for the given request.
    ///
    /// Plugins without a condition are always active.
    #[must_use]
    pub fn is_active(&self, context: &ResolutionContext) -> bool {
        self.activation_condition
            .as_ref()
            .map_or(true, |condition| condition(context))
    }
}

impl Debug for PluginSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginSettings")
            .field("id", &self.id)
            .field("dependencies", &self.dependencies)
            .field(
                "propagate_resolution_errors",
                &self.propagate_resolution_errors,
            )
            .field(
                "activation_condition",
                &self.activation_condition.is_some(),
            )
            .finish()
    }
}

/// Capability contract common to attribute definitions and data
/// connectors.
pub trait ResolverPlugin: Send + Sync + Debug {
    /// Returns the settings shared by all plugin kinds.
    fn settings(&self) -> &PluginSettings;

    /// Returns the stable unique identifier of this plugin.
    fn id(&self) -> &str {
        self.settings().id()
    }

    /// Returns the declared dependencies of this plugin.
    fn dependencies(&self) -> &[PluginDependency] {
        self.settings().dependencies()
    }

    /// Returns whether a resolution failure aborts the whole request.
    fn propagates_resolution_errors(&self) -> bool {
        self.settings().propagates_resolution_errors()
    }

    /// Returns whether this plugin participates in the given request.
    fn is_active(&self, context: &ResolutionContext) -> bool {
        self.settings().is_active(context)
    }
}

/// Settings specific to attribute definitions.
#[derive(Debug, Clone)]
pub struct DefinitionSettings {
    /// Settings common to all plugins.
    plugin: PluginSettings,
    /// Whether the output is only consumed by dependents, never released.
    dependency_only: bool,
}

impl DefinitionSettings {
    /// Creates definition settings for the given identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            plugin: PluginSettings::new(id),
            dependency_only: false,
        }
    }

    /// Wraps existing plugin settings.
    #[must_use]
    pub fn from_plugin(plugin: PluginSettings) -> Self {
        Self {
            plugin,
            dependency_only: false,
        }
    }

    /// Marks the definition's output as dependency-only.
    #[must_use]
    pub fn dependency_only(mut self, dependency_only: bool) -> Self {
        self.dependency_only = dependency_only;
        self
    }

    /// Returns the common plugin settings.
    #[must_use]
    pub fn plugin(&self) -> &PluginSettings {
        &self.plugin
    }

    /// Returns whether the output is dependency-only.
    #[must_use]
    pub const fn is_dependency_only(&self) -> bool {
        self.dependency_only
    }
}

/// A resolver plugin computing exactly one named attribute, possibly
/// from other plugins' outputs.
pub trait AttributeDefinition: ResolverPlugin {
    /// Returns the definition-specific settings.
    fn definition_settings(&self) -> &DefinitionSettings;

    /// Returns whether this definition's output is excluded from the
    /// final attribute set.
    fn is_dependency_only(&self) -> bool {
        self.definition_settings().is_dependency_only()
    }

    /// Computes this definition's attribute.
    ///
    /// The engine guarantees at-most-once invocation per request and
    /// resolves all declared dependencies beforehand; implementations
    /// read their inputs from the work context via
    /// [`support`](crate::support) and must not trigger resolution
    /// themselves.
    ///
    /// ## Errors
    ///
    /// Returns a [`ResolutionError`](crate::ResolutionError) on failure;
    /// whether that aborts the request is governed by
    /// [`ResolverPlugin::propagates_resolution_errors`].
    fn resolve(
        &self,
        context: &ResolutionContext,
        work: &WorkContext,
    ) -> ResolutionResult<Option<Attribute>>;
}

/// Settings specific to data connectors, including failover and retry
/// state.
#[derive(Debug)]
pub struct ConnectorSettings {
    /// Settings common to all plugins.
    plugin: PluginSettings,
    /// Connector to substitute when this one fails.
    failover_connector_id: Option<String>,
    /// How long after a failure before this connector is retried.
    no_retry_delay: Duration,
    /// Epoch millis of the last failure; 0 means never failed.
    ///
    /// Shared across concurrent requests. Relaxed ordering is fine: a
    /// racing read at worst triggers one redundant retry of a still
    /// failing connector.
    last_fail: AtomicI64,
}

impl ConnectorSettings {
    /// Creates connector settings for the given identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self::from_plugin(PluginSettings::new(id))
    }

    /// Wraps existing plugin settings.
    #[must_use]
    pub fn from_plugin(plugin: PluginSettings) -> Self {
        Self {
            plugin,
            failover_connector_id: None,
            no_retry_delay: Duration::ZERO,
            last_fail: AtomicI64::new(0),
        }
    }

    /// Sets the failover connector.
    #[must_use]
    pub fn with_failover(mut self, connector_id: impl Into<String>) -> Self {
        self.failover_connector_id = Some(connector_id.into());
        self
    }

    /// Sets the no-retry window after a failure.
    #[must_use]
    pub fn with_no_retry_delay(mut self, delay: Duration) -> Self {
        self.no_retry_delay = delay;
        self
    }

    /// Returns the common plugin settings.
    #[must_use]
    pub fn plugin(&self) -> &PluginSettings {
        &self.plugin
    }

    /// Returns the failover connector identifier, if any.
    #[must_use]
    pub fn failover_connector_id(&self) -> Option<&str> {
        self.failover_connector_id.as_deref()
    }

    /// Returns the no-retry window.
    #[must_use]
    pub const fn no_retry_delay(&self) -> Duration {
        self.no_retry_delay
    }

    /// Returns the epoch millis of the last recorded failure, if any.
    #[must_use]
    pub fn last_fail(&self) -> Option<i64> {
        match self.last_fail.load(Ordering::Relaxed) {
            0 => None,
            millis => Some(millis),
        }
    }

    /// Records a failure at the given time.
    pub fn note_failure(&self, now_millis: i64) {
        self.last_fail.store(now_millis, Ordering::Relaxed);
    }

    /// Clears the failure record, making the connector live immediately.
    pub fn clear_failure(&self) {
        self.last_fail.store(0, Ordering::Relaxed);
    }

    /// Returns true while the connector is inside its no-retry window.
    #[must_use]
    pub fn in_backoff(&self, now_millis: i64) -> bool {
        match self.last_fail() {
            Some(last_fail) => {
                let delay = i64::try_from(self.no_retry_delay.as_millis()).unwrap_or(i64::MAX);
                now_millis < last_fail.saturating_add(delay)
            }
            None => false,
        }
    }
}

/// A resolver plugin fetching a map of named attributes from an external
/// source.
pub trait DataConnector: ResolverPlugin {
    /// Returns the connector-specific settings.
    fn connector_settings(&self) -> &ConnectorSettings;

    /// Returns the connector to substitute when this one fails.
    fn failover_connector_id(&self) -> Option<&str> {
        self.connector_settings().failover_connector_id()
    }

    /// Returns the no-retry window applied after a failure.
    fn no_retry_delay(&self) -> Duration {
        self.connector_settings().no_retry_delay()
    }

    /// Returns the epoch millis of the last failure, if any.
    fn last_fail(&self) -> Option<i64> {
        self.connector_settings().last_fail()
    }

    /// Records a failure at the given time.
    fn note_failure(&self, now_millis: i64) {
        self.connector_settings().note_failure(now_millis);
    }

    /// Fetches this connector's attributes.
    ///
    /// Same at-most-once and dependency guarantees as
    /// [`AttributeDefinition::resolve`]. The result map may be empty.
    ///
    /// ## Errors
    ///
    /// Returns a [`ResolutionError`](crate::ResolutionError) on failure.
    /// The engine applies failover substitution before the
    /// propagate/swallow policy.
    fn resolve(
        &self,
        context: &ResolutionContext,
        work: &WorkContext,
    ) -> ResolutionResult<HashMap<String, Attribute>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_propagate_by_default() {
        let settings = PluginSettings::new("ad1");
        assert!(settings.propagates_resolution_errors());
        assert_eq!(settings.id(), "ad1");
    }

    #[test]
    fn activation_condition_is_consulted() {
        let settings = PluginSettings::new("ad1").with_activation_condition(Arc::new(
            |context: &ResolutionContext| context.principal() == Some("jdoe"),
        ));

        let mut context = ResolutionContext::new();
        assert!(!settings.is_active(&context));

        context.set_principal("jdoe");
        assert!(settings.is_active(&context));
    }

    #[test]
    fn backoff_window_respects_delay() {
        let settings =
            ConnectorSettings::new("dc1").with_no_retry_delay(Duration::from_millis(500));

        assert!(!settings.in_backoff(1_000));

        settings.note_failure(1_000);
        assert!(settings.in_backoff(1_400));
        assert!(!settings.in_backoff(1_500));
    }

    #[test]
    fn never_failed_connector_is_live() {
        let settings =
            ConnectorSettings::new("dc1").with_no_retry_delay(Duration::from_secs(600));
        assert_eq!(settings.last_fail(), None);
        assert!(!settings.in_backoff(i64::MAX));
    }
}
