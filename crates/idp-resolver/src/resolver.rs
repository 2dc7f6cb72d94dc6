//! The attribute resolver engine.

use std::collections::HashMap;
use std::sync::Arc;

use idp_attribute::Attribute;
use idp_resolver_spi::{
    now_millis, AttributeDefinition, CanonicalizationContext, DataConnector, InitializationError,
    PrincipalDecoder, ResolutionContext, ResolutionError, ResolutionResult, ResolverPlugin,
    WorkContext,
};
use tracing::{debug, trace, warn};

use crate::validation::GraphValidator;

/// A component that resolves the attributes for a particular subject.
///
/// Construction validates the whole plugin graph; a constructed resolver
/// is always usable and is safe to share across concurrent requests
/// (plugins are `Send + Sync` singletons, per-request state lives in a
/// call-local work context).
#[derive(Debug)]
pub struct AttributeResolver {
    /// Identifier of this resolver, used in log output.
    id: String,
    /// Attribute definitions configured for this resolver.
    attribute_definitions: HashMap<String, Arc<dyn AttributeDefinition>>,
    /// Data connectors configured for this resolver.
    data_connectors: HashMap<String, Arc<dyn DataConnector>>,
    /// Optional principal canonicalization hook.
    principal_decoder: Option<Arc<dyn PrincipalDecoder>>,
}

impl AttributeResolver {
    /// Creates a resolver from fully constructed plugins.
    ///
    /// ## Errors
    ///
    /// Returns an [`InitializationError`] for a blank resolver id,
    /// duplicate plugin ids within a namespace, dangling dependency or
    /// failover references, or a cyclic dependency graph. No partially
    /// initialized resolver is ever returned.
    pub fn new(
        id: impl Into<String>,
        definitions: Vec<Arc<dyn AttributeDefinition>>,
        connectors: Vec<Arc<dyn DataConnector>>,
        principal_decoder: Option<Arc<dyn PrincipalDecoder>>,
    ) -> Result<Self, InitializationError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(InitializationError::invalid("resolver id may not be blank"));
        }

        let mut attribute_definitions = HashMap::with_capacity(definitions.len());
        for definition in definitions {
            let definition_id = definition.id().to_string();
            if attribute_definitions
                .insert(definition_id.clone(), definition)
                .is_some()
            {
                return Err(InitializationError::DuplicateDefinition(definition_id));
            }
        }

        let mut data_connectors = HashMap::with_capacity(connectors.len());
        for connector in connectors {
            let connector_id = connector.id().to_string();
            if data_connectors
                .insert(connector_id.clone(), connector)
                .is_some()
            {
                return Err(InitializationError::DuplicateConnector(connector_id));
            }
        }

        GraphValidator::new(&attribute_definitions, &data_connectors).validate()?;

        Ok(Self {
            id,
            attribute_definitions,
            data_connectors,
            principal_decoder,
        })
    }

    /// Returns the identifier of this resolver.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the configured attribute definitions.
    #[must_use]
    pub fn attribute_definitions(&self) -> &HashMap<String, Arc<dyn AttributeDefinition>> {
        &self.attribute_definitions
    }

    /// Returns the configured data connectors.
    #[must_use]
    pub fn data_connectors(&self) -> &HashMap<String, Arc<dyn DataConnector>> {
        &self.data_connectors
    }

    /// Resolves the attributes for the given request.
    ///
    /// Requested attribute ids on the context are a hint: the resolver
    /// does not fail when one of them cannot be resolved. With no hint,
    /// every configured attribute definition is resolved. The final
    /// attribute set is written back onto the context.
    ///
    /// ## Errors
    ///
    /// Returns a [`ResolutionError`] when a plugin configured to
    /// propagate failures fails (after any failover substitution).
    pub fn resolve_attributes(&self, context: &mut ResolutionContext) -> ResolutionResult<()> {
        debug!(resolver = %self.id, "initiating attribute resolution");

        if self.attribute_definitions.is_empty() {
            debug!(resolver = %self.id, "no attribute definitions available, nothing resolved");
            context.set_resolved_attributes([]);
            return Ok(());
        }

        let targets = self.target_attribute_ids(context);
        debug!(resolver = %self.id, ?targets, "attempting to resolve attribute definitions");

        let mut work = WorkContext::new();
        for attribute_id in &targets {
            self.resolve_definition(attribute_id, context, &mut work)?;
        }

        debug!(resolver = %self.id, "finalizing resolved attributes");
        self.finalize_resolved_attributes(context, &work);

        debug!(
            resolver = %self.id,
            attributes = ?context.resolved_attributes().keys().collect::<Vec<_>>(),
            "final resolved attribute collection"
        );
        Ok(())
    }

    /// Canonicalizes an inbound subject via the configured decoder.
    ///
    /// A resolver without a decoder is a no-op returning `Ok(None)`.
    ///
    /// ## Errors
    ///
    /// Propagates the decoder's [`ResolutionError`].
    pub fn canonicalize(
        &self,
        context: &CanonicalizationContext,
    ) -> ResolutionResult<Option<String>> {
        match &self.principal_decoder {
            Some(decoder) => decoder.canonicalize(context),
            None => Ok(None),
        }
    }

    /// Returns whether a principal decoder with usable connectors is
    /// configured.
    #[must_use]
    pub fn has_valid_connectors(&self) -> bool {
        self.principal_decoder
            .as_ref()
            .is_some_and(|decoder| decoder.has_valid_connectors())
    }

    /// The attribute ids to resolve: the requested hint, or everything.
    fn target_attribute_ids(&self, context: &ResolutionContext) -> Vec<String> {
        if context.requested_attribute_ids().is_empty() {
            self.attribute_definitions.keys().cloned().collect()
        } else {
            context.requested_attribute_ids().to_vec()
        }
    }

    /// Resolves one attribute definition, dependencies first.
    fn resolve_definition(
        &self,
        attribute_id: &str,
        context: &ResolutionContext,
        work: &mut WorkContext,
    ) -> ResolutionResult<()> {
        trace!(resolver = %self.id, attribute_id, "beginning to resolve attribute definition");

        if work.has_definition(attribute_id) {
            trace!(resolver = %self.id, attribute_id, "already resolved, nothing to do");
            return Ok(());
        }

        let Some(definition) = self.attribute_definitions.get(attribute_id) else {
            debug!(
                resolver = %self.id,
                attribute_id,
                "no attribute definition registered with this id, nothing to do"
            );
            return Ok(());
        };

        if !definition.is_active(context) {
            debug!(
                resolver = %self.id,
                attribute_id,
                "activation condition not met, nothing to do"
            );
            return work.record_definition(definition.as_ref(), None);
        }

        self.resolve_dependencies(definition.as_ref(), context, work)?;

        trace!(resolver = %self.id, attribute_id, "resolving attribute definition");
        match definition.resolve(context, work) {
            Ok(Some(attribute)) => {
                debug!(
                    resolver = %self.id,
                    attribute_id,
                    values = attribute.values().len(),
                    "attribute definition produced an attribute"
                );
                work.record_definition(definition.as_ref(), Some(attribute))
            }
            Ok(None) => {
                debug!(resolver = %self.id, attribute_id, "attribute definition produced no attribute");
                work.record_definition(definition.as_ref(), None)
            }
            Err(error) if definition.propagates_resolution_errors() => Err(error),
            Err(error) => {
                debug!(
                    resolver = %self.id,
                    attribute_id,
                    %error,
                    "attribute definition failed but is configured not to propagate"
                );
                work.record_definition(definition.as_ref(), None)
            }
        }
    }

    /// Resolves one data connector, applying the no-retry window and
    /// failover substitution.
    fn resolve_connector(
        &self,
        connector_id: &str,
        context: &ResolutionContext,
        work: &mut WorkContext,
    ) -> ResolutionResult<()> {
        if work.has_connector(connector_id) {
            trace!(resolver = %self.id, connector_id, "already resolved, nothing to do");
            return Ok(());
        }

        let Some(connector) = self.data_connectors.get(connector_id) else {
            debug!(
                resolver = %self.id,
                connector_id,
                "no data connector registered with this id, nothing to do"
            );
            return Ok(());
        };

        if connector.connector_settings().in_backoff(now_millis()) {
            debug!(
                resolver = %self.id,
                connector_id,
                "data connector failed to resolve previously, still waiting"
            );
            return self.substitute_or_fail(
                connector,
                context,
                work,
                ResolutionError::ConnectorSuspended {
                    connector_id: connector_id.to_string(),
                },
            );
        }

        if !connector.is_active(context) {
            debug!(
                resolver = %self.id,
                connector_id,
                "activation condition not met, nothing to do"
            );
            return work.record_connector(connector.as_ref(), None);
        }

        self.resolve_dependencies(connector.as_ref(), context, work)?;

        debug!(resolver = %self.id, connector_id, "resolving data connector");
        match connector.resolve(context, work) {
            Ok(attributes) => {
                debug!(
                    resolver = %self.id,
                    connector_id,
                    attributes = ?attributes.keys().collect::<Vec<_>>(),
                    "data connector resolved attributes"
                );
                work.record_connector(connector.as_ref(), Some(attributes))
            }
            Err(error) => {
                // Result-shape errors are operator-declared conditions,
                // not outages; they never arm the retry window.
                if !error.is_result_shape() {
                    connector.note_failure(now_millis());
                }
                self.substitute_or_fail(connector, context, work, error)
            }
        }
    }

    /// Attempts failover substitution for a failed (or suspended)
    /// connector, then falls back to its propagate/swallow policy.
    fn substitute_or_fail(
        &self,
        connector: &Arc<dyn DataConnector>,
        context: &ResolutionContext,
        work: &mut WorkContext,
        error: ResolutionError,
    ) -> ResolutionResult<()> {
        if let Some(failover_id) = connector.failover_connector_id() {
            let failover_id = failover_id.to_string();
            debug!(
                resolver = %self.id,
                connector_id = connector.id(),
                failover_id = %failover_id,
                %error,
                "data connector failed, invoking failover data connector"
            );
            match self.resolve_connector(&failover_id, context, work) {
                Ok(()) if work.has_connector(&failover_id) => {
                    return work.record_failover_substitution(connector.as_ref(), &failover_id);
                }
                Ok(()) => {}
                Err(failover_error) => {
                    debug!(
                        resolver = %self.id,
                        connector_id = connector.id(),
                        failover_id = %failover_id,
                        error = %failover_error,
                        "failover data connector also failed"
                    );
                }
            }
        }

        if connector.propagates_resolution_errors() {
            Err(error)
        } else {
            debug!(
                resolver = %self.id,
                connector_id = connector.id(),
                %error,
                "data connector failed but is configured not to propagate"
            );
            work.record_connector(connector.as_ref(), None)
        }
    }

    /// Resolves all declared dependencies of a plugin, post-order.
    fn resolve_dependencies(
        &self,
        plugin: &dyn ResolverPlugin,
        context: &ResolutionContext,
        work: &mut WorkContext,
    ) -> ResolutionResult<()> {
        if plugin.dependencies().is_empty() {
            return Ok(());
        }

        debug!(resolver = %self.id, plugin_id = plugin.id(), "resolving dependencies");

        for dependency in plugin.dependencies() {
            let dependency_id = dependency.plugin_id.as_str();
            if self.attribute_definitions.contains_key(dependency_id) {
                self.resolve_definition(dependency_id, context, work)?;
            } else if self.data_connectors.contains_key(dependency_id) {
                self.resolve_connector(dependency_id, context, work)?;
            } else {
                // Construction-time validation makes this unreachable.
                return Err(ResolutionError::plugin(
                    plugin.id(),
                    format!("dependency on unknown plugin '{dependency_id}'"),
                ));
            }
        }

        trace!(resolver = %self.id, plugin_id = plugin.id(), "finished resolving dependencies");
        Ok(())
    }

    /// Assembles the final attribute set: non-dependency-only
    /// definitions with values, deduplicated by value equality.
    fn finalize_resolved_attributes(&self, context: &mut ResolutionContext, work: &WorkContext) {
        let mut resolved: Vec<Attribute> = Vec::new();

        for definition in work.resolved_definitions().values() {
            let Some(attribute) = definition.attribute() else {
                debug!(
                    resolver = %self.id,
                    attribute_id = definition.id(),
                    "dropping result, no attribute was produced"
                );
                continue;
            };

            if definition.is_dependency_only() {
                debug!(
                    resolver = %self.id,
                    attribute_id = definition.id(),
                    "dropping result, definition is marked dependency-only"
                );
                continue;
            }

            let mut attribute = attribute.clone();
            let before = attribute.values().len();
            attribute.dedup_values();
            if attribute.values().len() < before {
                debug!(
                    resolver = %self.id,
                    attribute_id = attribute.id(),
                    removed = before - attribute.values().len(),
                    "removed duplicate values from resolution result"
                );
            }

            if attribute.values().is_empty() {
                debug!(
                    resolver = %self.id,
                    attribute_id = attribute.id(),
                    "dropping result, attribute contains no values"
                );
                continue;
            }

            resolved.push(attribute);
        }

        if resolved.is_empty() {
            warn!(resolver = %self.id, "no attributes were resolved for this request");
        }
        context.set_resolved_attributes(resolved);
    }
}
