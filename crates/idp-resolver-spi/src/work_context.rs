//! Per-request memoization store for resolved plugin outputs.

use std::collections::HashMap;

use idp_attribute::Attribute;

use crate::error::{ResolutionError, ResolutionResult};
use crate::plugin::{AttributeDefinition, DataConnector};

/// The one-shot resolved output of an attribute definition.
///
/// Created once per definition per request; subsequent reads are free.
#[derive(Debug, Clone)]
pub struct ResolvedDefinition {
    /// Identifier of the definition.
    id: String,
    /// Whether the definition's output is excluded from the final set.
    dependency_only: bool,
    /// The produced attribute; `None` for a skipped or swallowed-failure
    /// resolution.
    attribute: Option<Attribute>,
}

impl ResolvedDefinition {
    /// Returns the identifier of the resolved definition.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns whether the definition is dependency-only.
    #[must_use]
    pub const fn is_dependency_only(&self) -> bool {
        self.dependency_only
    }

    /// Returns the resolved attribute, if one was produced.
    #[must_use]
    pub fn attribute(&self) -> Option<&Attribute> {
        self.attribute.as_ref()
    }
}

/// The one-shot resolved output of a data connector.
#[derive(Debug, Clone)]
pub struct ResolvedConnector {
    /// Identifier of the connector.
    id: String,
    /// The produced attribute map; `None` for a skipped or
    /// swallowed-failure resolution.
    attributes: Option<HashMap<String, Attribute>>,
}

impl ResolvedConnector {
    /// Returns the identifier of the resolved connector.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the resolved attribute map, if one was produced.
    #[must_use]
    pub fn attributes(&self) -> Option<&HashMap<String, Attribute>> {
        self.attributes.as_ref()
    }
}

/// Per-request scratch space mapping plugin id to resolved result.
///
/// A given plugin id is recorded at most once per work context. Absence
/// of an entry means "not yet resolved this request", not "resolution
/// failed"; failures swallowed by policy are recorded as entries with no
/// output.
#[derive(Debug, Default)]
pub struct WorkContext {
    /// Attribute definitions resolved so far.
    resolved_definitions: HashMap<String, ResolvedDefinition>,
    /// Data connectors resolved so far.
    resolved_connectors: HashMap<String, ResolvedConnector>,
}

impl WorkContext {
    /// Creates an empty work context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the attribute definitions resolved so far.
    #[must_use]
    pub fn resolved_definitions(&self) -> &HashMap<String, ResolvedDefinition> {
        &self.resolved_definitions
    }

    /// Returns the data connectors resolved so far.
    #[must_use]
    pub fn resolved_connectors(&self) -> &HashMap<String, ResolvedConnector> {
        &self.resolved_connectors
    }

    /// Returns true once the given definition has a recorded outcome.
    #[must_use]
    pub fn has_definition(&self, id: &str) -> bool {
        self.resolved_definitions.contains_key(id)
    }

    /// Returns true once the given connector has a recorded outcome.
    #[must_use]
    pub fn has_connector(&self, id: &str) -> bool {
        self.resolved_connectors.contains_key(id)
    }

    /// Records the outcome of an attribute definition resolution.
    ///
    /// ## Errors
    ///
    /// Returns [`ResolutionError::AlreadyResolved`] if an outcome for
    /// this definition was already recorded.
    pub fn record_definition(
        &mut self,
        definition: &dyn AttributeDefinition,
        attribute: Option<Attribute>,
    ) -> ResolutionResult<()> {
        let id = definition.id();
        if self.resolved_definitions.contains_key(id) {
            return Err(ResolutionError::AlreadyResolved {
                plugin_id: id.to_string(),
            });
        }
        self.resolved_definitions.insert(
            id.to_string(),
            ResolvedDefinition {
                id: id.to_string(),
                dependency_only: definition.is_dependency_only(),
                attribute,
            },
        );
        Ok(())
    }

    /// Records the outcome of a data connector resolution.
    ///
    /// ## Errors
    ///
    /// Returns [`ResolutionError::AlreadyResolved`] if an outcome for
    /// this connector was already recorded.
    pub fn record_connector(
        &mut self,
        connector: &dyn DataConnector,
        attributes: Option<HashMap<String, Attribute>>,
    ) -> ResolutionResult<()> {
        let id = connector.id();
        if self.resolved_connectors.contains_key(id) {
            return Err(ResolutionError::AlreadyResolved {
                plugin_id: id.to_string(),
            });
        }
        self.resolved_connectors.insert(
            id.to_string(),
            ResolvedConnector {
                id: id.to_string(),
                attributes,
            },
        );
        Ok(())
    }

    /// Records a failover substitution: the failover connector's result
    /// is re-recorded under the failed connector's id so that dependents
    /// can pretend the failed connector worked.
    ///
    /// Any value duplication this introduces is collapsed by the final
    /// de-duplication pass.
    ///
    /// ## Errors
    ///
    /// Returns [`ResolutionError::AlreadyResolved`] if the failed
    /// connector already has an outcome, or
    /// [`ResolutionError::FailoverNotResolved`] if the failover
    /// connector has none.
    pub fn record_failover_substitution(
        &mut self,
        failed: &dyn DataConnector,
        failover_id: &str,
    ) -> ResolutionResult<()> {
        let failed_id = failed.id();
        if self.resolved_connectors.contains_key(failed_id) {
            return Err(ResolutionError::AlreadyResolved {
                plugin_id: failed_id.to_string(),
            });
        }
        let failover = self.resolved_connectors.get(failover_id).ok_or_else(|| {
            ResolutionError::FailoverNotResolved {
                connector_id: failover_id.to_string(),
            }
        })?;
        let substituted = ResolvedConnector {
            id: failed_id.to_string(),
            attributes: failover.attributes.clone(),
        };
        self.resolved_connectors
            .insert(failed_id.to_string(), substituted);
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_plugins {
    //! Minimal plugin doubles shared by the in-crate tests.

    use std::collections::HashMap;

    use idp_attribute::{Attribute, AttributeValue};

    use crate::context::ResolutionContext;
    use crate::error::ResolutionResult;
    use crate::plugin::{
        AttributeDefinition, ConnectorSettings, DataConnector, DefinitionSettings, PluginSettings,
        ResolverPlugin,
    };
    use crate::work_context::WorkContext;

    /// A definition that always returns a fixed set of string values.
    #[derive(Debug)]
    pub struct FixedDefinition {
        pub settings: DefinitionSettings,
        pub values: Vec<AttributeValue>,
    }

    impl FixedDefinition {
        pub fn new(id: &str, values: &[&str]) -> Self {
            Self {
                settings: DefinitionSettings::new(id),
                values: values.iter().map(|v| AttributeValue::string(*v)).collect(),
            }
        }
    }

    impl ResolverPlugin for FixedDefinition {
        fn settings(&self) -> &PluginSettings {
            self.settings.plugin()
        }
    }

    impl AttributeDefinition for FixedDefinition {
        fn definition_settings(&self) -> &DefinitionSettings {
            &self.settings
        }

        fn resolve(
            &self,
            _context: &ResolutionContext,
            _work: &WorkContext,
        ) -> ResolutionResult<Option<Attribute>> {
            let mut attribute = Attribute::new(self.id()).expect("test id");
            attribute.set_values(self.values.iter().cloned());
            Ok(Some(attribute))
        }
    }

    /// A connector that always returns a fixed attribute map.
    #[derive(Debug)]
    pub struct FixedConnector {
        pub settings: ConnectorSettings,
        pub attributes: HashMap<String, Attribute>,
    }

    impl FixedConnector {
        pub fn new(id: &str, attributes: &[(&str, &[&str])]) -> Self {
            let attributes = attributes
                .iter()
                .map(|(attr_id, values)| {
                    let mut attribute = Attribute::new(*attr_id).expect("test id");
                    attribute.set_values(values.iter().map(|v| AttributeValue::string(*v)));
                    ((*attr_id).to_string(), attribute)
                })
                .collect();
            Self {
                settings: ConnectorSettings::new(id),
                attributes,
            }
        }
    }

    impl ResolverPlugin for FixedConnector {
        fn settings(&self) -> &PluginSettings {
            self.settings.plugin()
        }
    }

    impl DataConnector for FixedConnector {
        fn connector_settings(&self) -> &ConnectorSettings {
            &self.settings
        }

        fn resolve(
            &self,
            _context: &ResolutionContext,
            _work: &WorkContext,
        ) -> ResolutionResult<HashMap<String, Attribute>> {
            Ok(self.attributes.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_plugins::{FixedConnector, FixedDefinition};
    use super::*;

    #[test]
    fn double_recording_a_definition_is_an_error() {
        let definition = FixedDefinition::new("ad1", &["v"]);
        let mut work = WorkContext::new();

        work.record_definition(&definition, None).unwrap();
        let result = work.record_definition(&definition, None);
        assert!(matches!(
            result,
            Err(ResolutionError::AlreadyResolved { plugin_id }) if plugin_id == "ad1"
        ));
    }

    #[test]
    fn absent_entry_differs_from_absent_output() {
        let definition = FixedDefinition::new("ad1", &["v"]);
        let mut work = WorkContext::new();

        assert!(!work.has_definition("ad1"));

        work.record_definition(&definition, None).unwrap();
        assert!(work.has_definition("ad1"));
        assert!(work.resolved_definitions()["ad1"].attribute().is_none());
    }

    #[test]
    fn failover_substitution_copies_the_failover_result() {
        let failed = FixedConnector::new("dc1", &[]);
        let failover = FixedConnector::new("dc2", &[("uid", &["jdoe"][..])]);
        let mut work = WorkContext::new();

        let resolved = failover.attributes.clone();
        work.record_connector(&failover, Some(resolved)).unwrap();
        work.record_failover_substitution(&failed, "dc2").unwrap();

        let substituted = &work.resolved_connectors()["dc1"];
        assert!(substituted.attributes().unwrap().contains_key("uid"));
    }

    #[test]
    fn failover_substitution_requires_a_recorded_failover() {
        let failed = FixedConnector::new("dc1", &[]);
        let mut work = WorkContext::new();

        let result = work.record_failover_substitution(&failed, "dc2");
        assert!(matches!(
            result,
            Err(ResolutionError::FailoverNotResolved { connector_id }) if connector_id == "dc2"
        ));
    }
}
