//! Initialization-time validation of the plugin graph.
//!
//! Failure here is fatal: the resolver constructor refuses to produce a
//! partially usable instance.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use idp_resolver_spi::{
    AttributeDefinition, DataConnector, InitializationError, PluginDependency,
};
use tracing::warn;

/// Which namespace a graph node lives in.
///
/// An identifier may exist in both namespaces (tolerated with a
/// warning); attribute definitions take precedence when a dependency
/// reference is resolved, matching the engine's lookup order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Node {
    Definition(String),
    Connector(String),
}

pub(crate) struct GraphValidator<'a> {
    definitions: &'a HashMap<String, Arc<dyn AttributeDefinition>>,
    connectors: &'a HashMap<String, Arc<dyn DataConnector>>,
}

impl<'a> GraphValidator<'a> {
    pub(crate) fn new(
        definitions: &'a HashMap<String, Arc<dyn AttributeDefinition>>,
        connectors: &'a HashMap<String, Arc<dyn DataConnector>>,
    ) -> Self {
        Self {
            definitions,
            connectors,
        }
    }

    /// Runs every initialization-time check, stopping at the first
    /// violation.
    pub(crate) fn validate(&self) -> Result<(), InitializationError> {
        self.warn_on_namespace_overlap();
        self.check_references()?;
        self.check_failovers()?;
        self.check_cycles()
    }

    /// An id in both namespaces is ambiguous but tolerated; references
    /// resolve to the attribute definition.
    fn warn_on_namespace_overlap(&self) {
        for id in self.definitions.keys() {
            if self.connectors.contains_key(id) {
                warn!(
                    plugin_id = %id,
                    "id names both an attribute definition and a data connector; \
                     dependency references will resolve to the attribute definition"
                );
            }
        }
    }

    /// Every dependency must reference a configured plugin. A connector
    /// dependency's source attribute shadowing a top-level plugin id is
    /// only warned about; the connector's own attribute binding wins.
    fn check_references(&self) -> Result<(), InitializationError> {
        for (id, dependencies) in self.all_plugins() {
            for dependency in dependencies {
                if !self.exists(&dependency.plugin_id) {
                    return Err(InitializationError::MissingDependency {
                        plugin_id: id.to_string(),
                        dependency_id: dependency.plugin_id.clone(),
                    });
                }

                if self.connectors.contains_key(&dependency.plugin_id)
                    && !self.definitions.contains_key(&dependency.plugin_id)
                {
                    if let Some(source) = dependency.source_attribute_id.as_deref() {
                        if self.exists(source) {
                            warn!(
                                plugin_id = %id,
                                connector_id = %dependency.plugin_id,
                                source_attribute_id = source,
                                "source attribute of a connector dependency shadows a \
                                 top-level plugin id; the connector's attribute is used"
                            );
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Failover references must exist and failover chains must not loop,
    /// or a failing connector could recurse forever at resolution time.
    fn check_failovers(&self) -> Result<(), InitializationError> {
        for (id, connector) in self.connectors {
            let mut visited = HashSet::new();
            visited.insert(id.as_str());

            let mut current = connector.failover_connector_id();
            while let Some(failover_id) = current {
                let Some(next) = self.connectors.get(failover_id) else {
                    return Err(InitializationError::MissingFailover {
                        connector_id: id.clone(),
                        failover_id: failover_id.to_string(),
                    });
                };
                if !visited.insert(failover_id) {
                    return Err(InitializationError::CircularDependency {
                        plugin_id: failover_id.to_string(),
                    });
                }
                current = next.failover_connector_id();
            }
        }
        Ok(())
    }

    /// Depth-first cycle check over the dependency graph.
    fn check_cycles(&self) -> Result<(), InitializationError> {
        let mut done: HashSet<Node> = HashSet::new();
        let mut on_stack: HashSet<Node> = HashSet::new();

        for id in self.definitions.keys() {
            self.visit(Node::Definition(id.clone()), &mut done, &mut on_stack)?;
        }
        for id in self.connectors.keys() {
            self.visit(Node::Connector(id.clone()), &mut done, &mut on_stack)?;
        }
        Ok(())
    }

    fn visit(
        &self,
        node: Node,
        done: &mut HashSet<Node>,
        on_stack: &mut HashSet<Node>,
    ) -> Result<(), InitializationError> {
        if done.contains(&node) {
            return Ok(());
        }
        if !on_stack.insert(node.clone()) {
            let plugin_id = match &node {
                Node::Definition(id) | Node::Connector(id) => id.clone(),
            };
            return Err(InitializationError::CircularDependency { plugin_id });
        }

        let dependencies = match &node {
            Node::Definition(id) => self.definitions[id].dependencies(),
            Node::Connector(id) => self.connectors[id].dependencies(),
        };
        for dependency in dependencies {
            // Reference validity was checked beforehand.
            let target = if self.definitions.contains_key(&dependency.plugin_id) {
                Node::Definition(dependency.plugin_id.clone())
            } else {
                Node::Connector(dependency.plugin_id.clone())
            };
            self.visit(target, done, on_stack)?;
        }

        on_stack.remove(&node);
        done.insert(node);
        Ok(())
    }

    fn exists(&self, id: &str) -> bool {
        self.definitions.contains_key(id) || self.connectors.contains_key(id)
    }

    fn all_plugins(&self) -> impl Iterator<Item = (&str, &[PluginDependency])> {
        let definitions = self
            .definitions
            .iter()
            .map(|(id, plugin)| (id.as_str(), plugin.dependencies()));
        let connectors = self
            .connectors
            .iter()
            .map(|(id, plugin)| (id.as_str(), plugin.dependencies()));
        definitions.chain(connectors)
    }
}
