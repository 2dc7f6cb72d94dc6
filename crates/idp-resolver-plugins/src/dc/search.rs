//! Search-backed data connector.

use std::collections::HashMap;
use std::fmt::Debug;

use idp_attribute::Attribute;
use idp_resolver_spi::{
    ConnectorSettings, DataConnector, PluginSettings, ResolutionContext, ResolutionError,
    ResolutionResult, ResolverPlugin, WorkContext,
};
use tracing::debug;

/// Executes a search against a backing store and returns the matching
/// records as rows of attributes keyed by attribute id.
///
/// Implementations wrap whatever store the deployment uses. Errors are
/// reported as plugin errors so the engine can apply failover and the
/// error propagation policy.
pub trait SearchExecutor: Send + Sync + Debug {
    /// Runs the search for the given request context.
    fn execute(
        &self,
        context: &ResolutionContext,
        work: &WorkContext,
    ) -> ResolutionResult<Vec<HashMap<String, Attribute>>>;
}

/// A data connector that resolves attributes through a [`SearchExecutor`].
///
/// By default an empty result set resolves to no attributes and
/// multiple records are merged. Both shapes can instead be treated as
/// errors, which surface as [`ResolutionError::NoResults`] and
/// [`ResolutionError::MultipleResults`]. Result-shape errors never
/// suspend the connector.
#[derive(Debug)]
pub struct SearchDataConnector {
    settings: ConnectorSettings,
    executor: Box<dyn SearchExecutor>,
    no_result_is_error: bool,
    multiple_results_is_error: bool,
}

impl SearchDataConnector {
    /// Creates a search connector around the given executor.
    #[must_use]
    pub fn new(settings: ConnectorSettings, executor: Box<dyn SearchExecutor>) -> Self {
        Self {
            settings,
            executor,
            no_result_is_error: false,
            multiple_results_is_error: false,
        }
    }

    /// Treats an empty result set as a resolution error.
    #[must_use]
    pub fn no_result_is_error(mut self, enabled: bool) -> Self {
        self.no_result_is_error = enabled;
        self
    }

    /// Treats more than one record as a resolution error.
    #[must_use]
    pub fn multiple_results_is_error(mut self, enabled: bool) -> Self {
        self.multiple_results_is_error = enabled;
        self
    }

    /// Merges record rows into a single attribute map, concatenating
    /// values of attributes that appear in several rows.
    fn merge(rows: Vec<HashMap<String, Attribute>>) -> HashMap<String, Attribute> {
        let mut merged: HashMap<String, Attribute> = HashMap::new();
        for row in rows {
            for (id, attribute) in row {
                match merged.get_mut(&id) {
                    Some(existing) => {
                        let mut values = existing.values().to_vec();
                        values.extend(attribute.values().iter().cloned());
                        existing.set_values(values);
                    }
                    None => {
                        merged.insert(id, attribute);
                    }
                }
            }
        }
        merged
    }
}

impl ResolverPlugin for SearchDataConnector {
    fn settings(&self) -> &PluginSettings {
        self.settings.plugin()
    }
}

impl DataConnector for SearchDataConnector {
    fn connector_settings(&self) -> &ConnectorSettings {
        &self.settings
    }

    fn resolve(
        &self,
        context: &ResolutionContext,
        work: &WorkContext,
    ) -> ResolutionResult<HashMap<String, Attribute>> {
        let rows = self.executor.execute(context, work)?;

        if rows.is_empty() {
            if self.no_result_is_error {
                return Err(ResolutionError::NoResults {
                    connector_id: self.id().to_string(),
                });
            }
            debug!(connector_id = self.id(), "search returned no records");
            return Ok(HashMap::new());
        }
        if rows.len() > 1 && self.multiple_results_is_error {
            return Err(ResolutionError::MultipleResults {
                connector_id: self.id().to_string(),
                count: rows.len(),
            });
        }

        Ok(Self::merge(rows))
    }
}
