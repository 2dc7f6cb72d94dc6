//! Fixed-data connector.

use std::collections::HashMap;

use idp_attribute::Attribute;
use idp_resolver_spi::{
    ConnectorSettings, DataConnector, PluginSettings, ResolutionContext, ResolutionResult,
    ResolverPlugin, WorkContext,
};

/// A data connector that returns a fixed set of attributes.
///
/// Useful for attributes every principal shares and as a failover
/// target for connectors backed by fallible stores.
#[derive(Debug)]
pub struct StaticDataConnector {
    settings: ConnectorSettings,
    attributes: HashMap<String, Attribute>,
}

impl StaticDataConnector {
    /// Creates a static connector returning the given attributes.
    #[must_use]
    pub fn new(settings: ConnectorSettings, attributes: Vec<Attribute>) -> Self {
        let attributes = attributes
            .into_iter()
            .map(|a| (a.id().to_string(), a))
            .collect();
        Self {
            settings,
            attributes,
        }
    }
}

impl ResolverPlugin for StaticDataConnector {
    fn settings(&self) -> &PluginSettings {
        self.settings.plugin()
    }
}

impl DataConnector for StaticDataConnector {
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

#[cfg(test)]
mod tests {
    use idp_attribute::AttributeValue;

    use super::*;

    #[test]
    fn returns_configured_attributes() {
        let mut attribute = Attribute::new("entitlement").unwrap();
        attribute.set_values(vec![AttributeValue::string("urn:example:all")]);
        let connector =
            StaticDataConnector::new(ConnectorSettings::new("dc1"), vec![attribute]);

        let resolved = connector
            .resolve(&ResolutionContext::new(), &WorkContext::new())
            .unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(
            resolved["entitlement"].values(),
            &[AttributeValue::string("urn:example:all")]
        );
    }
}
