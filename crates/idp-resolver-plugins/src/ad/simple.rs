//! Passthrough attribute definition.

use idp_attribute::Attribute;
use idp_resolver_spi::{
    support, AttributeDefinition, DefinitionSettings, PluginSettings, ResolutionContext,
    ResolutionResult, ResolverPlugin, WorkContext,
};

use crate::output_attribute;

/// An attribute definition that simply collects the values of its
/// dependencies under its own id.
#[derive(Debug)]
pub struct SimpleAttributeDefinition {
    settings: DefinitionSettings,
}

impl SimpleAttributeDefinition {
    /// Creates a passthrough definition with the given settings.
    #[must_use]
    pub fn new(settings: DefinitionSettings) -> Self {
        Self { settings }
    }
}

impl ResolverPlugin for SimpleAttributeDefinition {
    fn settings(&self) -> &PluginSettings {
        self.settings.plugin()
    }
}

impl AttributeDefinition for SimpleAttributeDefinition {
    fn definition_settings(&self) -> &DefinitionSettings {
        &self.settings
    }

    fn resolve(
        &self,
        _context: &ResolutionContext,
        work: &WorkContext,
    ) -> ResolutionResult<Option<Attribute>> {
        let values = support::merged_attribute_values(work, self.dependencies(), self.id())?;

        let mut attribute = output_attribute(self.id())?;
        attribute.set_values(values);
        Ok(Some(attribute))
    }
}

#[cfg(test)]
mod tests {
    use idp_attribute::AttributeValue;
    use idp_resolver_spi::PluginDependency;

    use super::*;

    #[test]
    fn collects_dependency_values_under_own_id() {
        let source = SimpleAttributeDefinition::new(DefinitionSettings::new("src"));
        let mut source_attribute = Attribute::new("src").unwrap();
        source_attribute.set_values([AttributeValue::string("v1"), AttributeValue::string("v2")]);

        let mut work = WorkContext::new();
        work.record_definition(&source, Some(source_attribute)).unwrap();

        let definition = SimpleAttributeDefinition::new(DefinitionSettings::from_plugin(
            PluginSettings::new("ad1").with_dependency(PluginDependency::on_definition("src")),
        ));

        let resolved = definition
            .resolve(&ResolutionContext::new(), &work)
            .unwrap()
            .unwrap();
        assert_eq!(resolved.id(), "ad1");
        assert_eq!(resolved.values().len(), 2);
    }
}
