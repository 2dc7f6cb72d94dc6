//! Statically scoped attribute definition.

use idp_attribute::{Attribute, AttributeValue};
use idp_resolver_spi::{
    support, AttributeDefinition, DefinitionSettings, InitializationError, PluginSettings,
    ResolutionContext, ResolutionError, ResolutionResult, ResolverPlugin, WorkContext,
};
use tracing::debug;

use crate::output_attribute;

/// An attribute definition that produces scoped values by applying a
/// static scope to each string value of its dependencies.
#[derive(Debug)]
pub struct ScopedAttributeDefinition {
    settings: DefinitionSettings,
    scope: String,
}

impl ScopedAttributeDefinition {
    /// Creates a scoped definition.
    ///
    /// ## Errors
    ///
    /// Returns an [`InitializationError`] if the scope is blank or no
    /// dependencies were configured.
    pub fn new(
        settings: DefinitionSettings,
        scope: impl Into<String>,
    ) -> Result<Self, InitializationError> {
        let scope = scope.into().trim().to_string();
        if scope.is_empty() {
            return Err(InitializationError::invalid(format!(
                "attribute definition '{}': no scope was configured",
                settings.plugin().id()
            )));
        }
        if settings.plugin().dependencies().is_empty() {
            return Err(InitializationError::invalid(format!(
                "attribute definition '{}': no dependencies were configured",
                settings.plugin().id()
            )));
        }
        Ok(Self { settings, scope })
    }

    /// Returns the scope applied to each value.
    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }
}

impl ResolverPlugin for ScopedAttributeDefinition {
    fn settings(&self) -> &PluginSettings {
        self.settings.plugin()
    }
}

impl AttributeDefinition for ScopedAttributeDefinition {
    fn definition_settings(&self) -> &DefinitionSettings {
        &self.settings
    }

    fn resolve(
        &self,
        _context: &ResolutionContext,
        work: &WorkContext,
    ) -> ResolutionResult<Option<Attribute>> {
        let dependency_values =
            support::merged_attribute_values(work, self.dependencies(), self.id())?;

        let mut values = Vec::with_capacity(dependency_values.len());
        for value in dependency_values {
            match value {
                AttributeValue::Empty(kind) => {
                    debug!(plugin_id = self.id(), "ignored {}", kind.display_value());
                }
                AttributeValue::String(s) => {
                    values.push(AttributeValue::scoped(s, self.scope.as_str()));
                }
                other => {
                    return Err(ResolutionError::UnsupportedValueType {
                        plugin_id: self.id().to_string(),
                        expected: "string",
                        actual: other.type_name(),
                    })
                }
            }
        }

        let mut attribute = output_attribute(self.id())?;
        attribute.set_values(values);
        Ok(Some(attribute))
    }
}

#[cfg(test)]
mod tests {
    use idp_attribute::EmptyKind;
    use idp_resolver_spi::PluginDependency;

    use super::*;
    use crate::SimpleAttributeDefinition;

    fn work_with_source(values: Vec<AttributeValue>) -> WorkContext {
        let source = SimpleAttributeDefinition::new(DefinitionSettings::new("src"));
        let mut attribute = Attribute::new("src").unwrap();
        attribute.set_values(values);

        let mut work = WorkContext::new();
        work.record_definition(&source, Some(attribute)).unwrap();
        work
    }

    fn scoped(scope: &str) -> ScopedAttributeDefinition {
        ScopedAttributeDefinition::new(
            DefinitionSettings::from_plugin(
                PluginSettings::new("ad1")
                    .with_dependency(PluginDependency::on_definition("src")),
            ),
            scope,
        )
        .unwrap()
    }

    #[test]
    fn applies_static_scope_to_string_values() {
        let work = work_with_source(vec![AttributeValue::string("jdoe")]);
        let resolved = scoped("example.org")
            .resolve(&ResolutionContext::new(), &work)
            .unwrap()
            .unwrap();

        assert_eq!(
            resolved.values(),
            &[AttributeValue::scoped("jdoe", "example.org")]
        );
    }

    #[test]
    fn empty_marker_values_are_silently_skipped() {
        let work = work_with_source(vec![
            AttributeValue::Empty(EmptyKind::Null),
            AttributeValue::string("jdoe"),
        ]);
        let resolved = scoped("example.org")
            .resolve(&ResolutionContext::new(), &work)
            .unwrap()
            .unwrap();

        assert_eq!(resolved.values().len(), 1);
    }

    #[test]
    fn non_string_values_are_a_value_shape_error() {
        let work = work_with_source(vec![AttributeValue::Bytes(vec![1, 2, 3])]);
        let result = scoped("example.org").resolve(&ResolutionContext::new(), &work);

        assert!(matches!(
            result,
            Err(ResolutionError::UnsupportedValueType { actual: "bytes", .. })
        ));
    }

    #[test]
    fn blank_scope_fails_construction() {
        let result = ScopedAttributeDefinition::new(
            DefinitionSettings::from_plugin(
                PluginSettings::new("ad1")
                    .with_dependency(PluginDependency::on_definition("src")),
            ),
            "  ",
        );
        assert!(result.is_err());
    }

    #[test]
    fn missing_dependencies_fail_construction() {
        let result =
            ScopedAttributeDefinition::new(DefinitionSettings::new("ad1"), "example.org");
        assert!(result.is_err());
    }
}
