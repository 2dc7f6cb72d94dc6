//! Regex-extracting attribute definition.

use idp_attribute::{Attribute, AttributeValue};
use idp_resolver_spi::{
    support, AttributeDefinition, DefinitionSettings, InitializationError, PluginSettings,
    ResolutionContext, ResolutionError, ResolutionResult, ResolverPlugin, WorkContext,
};
use regex::Regex;
use tracing::debug;

use crate::output_attribute;

/// An attribute definition that extracts the first capture group of a
/// regular expression from each dependency value.
///
/// Values the expression does not match are dropped.
#[derive(Debug)]
pub struct RegexSplitAttributeDefinition {
    settings: DefinitionSettings,
    regex: Regex,
}

impl RegexSplitAttributeDefinition {
    /// Creates a regex split definition.
    ///
    /// ## Errors
    ///
    /// Returns an [`InitializationError`] if the pattern does not
    /// compile, contains no capture group, or no dependencies were
    /// configured.
    pub fn new(
        settings: DefinitionSettings,
        pattern: &str,
    ) -> Result<Self, InitializationError> {
        let plugin_id = settings.plugin().id();
        let regex = Regex::new(pattern).map_err(|e| {
            InitializationError::invalid(format!(
                "attribute definition '{plugin_id}': invalid pattern '{pattern}': {e}"
            ))
        })?;
        if regex.captures_len() < 2 {
            return Err(InitializationError::invalid(format!(
                "attribute definition '{plugin_id}': pattern '{pattern}' has no capture group"
            )));
        }
        if settings.plugin().dependencies().is_empty() {
            return Err(InitializationError::invalid(format!(
                "attribute definition '{plugin_id}': no dependencies were configured"
            )));
        }
        Ok(Self { settings, regex })
    }

    /// Returns the configured expression.
    #[must_use]
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }
}

impl ResolverPlugin for RegexSplitAttributeDefinition {
    fn settings(&self) -> &PluginSettings {
        self.settings.plugin()
    }
}

impl AttributeDefinition for RegexSplitAttributeDefinition {
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

        let mut values = Vec::new();
        for value in dependency_values {
            match value {
                AttributeValue::Empty(kind) => {
                    debug!(plugin_id = self.id(), "ignored {}", kind.display_value());
                }
                AttributeValue::String(s) => {
                    match self.regex.captures(&s).and_then(|c| c.get(1)) {
                        Some(group) => values.push(AttributeValue::string(group.as_str())),
                        None => {
                            debug!(
                                plugin_id = self.id(),
                                input = s.as_str(),
                                "value did not match, dropping"
                            );
                        }
                    }
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

    fn definition(pattern: &str) -> RegexSplitAttributeDefinition {
        RegexSplitAttributeDefinition::new(
            DefinitionSettings::from_plugin(
                PluginSettings::new("ad1")
                    .with_dependency(PluginDependency::on_definition("src")),
            ),
            pattern,
        )
        .unwrap()
    }

    #[test]
    fn extracts_first_capture_group() {
        let work = work_with_source(vec![AttributeValue::string("uid=jdoe,ou=people")]);
        let resolved = definition("uid=([^,]+)")
            .resolve(&ResolutionContext::new(), &work)
            .unwrap()
            .unwrap();
        assert_eq!(resolved.values(), &[AttributeValue::string("jdoe")]);
    }

    #[test]
    fn non_matching_value_is_dropped() {
        let work = work_with_source(vec![
            AttributeValue::string("uid=jdoe"),
            AttributeValue::string("cn=jdoe"),
        ]);
        let resolved = definition("uid=([^,]+)")
            .resolve(&ResolutionContext::new(), &work)
            .unwrap()
            .unwrap();
        assert_eq!(resolved.values(), &[AttributeValue::string("jdoe")]);
    }

    #[test]
    fn pattern_without_capture_group_is_rejected() {
        let settings = DefinitionSettings::from_plugin(
            PluginSettings::new("ad1").with_dependency(PluginDependency::on_definition("src")),
        );
        assert!(RegexSplitAttributeDefinition::new(settings, "uid=[^,]+").is_err());
    }
}
