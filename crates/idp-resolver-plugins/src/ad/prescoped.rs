//! Delimiter-splitting scoped attribute definition.

use idp_attribute::{Attribute, AttributeValue};
use idp_resolver_spi::{
    support, AttributeDefinition, DefinitionSettings, InitializationError, PluginSettings,
    ResolutionContext, ResolutionError, ResolutionResult, ResolverPlugin, WorkContext,
};
use tracing::debug;

use crate::output_attribute;

/// Default delimiter between value and scope.
const DEFAULT_DELIMITER: &str = "@";

/// An attribute definition that produces scoped values by splitting each
/// dependency value at a delimiter: the part before the delimiter
/// becomes the value, the part after becomes the scope.
#[derive(Debug)]
pub struct PrescopedAttributeDefinition {
    settings: DefinitionSettings,
    scope_delimiter: String,
}

impl PrescopedAttributeDefinition {
    /// Creates a prescoped definition with the `@` delimiter.
    ///
    /// ## Errors
    ///
    /// Returns an [`InitializationError`] if no dependencies were
    /// configured.
    pub fn new(settings: DefinitionSettings) -> Result<Self, InitializationError> {
        Self::with_delimiter(settings, DEFAULT_DELIMITER)
    }

    /// Creates a prescoped definition with a custom delimiter.
    ///
    /// ## Errors
    ///
    /// Returns an [`InitializationError`] if the delimiter is blank or
    /// no dependencies were configured.
    pub fn with_delimiter(
        settings: DefinitionSettings,
        delimiter: impl Into<String>,
    ) -> Result<Self, InitializationError> {
        let scope_delimiter = delimiter.into();
        if scope_delimiter.trim().is_empty() {
            return Err(InitializationError::invalid(format!(
                "attribute definition '{}': scope delimiter may not be blank",
                settings.plugin().id()
            )));
        }
        if settings.plugin().dependencies().is_empty() {
            return Err(InitializationError::invalid(format!(
                "attribute definition '{}': no dependencies were configured",
                settings.plugin().id()
            )));
        }
        Ok(Self {
            settings,
            scope_delimiter,
        })
    }

    /// Returns the delimiter between value and scope.
    #[must_use]
    pub fn scope_delimiter(&self) -> &str {
        &self.scope_delimiter
    }

    /// Splits a delimited value into a scoped value.
    fn split(&self, input: &str) -> ResolutionResult<AttributeValue> {
        match input.split_once(&self.scope_delimiter) {
            Some((value, scope)) if !scope.is_empty() => {
                Ok(AttributeValue::scoped(value, scope))
            }
            _ => Err(ResolutionError::plugin(
                self.id(),
                format!(
                    "input value '{input}' does not contain delimiter '{}' and can not be split",
                    self.scope_delimiter
                ),
            )),
        }
    }
}

impl ResolverPlugin for PrescopedAttributeDefinition {
    fn settings(&self) -> &PluginSettings {
        self.settings.plugin()
    }
}

impl AttributeDefinition for PrescopedAttributeDefinition {
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
                AttributeValue::String(s) => values.push(self.split(&s)?),
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
