//! Template-driven attribute definition.

use idp_attribute::{Attribute, AttributeValue};
use idp_resolver_spi::{
    support, AttributeDefinition, DefinitionSettings, InitializationError, PluginSettings,
    ResolutionContext, ResolutionError, ResolutionResult, ResolverPlugin, WorkContext,
};
use regex::Regex;
use tracing::debug;

use crate::output_attribute;

/// Placeholder syntax inside templates: `${attributeId}`.
const PLACEHOLDER_PATTERN: &str = r"\$\{([^}]+)\}";

/// An attribute definition that builds each output value by filling a
/// text template with dependency values.
///
/// The template references dependency attributes as `${attributeId}`.
/// Values are combined row-wise: the first output value uses the first
/// value of every referenced attribute, the second the second values,
/// and so on. All referenced attributes must carry the same number of
/// values.
#[derive(Debug)]
pub struct TemplateAttributeDefinition {
    settings: DefinitionSettings,
    template: String,
    placeholder: Regex,
    referenced_ids: Vec<String>,
}

impl TemplateAttributeDefinition {
    /// Creates a template definition.
    ///
    /// ## Errors
    ///
    /// Returns an [`InitializationError`] if the template is blank,
    /// references no attributes, or no dependencies were configured.
    pub fn new(
        settings: DefinitionSettings,
        template: impl Into<String>,
    ) -> Result<Self, InitializationError> {
        let plugin_id = settings.plugin().id();
        let template = template.into();
        if template.trim().is_empty() {
            return Err(InitializationError::invalid(format!(
                "attribute definition '{plugin_id}': template may not be blank"
            )));
        }
        if settings.plugin().dependencies().is_empty() {
            return Err(InitializationError::invalid(format!(
                "attribute definition '{plugin_id}': no dependencies were configured"
            )));
        }

        // The pattern is a constant, compilation can not fail.
        let placeholder = Regex::new(PLACEHOLDER_PATTERN)
            .map_err(|e| InitializationError::invalid(e.to_string()))?;
        let mut referenced_ids: Vec<String> = Vec::new();
        for captures in placeholder.captures_iter(&template) {
            let id = captures[1].to_string();
            if !referenced_ids.contains(&id) {
                referenced_ids.push(id);
            }
        }
        if referenced_ids.is_empty() {
            return Err(InitializationError::invalid(format!(
                "attribute definition '{plugin_id}': template references no attributes"
            )));
        }

        Ok(Self {
            settings,
            template,
            placeholder,
            referenced_ids,
        })
    }

    /// Returns the template text.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Extracts the string at `row` from the values of one referenced
    /// attribute.
    fn row_value<'a>(
        &self,
        id: &str,
        values: &'a [AttributeValue],
        row: usize,
    ) -> ResolutionResult<&'a str> {
        match &values[row] {
            AttributeValue::String(s) => Ok(s),
            AttributeValue::Empty(_) => Ok(""),
            other => Err(ResolutionError::UnsupportedValueType {
                plugin_id: format!("{} (attribute '{id}')", self.id()),
                expected: "string",
                actual: other.type_name(),
            }),
        }
    }
}

impl ResolverPlugin for TemplateAttributeDefinition {
    fn settings(&self) -> &PluginSettings {
        self.settings.plugin()
    }
}

impl AttributeDefinition for TemplateAttributeDefinition {
    fn definition_settings(&self) -> &DefinitionSettings {
        &self.settings
    }

    fn resolve(
        &self,
        _context: &ResolutionContext,
        work: &WorkContext,
    ) -> ResolutionResult<Option<Attribute>> {
        let available = support::all_attribute_values(work, self.dependencies());

        let mut row_count: Option<usize> = None;
        for id in &self.referenced_ids {
            let count = available.get(id).map_or(0, Vec::len);
            match row_count {
                None => row_count = Some(count),
                Some(expected) if expected != count => {
                    return Err(ResolutionError::plugin(
                        self.id(),
                        format!(
                            "referenced attributes carry differing value counts \
                             ('{id}' has {count}, expected {expected})"
                        ),
                    ));
                }
                Some(_) => {}
            }
        }

        let rows = row_count.unwrap_or(0);
        if rows == 0 {
            debug!(plugin_id = self.id(), "no dependency values, emitting empty attribute");
        }

        let mut values = Vec::with_capacity(rows);
        for row in 0..rows {
            // A single pass over the template text; substituted values
            // are never re-scanned for placeholder syntax.
            let mut failure: Option<ResolutionError> = None;
            let rendered = self
                .placeholder
                .replace_all(&self.template, |captures: &regex::Captures<'_>| {
                    let id = &captures[1];
                    let replacement = available
                        .get(id)
                        .ok_or_else(|| {
                            ResolutionError::plugin(
                                self.id(),
                                format!("referenced attribute '{id}' was not resolved"),
                            )
                        })
                        .and_then(|attribute_values| self.row_value(id, attribute_values, row));
                    match replacement {
                        Ok(replacement) => replacement.to_string(),
                        Err(error) => {
                            failure.get_or_insert(error);
                            String::new()
                        }
                    }
                })
                .into_owned();
            if let Some(error) = failure {
                return Err(error);
            }
            values.push(AttributeValue::string(rendered));
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

    fn record(work: &mut WorkContext, id: &str, values: Vec<AttributeValue>) {
        let source = SimpleAttributeDefinition::new(DefinitionSettings::new(id));
        let mut attribute = Attribute::new(id).unwrap();
        attribute.set_values(values);
        work.record_definition(&source, Some(attribute)).unwrap();
    }

    fn definition(template: &str) -> TemplateAttributeDefinition {
        TemplateAttributeDefinition::new(
            DefinitionSettings::from_plugin(
                PluginSettings::new("ad1")
                    .with_dependency(PluginDependency::on_definition("uid"))
                    .with_dependency(PluginDependency::on_definition("domain")),
            ),
            template,
        )
        .unwrap()
    }

    #[test]
    fn fills_template_row_wise() {
        let mut work = WorkContext::new();
        record(
            &mut work,
            "uid",
            vec![AttributeValue::string("jdoe"), AttributeValue::string("asmith")],
        );
        record(
            &mut work,
            "domain",
            vec![
                AttributeValue::string("example.org"),
                AttributeValue::string("example.net"),
            ],
        );

        let resolved = definition("${uid}@${domain}")
            .resolve(&ResolutionContext::new(), &work)
            .unwrap()
            .unwrap();
        assert_eq!(
            resolved.values(),
            &[
                AttributeValue::string("jdoe@example.org"),
                AttributeValue::string("asmith@example.net"),
            ]
        );
    }

    #[test]
    fn mismatched_value_counts_are_a_resolution_error() {
        let mut work = WorkContext::new();
        record(&mut work, "uid", vec![AttributeValue::string("jdoe")]);
        record(
            &mut work,
            "domain",
            vec![
                AttributeValue::string("example.org"),
                AttributeValue::string("example.net"),
            ],
        );

        assert!(definition("${uid}@${domain}")
            .resolve(&ResolutionContext::new(), &work)
            .is_err());
    }

    #[test]
    fn no_dependency_values_yields_empty_attribute() {
        let mut work = WorkContext::new();
        record(&mut work, "uid", Vec::new());
        record(&mut work, "domain", Vec::new());

        let resolved = definition("${uid}@${domain}")
            .resolve(&ResolutionContext::new(), &work)
            .unwrap()
            .unwrap();
        assert!(resolved.values().is_empty());
    }

    #[test]
    fn placeholder_syntax_inside_values_stays_literal() {
        let mut work = WorkContext::new();
        record(&mut work, "uid", vec![AttributeValue::string("${domain}")]);
        record(
            &mut work,
            "domain",
            vec![AttributeValue::string("example.org")],
        );

        let resolved = definition("${uid}@${domain}")
            .resolve(&ResolutionContext::new(), &work)
            .unwrap()
            .unwrap();
        assert_eq!(
            resolved.values(),
            &[AttributeValue::string("${domain}@example.org")]
        );
    }

    #[test]
    fn template_without_references_is_rejected() {
        let settings = DefinitionSettings::from_plugin(
            PluginSettings::new("ad1").with_dependency(PluginDependency::on_definition("uid")),
        );
        assert!(TemplateAttributeDefinition::new(settings, "static-text").is_err());
    }
}
