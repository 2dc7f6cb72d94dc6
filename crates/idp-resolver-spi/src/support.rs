//! Dependency-support helpers.
//!
//! These functions merge the values produced by a plugin's declared
//! dependencies, reading only from the work context. They never trigger
//! resolution themselves; the engine resolves every dependency before
//! invoking the dependent plugin.

use std::collections::HashMap;

use idp_attribute::{Attribute, AttributeValue};
use tracing::warn;

use crate::dependency::PluginDependency;
use crate::error::{ResolutionError, ResolutionResult};
use crate::work_context::WorkContext;

/// Gets the values, as a single list, from all dependencies.
///
/// Used by attribute definitions that process a single logical input.
/// Definition dependencies contribute the definition's own output; if a
/// `source_attribute_id` was also set it is ignored with a warning (the
/// definition output wins). Connector dependencies must name a source
/// attribute and contribute that named attribute from the connector's
/// result map.
///
/// Dependencies with no recorded outcome, or with a recorded outcome and
/// no output, contribute nothing.
///
/// ## Errors
///
/// Returns [`ResolutionError::MissingSourceAttribute`] for a connector
/// dependency without a `source_attribute_id`.
pub fn merged_attribute_values(
    work: &WorkContext,
    dependencies: &[PluginDependency],
    for_plugin: &str,
) -> ResolutionResult<Vec<AttributeValue>> {
    let mut values = Vec::new();

    for dependency in dependencies {
        if let Some(definition) = work.resolved_definitions().get(&dependency.plugin_id) {
            if let Some(source) = dependency.source_attribute_id.as_deref() {
                if source != dependency.plugin_id {
                    warn!(
                        plugin_id = for_plugin,
                        dependency_id = %dependency.plugin_id,
                        source_attribute_id = source,
                        "dependency names a source attribute but points at an attribute \
                         definition; the definition output is used and the source attribute \
                         is ignored"
                    );
                }
            }
            add_attribute_values(definition.attribute(), &mut values);
            continue;
        }

        if let Some(connector) = work.resolved_connectors().get(&dependency.plugin_id) {
            let source = dependency.source_attribute_id.as_deref().ok_or_else(|| {
                ResolutionError::MissingSourceAttribute {
                    plugin_id: for_plugin.to_string(),
                    connector_id: dependency.plugin_id.clone(),
                }
            })?;
            if let Some(attributes) = connector.attributes() {
                add_attribute_values(attributes.get(source), &mut values);
            }
        }
    }

    Ok(values)
}

/// Gets the values from all dependencies, keyed by attribute id.
///
/// Attributes with the same id produced by different plugins have their
/// values merged into a single list. Used by definitions that take
/// multiple named inputs (templates in particular).
#[must_use]
pub fn all_attribute_values(
    work: &WorkContext,
    dependencies: &[PluginDependency],
) -> HashMap<String, Vec<AttributeValue>> {
    let mut result: HashMap<String, Vec<AttributeValue>> = HashMap::new();

    for dependency in dependencies {
        if let Some(definition) = work.resolved_definitions().get(&dependency.plugin_id) {
            if let Some(attribute) = definition.attribute() {
                result
                    .entry(attribute.id().to_string())
                    .or_default()
                    .extend(attribute.values().iter().cloned());
            }
            continue;
        }

        if let Some(connector) = work.resolved_connectors().get(&dependency.plugin_id) {
            if let Some(attributes) = connector.attributes() {
                for attribute in attributes.values() {
                    result
                        .entry(attribute.id().to_string())
                        .or_default()
                        .extend(attribute.values().iter().cloned());
                }
            }
        }
    }

    result
}

/// Appends the values of the given attribute, if it exists.
fn add_attribute_values(source: Option<&Attribute>, target: &mut Vec<AttributeValue>) {
    if let Some(attribute) = source {
        target.extend(attribute.values().iter().cloned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::work_context::test_plugins::{FixedConnector, FixedDefinition};

    fn work_with_fixtures() -> WorkContext {
        let mut work = WorkContext::new();

        let definition = FixedDefinition::new("ad0", &["defValue1", "defValue2"]);
        let mut attribute = Attribute::new("ad0").unwrap();
        attribute.set_values([
            AttributeValue::string("defValue1"),
            AttributeValue::string("defValue2"),
        ]);
        work.record_definition(&definition, Some(attribute)).unwrap();

        let connector = FixedConnector::new(
            "dc0",
            &[
                ("SubAttribute", &["SubValue1"][..]),
                ("Other", &["OtherValue"][..]),
            ],
        );
        let resolved = connector.attributes.clone();
        work.record_connector(&connector, Some(resolved)).unwrap();

        work
    }

    #[test]
    fn definition_dependency_yields_its_output() {
        let work = work_with_fixtures();
        let deps = [PluginDependency::on_definition("ad0")];

        let values = merged_attribute_values(&work, &deps, "ad1").unwrap();
        assert_eq!(values.len(), 2);
        assert!(values.contains(&AttributeValue::string("defValue1")));
    }

    #[test]
    fn connector_dependency_yields_the_named_attribute() {
        let work = work_with_fixtures();
        let deps = [PluginDependency::on_connector("dc0", "SubAttribute")];

        let values = merged_attribute_values(&work, &deps, "ad1").unwrap();
        assert_eq!(values, vec![AttributeValue::string("SubValue1")]);
    }

    #[test]
    fn connector_dependency_without_source_attribute_is_an_error() {
        let work = work_with_fixtures();
        let deps = [PluginDependency::on_definition("dc0")];

        let result = merged_attribute_values(&work, &deps, "ad1");
        assert!(matches!(
            result,
            Err(ResolutionError::MissingSourceAttribute { connector_id, .. })
                if connector_id == "dc0"
        ));
    }

    #[test]
    fn unresolved_dependency_contributes_nothing() {
        let work = work_with_fixtures();
        let deps = [PluginDependency::on_definition("nowhere")];

        let values = merged_attribute_values(&work, &deps, "ad1").unwrap();
        assert!(values.is_empty());
    }

    #[test]
    fn all_values_merges_by_attribute_id() {
        let work = work_with_fixtures();
        let deps = [
            PluginDependency::on_definition("ad0"),
            PluginDependency::on_connector("dc0", "SubAttribute"),
        ];

        let merged = all_attribute_values(&work, &deps);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged["ad0"].len(), 2);
        assert_eq!(merged["SubAttribute"], vec![AttributeValue::string("SubValue1")]);
        assert_eq!(merged["Other"], vec![AttributeValue::string("OtherValue")]);
    }
}
