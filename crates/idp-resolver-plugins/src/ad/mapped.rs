//! Value-mapping attribute definition.

use idp_attribute::{Attribute, AttributeValue};
use idp_resolver_spi::{
    support, AttributeDefinition, DefinitionSettings, InitializationError, PluginSettings,
    ResolutionContext, ResolutionError, ResolutionResult, ResolverPlugin, WorkContext,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::output_attribute;

/// Declarative form of a single source value matcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceValueConfig {
    /// Pattern the dependency value is matched against.
    pub value: String,
    /// Whether matching ignores case.
    #[serde(default)]
    pub ignore_case: bool,
    /// Whether a substring match suffices instead of a full match.
    #[serde(default)]
    pub partial_match: bool,
}

/// Declarative form of a value map: one return value guarded by one or
/// more source value matchers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueMapConfig {
    /// Value emitted when any source value matches.
    pub return_value: String,
    /// Matchers tried against each dependency value.
    pub source_values: Vec<SourceValueConfig>,
}

#[derive(Debug)]
struct SourceValue {
    raw: String,
    regex: Option<Regex>,
    ignore_case: bool,
}

impl SourceValue {
    fn compile(plugin_id: &str, config: &SourceValueConfig) -> Result<Self, InitializationError> {
        let regex = if config.partial_match {
            None
        } else {
            let flags = if config.ignore_case { "(?i)" } else { "" };
            let pattern = format!("{flags}^(?:{})$", config.value);
            Some(Regex::new(&pattern).map_err(|e| {
                InitializationError::invalid(format!(
                    "attribute definition '{plugin_id}': invalid source value pattern '{}': {e}",
                    config.value
                ))
            })?)
        };
        Ok(Self {
            raw: config.value.clone(),
            regex,
            ignore_case: config.ignore_case,
        })
    }
}

/// A compiled value map.
#[derive(Debug)]
pub struct ValueMap {
    return_value: String,
    source_values: Vec<SourceValue>,
}

impl ValueMap {
    /// Applies this map to a single input value, yielding the mapped
    /// value if any source value matched.
    fn apply(&self, input: &str) -> Option<String> {
        for source in &self.source_values {
            match &source.regex {
                Some(regex) => {
                    if let Some(captures) = regex.captures(input) {
                        let mut mapped = String::new();
                        captures.expand(&self.return_value, &mut mapped);
                        return Some(mapped);
                    }
                }
                None => {
                    let matched = if source.ignore_case {
                        input.to_lowercase().contains(&source.raw.to_lowercase())
                    } else {
                        input.contains(&source.raw)
                    };
                    if matched {
                        return Some(self.return_value.clone());
                    }
                }
            }
        }
        None
    }
}

/// An attribute definition that maps dependency values onto configured
/// return values.
///
/// Each input value is tried against every value map. Inputs matched by
/// no map fall back to the default value, or to the input itself when
/// pass-through is enabled, and are otherwise dropped.
#[derive(Debug)]
pub struct MappedAttributeDefinition {
    settings: DefinitionSettings,
    value_maps: Vec<ValueMap>,
    default_value: Option<String>,
    pass_through: bool,
}

impl MappedAttributeDefinition {
    /// Creates a mapped definition from its declarative configuration.
    ///
    /// ## Errors
    ///
    /// Returns an [`InitializationError`] if no value maps or no
    /// dependencies were configured, or if a source value pattern does
    /// not compile.
    pub fn new(
        settings: DefinitionSettings,
        maps: Vec<ValueMapConfig>,
    ) -> Result<Self, InitializationError> {
        let plugin_id = settings.plugin().id().to_string();
        if maps.is_empty() {
            return Err(InitializationError::invalid(format!(
                "attribute definition '{plugin_id}': no value maps were configured"
            )));
        }
        if settings.plugin().dependencies().is_empty() {
            return Err(InitializationError::invalid(format!(
                "attribute definition '{plugin_id}': no dependencies were configured"
            )));
        }

        let mut value_maps = Vec::with_capacity(maps.len());
        for map in &maps {
            let mut source_values = Vec::with_capacity(map.source_values.len());
            for source in &map.source_values {
                source_values.push(SourceValue::compile(&plugin_id, source)?);
            }
            value_maps.push(ValueMap {
                return_value: map.return_value.clone(),
                source_values,
            });
        }

        Ok(Self {
            settings,
            value_maps,
            default_value: None,
            pass_through: false,
        })
    }

    /// Sets the value emitted for inputs no map matched.
    #[must_use]
    pub fn with_default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Passes unmatched inputs through unchanged instead of dropping
    /// them.
    #[must_use]
    pub fn pass_through(mut self, enabled: bool) -> Self {
        self.pass_through = enabled;
        self
    }

    /// Maps a single input value onto zero or more output values.
    fn map_value(&self, input: &str) -> Vec<AttributeValue> {
        let mapped: Vec<AttributeValue> = self
            .value_maps
            .iter()
            .filter_map(|map| map.apply(input))
            .map(AttributeValue::string)
            .collect();
        if !mapped.is_empty() {
            return mapped;
        }
        if self.pass_through {
            return vec![AttributeValue::string(input)];
        }
        match &self.default_value {
            Some(default) => vec![AttributeValue::string(default.clone())],
            None => {
                debug!(
                    plugin_id = self.id(),
                    input, "no value map matched, dropping value"
                );
                Vec::new()
            }
        }
    }
}

impl ResolverPlugin for MappedAttributeDefinition {
    fn settings(&self) -> &PluginSettings {
        self.settings.plugin()
    }
}

impl AttributeDefinition for MappedAttributeDefinition {
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
                AttributeValue::String(s) => values.extend(self.map_value(&s)),
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
