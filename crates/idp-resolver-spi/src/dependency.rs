//! Dependency declarations between resolver plugins.

use serde::{Deserialize, Serialize};

/// A declared dependency of one resolver plugin on another.
///
/// When the target is an attribute definition, the dependency is on that
/// definition's own computed output and `source_attribute_id` is ignored
/// (with a warning if set). When the target is a data connector, the
/// dependency must name which attribute inside the connector's result map
/// it consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginDependency {
    /// Identifier of the plugin this dependency points at.
    pub plugin_id: String,

    /// Name of the attribute inside a data connector's result map.
    ///
    /// Required for data-connector dependencies, meaningless otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_attribute_id: Option<String>,
}

impl PluginDependency {
    /// Declares a dependency on an attribute definition's output.
    #[must_use]
    pub fn on_definition(plugin_id: impl Into<String>) -> Self {
        Self {
            plugin_id: plugin_id.into(),
            source_attribute_id: None,
        }
    }

    /// Declares a dependency on a named attribute from a data connector.
    #[must_use]
    pub fn on_connector(
        plugin_id: impl Into<String>,
        source_attribute_id: impl Into<String>,
    ) -> Self {
        Self {
            plugin_id: plugin_id.into(),
            source_attribute_id: Some(source_attribute_id.into()),
        }
    }
}
