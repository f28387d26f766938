//! Plugin registry: name → factory mapping resolved at initialization time.
//!
//! Factories build a fresh plugin instance from its `config` value on every
//! run, so consecutive runs never share plugin state. Registration order is
//! the declaration order used for batching and issue merging.

use std::sync::Arc;

use audit_analysis::metrics::{MetricsPlugin, METRICS_PLUGIN_NAME};
use audit_analysis::plugin::{AnalyzerPlugin, PluginError};

/// Builds a plugin from its analyzer-specific configuration.
pub type PluginFactory = Arc<
    dyn Fn(&serde_json::Value) -> Result<Box<dyn AnalyzerPlugin>, PluginError> + Send + Sync,
>;

#[derive(Clone, Default)]
pub struct PluginRegistry {
    entries: Vec<(String, PluginFactory)>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the analyzers shipped in this workspace.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(METRICS_PLUGIN_NAME, |config| {
            Ok(Box::new(MetricsPlugin::new(config.clone())) as Box<dyn AnalyzerPlugin>)
        });
        registry
    }

    /// Register a factory. Re-registering a name replaces its factory but
    /// keeps its original position.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&serde_json::Value) -> Result<Box<dyn AnalyzerPlugin>, PluginError>
            + Send
            + Sync
            + 'static,
    {
        let name = name.into();
        let factory: PluginFactory = Arc::new(factory);
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = factory,
            None => self.entries.push((name, factory)),
        }
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PluginFactory)> {
        self.entries.iter().map(|(n, f)| (n.as_str(), f))
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_include_metrics() {
        let registry = PluginRegistry::with_builtins();
        assert!(registry.contains(METRICS_PLUGIN_NAME));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn reregistering_keeps_declaration_order() {
        let mut registry = PluginRegistry::with_builtins();
        registry.register("eslint", |_| Err(PluginError::configuration("no eslint")));
        registry.register(METRICS_PLUGIN_NAME, |_| {
            Err(PluginError::configuration("replaced"))
        });
        assert_eq!(registry.names(), vec![METRICS_PLUGIN_NAME, "eslint"]);

        let (_, factory) = registry.iter().next().unwrap();
        let err = factory(&serde_json::Value::Null).err().unwrap();
        assert!(err.to_string().contains("replaced"));
    }

    #[test]
    fn builtin_factory_builds_named_plugin() {
        let registry = PluginRegistry::with_builtins();
        let (_, factory) = registry.iter().next().unwrap();
        let plugin = factory(&serde_json::Value::Null).unwrap();
        assert_eq!(plugin.name(), METRICS_PLUGIN_NAME);
    }
}
