//! Orchestrator configuration.
//!
//! Built once at process start (defaults, or a TOML file) and passed by
//! reference into the orchestrator. Nothing here reads the environment.
//!
//! ```toml
//! parallel_execution = true
//! max_concurrent_plugins = 4
//! timeout_ms = 300000
//! fail_fast = false
//! generate_recommendations = true
//!
//! [plugins.metrics]
//! enabled = true
//!
//! [plugins.metrics.config]
//! cyclomatic_threshold = 12
//! duplicate_threshold = 8
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::errors::OrchestrationError;

/// Default number of plugins executed concurrently per batch.
const DEFAULT_MAX_CONCURRENT_PLUGINS: usize = 4;
/// Default per-plugin time budget (5 minutes).
const DEFAULT_TIMEOUT_MS: u64 = 300_000;

/// Per-analyzer-family settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginSettings {
    pub enabled: bool,
    /// Analyzer-specific configuration handed to the plugin factory
    pub config: serde_json::Value,
}

impl Default for PluginSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            config: serde_json::Value::Null,
        }
    }
}

impl PluginSettings {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    pub fn with_config(config: serde_json::Value) -> Self {
        Self {
            enabled: true,
            config,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Settings keyed by plugin name. Registered plugins without an entry
    /// run enabled with a `null` config.
    pub plugins: BTreeMap<String, PluginSettings>,
    /// Run plugins of a batch concurrently; `false` runs them one at a time
    pub parallel_execution: bool,
    pub max_concurrent_plugins: usize,
    /// Per-plugin time budget in milliseconds
    pub timeout_ms: u64,
    /// Abort the run on the first plugin failure
    pub fail_fast: bool,
    pub generate_recommendations: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            plugins: BTreeMap::new(),
            parallel_execution: true,
            max_concurrent_plugins: DEFAULT_MAX_CONCURRENT_PLUGINS,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            fail_fast: false,
            generate_recommendations: true,
        }
    }
}

impl OrchestratorConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, OrchestrationError> {
        toml::from_str(content)
            .map_err(|e| OrchestrationError::Configuration(format!("invalid config TOML: {e}")))
    }

    pub fn load(path: &Path) -> Result<Self, OrchestrationError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            OrchestrationError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Validate the config; return an error string if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_concurrent_plugins == 0 {
            return Err("max_concurrent_plugins must be > 0".to_string());
        }
        if self.timeout_ms == 0 {
            return Err("timeout_ms must be > 0".to_string());
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Number of plugins per batch.
    pub fn batch_size(&self) -> usize {
        if self.parallel_execution {
            self.max_concurrent_plugins.max(1)
        } else {
            1
        }
    }

    pub fn settings_for(&self, plugin: &str) -> PluginSettings {
        self.plugins.get(plugin).cloned().unwrap_or_default()
    }

    pub fn with_plugin(mut self, name: impl Into<String>, settings: PluginSettings) -> Self {
        self.plugins.insert(name.into(), settings);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let cfg = OrchestratorConfig::default();
        cfg.validate().expect("default config should be valid");
        assert_eq!(cfg.max_concurrent_plugins, 4);
        assert_eq!(cfg.timeout(), Duration::from_secs(300));
        assert!(!cfg.fail_fast);
    }

    #[test]
    fn zero_concurrency_rejected() {
        let cfg = OrchestratorConfig {
            max_concurrent_plugins: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn sequential_mode_uses_single_plugin_batches() {
        let cfg = OrchestratorConfig {
            parallel_execution: false,
            max_concurrent_plugins: 8,
            ..Default::default()
        };
        assert_eq!(cfg.batch_size(), 1);
    }

    #[test]
    fn toml_with_nested_plugin_config() {
        let cfg = OrchestratorConfig::from_toml_str(
            r#"
max_concurrent_plugins = 2
fail_fast = true

[plugins.metrics.config]
duplicate_threshold = 8

[plugins.eslint]
enabled = false
"#,
        )
        .unwrap();
        assert_eq!(cfg.max_concurrent_plugins, 2);
        assert!(cfg.fail_fast);
        assert_eq!(cfg.timeout_ms, 300_000);

        let metrics = cfg.settings_for("metrics");
        assert!(metrics.enabled);
        assert_eq!(metrics.config["duplicate_threshold"], 8);
        assert!(!cfg.settings_for("eslint").enabled);
        assert!(cfg.settings_for("unlisted").enabled);
    }

    #[test]
    fn malformed_toml_is_configuration_error() {
        let err = OrchestratorConfig::from_toml_str("timeout_ms = \"soon\"").unwrap_err();
        assert!(matches!(err, OrchestrationError::Configuration(_)));
    }
}
