//! Orchestration error taxonomy.
//!
//! Plugin failures are normally absorbed into failed `PluginResult`s; only
//! these reach the caller of `Orchestrator::run`:
//!
//! | Variant          | When                                                  |
//! |------------------|-------------------------------------------------------|
//! | Configuration    | orchestrator config is invalid or unreadable          |
//! | AggregateFailure | `fail_fast` is set and a plugin failed or timed out   |
//! | Internal         | anything else                                         |

use audit_analysis::plugin::{FailureKind, PluginError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestrationError {
    /// Configuration is invalid or missing required fields.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// First plugin failure of a `fail_fast` run; no schema was produced.
    #[error("Plugin '{plugin}' failed: {source}")]
    AggregateFailure {
        plugin: String,
        #[source]
        source: PluginError,
    },

    /// Any other error that doesn't fit the above categories.
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl OrchestrationError {
    pub fn aggregate(plugin: impl Into<String>, source: PluginError) -> Self {
        Self::AggregateFailure {
            plugin: plugin.into(),
            source,
        }
    }

    /// Name of the plugin that aborted the run, if any.
    pub fn failed_plugin(&self) -> Option<&str> {
        match self {
            Self::AggregateFailure { plugin, .. } => Some(plugin),
            _ => None,
        }
    }

    /// Classification of the underlying plugin failure, if any.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::AggregateFailure { source, .. } => Some(source.kind()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_failure_names_plugin_and_cause() {
        let err = OrchestrationError::aggregate("eslint", PluginError::execution("exit 137"));
        assert_eq!(err.failed_plugin(), Some("eslint"));
        assert_eq!(err.failure_kind(), Some(FailureKind::Execution));
        let msg = err.to_string();
        assert!(msg.contains("eslint"));
        assert!(msg.contains("exit 137"));
    }

    #[test]
    fn timeout_aggregate_keeps_timeout_kind() {
        let err = OrchestrationError::aggregate("slow", PluginError::Timeout);
        assert_eq!(err.failure_kind(), Some(FailureKind::Timeout));
    }

    #[test]
    fn configuration_has_no_plugin() {
        let err = OrchestrationError::Configuration("timeout_ms must be > 0".into());
        assert!(err.failed_plugin().is_none());
        assert!(err.failure_kind().is_none());
    }
}
