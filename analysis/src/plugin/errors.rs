//! Plugin error taxonomy with failure classification.
//!
//! Every error an analyzer can surface to the orchestrator is represented
//! here. Callers query `kind()` instead of matching on message text.
//!
//! | Kind          | Raised by        | Orchestrator reaction                          |
//! |---------------|------------------|------------------------------------------------|
//! | Configuration | `initialize()`   | plugin excluded from the run                   |
//! | Execution     | `analyze()`      | failed `PluginResult`, run continues           |
//! | Timeout       | orchestrator     | failed `PluginResult` with `"Plugin timeout"`  |
//! | Cancelled     | `analyze()`      | failed `PluginResult`, run continues           |

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Coarse classification of a plugin failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Bad or missing plugin configuration.
    Configuration,
    /// `analyze()` could not produce any result.
    Execution,
    /// `analyze()` did not settle within the run's time budget.
    Timeout,
    /// The plugin observed the cancellation signal and gave up.
    Cancelled,
}

impl FailureKind {
    /// Whether this failure happens during `analyze()` (vs. setup).
    pub fn is_execution_phase(self) -> bool {
        !matches!(self, Self::Configuration)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "configuration"),
            Self::Execution => write!(f, "execution"),
            Self::Timeout => write!(f, "timeout"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Unified error type for analyzer plugins.
#[derive(Debug, Error)]
pub enum PluginError {
    /// Configuration is invalid or a required resource is missing.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The analyzer failed while producing results.
    #[error("Plugin execution failed: {0}")]
    Execution(String),

    /// Synthesized by the orchestrator when the time budget expires.
    #[error("Plugin timeout")]
    Timeout,

    /// The analyzer aborted after observing cancellation.
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// Filesystem access failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Any other error that doesn't fit the above categories.
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl PluginError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Configuration(_) => FailureKind::Configuration,
            Self::Execution(_) | Self::Io { .. } | Self::Internal(_) => FailureKind::Execution,
            Self::Timeout => FailureKind::Timeout,
            Self::Cancelled(_) => FailureKind::Cancelled,
        }
    }

    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_message_is_stable() {
        assert_eq!(PluginError::Timeout.to_string(), "Plugin timeout");
        assert_eq!(PluginError::Timeout.kind(), FailureKind::Timeout);
    }

    #[test]
    fn configuration_is_setup_phase() {
        let err = PluginError::configuration("missing .eslintrc");
        assert_eq!(err.kind(), FailureKind::Configuration);
        assert!(!err.kind().is_execution_phase());
    }

    #[test]
    fn io_and_internal_classify_as_execution() {
        let io = PluginError::io("/tmp/x", std::io::Error::other("boom"));
        assert_eq!(io.kind(), FailureKind::Execution);
        let internal = PluginError::from(anyhow::anyhow!("bad state"));
        assert_eq!(internal.kind(), FailureKind::Execution);
        assert!(internal.kind().is_execution_phase());
    }
}
