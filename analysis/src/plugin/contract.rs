//! The capability contract every analyzer implements.
//!
//! ## Lifecycle
//!
//! ```text
//! plugin.initialize()            : one-time setup; read config, warm caches
//!   → plugin.analyze(ctx, files) : produce issues; may run concurrently with other plugins
//!   → plugin.cleanup()           : best-effort teardown, errors are only logged
//! ```
//!
//! `analyze` takes `&self` so the orchestrator can share one initialized
//! instance with a spawned task. Implementors only need `name`, `version`
//! and `analyze`; `initialize` and `cleanup` default to no-ops.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::errors::PluginError;
use crate::schema::CodeIssue;

/// Per-invocation context handed to `analyze`.
#[derive(Clone)]
pub struct AnalysisContext {
    /// Name of the plugin this context was built for.
    pub plugin: String,
    /// Cancellation token, raised when the invocation loses its timeout race.
    pub cancel: CancellationToken,
}

impl AnalysisContext {
    pub fn new(plugin: impl Into<String>, cancel: CancellationToken) -> Self {
        Self {
            plugin: plugin.into(),
            cancel,
        }
    }

    /// Context that is never cancelled, for direct use outside an orchestrator.
    pub fn detached(plugin: impl Into<String>) -> Self {
        Self::new(plugin, CancellationToken::new())
    }

    /// Returns `true` if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves once cancellation has been requested.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }

    /// Error out early if cancellation has been requested.
    pub fn check_cancelled(&self) -> Result<(), PluginError> {
        if self.is_cancelled() {
            return Err(PluginError::Cancelled(format!(
                "{} observed cancellation",
                self.plugin
            )));
        }
        Ok(())
    }
}

/// An analyzer that inspects files and returns issues.
///
/// Implementations must not mutate files under analysis. They should return
/// partial results rather than fail where they can; an `Err` means no result
/// at all could be produced.
#[async_trait]
pub trait AnalyzerPlugin: Send + Sync {
    /// Stable plugin name used in results, config keys and logs.
    fn name(&self) -> &str;

    /// Plugin version reported in `PluginResult`.
    fn version(&self) -> &str;

    /// Prepare state before the run.
    ///
    /// # Errors
    ///
    /// Returns `PluginError::Configuration` when the plugin cannot run; the
    /// orchestrator excludes it from the current run.
    async fn initialize(&mut self) -> Result<(), PluginError> {
        Ok(())
    }

    /// Analyze `files` (absolute paths) and return findings.
    ///
    /// Cooperative implementations poll `ctx` between units of work; ones
    /// that ignore it keep running after a timeout but their output is
    /// discarded.
    async fn analyze(
        &self,
        ctx: &AnalysisContext,
        files: &[PathBuf],
    ) -> Result<Vec<CodeIssue>, PluginError>;

    /// Best-effort teardown.
    async fn cleanup(&self) -> Result<(), PluginError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_cancelled_reports_plugin_name() {
        let ctx = AnalysisContext::detached("metrics");
        assert!(ctx.check_cancelled().is_ok());
        ctx.cancel.cancel();
        let err = ctx.check_cancelled().unwrap_err();
        assert!(err.to_string().contains("metrics"));
    }

    #[tokio::test]
    async fn cancelled_resolves_after_cancel() {
        let ctx = AnalysisContext::detached("p");
        let waiter = ctx.clone();
        let handle = tokio::spawn(async move { waiter.cancelled().await });
        ctx.cancel.cancel();
        handle.await.unwrap();
        assert!(ctx.is_cancelled());
    }
}
