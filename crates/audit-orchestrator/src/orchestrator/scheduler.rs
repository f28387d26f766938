//! Batched plugin execution.
//!
//! Plugins are split into consecutive batches of `batch_size` in declaration
//! order. Every plugin of a batch starts together; the next batch starts only
//! after the whole batch has settled, so at most `batch_size` plugins are in
//! flight at any time.
//!
//! Each invocation runs on its own task, raced against the per-plugin timeout.
//! On timeout the invocation's cancellation token is triggered and the task
//! is detached: the run no longer waits for it and nothing it returns later is
//! recorded.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use audit_analysis::plugin::{AnalysisContext, AnalyzerPlugin, PluginError};
use audit_analysis::schema::{CodeIssue, PluginResult};
use futures::future::join_all;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::errors::OrchestrationError;

/// Outcome of one plugin invocation.
#[derive(Debug)]
pub(crate) struct PluginExecution {
    pub result: PluginResult,
    pub issues: Vec<CodeIssue>,
    pub failure: Option<PluginError>,
}

/// Run `plugins` in batches and return their executions in declaration order.
///
/// With `fail_fast`, the first failure (in declaration order) of the first
/// batch that has one aborts the run. The batch itself is always allowed to
/// settle first.
pub(crate) async fn run_batches(
    plugins: &[Arc<dyn AnalyzerPlugin>],
    files: Arc<[PathBuf]>,
    batch_size: usize,
    timeout: Duration,
    fail_fast: bool,
    run_token: &CancellationToken,
) -> Result<Vec<PluginExecution>, OrchestrationError> {
    let mut executions = Vec::with_capacity(plugins.len());

    for (index, batch) in plugins.chunks(batch_size.max(1)).enumerate() {
        let names: Vec<&str> = batch.iter().map(|p| p.name()).collect();
        debug!(batch = index, plugins = ?names, "Starting plugin batch");

        let settled = join_all(batch.iter().map(|plugin| {
            execute_plugin(
                Arc::clone(plugin),
                Arc::clone(&files),
                timeout,
                run_token.child_token(),
            )
        }))
        .await;

        let failed = settled.iter().filter(|e| e.failure.is_some()).count();
        info!(batch = index, size = settled.len(), failed, "Plugin batch settled");

        for mut execution in settled {
            if fail_fast {
                if let Some(source) = execution.failure.take() {
                    run_token.cancel();
                    return Err(OrchestrationError::aggregate(
                        execution.result.name,
                        source,
                    ));
                }
            }
            executions.push(execution);
        }
    }

    Ok(executions)
}

/// Invoke one plugin under the timeout and convert the outcome into a
/// `PluginExecution`. Never returns an error: failures become failed results.
pub(crate) async fn execute_plugin(
    plugin: Arc<dyn AnalyzerPlugin>,
    files: Arc<[PathBuf]>,
    timeout: Duration,
    cancel: CancellationToken,
) -> PluginExecution {
    let name = plugin.name().to_string();
    let version = plugin.version().to_string();
    let file_count = files.len();
    let ctx = AnalysisContext::new(name.clone(), cancel.clone());
    let started = Instant::now();

    let task = tokio::spawn(async move { plugin.analyze(&ctx, &files).await });

    let outcome = match tokio::time::timeout(timeout, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => Err(PluginError::execution(format!(
            "plugin task aborted: {join_err}"
        ))),
        Err(_) => {
            // Dropping the join handle detaches the task; the token tells a
            // cooperative plugin to stop.
            cancel.cancel();
            Err(PluginError::Timeout)
        }
    };
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match outcome {
        Ok(issues) => {
            debug!(
                plugin = %name,
                issues = issues.len(),
                elapsed_ms,
                "Plugin completed"
            );
            PluginExecution {
                result: PluginResult::succeeded(
                    name,
                    version,
                    elapsed_ms,
                    issues.len(),
                    file_count,
                ),
                issues,
                failure: None,
            }
        }
        Err(e) => {
            warn!(
                plugin = %name,
                kind = %e.kind(),
                error = %e,
                elapsed_ms,
                "Plugin failed"
            );
            PluginExecution {
                result: PluginResult::failed(name, version, elapsed_ms, e.to_string()),
                issues: Vec::new(),
                failure: Some(e),
            }
        }
    }
}
