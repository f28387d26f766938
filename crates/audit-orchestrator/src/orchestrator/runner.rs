//! Orchestrator: drives one analysis run from plugin setup to the final
//! result schema.
//!
//! ```text
//! Idle → Initializing → Executing → Aggregating → Done
//! ```
//!
//! A `fail_fast` abort goes straight from `Executing` to `Done` without a
//! schema. `run` may be called again from `Done`; every run builds fresh
//! plugin instances from the registry.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use audit_analysis::metrics::SourceLanguage;
use audit_analysis::plugin::AnalyzerPlugin;
use audit_analysis::schema::{
    AnalysisMetrics, AnalysisResultSchema, AnalysisSummary, AnalyzedFile, CodeIssue,
    IssuesByLevel, PluginResult,
};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::config::OrchestratorConfig;
use super::errors::OrchestrationError;
use super::recommendations::{self, RecommendationInput, RecommendationTemplate};
use super::registry::PluginRegistry;
use super::scheduler::{self, PluginExecution};
use super::scoring;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorPhase {
    Idle,
    Initializing,
    Executing,
    Aggregating,
    Done,
}

impl std::fmt::Display for OrchestratorPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Initializing => write!(f, "initializing"),
            Self::Executing => write!(f, "executing"),
            Self::Aggregating => write!(f, "aggregating"),
            Self::Done => write!(f, "done"),
        }
    }
}

pub struct Orchestrator {
    config: OrchestratorConfig,
    registry: PluginRegistry,
    templates: Vec<Box<dyn RecommendationTemplate>>,
    phase: OrchestratorPhase,
}

impl Orchestrator {
    pub fn new(config: OrchestratorConfig, registry: PluginRegistry) -> Self {
        Self {
            config,
            registry,
            templates: recommendations::default_templates(),
            phase: OrchestratorPhase::Idle,
        }
    }

    /// Orchestrator over the analyzers shipped in this workspace.
    pub fn with_builtins(config: OrchestratorConfig) -> Self {
        Self::new(config, PluginRegistry::with_builtins())
    }

    /// Append a recommendation template after the defaults.
    pub fn with_template(mut self, template: impl RecommendationTemplate + 'static) -> Self {
        self.templates.push(Box::new(template));
        self
    }

    pub fn phase(&self) -> OrchestratorPhase {
        self.phase
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Analyze `files` with every enabled plugin and build the result schema.
    /// Repeated paths are analyzed once, at their first position.
    ///
    /// Plugin failures and timeouts are recorded as failed `PluginResult`s.
    /// Only a `fail_fast` abort or an invalid config produces an `Err`.
    pub async fn run(
        &mut self,
        files: &[PathBuf],
    ) -> Result<AnalysisResultSchema, OrchestrationError> {
        self.config
            .validate()
            .map_err(OrchestrationError::Configuration)?;

        let started = Instant::now();
        let mut seen = HashSet::new();
        let files: Arc<[PathBuf]> = files
            .iter()
            .filter(|path| seen.insert(path.as_path()))
            .cloned()
            .collect();
        info!(
            files = files.len(),
            plugins = self.registry.len(),
            "Starting analysis run"
        );

        self.transition(OrchestratorPhase::Initializing);
        let plugins = self.initialize_plugins().await;

        self.transition(OrchestratorPhase::Executing);
        let run_token = CancellationToken::new();
        let executed = scheduler::run_batches(
            &plugins,
            Arc::clone(&files),
            self.config.batch_size(),
            self.config.timeout(),
            self.config.fail_fast,
            &run_token,
        )
        .await;

        let executions = match executed {
            Ok(executions) => executions,
            Err(e) => {
                warn!(error = %e, "Analysis run aborted");
                cleanup_plugins(&plugins).await;
                self.transition(OrchestratorPhase::Done);
                return Err(e);
            }
        };

        self.transition(OrchestratorPhase::Aggregating);
        let schema = self
            .aggregate(&files, executions, started.elapsed())
            .await;

        cleanup_plugins(&plugins).await;
        self.transition(OrchestratorPhase::Done);
        info!(summary = %schema.summary_line(), "Analysis run complete");
        Ok(schema)
    }

    fn transition(&mut self, next: OrchestratorPhase) {
        debug!(from = %self.phase, to = %next, "Orchestrator phase");
        self.phase = next;
    }

    /// Build and initialize every enabled plugin in declaration order.
    ///
    /// A plugin whose factory or `initialize` fails is left out of the run
    /// entirely: it gets no `PluginResult`.
    async fn initialize_plugins(&self) -> Vec<Arc<dyn AnalyzerPlugin>> {
        for name in self.config.plugins.keys() {
            if !self.registry.contains(name) {
                warn!(plugin = %name, "Configured plugin is not registered; ignoring");
            }
        }

        let mut ready: Vec<Arc<dyn AnalyzerPlugin>> = Vec::new();
        for (name, factory) in self.registry.iter() {
            let settings = self.config.settings_for(name);
            if !settings.enabled {
                debug!(plugin = %name, "Plugin disabled");
                continue;
            }

            let mut plugin = match factory(&settings.config) {
                Ok(plugin) => plugin,
                Err(e) => {
                    warn!(plugin = %name, kind = %e.kind(), error = %e, "Plugin construction failed; excluded from run");
                    continue;
                }
            };
            match plugin.initialize().await {
                Ok(()) => {
                    debug!(plugin = %name, version = plugin.version(), "Plugin initialized");
                    ready.push(Arc::from(plugin));
                }
                Err(e) => {
                    warn!(plugin = %name, kind = %e.kind(), error = %e, "Plugin initialization failed; excluded from run");
                }
            }
        }
        ready
    }

    async fn aggregate(
        &self,
        files: &[PathBuf],
        executions: Vec<PluginExecution>,
        elapsed: Duration,
    ) -> AnalysisResultSchema {
        let known: HashSet<&Path> = files.iter().map(PathBuf::as_path).collect();
        let mut issues: Vec<CodeIssue> = Vec::new();
        let mut plugin_results: Vec<PluginResult> = Vec::with_capacity(executions.len());
        let mut per_file: HashMap<PathBuf, (usize, Vec<String>)> = HashMap::new();

        for execution in executions {
            let plugin = &execution.result.name;
            for issue in execution.issues {
                if !known.contains(issue.location.file.as_path()) {
                    warn!(
                        plugin = %plugin,
                        issue = %issue.id,
                        file = %issue.location.file.display(),
                        "Issue references a file outside the run; dropped"
                    );
                    continue;
                }
                let (count, contributors) =
                    per_file.entry(issue.location.file.clone()).or_default();
                *count += 1;
                if !contributors.iter().any(|c| c == plugin) {
                    contributors.push(plugin.clone());
                }
                issues.push(issue);
            }
            plugin_results.push(execution.result);
        }

        let mut analyzed = Vec::with_capacity(files.len());
        for path in files {
            let size = match tokio::fs::metadata(path).await {
                Ok(meta) => meta.len(),
                Err(e) => {
                    debug!(file = %path.display(), error = %e, "Cannot stat file; size 0");
                    0
                }
            };
            let language = SourceLanguage::from_path(path)
                .map(|lang| lang.name().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            let (issue_count, plugins) = per_file.remove(path).unwrap_or_default();
            analyzed.push(AnalyzedFile {
                path: path.clone(),
                size,
                language,
                issue_count,
                plugins,
            });
        }

        let by_level = IssuesByLevel::from_issues(&issues);
        let plugins_failed = plugin_results.iter().filter(|r| r.is_failed()).count();
        let any_failed = plugins_failed > 0;
        let quality_score = scoring::quality_score(&by_level);
        let security = scoring::security_metrics(&issues);

        let recommendations = if self.config.generate_recommendations {
            recommendations::generate(
                &self.templates,
                &RecommendationInput {
                    issues: &issues,
                    quality_score,
                    security: &security,
                },
            )
        } else {
            Vec::new()
        };

        let summary = AnalysisSummary {
            total_files: files.len(),
            total_issues: issues.len(),
            issues_by_level: by_level,
            fixable_issues: issues.iter().filter(|i| i.fixable).count(),
            plugins_run: plugin_results.len(),
            plugins_failed,
            status: scoring::run_status(any_failed, &by_level),
            exit_code: scoring::exit_code(any_failed, &by_level),
        };

        let metrics = AnalysisMetrics {
            execution_time_ms: elapsed.as_millis() as u64,
            plugin_execution_times: plugin_results
                .iter()
                .map(|r| (r.name.clone(), r.execution_time_ms))
                .collect(),
            quality_score,
            technical_debt_hours: scoring::technical_debt_hours(&by_level),
            average_issues_per_file: if files.is_empty() {
                0.0
            } else {
                issues.len() as f64 / files.len() as f64
            },
            complexity_distribution: scoring::complexity_distribution(&issues),
            security,
        };

        AnalysisResultSchema {
            timestamp: chrono::Utc::now(),
            configuration: serde_json::to_value(&self.config).unwrap_or_default(),
            summary,
            files: analyzed,
            issues,
            metrics,
            plugin_results,
            recommendations,
        }
    }
}

/// Best-effort cleanup of every initialized plugin.
async fn cleanup_plugins(plugins: &[Arc<dyn AnalyzerPlugin>]) {
    for plugin in plugins {
        if let Err(e) = plugin.cleanup().await {
            warn!(plugin = plugin.name(), error = %e, "Plugin cleanup failed");
        }
    }
}
