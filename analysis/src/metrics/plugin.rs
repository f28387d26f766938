//! `MetricsPlugin`: the built-in analyzer that computes findings directly
//! from parsed source instead of wrapping an external tool.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::complexity::{analyze_source, FileMetrics};
use super::duplication::{
    find_cross_file_duplicates, find_intra_file_duplicates, DuplicateLocation, DuplicatedBlock,
};
use super::language::SourceLanguage;
use crate::plugin::{AnalysisContext, AnalyzerPlugin, PluginError};
use crate::schema::{CodeIssue, Position, Range, Severity};

pub const METRICS_PLUGIN_NAME: &str = "metrics";

pub const RULE_CYCLOMATIC: &str = "complexity/cyclomatic";
pub const RULE_COGNITIVE: &str = "complexity/cognitive";
pub const RULE_MAINTAINABILITY: &str = "complexity/maintainability-index";
pub const RULE_LINES_OF_CODE: &str = "complexity/lines-of-code";
pub const RULE_FUNCTION_COMPLEXITY: &str = "complexity/function";
pub const RULE_INTRA_FILE_DUPLICATE: &str = "duplication/intra-file";
pub const RULE_CROSS_FILE_DUPLICATE: &str = "duplication/cross-file";

/// Thresholds for the metrics engine. Every field has a default, so a
/// partial (or null) config value is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// File or function cyclomatic complexity above this → warning
    pub cyclomatic_threshold: u32,
    /// File cognitive complexity above this → warning
    pub cognitive_threshold: u32,
    /// Maintainability index below this → warning
    pub maintainability_threshold: f64,
    /// Lines of code above this → info
    pub max_lines_of_code: usize,
    /// Sliding window size (lines) for duplicate detection
    pub duplicate_threshold: usize,
    pub detect_duplicates: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            cyclomatic_threshold: 10,
            cognitive_threshold: 15,
            maintainability_threshold: 20.0,
            max_lines_of_code: 300,
            duplicate_threshold: 6,
            detect_duplicates: true,
        }
    }
}

impl MetricsConfig {
    /// Parse from a plugin `config` value; `null` yields the defaults.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, PluginError> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value.clone())
            .map_err(|e| PluginError::configuration(format!("invalid metrics config: {e}")))
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.duplicate_threshold == 0 {
            return Err("duplicate_threshold must be > 0".to_string());
        }
        if !(0.0..=100.0).contains(&self.maintainability_threshold) {
            return Err(format!(
                "maintainability_threshold must be in [0, 100], got {}",
                self.maintainability_threshold
            ));
        }
        Ok(())
    }
}

/// Complexity, maintainability and duplication analyzer.
pub struct MetricsPlugin {
    raw_config: serde_json::Value,
    config: MetricsConfig,
}

impl MetricsPlugin {
    /// Build from an unvalidated config value; `initialize` parses it.
    pub fn new(raw_config: serde_json::Value) -> Self {
        Self {
            raw_config,
            config: MetricsConfig::default(),
        }
    }

    pub fn with_config(config: MetricsConfig) -> Self {
        let raw_config = serde_json::to_value(&config).unwrap_or(serde_json::Value::Null);
        Self { raw_config, config }
    }

    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }
}

#[async_trait]
impl AnalyzerPlugin for MetricsPlugin {
    fn name(&self) -> &str {
        METRICS_PLUGIN_NAME
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    async fn initialize(&mut self) -> Result<(), PluginError> {
        let config = MetricsConfig::from_value(&self.raw_config)?;
        config.validate().map_err(PluginError::Configuration)?;
        debug!(?config, "metrics plugin configured");
        self.config = config;
        Ok(())
    }

    async fn analyze(
        &self,
        ctx: &AnalysisContext,
        files: &[PathBuf],
    ) -> Result<Vec<CodeIssue>, PluginError> {
        let mut sources = Vec::new();
        let mut seen = HashSet::new();
        let mut first_failure = None;
        for path in files {
            ctx.check_cancelled()?;
            if !seen.insert(path.as_path()) {
                debug!(file = %path.display(), "duplicate path; skipped");
                continue;
            }
            let Some(language) = SourceLanguage::from_path(path) else {
                debug!(file = %path.display(), "unsupported language; skipped");
                continue;
            };
            match tokio::fs::read_to_string(path).await {
                Ok(source) => sources.push(SourceFile {
                    path: path.clone(),
                    language,
                    source,
                }),
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "unreadable file; skipped");
                    first_failure.get_or_insert((path.clone(), e));
                }
            }
        }

        // Nothing readable at all is a failed run, not a clean one.
        if sources.is_empty() {
            if let Some((path, e)) = first_failure {
                return Err(PluginError::io(path, e));
            }
        }

        // Parsing is CPU-bound; keep it off the async workers.
        let config = self.config.clone();
        let ctx = ctx.clone();
        let issues = tokio::task::spawn_blocking(move || compute_issues(&config, &ctx, &sources))
            .await
            .map_err(|e| PluginError::execution(format!("metrics worker panicked: {e}")))??;

        info!(files = files.len(), issues = issues.len(), "metrics analysis complete");
        Ok(issues)
    }
}

struct SourceFile {
    path: PathBuf,
    language: SourceLanguage,
    source: String,
}

/// Sequential ids, unique within one invocation.
fn issue_ids() -> impl FnMut() -> String {
    let mut n = 0usize;
    move || {
        n += 1;
        format!("{METRICS_PLUGIN_NAME}-{n:04}")
    }
}

fn compute_issues(
    config: &MetricsConfig,
    ctx: &AnalysisContext,
    sources: &[SourceFile],
) -> Result<Vec<CodeIssue>, PluginError> {
    let mut ids = issue_ids();
    let mut issues = Vec::new();

    for file in sources {
        ctx.check_cancelled()?;
        match analyze_source(&file.path, &file.source, file.language) {
            Ok(metrics) => issues.extend(threshold_issues(config, &metrics, &mut ids)),
            Err(e) => warn!(file = %file.path.display(), error = %e, "metrics unavailable"),
        }
        if config.detect_duplicates {
            for block in
                find_intra_file_duplicates(&file.path, &file.source, config.duplicate_threshold)
            {
                issues.push(intra_file_issue(&block, &mut ids));
            }
        }
    }

    if config.detect_duplicates && sources.len() > 1 {
        ctx.check_cancelled()?;
        let corpus: Vec<(PathBuf, &str)> = sources
            .iter()
            .map(|f| (f.path.clone(), f.source.as_str()))
            .collect();
        for block in find_cross_file_duplicates(&corpus, config.duplicate_threshold) {
            issues.push(cross_file_issue(&block, &mut ids));
        }
    }

    Ok(issues)
}

/// Convert file and function metrics into findings.
pub fn threshold_issues(
    config: &MetricsConfig,
    metrics: &FileMetrics,
    ids: &mut impl FnMut() -> String,
) -> Vec<CodeIssue> {
    let path = metrics.path.as_path();
    let mut issues = Vec::new();

    if metrics.cyclomatic_complexity > config.cyclomatic_threshold {
        issues.push(
            file_issue(
                ids(),
                Severity::Warning,
                RULE_CYCLOMATIC,
                format!(
                    "Cyclomatic complexity {} exceeds threshold {}",
                    metrics.cyclomatic_complexity, config.cyclomatic_threshold
                ),
                path,
            )
            .with_suggestion("Split branching logic into smaller functions"),
        );
    }
    if metrics.cognitive_complexity > config.cognitive_threshold {
        issues.push(
            file_issue(
                ids(),
                Severity::Warning,
                RULE_COGNITIVE,
                format!(
                    "Cognitive complexity {} exceeds threshold {}",
                    metrics.cognitive_complexity, config.cognitive_threshold
                ),
                path,
            )
            .with_suggestion("Flatten nested conditions and extract boolean expressions"),
        );
    }
    if metrics.maintainability_index < config.maintainability_threshold {
        issues.push(file_issue(
            ids(),
            Severity::Warning,
            RULE_MAINTAINABILITY,
            format!(
                "Maintainability index {:.1} is below {:.1}",
                metrics.maintainability_index, config.maintainability_threshold
            ),
            path,
        ));
    }
    if metrics.lines_of_code > config.max_lines_of_code {
        issues.push(
            file_issue(
                ids(),
                Severity::Info,
                RULE_LINES_OF_CODE,
                format!(
                    "File has {} lines of code (limit {})",
                    metrics.lines_of_code, config.max_lines_of_code
                ),
                path,
            )
            .with_suggestion("Consider splitting this file into focused modules"),
        );
    }

    for function in &metrics.functions {
        if function.cyclomatic_complexity <= config.cyclomatic_threshold {
            continue;
        }
        issues.push(
            CodeIssue::new(
                ids(),
                Severity::Warning,
                RULE_FUNCTION_COMPLEXITY,
                format!(
                    "Function '{}' has cyclomatic complexity {} (threshold {})",
                    function.name, function.cyclomatic_complexity, config.cyclomatic_threshold
                ),
                path,
                function.start_line,
                1,
            )
            .with_range(Range {
                start: Position::new(function.start_line, 1),
                end: Position::new(function.end_line, 1),
            }),
        );
    }

    issues
}

fn file_issue(
    id: String,
    severity: Severity,
    rule: &str,
    message: String,
    path: &Path,
) -> CodeIssue {
    CodeIssue::new(id, severity, rule, message, path, 1, 1)
}

fn describe(locations: &[DuplicateLocation]) -> String {
    locations
        .iter()
        .map(|l| format!("{}:{}-{}", l.file.display(), l.start_line, l.end_line))
        .collect::<Vec<_>>()
        .join(", ")
}

fn block_issue(
    block: &DuplicatedBlock,
    rule: &str,
    message: String,
    ids: &mut impl FnMut() -> String,
) -> CodeIssue {
    let first = &block.locations[0];
    CodeIssue::new(
        ids(),
        Severity::Warning,
        rule,
        message,
        &first.file,
        first.start_line,
        1,
    )
    .with_range(Range {
        start: Position::new(first.start_line, 1),
        end: Position::new(first.end_line, 1),
    })
    .with_suggestion("Extract the duplicated block into a shared function")
}

fn intra_file_issue(block: &DuplicatedBlock, ids: &mut impl FnMut() -> String) -> CodeIssue {
    let message = format!(
        "Block of {} lines is duplicated within the file at {}",
        block.lines,
        describe(&block.locations)
    );
    block_issue(block, RULE_INTRA_FILE_DUPLICATE, message, ids)
}

fn cross_file_issue(block: &DuplicatedBlock, ids: &mut impl FnMut() -> String) -> CodeIssue {
    let message = format!(
        "Block of {} lines is duplicated across {} files: {}",
        block.lines,
        block.distinct_files(),
        describe(&block.locations)
    );
    block_issue(block, RULE_CROSS_FILE_DUPLICATE, message, ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::complexity::FunctionMetrics;
    use std::collections::BTreeSet;

    fn counter() -> impl FnMut() -> String {
        let mut n = 0;
        move || {
            n += 1;
            format!("t-{n}")
        }
    }

    fn metrics(cc: u32, cog: u32, mi: f64, loc: usize) -> FileMetrics {
        FileMetrics {
            path: PathBuf::from("/src/a.ts"),
            language: SourceLanguage::TypeScript,
            lines_of_code: loc,
            comment_lines: 0,
            blank_lines: 0,
            cyclomatic_complexity: cc,
            cognitive_complexity: cog,
            maintainability_index: mi,
            functions: Vec::new(),
            classes: Vec::new(),
        }
    }

    #[test]
    fn defaults_match_documented_thresholds() {
        let cfg = MetricsConfig::default();
        assert_eq!(cfg.cyclomatic_threshold, 10);
        assert_eq!(cfg.cognitive_threshold, 15);
        assert_eq!(cfg.maintainability_threshold, 20.0);
        assert_eq!(cfg.max_lines_of_code, 300);
        assert_eq!(cfg.duplicate_threshold, 6);
    }

    #[test]
    fn partial_config_value_keeps_defaults() {
        let cfg =
            MetricsConfig::from_value(&serde_json::json!({ "duplicate_threshold": 8 })).unwrap();
        assert_eq!(cfg.duplicate_threshold, 8);
        assert_eq!(cfg.cyclomatic_threshold, 10);
        assert_eq!(
            MetricsConfig::from_value(&serde_json::Value::Null).unwrap(),
            MetricsConfig::default()
        );
    }

    #[test]
    fn malformed_config_is_configuration_error() {
        let err = MetricsConfig::from_value(&serde_json::json!({ "cyclomatic_threshold": "high" }))
            .unwrap_err();
        assert!(matches!(err, PluginError::Configuration(_)));
    }

    #[test]
    fn thresholds_are_strict() {
        let cfg = MetricsConfig::default();
        let at_limit = threshold_issues(&cfg, &metrics(10, 15, 20.0, 300), &mut counter());
        assert!(at_limit.is_empty());

        let over = threshold_issues(&cfg, &metrics(11, 16, 19.9, 301), &mut counter());
        let rules: Vec<&str> = over.iter().map(|i| i.rule_id.as_str()).collect();
        assert_eq!(
            rules,
            vec![
                RULE_CYCLOMATIC,
                RULE_COGNITIVE,
                RULE_MAINTAINABILITY,
                RULE_LINES_OF_CODE
            ]
        );
        assert_eq!(over[3].severity, Severity::Info);
        assert!(over[..3].iter().all(|i| i.severity == Severity::Warning));
    }

    #[test]
    fn complex_function_gets_its_own_warning() {
        let mut m = metrics(3, 0, 90.0, 40);
        m.functions.push(FunctionMetrics {
            name: "dispatch".into(),
            start_line: 5,
            end_line: 30,
            cyclomatic_complexity: 12,
            cognitive_complexity: 4,
            parameter_count: 2,
            called_identifiers: BTreeSet::new(),
        });
        let issues = threshold_issues(&MetricsConfig::default(), &m, &mut counter());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].rule_id, RULE_FUNCTION_COMPLEXITY);
        assert_eq!(issues[0].location.line, 5);
        assert_eq!(issues[0].range.unwrap().end.line, 30);
        assert!(issues[0].message.contains("dispatch"));
    }

    #[tokio::test]
    async fn invalid_window_fails_initialize() {
        let mut plugin = MetricsPlugin::new(serde_json::json!({ "duplicate_threshold": 0 }));
        let err = plugin.initialize().await.unwrap_err();
        assert!(matches!(err, PluginError::Configuration(_)));
    }
}
