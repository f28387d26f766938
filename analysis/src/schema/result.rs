//! Result schema: the terminal aggregate produced once per orchestration run.
//!
//! Everything here is plain data (primitives, maps, sequences) so the whole
//! value serializes to JSON for CI gating without any custom layout.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use super::issue::{CodeIssue, Severity};

/// Outcome of a single plugin invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PluginStatus {
    Success,
    Failed,
}

impl std::fmt::Display for PluginStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Exactly one per plugin per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginResult {
    pub name: String,
    pub version: String,
    pub execution_time_ms: u64,
    pub status: PluginStatus,
    pub issues_found: usize,
    pub files_processed: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PluginResult {
    pub fn succeeded(
        name: impl Into<String>,
        version: impl Into<String>,
        execution_time_ms: u64,
        issues_found: usize,
        files_processed: usize,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            execution_time_ms,
            status: PluginStatus::Success,
            issues_found,
            files_processed,
            error: None,
        }
    }

    /// A failed invocation never reports issues or processed files.
    pub fn failed(
        name: impl Into<String>,
        version: impl Into<String>,
        execution_time_ms: u64,
        error: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            execution_time_ms,
            status: PluginStatus::Failed,
            issues_found: 0,
            files_processed: 0,
            error: Some(error.into()),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == PluginStatus::Failed
    }
}

/// Per-file record built after every plugin has finished.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzedFile {
    pub path: PathBuf,
    /// Size in bytes (0 when the file could not be stat'ed)
    pub size: u64,
    pub language: String,
    pub issue_count: usize,
    /// Names of plugins that reported at least one issue for this file
    pub plugins: Vec<String>,
}

/// Issue counts keyed by severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuesByLevel {
    pub error: usize,
    pub warning: usize,
    pub info: usize,
}

impl IssuesByLevel {
    pub fn from_issues(issues: &[CodeIssue]) -> Self {
        let mut counts = Self::default();
        for issue in issues {
            counts.increment(issue.severity);
        }
        counts
    }

    pub fn increment(&mut self, severity: Severity) {
        match severity {
            Severity::Error => self.error += 1,
            Severity::Warning => self.warning += 1,
            Severity::Info => self.info += 1,
        }
    }

    pub fn get(&self, severity: Severity) -> usize {
        match severity {
            Severity::Error => self.error,
            Severity::Warning => self.warning,
            Severity::Info => self.info,
        }
    }

    pub fn total(&self) -> usize {
        self.error + self.warning + self.info
    }
}

/// Overall health of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    Partial,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Partial => write!(f, "partial"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub total_files: usize,
    pub total_issues: usize,
    pub issues_by_level: IssuesByLevel,
    pub fixable_issues: usize,
    pub plugins_run: usize,
    pub plugins_failed: usize,
    pub status: RunStatus,
    /// 0 = clean, 1 = error-severity issues present, 2 = a plugin failed
    pub exit_code: i32,
}

/// Security risk classification over security-tagged issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityMetrics {
    pub risk_level: RiskLevel,
    pub security_score: u32,
    pub security_issues: IssuesByLevel,
}

/// Aggregate numbers derived once over the final issue set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisMetrics {
    pub execution_time_ms: u64,
    pub plugin_execution_times: BTreeMap<String, u64>,
    pub quality_score: u32,
    pub technical_debt_hours: f64,
    pub average_issues_per_file: f64,
    pub security: SecurityMetrics,
    /// Complexity-family findings counted by rule id
    pub complexity_distribution: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationPriority {
    High,
    Medium,
    Low,
}

/// Templated summary linking the findings that triggered it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub category: String,
    pub priority: RecommendationPriority,
    pub title: String,
    pub description: String,
    pub issue_ids: Vec<String>,
}

/// Canonical output of one orchestration run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResultSchema {
    pub timestamp: DateTime<Utc>,
    /// Orchestrator configuration the run executed with
    pub configuration: serde_json::Value,
    pub summary: AnalysisSummary,
    pub files: Vec<AnalyzedFile>,
    pub issues: Vec<CodeIssue>,
    pub metrics: AnalysisMetrics,
    pub plugin_results: Vec<PluginResult>,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
}

impl AnalysisResultSchema {
    /// One-line human summary for logs.
    pub fn summary_line(&self) -> String {
        format!(
            "{} issue(s) in {} file(s) [{} error, {} warning, {} info], status {}, exit {}",
            self.summary.total_issues,
            self.summary.total_files,
            self.summary.issues_by_level.error,
            self.summary.issues_by_level.warning,
            self.summary.issues_by_level.info,
            self.summary.status,
            self.summary.exit_code,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_result_reports_nothing_processed() {
        let r = PluginResult::failed("eslint", "1.0.0", 12, "Plugin timeout");
        assert!(r.is_failed());
        assert_eq!(r.issues_found, 0);
        assert_eq!(r.files_processed, 0);
        assert_eq!(r.error.as_deref(), Some("Plugin timeout"));
    }

    #[test]
    fn issues_by_level_counts_each_severity() {
        let issues = vec![
            CodeIssue::new("1", Severity::Error, "r", "m", "/a", 1, 1),
            CodeIssue::new("2", Severity::Error, "r", "m", "/a", 2, 1),
            CodeIssue::new("3", Severity::Info, "r", "m", "/a", 3, 1),
        ];
        let counts = IssuesByLevel::from_issues(&issues);
        assert_eq!(counts.get(Severity::Error), 2);
        assert_eq!(counts.get(Severity::Warning), 0);
        assert_eq!(counts.get(Severity::Info), 1);
        assert_eq!(counts.total(), issues.len());
    }

    #[test]
    fn plugin_status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&PluginStatus::Failed).unwrap(),
            "\"failed\""
        );
        assert_eq!(
            serde_json::to_string(&RiskLevel::Critical).unwrap(),
            "\"critical\""
        );
    }
}
