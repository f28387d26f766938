//! Audit Analysis Library
//!
//! Deterministic building blocks of the code-quality audit core:
//! - `schema`: issue records and the canonical `AnalysisResultSchema`
//! - `plugin`: the analyzer capability contract (`initialize` / `analyze` / `cleanup`)
//!   and its error taxonomy
//! - `metrics`: the built-in tree-sitter metrics engine (complexity,
//!   maintainability, duplication)
//!
//! Scheduling, scoring and result assembly live in the `audit-orchestrator` crate.

pub mod metrics;
pub mod plugin;
pub mod schema;

pub use metrics::{MetricsConfig, MetricsPlugin, SourceLanguage};
pub use plugin::{AnalysisContext, AnalyzerPlugin, FailureKind, PluginError};
pub use schema::{
    AnalysisMetrics, AnalysisResultSchema, AnalysisSummary, AnalyzedFile, CodeIssue,
    IssuesByLevel, Location, PluginResult, PluginStatus, Position, Range, Recommendation,
    RecommendationPriority, RiskLevel, RunStatus, SecurityMetrics, Severity,
};
