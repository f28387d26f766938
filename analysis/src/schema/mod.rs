//! Canonical records shared by every analyzer and by the orchestrator.

pub mod issue;
pub mod result;

pub use issue::{CodeIssue, Location, Position, Range, Severity};
pub use result::{
    AnalysisMetrics, AnalysisResultSchema, AnalysisSummary, AnalyzedFile, IssuesByLevel,
    PluginResult, PluginStatus, Recommendation, RecommendationPriority, RiskLevel, RunStatus,
    SecurityMetrics,
};
