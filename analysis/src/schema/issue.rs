//! Issue records: the single finding type every analyzer emits.
//!
//! A `CodeIssue` is built once by a plugin during `analyze()` and never
//! mutated afterwards; the orchestrator only moves it into the merged list.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Severity of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// 1-based line/column position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Span covered by a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

/// Where a finding points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub file: PathBuf,
    pub line: usize,
    pub column: usize,
}

/// A single finding with severity, location and message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeIssue {
    pub id: String,
    pub severity: Severity,
    pub message: String,
    /// Rule identifier, e.g. `complexity/cyclomatic` or `security/audit`
    pub rule_id: String,
    pub location: Location,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<Range>,
    #[serde(default)]
    pub fixable: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl CodeIssue {
    pub fn new(
        id: impl Into<String>,
        severity: Severity,
        rule_id: impl Into<String>,
        message: impl Into<String>,
        file: impl AsRef<Path>,
        line: usize,
        column: usize,
    ) -> Self {
        Self {
            id: id.into(),
            severity,
            message: message.into(),
            rule_id: rule_id.into(),
            location: Location {
                file: file.as_ref().to_path_buf(),
                line,
                column,
            },
            range: None,
            fixable: false,
            suggestions: Vec::new(),
        }
    }

    pub fn with_range(mut self, range: Range) -> Self {
        self.range = Some(range);
        self
    }

    pub fn with_fixable(mut self, fixable: bool) -> Self {
        self.fixable = fixable;
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Whether the rule id tags this finding as security-relevant.
    pub fn is_security_related(&self) -> bool {
        let rule = self.rule_id.to_ascii_lowercase();
        rule.contains("vulnerability") || rule.contains("security") || rule.contains("audit")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_serializes_lowercase() {
        let json = serde_json::to_string(&Severity::Warning).unwrap();
        assert_eq!(json, "\"warning\"");
    }

    #[test]
    fn builder_sets_optional_fields() {
        let issue = CodeIssue::new("x-1", Severity::Info, "style/x", "msg", "/a.ts", 3, 1)
            .with_fixable(true)
            .with_suggestion("do the thing")
            .with_range(Range {
                start: Position::new(3, 1),
                end: Position::new(5, 2),
            });
        assert!(issue.fixable);
        assert_eq!(issue.suggestions, vec!["do the thing".to_string()]);
        assert_eq!(issue.range.unwrap().end.line, 5);
        assert_eq!(issue.location.file, PathBuf::from("/a.ts"));
    }

    #[test]
    fn security_tagging_matches_rule_id_keywords() {
        let mk = |rule: &str| CodeIssue::new("i", Severity::Error, rule, "m", "/a", 1, 1);
        assert!(mk("npm-audit/high").is_security_related());
        assert!(mk("Security/eval").is_security_related());
        assert!(mk("dep/vulnerability").is_security_related());
        assert!(!mk("complexity/cyclomatic").is_security_related());
    }
}
