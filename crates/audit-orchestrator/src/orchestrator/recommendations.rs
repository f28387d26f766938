//! Recommendation templates.
//!
//! A template inspects the final issue set and derived metrics and emits at
//! most one recommendation. Templates are evaluated in registration order.

use audit_analysis::schema::{
    CodeIssue, Recommendation, RecommendationPriority, RiskLevel, SecurityMetrics, Severity,
};
use tracing::debug;

/// Inputs shared by every template.
#[derive(Debug, Clone, Copy)]
pub struct RecommendationInput<'a> {
    pub issues: &'a [CodeIssue],
    pub quality_score: u32,
    pub security: &'a SecurityMetrics,
}

pub trait RecommendationTemplate: Send + Sync {
    fn name(&self) -> &str;

    fn evaluate(&self, input: &RecommendationInput<'_>) -> Option<Recommendation>;
}

/// The templates an orchestrator starts with.
pub fn default_templates() -> Vec<Box<dyn RecommendationTemplate>> {
    vec![
        Box::new(SecurityTemplate),
        Box::new(CodeQualityTemplate::default()),
    ]
}

pub fn generate(
    templates: &[Box<dyn RecommendationTemplate>],
    input: &RecommendationInput<'_>,
) -> Vec<Recommendation> {
    templates
        .iter()
        .filter_map(|template| {
            let recommendation = template.evaluate(input)?;
            debug!(
                template = template.name(),
                category = %recommendation.category,
                issues = recommendation.issue_ids.len(),
                "Recommendation generated"
            );
            Some(recommendation)
        })
        .collect()
}

// ── Security ─────────────────────────────────────────────────────────

/// Fires when any security-tagged issue is present.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecurityTemplate;

impl RecommendationTemplate for SecurityTemplate {
    fn name(&self) -> &str {
        "security"
    }

    fn evaluate(&self, input: &RecommendationInput<'_>) -> Option<Recommendation> {
        let issue_ids: Vec<String> = input
            .issues
            .iter()
            .filter(|i| i.is_security_related())
            .map(|i| i.id.clone())
            .collect();
        if issue_ids.is_empty() {
            return None;
        }

        let priority = if input.security.risk_level >= RiskLevel::High {
            RecommendationPriority::High
        } else {
            RecommendationPriority::Medium
        };
        Some(Recommendation {
            category: "Security".to_string(),
            priority,
            title: "Address security findings".to_string(),
            description: format!(
                "{} security-related issue(s) found, risk level {}. \
                 Resolve flagged vulnerabilities before release.",
                issue_ids.len(),
                input.security.risk_level
            ),
            issue_ids,
        })
    }
}

// ── Code quality ─────────────────────────────────────────────────────

/// Fires when the quality score drops below `threshold`.
#[derive(Debug, Clone, Copy)]
pub struct CodeQualityTemplate {
    pub threshold: u32,
}

impl Default for CodeQualityTemplate {
    fn default() -> Self {
        Self { threshold: 80 }
    }
}

impl RecommendationTemplate for CodeQualityTemplate {
    fn name(&self) -> &str {
        "code-quality"
    }

    fn evaluate(&self, input: &RecommendationInput<'_>) -> Option<Recommendation> {
        if input.quality_score >= self.threshold {
            return None;
        }

        // Link the issues that weigh most on the score; fall back to all of
        // them when only info findings are present.
        let mut issue_ids: Vec<String> = input
            .issues
            .iter()
            .filter(|i| i.severity != Severity::Info)
            .map(|i| i.id.clone())
            .collect();
        if issue_ids.is_empty() {
            issue_ids = input.issues.iter().map(|i| i.id.clone()).collect();
        }

        let priority = if input.quality_score < 50 {
            RecommendationPriority::High
        } else {
            RecommendationPriority::Medium
        };
        Some(Recommendation {
            category: "Code Quality".to_string(),
            priority,
            title: "Improve code quality".to_string(),
            description: format!(
                "Quality score {}/100 is below {}. Start with error and warning findings.",
                input.quality_score, self.threshold
            ),
            issue_ids,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::scoring;
    use audit_analysis::schema::IssuesByLevel;

    fn issue(id: &str, severity: Severity, rule: &str) -> CodeIssue {
        CodeIssue::new(id, severity, rule, "m", "/src/a.ts", 1, 1)
    }

    fn evaluate(issues: &[CodeIssue]) -> Vec<Recommendation> {
        let security = scoring::security_metrics(issues);
        let input = RecommendationInput {
            issues,
            quality_score: scoring::quality_score(&IssuesByLevel::from_issues(issues)),
            security: &security,
        };
        generate(&default_templates(), &input)
    }

    #[test]
    fn clean_run_has_no_recommendations() {
        assert!(evaluate(&[]).is_empty());
    }

    #[test]
    fn security_issue_links_its_id() {
        let issues = vec![
            issue("a", Severity::Warning, "npm-audit/vulnerability"),
            issue("b", Severity::Info, "style/quotes"),
        ];
        let recs = evaluate(&issues);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].category, "Security");
        assert_eq!(recs[0].issue_ids, vec!["a".to_string()]);
        assert_eq!(recs[0].priority, RecommendationPriority::Medium);
    }

    #[test]
    fn low_quality_links_errors_and_warnings() {
        let issues = vec![
            issue("e1", Severity::Error, "x/y"),
            issue("e2", Severity::Error, "x/y"),
            issue("w1", Severity::Warning, "x/y"),
            issue("i1", Severity::Info, "x/y"),
        ];
        // 100 - (20 + 3 + 1) = 76
        let recs = evaluate(&issues);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].category, "Code Quality");
        assert_eq!(recs[0].issue_ids, vec!["e1", "e2", "w1"]);
        assert!(recs[0].description.contains("76"));
    }

    #[test]
    fn info_only_low_quality_links_everything() {
        let issues: Vec<_> = (0..25)
            .map(|n| issue(&format!("i{n}"), Severity::Info, "x/y"))
            .collect();
        let recs = evaluate(&issues);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].issue_ids.len(), 25);
    }

    #[test]
    fn critical_security_is_high_priority() {
        let issues = vec![issue("s", Severity::Error, "security/hardcoded-secret")];
        let recs = evaluate(&issues);
        let security = recs.iter().find(|r| r.category == "Security").unwrap();
        assert_eq!(security.priority, RecommendationPriority::High);
    }
}
