//! Derived metrics computed once over the merged issue set.
//!
//! | Metric               | Formula                                              |
//! |----------------------|------------------------------------------------------|
//! | quality score        | `max(0, 100 - (10*errors + 3*warnings + 1*info))`    |
//! | technical debt (h)   | `2.0*errors + 0.5*warnings + 0.1*info`               |
//! | security score       | `max(0, 100 - (25*e + 10*w + 5*i))` over tagged only |
//! | exit code            | 2 if any plugin failed, else 1 if errors, else 0     |
//! | status               | partial if any plugin failed or any error, else success |

use std::collections::BTreeMap;

use audit_analysis::schema::{
    CodeIssue, IssuesByLevel, RiskLevel, RunStatus, SecurityMetrics,
};

const COMPLEXITY_RULE_PREFIX: &str = "complexity/";

/// Security warnings above this count raise the risk to `high`.
const HIGH_RISK_WARNING_COUNT: usize = 5;

pub fn quality_score(counts: &IssuesByLevel) -> u32 {
    let penalty = weighted(counts, 10, 3, 1);
    100u64.saturating_sub(penalty) as u32
}

pub fn technical_debt_hours(counts: &IssuesByLevel) -> f64 {
    2.0 * counts.error as f64 + 0.5 * counts.warning as f64 + 0.1 * counts.info as f64
}

/// Risk level and score over the security-tagged subset of `issues`.
pub fn security_metrics(issues: &[CodeIssue]) -> SecurityMetrics {
    let mut tagged = IssuesByLevel::default();
    for issue in issues.iter().filter(|i| i.is_security_related()) {
        tagged.increment(issue.severity);
    }

    let risk_level = if tagged.error > 0 {
        RiskLevel::Critical
    } else if tagged.warning > HIGH_RISK_WARNING_COUNT {
        RiskLevel::High
    } else if tagged.warning > 0 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    SecurityMetrics {
        risk_level,
        security_score: 100u64.saturating_sub(weighted(&tagged, 25, 10, 5)) as u32,
        security_issues: tagged,
    }
}

/// Plugin failure dominates error findings.
pub fn exit_code(any_plugin_failed: bool, counts: &IssuesByLevel) -> i32 {
    if any_plugin_failed {
        2
    } else if counts.error > 0 {
        1
    } else {
        0
    }
}

/// `partial` when a plugin failed or any error-severity finding exists.
pub fn run_status(any_plugin_failed: bool, counts: &IssuesByLevel) -> RunStatus {
    if any_plugin_failed || counts.error > 0 {
        RunStatus::Partial
    } else {
        RunStatus::Success
    }
}

/// Issue counts per complexity rule.
pub fn complexity_distribution(issues: &[CodeIssue]) -> BTreeMap<String, usize> {
    let mut distribution = BTreeMap::new();
    for issue in issues
        .iter()
        .filter(|i| i.rule_id.starts_with(COMPLEXITY_RULE_PREFIX))
    {
        *distribution.entry(issue.rule_id.clone()).or_insert(0) += 1;
    }
    distribution
}

fn weighted(counts: &IssuesByLevel, error: u64, warning: u64, info: u64) -> u64 {
    (counts.error as u64)
        .saturating_mul(error)
        .saturating_add((counts.warning as u64).saturating_mul(warning))
        .saturating_add((counts.info as u64).saturating_mul(info))
}
