use crate::config::ValidationMode;
use crate::model::issue::{rank_issues, Severity, ValidationIssue};
use crate::policy::risk_matrix::RiskCalculation;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Completeness,
    Consistency,
    PolicyCompliance,
    RiskMatrix,
    CrossSource,
    Patterns,
    Contextual,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Completed,
    /// Missing optional context; not an error.
    Skipped,
    /// A collaborator failed; the stage returned a fallback or empty result.
    Degraded,
    TimedOut,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StageOutcome {
    pub stage: Stage,
    pub status: StageStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub issue_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_providers: Vec<String>,
}

impl StageOutcome {
    pub fn completed(stage: Stage, issue_count: usize) -> Self {
        Self {
            stage,
            status: StageStatus::Completed,
            reason: None,
            issue_count,
            provider: None,
            failed_providers: Vec::new(),
        }
    }

    pub fn skipped(stage: Stage, reason: impl Into<String>) -> Self {
        Self {
            status: StageStatus::Skipped,
            reason: Some(reason.into()),
            ..Self::completed(stage, 0)
        }
    }

    pub fn degraded(stage: Stage, issue_count: usize, reason: impl Into<String>) -> Self {
        Self {
            status: StageStatus::Degraded,
            reason: Some(reason.into()),
            ..Self::completed(stage, issue_count)
        }
    }

    pub fn timed_out(stage: Stage, issue_count: usize, reason: impl Into<String>) -> Self {
        Self {
            status: StageStatus::TimedOut,
            reason: Some(reason.into()),
            ..Self::completed(stage, issue_count)
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn with_failed_providers(mut self, ids: Vec<String>) -> Self {
        self.failed_providers = ids;
        self
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeveritySummary {
    pub error: usize,
    pub warn: usize,
    pub info: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub validation_id: String,
    pub document_fingerprint: String,
    pub mode: ValidationMode,
    /// Stage order: 1, 2, 3a, 3c, 3b, 4, 5.
    pub issues: Vec<ValidationIssue>,
    pub stages: Vec<StageOutcome>,
    pub risk_assessments: Vec<RiskCalculation>,
}

impl ValidationReport {
    pub fn ranked_issues(&self) -> Vec<ValidationIssue> {
        rank_issues(&self.issues)
    }

    pub fn summary(&self) -> SeveritySummary {
        let mut s = SeveritySummary::default();
        for i in &self.issues {
            match i.severity {
                Severity::Error => s.error += 1,
                Severity::Warn => s.warn += 1,
                Severity::Info => s.info += 1,
            }
        }
        s
    }

    pub fn has_blocking_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    pub fn stage(&self, stage: Stage) -> Option<&StageOutcome> {
        self.stages.iter().find(|s| s.stage == stage)
    }

    pub fn issues_with_prefix<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = &'a ValidationIssue> + 'a {
        self.issues.iter().filter(move |i| i.rule_id.starts_with(prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_outcome_serializes_snake_case_status() {
        let o = StageOutcome::timed_out(Stage::CrossSource, 0, "deadline reached");
        let v = serde_json::to_value(&o).unwrap();
        assert_eq!(v["stage"], "cross_source");
        assert_eq!(v["status"], "timed_out");
        assert_eq!(v["issueCount"], 0);
        assert!(v.get("provider").is_none());
    }

    #[test]
    fn summary_counts_by_severity() {
        let report = ValidationReport {
            validation_id: "v_0".to_string(),
            document_fingerprint: "0".to_string(),
            mode: ValidationMode::DEFAULT,
            issues: vec![
                ValidationIssue::warn("rule_a", "a", "a"),
                ValidationIssue::error("completeness_site_name", "b", "b"),
                ValidationIssue::warn("rule_c", "c", "c"),
            ],
            stages: Vec::new(),
            risk_assessments: Vec::new(),
        };
        assert_eq!(
            report.summary(),
            SeveritySummary {
                error: 1,
                warn: 2,
                info: 0
            }
        );
        assert!(report.has_blocking_errors());
        assert_eq!(report.ranked_issues()[0].rule_id, "completeness_site_name");
        assert_eq!(report.issues_with_prefix("rule_").count(), 2);
    }
}
