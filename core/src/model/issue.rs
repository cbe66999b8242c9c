use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warn,
    Info,
}

impl Severity {
    /// Lower ranks first.
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Error => 0,
            Severity::Warn => 1,
            Severity::Info => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warn => "warn",
            Severity::Info => "info",
        }
    }
}

/// Rule-id prefixes. Consumers route UI treatment on these, so they never change meaning.
pub mod rule_ns {
    pub const RULE: &str = "rule_";
    pub const COMPLETENESS: &str = "completeness_";
    pub const PATTERN: &str = "pattern_";
    pub const STRUCTURED: &str = "structured_";
    pub const RISK_MATRIX: &str = "risk_matrix_";
    pub const CROSS_DOC: &str = "cross_doc_";
    pub const CROSS_DOC_AI: &str = "cross_doc_ai_";
    pub const CROSS_DOC_KEYWORD: &str = "cross_doc_kw_";
    pub const CONTEXTUAL: &str = "contextual_";
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    pub severity: Severity,
    pub title: String,
    pub message: String,
    pub rule_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl ValidationIssue {
    pub fn new(
        severity: Severity,
        rule_id: impl Into<String>,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            title: title.into(),
            message: message.into(),
            rule_id: rule_id.into(),
            category: None,
        }
    }

    pub fn error(
        rule_id: impl Into<String>,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(Severity::Error, rule_id, title, message)
    }

    pub fn warn(
        rule_id: impl Into<String>,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(Severity::Warn, rule_id, title, message)
    }

    pub fn info(
        rule_id: impl Into<String>,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::new(Severity::Info, rule_id, title, message)
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// Stable sort by severity; stage order is kept within a severity.
pub fn rank_issues(issues: &[ValidationIssue]) -> Vec<ValidationIssue> {
    let mut out = issues.to_vec();
    out.sort_by_key(|i| i.severity.rank());
    out
}
