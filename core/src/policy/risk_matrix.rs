//! Objective per-activity risk score from a site risk matrix.
//!
//! Score = base ordinal + triggered factor increases - evidenced mitigation
//! reductions, quantized back to a level. Every condition evaluator is total:
//! anything it cannot interpret evaluates to `false`.

use crate::config::ValidationConfig;
use crate::model::checklist::ChecklistValue;
use crate::model::document::{DocumentRecord, RiskLevel};
use crate::model::issue::ValidationIssue;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RiskMatrix {
    #[serde(default)]
    pub activities: Vec<ActivityRisk>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ActivityRisk {
    pub activity: String,
    /// Checklist item marking the activity as performed.
    #[serde(default)]
    pub checklist_item: Option<String>,
    pub base_level: RiskLevel,
    #[serde(default)]
    pub risk_factors: Vec<RiskFactor>,
    #[serde(default)]
    pub mitigations: Vec<Mitigation>,
    #[serde(default)]
    pub prohibited_conditions: Vec<ProhibitedCondition>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RiskFactor {
    pub id: String,
    #[serde(default)]
    pub description: String,
    pub condition: Condition,
    pub increase: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Mitigation {
    pub id: String,
    #[serde(default)]
    pub description: String,
    pub evidence: Condition,
    pub reduction: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProhibitedCondition {
    pub id: String,
    #[serde(default)]
    pub description: String,
    pub condition: Condition,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    ItemChecked { item: String },
    ItemUnchecked { item: String },
    ItemNotApplicable { item: String },
    /// Absent, unchecked, not applicable or unset.
    ItemNotChecked { item: String },
    WindSpeedAbove { value: f64 },
    TemperatureAbove { value: f64 },
    TemperatureBelow { value: f64 },
    PrecipitationAbove { value: f64 },
    WorkersBelow { value: u32 },
    WorkersAbove { value: u32 },
    DescriptionContains { keyword: String },
    WeatherConditionIs { value: String },
    AllOf { conditions: Vec<Condition> },
    AnyOf { conditions: Vec<Condition> },
    Not { condition: Box<Condition> },
    #[serde(other)]
    Unsupported,
}

impl Condition {
    pub fn evaluate(&self, doc: &DocumentRecord) -> bool {
        let checklist = doc.checklist();
        let f = &doc.fields;
        match self {
            Condition::ItemChecked { item } => checklist.is_checked(item),
            Condition::ItemUnchecked { item } => checklist.is_unchecked(item),
            Condition::ItemNotApplicable { item } => checklist.is_not_applicable(item),
            Condition::ItemNotChecked { item } => {
                !item.trim().is_empty() && checklist.value_of(item) != Some(ChecklistValue::Checked)
            }
            Condition::WindSpeedAbove { value } => f.wind_speed_ms.is_some_and(|v| v > *value),
            Condition::TemperatureAbove { value } => f.temperature_c.is_some_and(|v| v > *value),
            Condition::TemperatureBelow { value } => f.temperature_c.is_some_and(|v| v < *value),
            Condition::PrecipitationAbove { value } => {
                f.precipitation_mm.is_some_and(|v| v > *value)
            }
            Condition::WorkersBelow { value } => f.worker_count.is_some_and(|v| v < *value),
            Condition::WorkersAbove { value } => f.worker_count.is_some_and(|v| v > *value),
            Condition::DescriptionContains { keyword } => {
                let needle = keyword.trim().to_lowercase();
                !needle.is_empty()
                    && doc
                        .work_description()
                        .is_some_and(|d| d.to_lowercase().contains(&needle))
            }
            Condition::WeatherConditionIs { value } => f
                .weather_condition
                .as_deref()
                .is_some_and(|w| !value.trim().is_empty() && w.trim().eq_ignore_ascii_case(value.trim())),
            Condition::AllOf { conditions } => {
                !conditions.is_empty() && conditions.iter().all(|c| c.evaluate(doc))
            }
            Condition::AnyOf { conditions } => conditions.iter().any(|c| c.evaluate(doc)),
            Condition::Not { condition } => match condition.as_ref() {
                Condition::Unsupported => false,
                inner => !inner.evaluate(doc),
            },
            Condition::Unsupported => false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RiskCalculation {
    pub activity: String,
    pub base_level: RiskLevel,
    pub triggered_factors: Vec<String>,
    pub applied_mitigations: Vec<String>,
    pub violated_prohibitions: Vec<String>,
    pub score: i32,
    pub calculated_level: RiskLevel,
    pub declared_level: Option<RiskLevel>,
    /// Declared level differs from the calculated one.
    pub inconsistency: bool,
}

impl RiskMatrix {
    pub fn find(&self, activity: &str) -> Option<&ActivityRisk> {
        let key = activity.trim();
        self.activities
            .iter()
            .find(|a| a.activity.trim().eq_ignore_ascii_case(key))
    }
}

/// `None` when the matrix has no entry for `activity`.
pub fn calculate_activity_risk(
    activity: &str,
    doc: &DocumentRecord,
    matrix: &RiskMatrix,
) -> Option<RiskCalculation> {
    let entry = matrix.find(activity)?;
    Some(calculate_entry(entry, doc))
}

fn calculate_entry(entry: &ActivityRisk, doc: &DocumentRecord) -> RiskCalculation {
    let mut score = entry.base_level.ordinal();
    let mut triggered_factors = Vec::new();
    for factor in &entry.risk_factors {
        if factor.condition.evaluate(doc) {
            score = score.saturating_add(factor.increase);
            triggered_factors.push(factor.id.clone());
        }
    }
    let mut applied_mitigations = Vec::new();
    for m in &entry.mitigations {
        if m.evidence.evaluate(doc) {
            score = score.saturating_sub(m.reduction);
            applied_mitigations.push(m.id.clone());
        }
    }
    let violated_prohibitions = entry
        .prohibited_conditions
        .iter()
        .filter(|p| p.condition.evaluate(doc))
        .map(|p| p.id.clone())
        .collect();

    let calculated_level = RiskLevel::from_score(score);
    let declared_level = doc.risk_level;
    RiskCalculation {
        activity: entry.activity.clone(),
        base_level: entry.base_level,
        triggered_factors,
        applied_mitigations,
        violated_prohibitions,
        score,
        calculated_level,
        declared_level,
        inconsistency: declared_level.is_some_and(|d| d != calculated_level),
    }
}

/// Runs the calculator for every matrix activity the document shows as performed.
pub fn assess_performed_activities(doc: &DocumentRecord, matrix: &RiskMatrix) -> Vec<RiskCalculation> {
    let checklist = doc.checklist();
    let description = doc.work_description().map(str::to_lowercase);
    matrix
        .activities
        .iter()
        .filter(|a| match &a.checklist_item {
            Some(item) => checklist.is_checked(item),
            None => description
                .as_deref()
                .is_some_and(|d| d.contains(&a.activity.trim().to_lowercase())),
        })
        .map(|a| calculate_entry(a, doc))
        .collect()
}

pub fn risk_matrix_issues(calcs: &[RiskCalculation], config: &ValidationConfig) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    for c in calcs {
        if !c.violated_prohibitions.is_empty() {
            issues.push(
                ValidationIssue::error(
                    "risk_matrix_prohibited",
                    format!("Prohibited condition for {}", c.activity),
                    format!(
                        "The site risk matrix prohibits {} under the recorded conditions ({}).",
                        c.activity,
                        c.violated_prohibitions.join(", ")
                    ),
                )
                .with_category("risk_matrix"),
            );
        }
        let Some(declared) = c.declared_level else {
            continue;
        };
        if !c.inconsistency {
            continue;
        }
        let detail = format!(
            "Declared '{}' but the matrix gives '{}' for {} (score {}: base {}, factors [{}], mitigations [{}]).",
            declared.as_str(),
            c.calculated_level.as_str(),
            c.activity,
            c.score,
            c.base_level.as_str(),
            c.triggered_factors.join(", "),
            c.applied_mitigations.join(", ")
        );
        let issue = if declared < c.calculated_level {
            ValidationIssue::warn(
                "risk_matrix_underestimated",
                format!("Risk underestimated for {}", c.activity),
                detail,
            )
        } else {
            ValidationIssue::info(
                "risk_matrix_overestimated",
                format!("Risk overestimated for {}", c.activity),
                detail,
            )
        };
        issues.push(issue.with_category("risk_matrix"));
    }
    config.retain_enabled(&mut issues);
    issues
}
