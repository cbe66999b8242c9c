use crate::error::{CoreError, CoreResult};
use crate::model::checklist::Checklist;
use crate::model::issue::{rule_ns, Severity, ValidationIssue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const REGISTRY_VERSION: &str = "consistency_rules_v1";

#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RuleCategory {
    safety_violation,
    logical_contradiction,
    suspicious_pattern,
    completeness,
}

impl RuleCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleCategory::safety_violation => "safety_violation",
            RuleCategory::logical_contradiction => "logical_contradiction",
            RuleCategory::suspicious_pattern => "suspicious_pattern",
            RuleCategory::completeness => "completeness",
        }
    }

    fn id_prefix(&self) -> &'static str {
        match self {
            RuleCategory::safety_violation | RuleCategory::logical_contradiction => rule_ns::RULE,
            RuleCategory::suspicious_pattern => rule_ns::PATTERN,
            RuleCategory::completeness => rule_ns::COMPLETENESS,
        }
    }
}

/// Checklist predicate. Each variant reads items by id only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RulePredicate {
    /// Activity performed while its mandated countermeasure is explicitly not done.
    ActivityWithoutCountermeasure {
        activity: String,
        countermeasure: String,
    },
    /// Countermeasure recorded for an activity that was marked not performed.
    CountermeasureWithoutActivity {
        activity: String,
        countermeasure: String,
    },
    ItemNotApplicable { item: String },
    ItemMissing { item: String },
}

impl RulePredicate {
    pub fn holds(&self, checklist: &Checklist<'_>) -> bool {
        match self {
            RulePredicate::ActivityWithoutCountermeasure {
                activity,
                countermeasure,
            } => checklist.is_checked(activity) && checklist.is_unchecked(countermeasure),
            RulePredicate::CountermeasureWithoutActivity {
                activity,
                countermeasure,
            } => checklist.is_unchecked(activity) && checklist.is_checked(countermeasure),
            RulePredicate::ItemNotApplicable { item } => checklist.is_not_applicable(item),
            RulePredicate::ItemMissing { item } => !checklist.contains(item),
        }
    }

    fn describe(&self, checklist: &Checklist<'_>) -> String {
        let label = |id: &str| {
            checklist
                .get(id)
                .map(|i| i.name.clone())
                .unwrap_or_else(|| id.to_string())
        };
        match self {
            RulePredicate::ActivityWithoutCountermeasure {
                activity,
                countermeasure,
            } => format!(
                "'{}' is checked but '{}' is unchecked.",
                label(activity),
                label(countermeasure)
            ),
            RulePredicate::CountermeasureWithoutActivity {
                activity,
                countermeasure,
            } => format!(
                "'{}' is checked although '{}' is unchecked.",
                label(countermeasure),
                label(activity)
            ),
            RulePredicate::ItemNotApplicable { item } => {
                format!("'{}' is marked not applicable.", label(item))
            }
            RulePredicate::ItemMissing { item } => {
                format!("Required item '{}' is absent from the checklist.", item)
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsistencyRule {
    pub id: String,
    pub category: RuleCategory,
    pub severity: Severity,
    pub title: String,
    pub predicate: RulePredicate,
    pub guidance: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regulation_reference: Option<String>,
}

impl ConsistencyRule {
    pub fn evaluate(&self, checklist: &Checklist<'_>) -> Option<ValidationIssue> {
        if !self.predicate.holds(checklist) {
            return None;
        }
        let mut message = format!("{} {}", self.predicate.describe(checklist), self.guidance);
        if let Some(reference) = &self.regulation_reference {
            message.push_str(&format!(" ({})", reference));
        }
        Some(
            ValidationIssue::new(self.severity, self.id.clone(), self.title.clone(), message)
                .with_category(self.category.as_str()),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleRegistry {
    pub registry_version: String,
    pub rules: Vec<ConsistencyRule>,
}

impl RuleRegistry {
    pub fn from_json_str(raw: &str) -> CoreResult<Self> {
        let mut reg: RuleRegistry = serde_json::from_str(raw)
            .map_err(|e| CoreError::RuleRegistry(format!("registry parse failed: {}", e)))?;
        reg.check()?;
        reg.rules.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(reg)
    }

    fn check(&self) -> CoreResult<()> {
        let mut ids = BTreeSet::new();
        for rule in &self.rules {
            if !rule.id.starts_with(rule.category.id_prefix()) {
                return Err(CoreError::RuleRegistry(format!(
                    "rule {} must use the {} prefix for category {}",
                    rule.id,
                    rule.category.id_prefix(),
                    rule.category.as_str()
                )));
            }
            if !ids.insert(rule.id.as_str()) {
                return Err(CoreError::RuleRegistry(format!(
                    "duplicate rule id {}",
                    rule.id
                )));
            }
        }
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&ConsistencyRule> {
        self.rules.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

pub fn registry_v1() -> CoreResult<RuleRegistry> {
    let reg = RuleRegistry::from_json_str(include_str!("rules_v1.json"))?;
    if reg.registry_version != REGISTRY_VERSION {
        return Err(CoreError::RuleRegistry(format!(
            "embedded registry is not {}",
            REGISTRY_VERSION
        )));
    }
    Ok(reg)
}
