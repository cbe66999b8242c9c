pub mod rules;

use crate::config::ValidationConfig;
use crate::error::CoreResult;
use crate::model::checklist::{Checklist, ChecklistItem, ChecklistValue};
use crate::model::issue::ValidationIssue;
use rules::{registry_v1, RuleRegistry};

/// Stage 2 engine: registry rules plus coverage and pattern heuristics.
pub struct ConsistencyEngine {
    registry: RuleRegistry,
}

impl ConsistencyEngine {
    pub fn new_v1() -> CoreResult<Self> {
        Ok(Self {
            registry: registry_v1()?,
        })
    }

    pub fn with_registry(registry: RuleRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    pub fn evaluate(&self, items: &[ChecklistItem], config: &ValidationConfig) -> Vec<ValidationIssue> {
        let checklist = Checklist::new(items);
        let mut issues = Vec::new();

        if checklist.is_empty() {
            issues.push(
                ValidationIssue::error(
                    "completeness_no_checklist",
                    "Checklist missing",
                    "The document carries no checklist items; safety measures cannot be verified.",
                )
                .with_category("completeness"),
            );
            config.retain_enabled(&mut issues);
            return issues;
        }

        // All-N/A is handled like a missing checklist: no rule is meaningful against it.
        if checklist.all(ChecklistValue::NotApplicable) {
            push_too_short(&checklist, config, &mut issues);
            issues.push(
                ValidationIssue::error(
                    "pattern_all_na",
                    "Every checklist item marked not applicable",
                    format!(
                        "All {} items are marked not applicable, which is equivalent to submitting no checklist.",
                        checklist.len()
                    ),
                )
                .with_category("suspicious_pattern"),
            );
            config.retain_enabled(&mut issues);
            return issues;
        }

        for rule in &self.registry.rules {
            if !config.rule_enabled(&rule.id) {
                continue;
            }
            if let Some(issue) = rule.evaluate(&checklist) {
                issues.push(issue);
            }
        }

        push_too_short(&checklist, config, &mut issues);

        let na = checklist.count(ChecklistValue::NotApplicable);
        let ratio = na as f64 / checklist.len() as f64;
        if na > 0 && ratio >= config.na_ratio_threshold {
            issues.push(
                ValidationIssue::warn(
                    "pattern_high_na_ratio",
                    "Unusually many items marked not applicable",
                    format!(
                        "{} of {} items ({:.0}%) are marked not applicable; threshold is {:.0}%.",
                        na,
                        checklist.len(),
                        ratio * 100.0,
                        config.na_ratio_threshold * 100.0
                    ),
                )
                .with_category("suspicious_pattern"),
            );
        }

        if checklist.all(ChecklistValue::Checked) {
            issues.push(
                ValidationIssue::info(
                    "pattern_all_checked",
                    "Every checklist item checked",
                    format!(
                        "All {} items are checked. Confirm each measure was actually verified on site.",
                        checklist.len()
                    ),
                )
                .with_category("suspicious_pattern"),
            );
        }

        config.retain_enabled(&mut issues);
        issues
    }
}

fn push_too_short(checklist: &Checklist<'_>, config: &ValidationConfig, out: &mut Vec<ValidationIssue>) {
    if checklist.len() < config.min_checklist_items {
        out.push(
            ValidationIssue::warn(
                "completeness_too_short",
                "Checklist unusually short",
                format!(
                    "The checklist has {} items; at least {} are expected.",
                    checklist.len(),
                    config.min_checklist_items
                ),
            )
            .with_category("completeness"),
        );
    }
}
