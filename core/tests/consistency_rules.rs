mod common;

use common::*;
use inspection_core::config::{ValidationConfig, ValidationMode};
use inspection_core::model::issue::Severity;
use inspection_core::validator::ConsistencyEngine;

fn engine() -> ConsistencyEngine {
    ConsistencyEngine::new_v1().unwrap()
}

fn ids(issues: &[inspection_core::model::issue::ValidationIssue]) -> Vec<&str> {
    issues.iter().map(|i| i.rule_id.as_str()).collect()
}

#[test]
fn activity_without_countermeasure_emits_exactly_one_error() {
    let mut items = baseline_items();
    items.push(item("height_work", Checked));
    items.push(item("safety_harness", Unchecked));
    items.push(item("fall_protection", Checked));

    let issues = engine().evaluate(&items, &ValidationConfig::default());
    let hits: Vec<_> = issues
        .iter()
        .filter(|i| i.rule_id == "rule_height_without_harness")
        .collect();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].severity, Severity::Error);
    assert_eq!(hits[0].category.as_deref(), Some("safety_violation"));
}

#[test]
fn countermeasure_checked_or_activity_not_checked_is_quiet() {
    let cfg = ValidationConfig::default();
    for (activity, harness) in [(Checked, Checked), (Unchecked, Unchecked), (NotApplicable, Unchecked), (Unset, Unchecked)] {
        let mut items = baseline_items();
        items.push(item("height_work", activity));
        items.push(item("safety_harness", harness));
        items.push(item("fall_protection", Checked));
        let issues = engine().evaluate(&items, &cfg);
        assert!(
            !ids(&issues).contains(&"rule_height_without_harness"),
            "{:?}/{:?} fired",
            activity,
            harness
        );
    }
}

#[test]
fn countermeasure_without_activity_is_a_contradiction_warning() {
    let mut items = baseline_items();
    items.push(item("hot_work", Unchecked));
    items.push(item("fire_watch", Checked));
    let issues = engine().evaluate(&items, &ValidationConfig::default());
    let hit = issues
        .iter()
        .find(|i| i.rule_id == "rule_fire_watch_without_hot_work")
        .unwrap();
    assert_eq!(hit.severity, Severity::Warn);
}

#[test]
fn empty_checklist_short_circuits_to_single_error() {
    let issues = engine().evaluate(&[], &ValidationConfig::default());
    assert_eq!(ids(&issues), vec!["completeness_no_checklist"]);
    assert_eq!(issues[0].severity, Severity::Error);
}

#[test]
fn short_checklist_always_flags_too_short() {
    let items = vec![item("height_work", Unchecked), item("safety_helmet", Checked)];
    let issues = engine().evaluate(&items, &ValidationConfig::default());
    assert!(ids(&issues).contains(&"completeness_too_short"));
}

#[test]
fn all_checked_emits_one_info() {
    let mut items = baseline_items();
    items.push(item("height_work", Checked));
    items.push(item("safety_harness", Checked));
    items.push(item("fall_protection", Checked));
    let issues = engine().evaluate(&items, &ValidationConfig::default());
    let hits: Vec<_> = issues
        .iter()
        .filter(|i| i.rule_id == "pattern_all_checked")
        .collect();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].severity, Severity::Info);
}

#[test]
fn all_not_applicable_is_one_error_and_no_rules() {
    let items: Vec<_> = [
        "safety_helmet",
        "safety_shoes",
        "safety_briefing",
        "height_work",
        "safety_harness",
        "hot_work",
    ]
    .iter()
    .map(|id| item(id, NotApplicable))
    .collect();
    let issues = engine().evaluate(&items, &ValidationConfig::default());
    assert_eq!(ids(&issues), vec!["pattern_all_na"]);
    assert_eq!(issues[0].severity, Severity::Error);
}

#[test]
fn high_na_ratio_and_safety_critical_na() {
    let items = vec![
        item("safety_helmet", NotApplicable),
        item("safety_shoes", Checked),
        item("safety_briefing", Checked),
        item("scaffolding", NotApplicable),
        item("hot_work", NotApplicable),
        item("excavation", Unchecked),
    ];
    let issues = engine().evaluate(&items, &ValidationConfig::default());
    let got = ids(&issues);
    assert!(got.contains(&"pattern_na_safety_helmet"));
    assert!(got.contains(&"pattern_high_na_ratio"));

    let lenient = ValidationConfig::for_mode(ValidationMode::LENIENT);
    let issues = engine().evaluate(&items, &lenient);
    assert!(!ids(&issues).contains(&"pattern_high_na_ratio"));
}

#[test]
fn missing_required_item_is_reported_by_id() {
    let items = vec![
        item("safety_helmet", Checked),
        item("safety_briefing", Checked),
        item("height_work", Unchecked),
        item("hot_work", Unchecked),
        item("excavation", Unchecked),
    ];
    let issues = engine().evaluate(&items, &ValidationConfig::default());
    assert!(ids(&issues).contains(&"completeness_missing_safety_shoes"));
    assert!(!ids(&issues).contains(&"completeness_missing_safety_helmet"));
}

#[test]
fn item_order_does_not_change_findings() {
    let mut items = baseline_items();
    items.push(item("height_work", Checked));
    items.push(item("safety_harness", Unchecked));
    items.push(item("confined_space", Checked));
    items.push(item("gas_test", Unchecked));
    let forward = engine().evaluate(&items, &ValidationConfig::default());
    items.reverse();
    let backward = engine().evaluate(&items, &ValidationConfig::default());
    assert_eq!(forward, backward);
}

#[test]
fn disabled_rules_are_never_emitted() {
    let mut items = baseline_items();
    items.push(item("height_work", Checked));
    items.push(item("safety_harness", Unchecked));
    items.push(item("fall_protection", Unchecked));
    let mut cfg = ValidationConfig::default();
    cfg.disabled_rules.insert("rule_height_without_harness".to_string());
    cfg.disabled_rules.insert("completeness_too_short".to_string());
    let issues = engine().evaluate(&items, &cfg);
    assert!(!ids(&issues).contains(&"rule_height_without_harness"));
    assert!(!ids(&issues).contains(&"completeness_too_short"));
    assert!(ids(&issues).contains(&"rule_height_without_fall_protection"));
}
