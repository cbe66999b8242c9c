mod common;

use common::*;
use inspection_core::config::ValidationConfig;
use inspection_core::model::document::RiskLevel;
use inspection_core::model::issue::{Severity, ValidationIssue};
use inspection_core::policy::compliance::{check_policy_compliance, requirements_for, PolicyActivity};
use inspection_core::policy::types::SiteSafetyPolicy;
use time::macros::date;

const POLICY: &str = r#"{
  "siteId": "site-nt-01",
  "siteName": "North Tower",
  "weather": {
    "maxWindSpeedMs": {"limit": 10.0, "action": "stop", "clause": "W-1"},
    "maxTemperatureC": {"limit": 33.0, "action": "warn", "clause": "W-2"}
  },
  "activities": {
    "height": {"clause": "H-3.2", "requiredPpe": ["safety_harness"], "fallProtection": false},
    "hotWork": {"clause": "F-1", "extinguisherCount": 2, "extinguisherMaxDistanceM": 10.0, "fireWatch": true}
  },
  "personnel": {"minWorkers": 2, "maxWorkers": 12, "clause": "P-1"},
  "inspection": {"maxReportAgeDays": 7, "clause": "I-1"}
}"#;

fn policy() -> SiteSafetyPolicy {
    SiteSafetyPolicy::from_json_str(POLICY).unwrap()
}

fn ids(issues: &[ValidationIssue]) -> Vec<&str> {
    issues.iter().map(|i| i.rule_id.as_str()).collect()
}

#[test]
fn harness_requirement_flips_with_checklist() {
    let mut items = baseline_items();
    items.push(item("height_work", Checked));
    items.push(item("safety_harness", Unchecked));
    let doc = doc_with(items.clone());
    let issues = check_policy_compliance(&doc, &policy(), None, &ValidationConfig::default());
    assert_eq!(ids(&issues), vec!["structured_height_ppe_safety_harness"]);
    assert_eq!(issues[0].severity, Severity::Error);
    assert!(issues[0].message.contains("H-3.2"));

    let last = items.len() - 1;
    items[last] = item("safety_harness", Checked);
    let doc = doc_with(items);
    let issues = check_policy_compliance(&doc, &policy(), None, &ValidationConfig::default());
    assert!(issues.is_empty(), "unexpected: {:?}", ids(&issues));
}

#[test]
fn absent_requirement_item_counts_as_missing() {
    let mut items = baseline_items();
    items.push(item("hot_work", Checked));
    items.push(item("fire_extinguisher", Checked));
    let doc = doc_with(items);
    let issues = check_policy_compliance(&doc, &policy(), None, &ValidationConfig::default());
    assert_eq!(ids(&issues), vec!["structured_hot_work_fire_watch"]);
    assert!(issues[0].message.contains("not on the checklist"));
}

#[test]
fn ungoverned_or_unperformed_activities_are_ignored() {
    let mut items = baseline_items();
    items.push(item("height_work", Unchecked));
    items.push(item("excavation", Checked));
    let doc = doc_with(items);
    let issues = check_policy_compliance(&doc, &policy(), None, &ValidationConfig::default());
    assert!(issues.is_empty());
    assert!(requirements_for(&policy(), PolicyActivity::Excavation).is_empty());
}

#[test]
fn weather_thresholds_follow_policy_action() {
    let mut doc = doc_with(baseline_items());
    doc.fields.wind_speed_ms = Some(14.0);
    doc.fields.temperature_c = Some(35.5);
    let issues = check_policy_compliance(&doc, &policy(), None, &ValidationConfig::default());
    let wind = issues.iter().find(|i| i.rule_id == "structured_weather_wind").unwrap();
    let heat = issues.iter().find(|i| i.rule_id == "structured_weather_heat").unwrap();
    assert_eq!(wind.severity, Severity::Error);
    assert_eq!(heat.severity, Severity::Warn);

    doc.fields.wind_speed_ms = Some(10.0);
    let issues = check_policy_compliance(&doc, &policy(), None, &ValidationConfig::default());
    assert!(!ids(&issues).contains(&"structured_weather_wind"));
}

#[test]
fn personnel_bounds() {
    let mut doc = doc_with(baseline_items());
    doc.fields.worker_count = Some(1);
    let issues = check_policy_compliance(&doc, &policy(), None, &ValidationConfig::default());
    assert_eq!(ids(&issues), vec!["structured_personnel_min"]);
    assert_eq!(issues[0].severity, Severity::Error);

    doc.fields.worker_count = Some(20);
    let issues = check_policy_compliance(&doc, &policy(), None, &ValidationConfig::default());
    assert_eq!(ids(&issues), vec!["structured_personnel_max"]);
    assert_eq!(issues[0].severity, Severity::Warn);
}

#[test]
fn declared_risk_below_high_baseline_needs_reassessment() {
    let mut p = policy();
    p.baseline_risk_level = Some(RiskLevel::High);
    let mut doc = doc_with(baseline_items());

    doc.risk_level = Some(RiskLevel::Medium);
    let issues = check_policy_compliance(&doc, &p, None, &ValidationConfig::default());
    assert_eq!(ids(&issues), vec!["structured_risk_baseline"]);

    doc.risk_level = Some(RiskLevel::Critical);
    assert!(check_policy_compliance(&doc, &p, None, &ValidationConfig::default()).is_empty());

    doc.risk_level = None;
    let issues = check_policy_compliance(&doc, &p, None, &ValidationConfig::default());
    assert_eq!(ids(&issues), vec!["structured_risk_undeclared"]);

    p.baseline_risk_level = Some(RiskLevel::Medium);
    doc.risk_level = Some(RiskLevel::Low);
    assert!(check_policy_compliance(&doc, &p, None, &ValidationConfig::default()).is_empty());
}

#[test]
fn inspection_cadence_uses_explicit_reference_date() {
    let doc = doc_with(baseline_items());
    let cfg = ValidationConfig::default();

    let issues = check_policy_compliance(&doc, &policy(), Some(date!(2026 - 03 - 20)), &cfg);
    assert_eq!(ids(&issues), vec!["structured_inspection_stale"]);

    let issues = check_policy_compliance(&doc, &policy(), Some(date!(2026 - 03 - 05)), &cfg);
    assert!(issues.is_empty());

    let issues = check_policy_compliance(&doc, &policy(), Some(date!(2026 - 03 - 01)), &cfg);
    assert_eq!(ids(&issues), vec!["structured_inspection_future"]);
}

#[test]
fn policy_shape_errors_are_rejected_at_the_boundary() {
    assert!(SiteSafetyPolicy::from_json_str(r#"{"siteId":"s","surprise":1}"#).is_err());
    assert!(SiteSafetyPolicy::from_json_str(r#"{"siteId":""}"#).is_err());
    assert!(SiteSafetyPolicy::from_json_str(
        r#"{"siteId":"s","personnel":{"minWorkers":5,"maxWorkers":2}}"#
    )
    .is_err());
}
