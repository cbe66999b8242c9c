mod common;

use common::*;
use inspection_core::adapters::interface::ReasoningAssistant;
use inspection_core::config::{ValidationConfig, ValidationMode};
use inspection_core::determinism::json_canonical::to_canonical_bytes;
use inspection_core::engine::{Stage, StageStatus, ValidationEngine, ValidationRequest};
use inspection_core::history::store::{HistoryStore, InMemoryHistoryStore};
use inspection_core::model::briefing::BriefingContext;
use inspection_core::model::document::RiskLevel;
use inspection_core::policy::types::SiteSafetyPolicy;
use std::sync::Arc;
use std::time::Duration;

const POLICY: &str = r#"{
  "siteId": "site-nt-01",
  "activities": {"height": {"clause": "H-3.2", "requiredPpe": ["safety_harness"]}},
  "riskMatrix": {"activities": [
    {"activity": "height", "checklistItem": "height_work", "baseLevel": "medium",
     "riskFactors": [{"id": "wind", "condition": {"type": "wind_speed_above", "value": 8.0}, "increase": 2}]}
  ]}
}"#;

fn briefing() -> BriefingContext {
    BriefingContext {
        hazards: vec!["Fall from the slab edge".to_string()],
        inspector_name: Some("M. Lee".to_string()),
        summary: "Facade panels".to_string(),
        ..BriefingContext::default()
    }
}

fn rich_request() -> ValidationRequest {
    let mut items = baseline_items();
    items.push(item("height_work", Checked));
    items.push(item("safety_harness", Unchecked));
    items.push(item("fall_protection", Checked));
    let mut doc = doc_with(items);
    doc.fields.wind_speed_ms = Some(9.5);
    doc.risk_level = Some(RiskLevel::Medium);
    ValidationRequest::new(doc)
        .with_policy(SiteSafetyPolicy::from_json_str(POLICY).unwrap())
        .with_briefing(briefing())
}

#[tokio::test]
async fn missing_basics_and_empty_checklist() {
    let mut doc = doc_with(Vec::new());
    doc.fields.inspection_date = None;
    doc.signatures.worker = None;
    let engine = ValidationEngine::new(ValidationConfig::default()).unwrap();
    let report = engine.validate(&ValidationRequest::new(doc)).await.unwrap();

    let ids: Vec<&str> = report.issues.iter().map(|i| i.rule_id.as_str()).collect();
    assert!(ids.contains(&"completeness_inspection_date"));
    assert!(ids.contains(&"completeness_signature_worker"));
    assert!(ids.contains(&"completeness_no_checklist"));
    assert_eq!(report.issues_with_prefix("rule_").count(), 0);
    assert!(report.has_blocking_errors());
    assert_eq!(report.stage(Stage::PolicyCompliance).unwrap().status, StageStatus::Skipped);
    assert_eq!(report.stage(Stage::Patterns).unwrap().status, StageStatus::Skipped);
}

#[tokio::test]
async fn issues_follow_stage_order() {
    let engine = ValidationEngine::new(ValidationConfig::default()).unwrap();
    let report = engine.validate(&rich_request()).await.unwrap();
    let prefixes: Vec<&str> = report
        .issues
        .iter()
        .map(|i| i.rule_id.split('_').next().unwrap_or(""))
        .collect();
    let first = |p: &str| prefixes.iter().position(|x| *x == p).unwrap();
    assert!(first("rule") < first("structured"));
    assert!(first("structured") < first("risk"));
    assert!(first("risk") < first("cross"));

    let height = &report.risk_assessments[0];
    assert_eq!(height.calculated_level, RiskLevel::Critical);
    assert!(height.inconsistency);
    let cross = report.stage(Stage::CrossSource).unwrap();
    assert_eq!(cross.status, StageStatus::Completed);
    assert_eq!(cross.provider.as_deref(), Some("keyword_fallback"));
    assert_eq!(report.stages.len(), 7);
}

#[tokio::test]
async fn deterministic_output_for_identical_input() {
    let engine = ValidationEngine::new(ValidationConfig::default()).unwrap();
    let a = engine.validate(&rich_request()).await.unwrap();
    let b = engine.validate(&rich_request()).await.unwrap();
    assert_eq!(a.validation_id, b.validation_id);
    assert!(a.validation_id.starts_with("v_"));
    assert_eq!(a.validation_id.len(), 34);
    assert_eq!(
        to_canonical_bytes(&a).unwrap(),
        to_canonical_bytes(&b).unwrap()
    );

    let other = engine
        .validate(&rich_request().with_as_of("2026-03-02"))
        .await
        .unwrap();
    assert_ne!(a.validation_id, other.validation_id);
    assert_eq!(a.document_fingerprint, other.document_fingerprint);
}

#[tokio::test]
async fn failing_assistants_degrade_but_keep_earlier_issues() {
    let p1: Arc<dyn ReasoningAssistant> = Arc::new(FailingAssistant::new("primary"));
    let p2: Arc<dyn ReasoningAssistant> = Arc::new(FailingAssistant::new("secondary"));
    let engine = ValidationEngine::new(ValidationConfig::default())
        .unwrap()
        .with_assistants(vec![p1, p2]);
    let report = engine.validate(&rich_request()).await.unwrap();

    let cross = report.stage(Stage::CrossSource).unwrap();
    assert_eq!(cross.status, StageStatus::Degraded);
    assert_eq!(cross.failed_providers, vec!["primary", "secondary"]);
    assert!(report.issues_with_prefix("cross_doc_kw_").count() > 0);

    let contextual = report.stage(Stage::Contextual).unwrap();
    assert_eq!(contextual.status, StageStatus::Degraded);
    assert_eq!(report.issues_with_prefix("contextual_").count(), 0);
    assert!(report.issues_with_prefix("rule_height_without_harness").count() == 1);
}

#[tokio::test]
async fn overall_deadline_bounds_slow_stages() {
    let mut cfg = ValidationConfig::default();
    cfg.overall_timeout_ms = 50;
    cfg.assistant_call_timeout_ms = 10_000;
    let slow: Arc<dyn ReasoningAssistant> =
        Arc::new(SleepingAssistant::new("slow", Duration::from_secs(10)));
    let engine = ValidationEngine::new(cfg).unwrap().with_assistants(vec![slow]);

    let started = std::time::Instant::now();
    let report = engine.validate(&rich_request()).await.unwrap();
    assert!(started.elapsed() < Duration::from_secs(5));

    let cross = report.stage(Stage::CrossSource).unwrap();
    assert_eq!(cross.status, StageStatus::TimedOut);
    assert!(report.issues_with_prefix("cross_doc_kw_").count() > 0);
    assert_eq!(report.stage(Stage::Contextual).unwrap().status, StageStatus::TimedOut);
    assert_eq!(report.issues_with_prefix("rule_").count(), 1);
}

#[tokio::test]
async fn history_stage_runs_when_store_and_reporter_present() {
    let store = Arc::new(InMemoryHistoryStore::new());
    for n in 0..6 {
        let t = format!("2026-02-{:02}T09:00:00Z", n + 1);
        store
            .insert("rep-1", Some("site-nt-01"), sample(&format!("s{}", n), &t, &[item("a", Checked)], "Same words"))
            .await;
    }
    let engine = ValidationEngine::new(ValidationConfig::for_mode(ValidationMode::STRICT))
        .unwrap()
        .with_history_store(store.clone() as Arc<dyn HistoryStore>);
    let report = engine
        .validate(&rich_request().with_reporter("rep-1", Some("site-nt-01")))
        .await
        .unwrap();
    assert_eq!(report.mode, ValidationMode::STRICT);
    assert_eq!(report.stage(Stage::Patterns).unwrap().status, StageStatus::Completed);
    assert_eq!(report.issues_with_prefix("pattern_duplicate_description").count(), 1);
}

#[tokio::test]
async fn malformed_request_is_the_only_fatal_error() {
    let engine = ValidationEngine::new(ValidationConfig::default()).unwrap();
    let mut req = rich_request();
    req.document.checklist.push(item("height_work", Unchecked));
    assert!(engine.validate(&req).await.is_err());

    let bad_date = rich_request().with_as_of("yesterday");
    assert!(engine.validate(&bad_date).await.is_err());
}
