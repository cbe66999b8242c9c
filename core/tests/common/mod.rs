#![allow(dead_code)]

use async_trait::async_trait;
use inspection_core::adapters::interface::{AssistantError, AssistantErrorKind, ReasoningAssistant};
use inspection_core::model::checklist::{ChecklistItem, ChecklistValue};
use inspection_core::model::document::{DocumentFields, DocumentRecord, Signatures};
use inspection_core::model::history::HistoricalReportSample;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub use ChecklistValue::{Checked, NotApplicable, Unchecked, Unset};

pub fn item(id: &str, value: ChecklistValue) -> ChecklistItem {
    ChecklistItem::new(id, "safety", &id.replace('_', " "), value)
}

pub fn complete_fields() -> DocumentFields {
    DocumentFields {
        inspection_date: Some("2026-03-02".to_string()),
        site_name: Some("North Tower".to_string()),
        work_description: Some("Install curtain wall panels on level 12".to_string()),
        worker_count: Some(6),
        ..DocumentFields::default()
    }
}

pub fn doc_with(items: Vec<ChecklistItem>) -> DocumentRecord {
    DocumentRecord {
        document_type: "daily_inspection".to_string(),
        fields: complete_fields(),
        signatures: Signatures {
            worker: Some("J. Park".to_string()),
            supervisor: Some("M. Lee".to_string()),
        },
        checklist: items,
        risk_level: None,
        inspector_name: Some("M. Lee".to_string()),
    }
}

/// Baseline items so Stage 2 coverage rules stay quiet.
pub fn baseline_items() -> Vec<ChecklistItem> {
    vec![
        item("safety_helmet", Checked),
        item("safety_shoes", Checked),
        item("safety_briefing", Checked),
    ]
}

pub fn sample(id: &str, created_at: &str, items: &[ChecklistItem], description: &str) -> HistoricalReportSample {
    HistoricalReportSample {
        id: id.to_string(),
        created_at: created_at.to_string(),
        checklist_json: serde_json::to_string(items).unwrap(),
        doc_data_json: serde_json::json!({"fields": {"workDescription": description}}).to_string(),
    }
}

/// Returns the same text on every call and counts calls.
pub struct ScriptedAssistant {
    pub id: String,
    pub reply: String,
    pub calls: AtomicUsize,
}

impl ScriptedAssistant {
    pub fn new(id: &str, reply: &str) -> Self {
        Self {
            id: id.to_string(),
            reply: reply.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReasoningAssistant for ScriptedAssistant {
    fn provider_id(&self) -> &str {
        &self.id
    }

    async fn complete(&self, _prompt: &str) -> Result<String, AssistantError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }
}

pub struct FailingAssistant {
    pub id: String,
}

impl FailingAssistant {
    pub fn new(id: &str) -> Self {
        Self { id: id.to_string() }
    }
}

#[async_trait]
impl ReasoningAssistant for FailingAssistant {
    fn provider_id(&self) -> &str {
        &self.id
    }

    async fn complete(&self, _prompt: &str) -> Result<String, AssistantError> {
        Err(AssistantError::new(
            AssistantErrorKind::UNAVAILABLE,
            &self.id,
            "connection refused",
        ))
    }
}

pub struct SleepingAssistant {
    pub id: String,
    pub delay: Duration,
}

impl SleepingAssistant {
    pub fn new(id: &str, delay: Duration) -> Self {
        Self {
            id: id.to_string(),
            delay,
        }
    }
}

#[async_trait]
impl ReasoningAssistant for SleepingAssistant {
    fn provider_id(&self) -> &str {
        &self.id
    }

    async fn complete(&self, _prompt: &str) -> Result<String, AssistantError> {
        tokio::time::sleep(self.delay).await;
        Ok("{}".to_string())
    }
}
