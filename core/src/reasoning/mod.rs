pub mod contextual;
pub mod cross_source;

use crate::model::document::DocumentRecord;
use crate::model::issue::Severity;
use serde::{Deserialize, Serialize};

/// Which implementation produced a reasoning stage's findings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "path", rename_all = "snake_case")]
pub enum ReasoningPath {
    Assistant { provider_id: String },
    KeywordFallback,
    Unavailable,
    Skipped { reason: String },
}

/// Severity as written by a model; common synonyms are folded onto the issue scale.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub(crate) enum AiSeverity {
    #[serde(alias = "critical", alias = "high", alias = "ERROR", alias = "HIGH")]
    Error,
    #[serde(alias = "warning", alias = "medium", alias = "WARN", alias = "MEDIUM")]
    Warn,
    #[serde(alias = "low", alias = "INFO", alias = "LOW")]
    Info,
}

impl From<AiSeverity> for Severity {
    fn from(s: AiSeverity) -> Self {
        match s {
            AiSeverity::Error => Severity::Error,
            AiSeverity::Warn => Severity::Warn,
            AiSeverity::Info => Severity::Info,
        }
    }
}

/// Lowercase `[a-z0-9_]` slug for use as a rule-id suffix.
pub(crate) fn rule_suffix(raw: &str, fallback: &str) -> String {
    let mut out = String::new();
    let mut last_underscore = true;
    for ch in raw.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
            last_underscore = false;
        } else if !last_underscore {
            out.push('_');
            last_underscore = true;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    if out.is_empty() {
        fallback.to_string()
    } else {
        out
    }
}

pub(crate) fn checklist_lines(doc: &DocumentRecord) -> String {
    if doc.checklist.is_empty() {
        return "(no checklist items)".to_string();
    }
    doc.checklist
        .iter()
        .map(|i| format!("- {} ({}, {}): {}", i.id, i.name, i.category, i.value.as_str()))
        .collect::<Vec<_>>()
        .join("\n")
}

pub(crate) fn document_lines(doc: &DocumentRecord) -> String {
    let f = &doc.fields;
    let opt = |v: Option<&str>| {
        v.map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("(not recorded)")
            .to_string()
    };
    let num = |v: Option<f64>, unit: &str| {
        v.map(|x| format!("{} {}", x, unit))
            .unwrap_or_else(|| "(not recorded)".to_string())
    };
    [
        format!("Document type: {}", doc.document_type),
        format!("Inspection date: {}", opt(f.inspection_date.as_deref())),
        format!("Site: {}", opt(f.site_name.as_deref())),
        format!("Work description: {}", opt(f.work_description.as_deref())),
        format!(
            "Workers: {}",
            f.worker_count
                .map(|n| n.to_string())
                .unwrap_or_else(|| "(not recorded)".to_string())
        ),
        format!("Weather: {}", opt(f.weather_condition.as_deref())),
        format!("Temperature: {}", num(f.temperature_c, "°C")),
        format!("Wind speed: {}", num(f.wind_speed_ms, "m/s")),
        format!("Precipitation: {}", num(f.precipitation_mm, "mm")),
        format!(
            "Declared risk level: {}",
            doc.risk_level.map(|r| r.as_str()).unwrap_or("(not declared)")
        ),
        format!("Inspector: {}", opt(doc.inspector_name.as_deref())),
    ]
    .join("\n")
}
