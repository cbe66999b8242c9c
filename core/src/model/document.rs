use crate::error::{CoreError, CoreResult};
use crate::model::checklist::{Checklist, ChecklistItem};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// low=1 .. critical=4
    pub fn ordinal(&self) -> i32 {
        match self {
            RiskLevel::Low => 1,
            RiskLevel::Medium => 2,
            RiskLevel::High => 3,
            RiskLevel::Critical => 4,
        }
    }

    pub fn from_score(score: i32) -> Self {
        if score >= 4 {
            RiskLevel::Critical
        } else if score >= 3 {
            RiskLevel::High
        } else if score >= 2 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DocumentFields {
    #[serde(default)]
    pub inspection_date: Option<String>,
    #[serde(default)]
    pub site_name: Option<String>,
    #[serde(default)]
    pub work_description: Option<String>,
    #[serde(default)]
    pub worker_count: Option<u32>,
    #[serde(default)]
    pub weather_condition: Option<String>,
    #[serde(default)]
    pub temperature_c: Option<f64>,
    #[serde(default)]
    pub wind_speed_ms: Option<f64>,
    #[serde(default)]
    pub precipitation_mm: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Signatures {
    #[serde(default)]
    pub worker: Option<String>,
    #[serde(default)]
    pub supervisor: Option<String>,
}

/// Structured inspection document as handed over by the extraction layer.
/// Read-only to every stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DocumentRecord {
    pub document_type: String,
    #[serde(default)]
    pub fields: DocumentFields,
    #[serde(default)]
    pub signatures: Signatures,
    #[serde(default)]
    pub checklist: Vec<ChecklistItem>,
    #[serde(default)]
    pub risk_level: Option<RiskLevel>,
    #[serde(default)]
    pub inspector_name: Option<String>,
}

impl DocumentRecord {
    pub fn from_json_str(raw: &str) -> CoreResult<Self> {
        let doc: DocumentRecord = serde_json::from_str(raw)
            .map_err(|e| CoreError::InvalidInput(format!("document rejected: {}", e)))?;
        doc.validate_shape()?;
        Ok(doc)
    }

    pub fn validate_shape(&self) -> CoreResult<()> {
        if self.document_type.trim().is_empty() {
            return Err(CoreError::InvalidInput(
                "documentType cannot be empty".to_string(),
            ));
        }
        let mut seen = BTreeSet::new();
        for item in &self.checklist {
            if item.id.trim().is_empty() {
                return Err(CoreError::InvalidInput(
                    "checklist item id cannot be empty".to_string(),
                ));
            }
            if !seen.insert(item.id.as_str()) {
                return Err(CoreError::InvalidInput(format!(
                    "duplicate checklist item id: {}",
                    item.id
                )));
            }
        }
        for (name, v) in [
            ("temperatureC", self.fields.temperature_c),
            ("windSpeedMs", self.fields.wind_speed_ms),
            ("precipitationMm", self.fields.precipitation_mm),
        ] {
            if let Some(x) = v {
                if !x.is_finite() {
                    return Err(CoreError::InvalidInput(format!(
                        "{} must be a finite number",
                        name
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn checklist(&self) -> Checklist<'_> {
        Checklist::new(&self.checklist)
    }

    /// Trimmed work description, `None` when absent or blank.
    pub fn work_description(&self) -> Option<&str> {
        non_blank(self.fields.work_description.as_deref())
    }
}

pub(crate) fn non_blank(v: Option<&str>) -> Option<&str> {
    v.map(str::trim).filter(|s| !s.is_empty())
}
