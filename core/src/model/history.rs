use crate::model::checklist::ChecklistItem;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Read-only projection of one past submission. Payloads stay as stored JSON text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalReportSample {
    pub id: String,
    pub created_at: String,
    pub checklist_json: String,
    pub doc_data_json: String,
}

impl HistoricalReportSample {
    /// `None` when the timestamp is not RFC 3339.
    pub fn created_at(&self) -> Option<OffsetDateTime> {
        OffsetDateTime::parse(self.created_at.trim(), &Rfc3339).ok()
    }

    /// Stored checklist items; an unreadable payload counts as no items.
    pub fn checklist_items(&self) -> Vec<ChecklistItem> {
        match serde_json::from_str::<Value>(&self.checklist_json) {
            Ok(Value::Array(values)) => values
                .into_iter()
                .filter_map(|v| serde_json::from_value::<ChecklistItem>(v).ok())
                .collect(),
            Ok(Value::Object(mut map)) => match map.remove("checklist") {
                Some(Value::Array(values)) => values
                    .into_iter()
                    .filter_map(|v| serde_json::from_value::<ChecklistItem>(v).ok())
                    .collect(),
                _ => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    /// Work description from the stored document data, accepting either the
    /// nested `fields.workDescription` shape or a flat `workDescription` key.
    pub fn work_description(&self) -> Option<String> {
        let v: Value = serde_json::from_str(&self.doc_data_json).ok()?;
        let text = v
            .get("fields")
            .and_then(|f| f.get("workDescription"))
            .or_else(|| v.get("workDescription"))
            .and_then(|x| x.as_str())?;
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}
