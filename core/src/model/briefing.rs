use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};

/// Independent record of a verbal pre-work briefing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BriefingContext {
    #[serde(default)]
    pub work_type: Option<String>,
    #[serde(default)]
    pub hazards: Vec<String>,
    #[serde(default)]
    pub inspector_name: Option<String>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub participants: Option<Vec<String>>,
}

impl BriefingContext {
    pub fn from_json_str(raw: &str) -> CoreResult<Self> {
        serde_json::from_str(raw)
            .map_err(|e| CoreError::InvalidInput(format!("briefing rejected: {}", e)))
    }

    /// Hazards with blank entries removed.
    pub fn declared_hazards(&self) -> Vec<&str> {
        self.hazards
            .iter()
            .map(|h| h.trim())
            .filter(|h| !h.is_empty())
            .collect()
    }
}
