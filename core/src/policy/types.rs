use crate::error::{CoreError, CoreResult};
use crate::model::document::RiskLevel;
use crate::policy::risk_matrix::RiskMatrix;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PolicyAction {
    Stop,
    Warn,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ThresholdRule {
    pub limit: f64,
    pub action: PolicyAction,
    #[serde(default)]
    pub clause: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WeatherPolicy {
    #[serde(default)]
    pub max_wind_speed_ms: Option<ThresholdRule>,
    #[serde(default)]
    pub max_temperature_c: Option<ThresholdRule>,
    #[serde(default)]
    pub min_temperature_c: Option<ThresholdRule>,
    #[serde(default)]
    pub max_precipitation_mm: Option<ThresholdRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HeightWorkPolicy {
    pub clause: String,
    #[serde(default = "default_height_threshold")]
    pub height_threshold_m: f64,
    /// Checklist item ids of protective equipment that must be checked.
    #[serde(default)]
    pub required_ppe: Vec<String>,
    #[serde(default)]
    pub fall_protection: bool,
}

fn default_height_threshold() -> f64 {
    2.0
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HotWorkPolicy {
    pub clause: String,
    #[serde(default)]
    pub extinguisher_count: u32,
    #[serde(default)]
    pub extinguisher_max_distance_m: Option<f64>,
    #[serde(default)]
    pub fire_watch: bool,
    #[serde(default)]
    pub permit: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConfinedSpacePolicy {
    pub clause: String,
    #[serde(default)]
    pub gas_test: bool,
    #[serde(default)]
    pub min_oxygen_pct: Option<f64>,
    #[serde(default)]
    pub max_oxygen_pct: Option<f64>,
    #[serde(default)]
    pub ventilation: bool,
    #[serde(default)]
    pub attendant: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ExcavationPolicy {
    pub clause: String,
    /// Shoring is mandatory when set.
    #[serde(default)]
    pub shoring_depth_m: Option<f64>,
    /// Exit ladder is mandatory when set.
    #[serde(default)]
    pub exit_ladder_max_distance_m: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ElectricalPolicy {
    pub clause: String,
    #[serde(default)]
    pub lockout_tagout: bool,
    #[serde(default)]
    pub insulated_tools: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ActivityPolicies {
    #[serde(default)]
    pub height: Option<HeightWorkPolicy>,
    #[serde(default)]
    pub hot_work: Option<HotWorkPolicy>,
    #[serde(default)]
    pub confined_space: Option<ConfinedSpacePolicy>,
    #[serde(default)]
    pub excavation: Option<ExcavationPolicy>,
    #[serde(default)]
    pub electrical: Option<ElectricalPolicy>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PersonnelPolicy {
    #[serde(default)]
    pub min_workers: Option<u32>,
    #[serde(default)]
    pub max_workers: Option<u32>,
    #[serde(default)]
    pub clause: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct InspectionCadence {
    #[serde(default)]
    pub max_report_age_days: Option<u32>,
    #[serde(default)]
    pub clause: String,
}

/// A site's codified safety requirements. Read-only to the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SiteSafetyPolicy {
    pub site_id: String,
    #[serde(default)]
    pub site_name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub weather: WeatherPolicy,
    #[serde(default)]
    pub activities: ActivityPolicies,
    #[serde(default)]
    pub personnel: PersonnelPolicy,
    #[serde(default)]
    pub inspection: InspectionCadence,
    #[serde(default)]
    pub baseline_risk_level: Option<RiskLevel>,
    #[serde(default)]
    pub risk_matrix: Option<RiskMatrix>,
}

impl SiteSafetyPolicy {
    pub fn from_json_str(raw: &str) -> CoreResult<Self> {
        let policy: SiteSafetyPolicy = serde_json::from_str(raw)
            .map_err(|e| CoreError::InvalidInput(format!("policy rejected: {}", e)))?;
        policy.validate_shape()?;
        Ok(policy)
    }

    pub fn validate_shape(&self) -> CoreResult<()> {
        if self.site_id.trim().is_empty() {
            return Err(CoreError::InvalidInput("siteId cannot be empty".to_string()));
        }
        for (name, rule) in [
            ("maxWindSpeedMs", &self.weather.max_wind_speed_ms),
            ("maxTemperatureC", &self.weather.max_temperature_c),
            ("minTemperatureC", &self.weather.min_temperature_c),
            ("maxPrecipitationMm", &self.weather.max_precipitation_mm),
        ] {
            if let Some(r) = rule {
                if !r.limit.is_finite() {
                    return Err(CoreError::InvalidInput(format!(
                        "weather.{}.limit must be finite",
                        name
                    )));
                }
            }
        }
        if let (Some(min), Some(max)) = (self.personnel.min_workers, self.personnel.max_workers) {
            if min > max {
                return Err(CoreError::InvalidInput(format!(
                    "personnel.minWorkers ({}) exceeds maxWorkers ({})",
                    min, max
                )));
            }
        }
        if let Some(matrix) = &self.risk_matrix {
            let mut names = BTreeSet::new();
            for a in &matrix.activities {
                let key = a.activity.trim().to_lowercase();
                if key.is_empty() {
                    return Err(CoreError::InvalidInput(
                        "riskMatrix activity name cannot be empty".to_string(),
                    ));
                }
                if !names.insert(key) {
                    return Err(CoreError::InvalidInput(format!(
                        "duplicate riskMatrix activity: {}",
                        a.activity
                    )));
                }
            }
        }
        Ok(())
    }
}
