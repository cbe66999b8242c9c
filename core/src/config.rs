use crate::error::{CoreError, CoreResult};
use crate::model::issue::ValidationIssue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

/// Upper bound for `burst_window_minutes` (one week).
pub const MAX_BURST_WINDOW_MINUTES: u64 = 10_080;

#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ValidationMode {
    STRICT,
    DEFAULT,
    LENIENT,
}

/// Thresholds threaded through every stage call. Never mutated after construction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationConfig {
    pub mode: ValidationMode,
    pub na_ratio_threshold: f64,
    pub min_checklist_items: usize,
    pub always_checked_ratio: f64,
    pub always_checked_min_items: usize,
    pub duplicate_description_min: usize,
    pub burst_count: usize,
    pub burst_window_minutes: u64,
    pub history_limit: usize,
    pub history_min_samples: usize,
    pub contextual_max_findings: usize,
    pub assistant_call_timeout_ms: u64,
    pub overall_timeout_ms: u64,
    pub disabled_rules: BTreeSet<String>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self::for_mode(ValidationMode::DEFAULT)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ConfigOverrides {
    mode: ValidationMode,
    na_ratio_threshold: Option<f64>,
    min_checklist_items: Option<usize>,
    always_checked_ratio: Option<f64>,
    always_checked_min_items: Option<usize>,
    duplicate_description_min: Option<usize>,
    burst_count: Option<usize>,
    burst_window_minutes: Option<u64>,
    history_limit: Option<usize>,
    history_min_samples: Option<usize>,
    contextual_max_findings: Option<usize>,
    assistant_call_timeout_ms: Option<u64>,
    overall_timeout_ms: Option<u64>,
    #[serde(default)]
    disabled_rules: Vec<String>,
}

impl ValidationConfig {
    pub fn for_mode(mode: ValidationMode) -> Self {
        let base = Self {
            mode,
            na_ratio_threshold: 0.5,
            min_checklist_items: 5,
            always_checked_ratio: 0.95,
            always_checked_min_items: 50,
            duplicate_description_min: 3,
            burst_count: 5,
            burst_window_minutes: 30,
            history_limit: 20,
            history_min_samples: 5,
            contextual_max_findings: 5,
            assistant_call_timeout_ms: 20_000,
            overall_timeout_ms: 45_000,
            disabled_rules: BTreeSet::new(),
        };
        match mode {
            ValidationMode::DEFAULT => base,
            ValidationMode::STRICT => Self {
                na_ratio_threshold: 0.3,
                min_checklist_items: 8,
                always_checked_ratio: 0.90,
                always_checked_min_items: 30,
                duplicate_description_min: 2,
                ..base
            },
            ValidationMode::LENIENT => Self {
                na_ratio_threshold: 0.7,
                min_checklist_items: 3,
                always_checked_ratio: 0.98,
                always_checked_min_items: 80,
                duplicate_description_min: 4,
                ..base
            },
        }
    }

    /// `{"mode": "...", ...}` with optional per-threshold overrides on top of the mode preset.
    pub fn from_json_str(raw: &str) -> CoreResult<Self> {
        let o: ConfigOverrides = serde_json::from_str(raw)
            .map_err(|e| CoreError::Config(format!("config rejected: {}", e)))?;
        let mut cfg = Self::for_mode(o.mode);
        if let Some(v) = o.na_ratio_threshold {
            cfg.na_ratio_threshold = v;
        }
        if let Some(v) = o.min_checklist_items {
            cfg.min_checklist_items = v;
        }
        if let Some(v) = o.always_checked_ratio {
            cfg.always_checked_ratio = v;
        }
        if let Some(v) = o.always_checked_min_items {
            cfg.always_checked_min_items = v;
        }
        if let Some(v) = o.duplicate_description_min {
            cfg.duplicate_description_min = v;
        }
        if let Some(v) = o.burst_count {
            cfg.burst_count = v;
        }
        if let Some(v) = o.burst_window_minutes {
            cfg.burst_window_minutes = v;
        }
        if let Some(v) = o.history_limit {
            cfg.history_limit = v;
        }
        if let Some(v) = o.history_min_samples {
            cfg.history_min_samples = v;
        }
        if let Some(v) = o.contextual_max_findings {
            cfg.contextual_max_findings = v;
        }
        if let Some(v) = o.assistant_call_timeout_ms {
            cfg.assistant_call_timeout_ms = v;
        }
        if let Some(v) = o.overall_timeout_ms {
            cfg.overall_timeout_ms = v;
        }
        cfg.disabled_rules = o.disabled_rules.into_iter().collect();
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> CoreResult<()> {
        for (name, ratio) in [
            ("na_ratio_threshold", self.na_ratio_threshold),
            ("always_checked_ratio", self.always_checked_ratio),
        ] {
            if !(ratio > 0.0 && ratio <= 1.0) {
                return Err(CoreError::Config(format!(
                    "{} must be in (0, 1], got {}",
                    name, ratio
                )));
            }
        }
        for (name, n) in [
            ("duplicate_description_min", self.duplicate_description_min as u64),
            ("burst_count", self.burst_count as u64),
            ("burst_window_minutes", self.burst_window_minutes),
            ("history_limit", self.history_limit as u64),
            ("assistant_call_timeout_ms", self.assistant_call_timeout_ms),
            ("overall_timeout_ms", self.overall_timeout_ms),
        ] {
            if n == 0 {
                return Err(CoreError::Config(format!("{} must be > 0", name)));
            }
        }
        if self.burst_count < 2 {
            return Err(CoreError::Config("burst_count must be >= 2".to_string()));
        }
        if self.burst_window_minutes > MAX_BURST_WINDOW_MINUTES {
            return Err(CoreError::Config(format!(
                "burst_window_minutes must be <= {}, got {}",
                MAX_BURST_WINDOW_MINUTES, self.burst_window_minutes
            )));
        }
        if self.history_min_samples > self.history_limit {
            return Err(CoreError::Config(format!(
                "history_min_samples ({}) must not exceed history_limit ({})",
                self.history_min_samples, self.history_limit
            )));
        }
        if self.contextual_max_findings == 0 {
            return Err(CoreError::Config(
                "contextual_max_findings must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn rule_enabled(&self, rule_id: &str) -> bool {
        !self.disabled_rules.contains(rule_id)
    }

    pub fn retain_enabled(&self, issues: &mut Vec<ValidationIssue>) {
        if !self.disabled_rules.is_empty() {
            issues.retain(|i| self.rule_enabled(&i.rule_id));
        }
    }

    pub fn assistant_call_timeout(&self) -> Duration {
        Duration::from_millis(self.assistant_call_timeout_ms)
    }

    pub fn overall_timeout(&self) -> Duration {
        Duration::from_millis(self.overall_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_preset_matches_documented_constants() {
        let c = ValidationConfig::default();
        assert_eq!(c.mode, ValidationMode::DEFAULT);
        assert_eq!(c.na_ratio_threshold, 0.5);
        assert_eq!(c.always_checked_ratio, 0.95);
        assert_eq!(c.always_checked_min_items, 50);
        assert_eq!(c.history_limit, 20);
    }

    #[test]
    fn overrides_apply_on_top_of_mode() {
        let c = ValidationConfig::from_json_str(
            r#"{"mode":"STRICT","naRatioThreshold":0.4,"disabledRules":["pattern_all_checked"]}"#,
        )
        .unwrap();
        assert_eq!(c.na_ratio_threshold, 0.4);
        assert_eq!(c.min_checklist_items, 8);
        assert!(!c.rule_enabled("pattern_all_checked"));
    }

    #[test]
    fn rejects_out_of_range_ratio_and_unknown_keys() {
        assert!(ValidationConfig::from_json_str(r#"{"mode":"DEFAULT","naRatioThreshold":1.5}"#)
            .is_err());
        assert!(ValidationConfig::from_json_str(r#"{"mode":"DEFAULT","verbose":true}"#).is_err());
    }

    #[test]
    fn snake_case_keys_are_unknown() {
        let err = ValidationConfig::from_json_str(r#"{"mode":"DEFAULT","burst_count":4}"#);
        assert!(matches!(err, Err(CoreError::Config(_))));
    }

    #[test]
    fn burst_window_is_bounded() {
        let huge = ValidationConfig::from_json_str(
            r#"{"mode":"DEFAULT","burstWindowMinutes":4611686018427387904}"#,
        );
        assert!(matches!(huge, Err(CoreError::Config(_))));

        let week = ValidationConfig::from_json_str(
            r#"{"mode":"DEFAULT","burstWindowMinutes":10080}"#,
        )
        .unwrap();
        assert_eq!(week.burst_window_minutes, MAX_BURST_WINDOW_MINUTES);

        let over = ValidationConfig {
            burst_window_minutes: MAX_BURST_WINDOW_MINUTES + 1,
            ..ValidationConfig::default()
        };
        assert!(over.validate().is_err());
    }

    #[test]
    fn rejects_history_minimum_above_limit() {
        let err = ValidationConfig::from_json_str(
            r#"{"mode":"DEFAULT","historyLimit":4,"historyMinSamples":5}"#,
        );
        assert!(matches!(err, Err(CoreError::Config(_))));
        assert!(ValidationConfig::from_json_str(
            r#"{"mode":"DEFAULT","historyLimit":5,"historyMinSamples":5}"#
        )
        .is_ok());
    }

    #[test]
    fn rejects_zero_contextual_findings() {
        let err =
            ValidationConfig::from_json_str(r#"{"mode":"DEFAULT","contextualMaxFindings":0}"#);
        assert!(matches!(err, Err(CoreError::Config(_))));
    }
}
