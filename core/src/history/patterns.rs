//! Stage 4: statistical anomalies across a reporter's recent submissions.
//!
//! Every call re-fetches and re-aggregates; nothing is retained between calls.

use crate::config::ValidationConfig;
use crate::history::store::HistoryStore;
use crate::model::checklist::ChecklistValue;
use crate::model::history::HistoricalReportSample;
use crate::model::issue::ValidationIssue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use time::Duration;
use tracing::{debug, info, warn};

const CATEGORY: &str = "behavior";
const EXCERPT_CHARS: usize = 60;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReporterRef {
    pub reporter_id: String,
    #[serde(default)]
    pub site_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternStatus {
    Analyzed { samples: usize },
    InsufficientHistory { available: usize, required: usize },
    StoreUnavailable { message: String },
}

#[derive(Debug, Clone)]
pub struct PatternOutcome {
    pub issues: Vec<ValidationIssue>,
    pub status: PatternStatus,
}

pub async fn analyze_reporter_patterns(
    store: &dyn HistoryStore,
    reporter: &ReporterRef,
    config: &ValidationConfig,
) -> PatternOutcome {
    let fetched = store
        .fetch_recent(
            &reporter.reporter_id,
            reporter.site_id.as_deref(),
            config.history_limit,
        )
        .await;
    let mut samples = match fetched {
        Ok(s) => s,
        Err(e) => {
            warn!(
                stage = "patterns",
                backend = store.backend_tag(),
                reporter_id = %reporter.reporter_id,
                "history fetch failed: {}",
                e
            );
            return PatternOutcome {
                issues: Vec::new(),
                status: PatternStatus::StoreUnavailable {
                    message: e.to_string(),
                },
            };
        }
    };
    samples.truncate(config.history_limit);

    if samples.len() < config.history_min_samples {
        debug!(
            stage = "patterns",
            reporter_id = %reporter.reporter_id,
            available = samples.len(),
            "not enough history for pattern analysis"
        );
        return PatternOutcome {
            issues: Vec::new(),
            status: PatternStatus::InsufficientHistory {
                available: samples.len(),
                required: config.history_min_samples,
            },
        };
    }

    let issues = analyze_samples(&samples, config);
    info!(
        stage = "patterns",
        reporter_id = %reporter.reporter_id,
        samples = samples.len(),
        issue_count = issues.len(),
        "pattern analysis complete"
    );
    PatternOutcome {
        issues,
        status: PatternStatus::Analyzed {
            samples: samples.len(),
        },
    }
}

/// The three indicators over an already-fetched window. Empty below the minimum sample count.
pub fn analyze_samples(
    samples: &[HistoricalReportSample],
    config: &ValidationConfig,
) -> Vec<ValidationIssue> {
    if samples.len() < config.history_min_samples {
        return Vec::new();
    }
    let mut issues = Vec::new();
    issues.extend(always_checked_bias(samples, config));
    issues.extend(duplicate_narratives(samples, config));
    issues.extend(burst_submission(samples, config));
    config.retain_enabled(&mut issues);
    issues
}

fn always_checked_bias(
    samples: &[HistoricalReportSample],
    config: &ValidationConfig,
) -> Option<ValidationIssue> {
    let mut checked = 0usize;
    let mut unchecked = 0usize;
    for s in samples {
        for item in s.checklist_items() {
            match item.value {
                ChecklistValue::Checked => checked += 1,
                ChecklistValue::Unchecked => unchecked += 1,
                ChecklistValue::NotApplicable | ChecklistValue::Unset => {}
            }
        }
    }
    let denominator = checked + unchecked;
    if denominator == 0 || denominator < config.always_checked_min_items {
        return None;
    }
    let ratio = checked as f64 / denominator as f64;
    if ratio <= config.always_checked_ratio {
        return None;
    }
    Some(
        ValidationIssue::warn(
            "pattern_always_check",
            "Reporter checks nearly every item",
            format!(
                "{} of {} answered items ({:.1}%) across the last {} submissions are checked. \
                 Spot-check that measures are verified rather than ticked by habit.",
                checked,
                denominator,
                ratio * 100.0,
                samples.len()
            ),
        )
        .with_category(CATEGORY),
    )
}

fn duplicate_narratives(
    samples: &[HistoricalReportSample],
    config: &ValidationConfig,
) -> Vec<ValidationIssue> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for s in samples {
        if let Some(text) = s.work_description() {
            *counts.entry(text).or_default() += 1;
        }
    }
    let mut repeated: Vec<(String, usize)> = counts
        .into_iter()
        .filter(|(_, n)| *n >= config.duplicate_description_min)
        .collect();
    repeated.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    repeated
        .into_iter()
        .map(|(text, n)| {
            ValidationIssue::warn(
                "pattern_duplicate_description",
                "Work description repeated verbatim",
                format!(
                    "The description \"{}\" appears in {} of the last {} submissions.",
                    excerpt(&text),
                    n,
                    samples.len()
                ),
            )
            .with_category(CATEGORY)
        })
        .collect()
}

fn burst_submission(
    samples: &[HistoricalReportSample],
    config: &ValidationConfig,
) -> Option<ValidationIssue> {
    let mut stamps: Vec<_> = samples.iter().filter_map(|s| s.created_at()).collect();
    if stamps.len() < config.burst_count {
        return None;
    }
    stamps.sort();
    let window = burst_window(config.burst_window_minutes)?;
    let span = config.burst_count - 1;
    stamps.windows(config.burst_count).find_map(|w| {
        let elapsed = w[span] - w[0];
        if elapsed <= window {
            Some(
                ValidationIssue::info(
                    "pattern_burst_submission",
                    "Submissions filed in a burst",
                    format!(
                        "{} submissions were filed within {} minute(s), starting {}.",
                        config.burst_count,
                        elapsed.whole_minutes(),
                        w[0].date()
                    ),
                )
                .with_category(CATEGORY),
            )
        } else {
            None
        }
    })
}

/// `None` when the minute count does not fit a signed duration.
fn burst_window(minutes: u64) -> Option<Duration> {
    i64::try_from(minutes)
        .ok()
        .and_then(|m| m.checked_mul(60))
        .map(Duration::seconds)
}

fn excerpt(text: &str) -> String {
    if text.chars().count() <= EXCERPT_CHARS {
        return text.to_string();
    }
    let head: String = text.chars().take(EXCERPT_CHARS).collect();
    format!("{}...", head)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_window_refuses_overflowing_minutes() {
        assert_eq!(burst_window(30), Some(Duration::minutes(30)));
        assert_eq!(burst_window(4_611_686_018_427_387_904), None);
        assert_eq!(burst_window(u64::MAX), None);
    }
}
