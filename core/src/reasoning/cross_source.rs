//! Stage 3b: cross-check the document against the pre-work briefing.

use crate::adapters::interface::AssistantError;
use crate::adapters::runtime::AssistantChain;
use crate::config::ValidationConfig;
use crate::model::briefing::BriefingContext;
use crate::model::checklist::{ChecklistItem, ChecklistValue};
use crate::model::document::{non_blank, DocumentRecord};
use crate::model::issue::{rule_ns, ValidationIssue};
use crate::reasoning::{checklist_lines, document_lines, rule_suffix, AiSeverity, ReasoningPath};
use regex::Regex;
use serde::Deserialize;
use std::sync::OnceLock;
use tracing::{info, warn};

const CATEGORY: &str = "cross_document";

#[derive(Debug, Clone, Deserialize)]
struct CrossSourceResponse {
    inconsistencies: Vec<AiInconsistency>,
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default)]
    summary: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AiInconsistency {
    #[serde(rename = "type")]
    kind: String,
    severity: AiSeverity,
    #[serde(default)]
    hazard: Option<String>,
    #[serde(default)]
    checklist_item: Option<String>,
    reason: String,
    #[serde(default)]
    suggestion: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CrossSourceOutcome {
    pub issues: Vec<ValidationIssue>,
    pub path: ReasoningPath,
    pub failures: Vec<AssistantError>,
    /// The assistant's one-line verdict, when it gave one.
    pub summary: Option<String>,
}

pub fn build_cross_source_prompt(doc: &DocumentRecord, briefing: &BriefingContext) -> String {
    let hazards = briefing
        .declared_hazards()
        .iter()
        .map(|h| format!("- {}", h))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "You compare a pre-work safety briefing with the inspection checklist filed for the \
         same work.\n\
         Report every hazard from the briefing that the checklist does not control, every \
         control that is present but not checked, and any mismatch in who ran the \
         inspection.\n\n\
         BRIEFING\n\
         Work type: {work_type}\n\
         Inspector: {inspector}\n\
         Summary: {summary}\n\
         Hazards:\n{hazards}\n\n\
         DOCUMENT\n{document}\n\
         Checklist:\n{checklist}\n\n\
         Answer with one JSON object and nothing else:\n\
         {{\"inconsistencies\": [{{\"type\": \
         \"missing_control|unchecked_control|inspector_mismatch|other\", \
         \"severity\": \"error|warn|info\", \"hazard\": \"...\", \"checklistItem\": \"...\", \
         \"reason\": \"...\", \"suggestion\": \"...\"}}], \"confidence\": 0.0, \
         \"summary\": \"...\"}}",
        work_type = briefing.work_type.as_deref().unwrap_or("(not recorded)"),
        inspector = briefing.inspector_name.as_deref().unwrap_or("(not recorded)"),
        summary = briefing.summary.trim(),
        hazards = hazards,
        document = document_lines(doc),
        checklist = checklist_lines(doc),
    )
}

/// Never fails: assistant errors fall through to the keyword path.
pub async fn check_cross_source(
    doc: &DocumentRecord,
    briefing: &BriefingContext,
    chain: Option<&AssistantChain>,
    config: &ValidationConfig,
) -> CrossSourceOutcome {
    if briefing.declared_hazards().is_empty() {
        return CrossSourceOutcome {
            issues: Vec::new(),
            path: ReasoningPath::Skipped {
                reason: "briefing declares no hazards".to_string(),
            },
            failures: Vec::new(),
            summary: None,
        };
    }

    let mut failures = Vec::new();
    if let Some(chain) = chain.filter(|c| !c.is_empty()) {
        let prompt = build_cross_source_prompt(doc, briefing);
        match chain.complete_json::<CrossSourceResponse>(&prompt).await {
            Ok(success) => {
                let mut issues = assistant_issues(&success.value);
                config.retain_enabled(&mut issues);
                info!(
                    stage = "cross_source",
                    provider = %success.provider_id,
                    issue_count = issues.len(),
                    "assistant cross-check complete"
                );
                let summary = non_blank(success.value.summary.as_deref()).map(str::to_string);
                return CrossSourceOutcome {
                    issues,
                    path: ReasoningPath::Assistant {
                        provider_id: success.provider_id,
                    },
                    failures: success.failures,
                    summary,
                };
            }
            Err(exhausted) => {
                warn!(
                    stage = "cross_source",
                    failed = exhausted.failures.len(),
                    "assistant chain exhausted; using keyword fallback"
                );
                failures = exhausted.failures;
            }
        }
    }

    let mut issues = keyword_fallback(doc, briefing);
    config.retain_enabled(&mut issues);
    CrossSourceOutcome {
        issues,
        path: ReasoningPath::KeywordFallback,
        failures,
        summary: None,
    }
}

fn assistant_issues(resp: &CrossSourceResponse) -> Vec<ValidationIssue> {
    resp.inconsistencies
        .iter()
        .map(|inc| {
            let suffix = rule_suffix(&inc.kind, "inconsistency");
            let mut message = inc.reason.trim().to_string();
            if let Some(item) = non_blank(inc.checklist_item.as_deref()) {
                message.push_str(&format!(" Checklist item: {}.", item));
            }
            if let Some(s) = non_blank(inc.suggestion.as_deref()) {
                message.push_str(&format!(" Suggested action: {}", s));
            }
            if let Some(c) = resp.confidence {
                message.push_str(&format!(" (confidence {:.2})", c));
            }
            let title = match non_blank(inc.hazard.as_deref()) {
                Some(h) => format!("Briefing hazard not reflected: {}", h),
                None => "Briefing and document disagree".to_string(),
            };
            ValidationIssue::new(
                inc.severity.into(),
                format!("{}{}", rule_ns::CROSS_DOC_AI, suffix),
                title,
                message,
            )
            .with_category(CATEGORY)
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HazardCategory {
    Fall,
    Fire,
    Electrical,
    ConfinedSpace,
}

impl HazardCategory {
    const ALL: [HazardCategory; 4] = [
        HazardCategory::Fall,
        HazardCategory::Fire,
        HazardCategory::Electrical,
        HazardCategory::ConfinedSpace,
    ];

    fn label(&self) -> &'static str {
        match self {
            HazardCategory::Fall => "fall",
            HazardCategory::Fire => "fire",
            HazardCategory::Electrical => "electrical",
            HazardCategory::ConfinedSpace => "confined space",
        }
    }

    fn pattern_source(&self) -> &'static str {
        match self {
            HazardCategory::Fall => concat!(
                r"(?i)\b(?:fall(?:s|ing|en)?|heights?|ladders?|scaffold\w*|roof\w*",
                r"|edges?|harness(?:es)?)\b"
            ),
            HazardCategory::Fire => concat!(
                r"(?i)\b(?:fires?|weld\w*|hot\s+work|cutting|grind\w*|sparks?",
                r"|flammable|extinguishers?)\b"
            ),
            HazardCategory::Electrical => {
                r"(?i)\b(?:electric\w*|shocks?|voltage|live\s+wires?|lockout|arc\s+flash)\b"
            }
            HazardCategory::ConfinedSpace => concat!(
                r"(?i)\b(?:confined|manholes?|tanks?|oxygen|toxic\s+gas(?:es)?",
                r"|asphyx\w*|gas\s+test\w*)\b"
            ),
        }
    }

    fn pattern(&self) -> &'static Regex {
        static RES: OnceLock<[Regex; 4]> = OnceLock::new();
        let all = RES.get_or_init(|| {
            HazardCategory::ALL
                .map(|c| Regex::new(c.pattern_source()).expect("static hazard regex must compile"))
        });
        &all[*self as usize]
    }

    fn item_ids(&self) -> &'static [&'static str] {
        match self {
            HazardCategory::Fall => &[
                "height_work",
                "safety_harness",
                "fall_protection",
                "scaffolding",
                "scaffold_inspection",
            ],
            HazardCategory::Fire => &[
                "hot_work",
                "fire_extinguisher",
                "fire_watch",
                "hot_work_permit",
            ],
            HazardCategory::Electrical => &["electrical_work", "lockout_tagout", "insulated_tools"],
            HazardCategory::ConfinedSpace => &[
                "confined_space",
                "gas_test",
                "ventilation",
                "standby_attendant",
            ],
        }
    }

    /// Whole-word match, so "rainfall" is not a fall hazard.
    fn mentioned_in(&self, text: &str) -> bool {
        self.pattern().is_match(text)
    }

    fn covers(&self, item: &ChecklistItem) -> bool {
        self.item_ids().contains(&item.id.as_str()) || self.mentioned_in(&item.name)
    }
}

/// Deterministic fallback: keyword categories, checklist coverage, inspector identity.
pub fn keyword_fallback(doc: &DocumentRecord, briefing: &BriefingContext) -> Vec<ValidationIssue> {
    let hazards = briefing.declared_hazards();
    let mut issues = Vec::new();

    for category in HazardCategory::ALL {
        let mentions: Vec<&str> = hazards
            .iter()
            .copied()
            .filter(|h| category.mentioned_in(h))
            .collect();
        if mentions.is_empty() {
            continue;
        }
        let matching: Vec<&ChecklistItem> =
            doc.checklist.iter().filter(|i| category.covers(i)).collect();
        if matching.is_empty() {
            issues.push(
                ValidationIssue::warn(
                    format!("{}hazard_unaddressed", rule_ns::CROSS_DOC_KEYWORD),
                    format!("Briefing {} hazard has no checklist control", category.label()),
                    format!(
                        "The briefing names '{}' but the checklist has no {} item.",
                        mentions.join("', '"),
                        category.label()
                    ),
                )
                .with_category(CATEGORY),
            );
            continue;
        }
        let not_checked: Vec<String> = matching
            .iter()
            .filter(|i| i.value != ChecklistValue::Checked)
            .map(|i| format!("{} ({})", i.name, i.value.as_str()))
            .collect();
        if !not_checked.is_empty() {
            issues.push(
                ValidationIssue::warn(
                    format!("{}hazard_unchecked", rule_ns::CROSS_DOC_KEYWORD),
                    format!("Briefing {} hazard control not confirmed", category.label()),
                    format!(
                        "The briefing names '{}' but these related items are not checked: {}.",
                        mentions.join("', '"),
                        not_checked.join(", ")
                    ),
                )
                .with_category(CATEGORY),
            );
        }
    }

    if let (Some(briefed), Some(documented)) = (
        non_blank(briefing.inspector_name.as_deref()),
        non_blank(doc.inspector_name.as_deref()),
    ) {
        if normalize_name(briefed) != normalize_name(documented) {
            issues.push(
                ValidationIssue::info(
                    format!("{}inspector_mismatch", rule_ns::CROSS_DOC_KEYWORD),
                    "Inspector differs from briefing",
                    format!(
                        "The briefing was led by '{}' but the document names '{}' as inspector.",
                        briefed, documented
                    ),
                )
                .with_category(CATEGORY),
            );
        }
    }

    issues
}

fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
