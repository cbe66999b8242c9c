//! Stage 5: latent risks implied by the work and its environment.

use crate::adapters::interface::AssistantError;
use crate::adapters::runtime::AssistantChain;
use crate::config::ValidationConfig;
use crate::model::document::{non_blank, DocumentRecord};
use crate::model::issue::{rule_ns, ValidationIssue};
use crate::reasoning::{checklist_lines, document_lines, AiSeverity, ReasoningPath};
use serde::Deserialize;
use tracing::{info, warn};

const POLICY_TEXT_LIMIT: usize = 4000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextualCategory {
    Weather,
    LoneWorker,
    MissingPrecaution,
    Environmental,
    Temporal,
    RegulatoryGap,
}

impl ContextualCategory {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "weather" => Some(ContextualCategory::Weather),
            "lone_worker" => Some(ContextualCategory::LoneWorker),
            "missing_precaution" => Some(ContextualCategory::MissingPrecaution),
            "environmental" => Some(ContextualCategory::Environmental),
            "temporal" => Some(ContextualCategory::Temporal),
            "regulatory_gap" => Some(ContextualCategory::RegulatoryGap),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContextualCategory::Weather => "weather",
            ContextualCategory::LoneWorker => "lone_worker",
            ContextualCategory::MissingPrecaution => "missing_precaution",
            ContextualCategory::Environmental => "environmental",
            ContextualCategory::Temporal => "temporal",
            ContextualCategory::RegulatoryGap => "regulatory_gap",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ContextualResponse {
    risks: Vec<AiRisk>,
}

#[derive(Debug, Clone, Deserialize)]
struct AiRisk {
    category: String,
    severity: AiSeverity,
    title: String,
    description: String,
    #[serde(default)]
    suggestion: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ContextualOutcome {
    pub issues: Vec<ValidationIssue>,
    pub path: ReasoningPath,
    pub failures: Vec<AssistantError>,
}

impl ContextualOutcome {
    fn empty(path: ReasoningPath, failures: Vec<AssistantError>) -> Self {
        Self {
            issues: Vec::new(),
            path,
            failures,
        }
    }
}

pub fn build_contextual_prompt(
    doc: &DocumentRecord,
    policy_text: Option<&str>,
    max_findings: usize,
) -> String {
    let policy = match policy_text.map(str::trim).filter(|t| !t.is_empty()) {
        Some(text) => {
            let clipped: String = text.chars().take(POLICY_TEXT_LIMIT).collect();
            format!("SITE POLICY (excerpt)\n{}\n\n", clipped)
        }
        None => String::new(),
    };
    format!(
        "You are a construction safety reviewer. Read the inspection record below and name \
         risks that the work description, crew, weather or timing imply but that a checklist \
         cannot catch.\n\
         Do not report contradictions between checklist items; those are checked elsewhere.\n\
         Report at most {max} risks. Use only these categories: weather, lone_worker, \
         missing_precaution, environmental, temporal, regulatory_gap.\n\n\
         {policy}DOCUMENT\n{document}\n\
         Checklist:\n{checklist}\n\n\
         Answer with one JSON object and nothing else:\n\
         {{\"risks\": [{{\"category\": \"...\", \"severity\": \"error|warn|info\", \
         \"title\": \"...\", \"description\": \"...\", \"suggestion\": \"...\"}}]}}",
        max = max_findings,
        policy = policy,
        document = document_lines(doc),
        checklist = checklist_lines(doc),
    )
}

/// Non-critical: every failure degrades to an empty finding list.
pub async fn review_contextual_risks(
    doc: &DocumentRecord,
    policy_text: Option<&str>,
    chain: Option<&AssistantChain>,
    config: &ValidationConfig,
) -> ContextualOutcome {
    if doc.work_description().is_none() {
        return ContextualOutcome::empty(
            ReasoningPath::Skipped {
                reason: "work description absent".to_string(),
            },
            Vec::new(),
        );
    }
    let Some(chain) = chain.filter(|c| !c.is_empty()) else {
        return ContextualOutcome::empty(
            ReasoningPath::Skipped {
                reason: "no reasoning assistant configured".to_string(),
            },
            Vec::new(),
        );
    };

    let prompt = build_contextual_prompt(doc, policy_text, config.contextual_max_findings);
    match chain.complete_json::<ContextualResponse>(&prompt).await {
        Ok(success) => {
            let mut issues = contextual_issues(&success.value, config.contextual_max_findings);
            config.retain_enabled(&mut issues);
            info!(
                stage = "contextual",
                provider = %success.provider_id,
                issue_count = issues.len(),
                "contextual review complete"
            );
            ContextualOutcome {
                issues,
                path: ReasoningPath::Assistant {
                    provider_id: success.provider_id,
                },
                failures: success.failures,
            }
        }
        Err(exhausted) => {
            warn!(
                stage = "contextual",
                failed = exhausted.failures.len(),
                "assistant chain exhausted; contextual review dropped"
            );
            ContextualOutcome::empty(ReasoningPath::Unavailable, exhausted.failures)
        }
    }
}

fn contextual_issues(resp: &ContextualResponse, max_findings: usize) -> Vec<ValidationIssue> {
    resp.risks
        .iter()
        .filter_map(|r| {
            let category = ContextualCategory::parse(&r.category)?;
            let title = non_blank(Some(r.title.as_str()))?;
            let mut message = r.description.trim().to_string();
            if let Some(s) = non_blank(r.suggestion.as_deref()) {
                message.push_str(&format!(" Suggested action: {}", s));
            }
            Some(
                ValidationIssue::new(
                    r.severity.into(),
                    format!("{}{}", rule_ns::CONTEXTUAL, category.as_str()),
                    title,
                    message,
                )
                .with_category(category.as_str()),
            )
        })
        .take(max_findings)
        .collect()
}
