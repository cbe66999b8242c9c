use crate::adapters::interface::{AssistantError, ReasoningAssistant};
use crate::adapters::runtime::AssistantChain;
use crate::completeness::check_required_fields;
use crate::config::ValidationConfig;
use crate::determinism::fingerprint::{canonical_fingerprint, validation_id_from_fingerprint_hex32};
use crate::engine::report::{Stage, StageOutcome, ValidationReport};
use crate::engine::request::ValidationRequest;
use crate::error::CoreResult;
use crate::history::patterns::{analyze_reporter_patterns, PatternOutcome, PatternStatus};
use crate::history::store::HistoryStore;
use crate::model::issue::ValidationIssue;
use crate::policy::compliance::check_policy_compliance;
use crate::policy::risk_matrix::{assess_performed_activities, risk_matrix_issues, RiskCalculation};
use crate::reasoning::contextual::{review_contextual_risks, ContextualOutcome};
use crate::reasoning::cross_source::{check_cross_source, keyword_fallback, CrossSourceOutcome};
use crate::reasoning::ReasoningPath;
use crate::validator::ConsistencyEngine;
use std::sync::Arc;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, info_span, warn, Instrument};

/// Runs every stage for one request.
///
/// Holds no per-validation state, so one engine serves concurrent calls.
pub struct ValidationEngine {
    config: ValidationConfig,
    consistency: ConsistencyEngine,
    assistants: Option<AssistantChain>,
    history: Option<Arc<dyn HistoryStore>>,
}

struct StageResult {
    issues: Vec<ValidationIssue>,
    outcome: StageOutcome,
}

impl StageResult {
    fn new(issues: Vec<ValidationIssue>, outcome: StageOutcome) -> Self {
        Self { issues, outcome }
    }

    fn skipped(stage: Stage, reason: &str) -> Self {
        debug!(stage = ?stage, reason, "stage skipped");
        Self::new(Vec::new(), StageOutcome::skipped(stage, reason))
    }
}

impl ValidationEngine {
    pub fn new(config: ValidationConfig) -> CoreResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            consistency: ConsistencyEngine::new_v1()?,
            assistants: None,
            history: None,
        })
    }

    /// Providers are tried in the given order.
    pub fn with_assistants(mut self, providers: Vec<Arc<dyn ReasoningAssistant>>) -> Self {
        self.assistants = Some(AssistantChain::new(
            providers,
            self.config.assistant_call_timeout(),
        ));
        self
    }

    pub fn with_history_store(mut self, store: Arc<dyn HistoryStore>) -> Self {
        self.history = Some(store);
        self
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Only input-shape errors are returned; every collaborator failure is absorbed
    /// into the report.
    pub async fn validate(&self, request: &ValidationRequest) -> CoreResult<ValidationReport> {
        request.validate_shape()?;
        let as_of = request.as_of_date()?;
        let document_fingerprint = canonical_fingerprint(&request.document)?;
        let validation_id = validation_id_from_fingerprint_hex32(&canonical_fingerprint(request)?)?;
        let deadline = Instant::now() + self.config.overall_timeout();
        let cfg = &self.config;
        let doc = &request.document;

        let completeness = {
            let issues = check_required_fields(doc, cfg);
            let n = issues.len();
            StageResult::new(issues, StageOutcome::completed(Stage::Completeness, n))
        };
        let consistency = {
            let issues = self.consistency.evaluate(&doc.checklist, cfg);
            let n = issues.len();
            StageResult::new(issues, StageOutcome::completed(Stage::Consistency, n))
        };
        let compliance = match &request.policy {
            Some(policy) => {
                let issues = check_policy_compliance(doc, policy, as_of, cfg);
                let n = issues.len();
                StageResult::new(issues, StageOutcome::completed(Stage::PolicyCompliance, n))
            }
            None => StageResult::skipped(Stage::PolicyCompliance, "no site policy supplied"),
        };
        let mut risk_assessments: Vec<RiskCalculation> = Vec::new();
        let risk = match request.policy.as_ref().and_then(|p| p.risk_matrix.as_ref()) {
            Some(matrix) => {
                risk_assessments = assess_performed_activities(doc, matrix);
                let issues = risk_matrix_issues(&risk_assessments, cfg);
                let n = issues.len();
                StageResult::new(issues, StageOutcome::completed(Stage::RiskMatrix, n))
            }
            None => StageResult::skipped(Stage::RiskMatrix, "site policy has no risk matrix"),
        };

        let chain = self.assistants.as_ref();
        let cross_source = async {
            match &request.briefing {
                Some(briefing) => Some(check_cross_source(doc, briefing, chain, cfg).await),
                None => None,
            }
        }
        .instrument(info_span!("stage", stage = "cross_source"));
        let patterns = async {
            match (&self.history, &request.reporter) {
                (Some(store), Some(reporter)) => {
                    Ok(analyze_reporter_patterns(store.as_ref(), reporter, cfg).await)
                }
                (None, _) => Err("no history store configured"),
                (_, None) => Err("no reporter supplied"),
            }
        }
        .instrument(info_span!("stage", stage = "patterns"));
        let contextual = review_contextual_risks(doc, request.policy_text.as_deref(), chain, cfg)
            .instrument(info_span!("stage", stage = "contextual"));

        let (cross_res, pattern_res, contextual_res) = tokio::join!(
            timeout_at(deadline, cross_source),
            timeout_at(deadline, patterns),
            timeout_at(deadline, contextual),
        );

        let cross_source = match cross_res {
            Ok(Some(outcome)) => cross_source_result(outcome),
            Ok(None) => StageResult::skipped(Stage::CrossSource, "no briefing supplied"),
            Err(_) => cross_source_timed_out(request, cfg),
        };
        let patterns = match pattern_res {
            Ok(Ok(outcome)) => pattern_result(outcome),
            Ok(Err(reason)) => StageResult::skipped(Stage::Patterns, reason),
            Err(_) => {
                warn!(stage = "patterns", "overall deadline reached");
                StageResult::new(
                    Vec::new(),
                    StageOutcome::timed_out(Stage::Patterns, 0, "overall deadline reached"),
                )
            }
        };
        let contextual = match contextual_res {
            Ok(outcome) => contextual_result(outcome),
            Err(_) => {
                warn!(stage = "contextual", "overall deadline reached");
                StageResult::new(
                    Vec::new(),
                    StageOutcome::timed_out(Stage::Contextual, 0, "overall deadline reached"),
                )
            }
        };

        let mut issues = Vec::new();
        let mut stages = Vec::new();
        for r in [
            completeness,
            consistency,
            compliance,
            risk,
            cross_source,
            patterns,
            contextual,
        ] {
            issues.extend(r.issues);
            stages.push(r.outcome);
        }

        info!(
            validation_id = %validation_id,
            mode = ?cfg.mode,
            issue_count = issues.len(),
            "validation complete"
        );
        Ok(ValidationReport {
            validation_id,
            document_fingerprint,
            mode: cfg.mode,
            issues,
            stages,
            risk_assessments,
        })
    }
}

fn failed_ids(failures: &[AssistantError]) -> Vec<String> {
    failures.iter().map(|f| f.provider_id.clone()).collect()
}

fn cross_source_result(outcome: CrossSourceOutcome) -> StageResult {
    let n = outcome.issues.len();
    let failed = failed_ids(&outcome.failures);
    let stage_outcome = match outcome.path {
        ReasoningPath::Assistant { provider_id } => {
            let completed = StageOutcome::completed(Stage::CrossSource, n)
                .with_provider(provider_id)
                .with_failed_providers(failed);
            match outcome.summary {
                Some(summary) => completed.with_reason(summary),
                None => completed,
            }
        }
        ReasoningPath::KeywordFallback if failed.is_empty() => {
            StageOutcome::completed(Stage::CrossSource, n)
                .with_provider("keyword_fallback")
                .with_reason("no reasoning assistant configured")
        }
        ReasoningPath::KeywordFallback => StageOutcome::degraded(
            Stage::CrossSource,
            n,
            "assistant providers failed; keyword fallback used",
        )
        .with_provider("keyword_fallback")
        .with_failed_providers(failed),
        ReasoningPath::Unavailable => {
            StageOutcome::degraded(Stage::CrossSource, n, "assistant providers failed")
                .with_failed_providers(failed)
        }
        ReasoningPath::Skipped { reason } => StageOutcome::skipped(Stage::CrossSource, reason),
    };
    StageResult::new(outcome.issues, stage_outcome)
}

/// The keyword path is local and cheap, so a timed-out assistant still yields findings.
fn cross_source_timed_out(request: &ValidationRequest, cfg: &ValidationConfig) -> StageResult {
    warn!(stage = "cross_source", "overall deadline reached; keyword fallback used");
    let issues = match &request.briefing {
        Some(b) if !b.declared_hazards().is_empty() => {
            let mut issues = keyword_fallback(&request.document, b);
            cfg.retain_enabled(&mut issues);
            issues
        }
        _ => Vec::new(),
    };
    let n = issues.len();
    StageResult::new(
        issues,
        StageOutcome::timed_out(
            Stage::CrossSource,
            n,
            "overall deadline reached; keyword fallback used",
        )
        .with_provider("keyword_fallback"),
    )
}

fn pattern_result(outcome: PatternOutcome) -> StageResult {
    let n = outcome.issues.len();
    let stage_outcome = match outcome.status {
        PatternStatus::Analyzed { samples } => StageOutcome::completed(Stage::Patterns, n)
            .with_reason(format!("{} samples analyzed", samples)),
        PatternStatus::InsufficientHistory { available, required } => StageOutcome::skipped(
            Stage::Patterns,
            format!("{} of {} required samples available", available, required),
        ),
        PatternStatus::StoreUnavailable { message } => {
            StageOutcome::degraded(Stage::Patterns, n, message)
        }
    };
    StageResult::new(outcome.issues, stage_outcome)
}

fn contextual_result(outcome: ContextualOutcome) -> StageResult {
    let n = outcome.issues.len();
    let failed = failed_ids(&outcome.failures);
    let stage_outcome = match outcome.path {
        ReasoningPath::Assistant { provider_id } => StageOutcome::completed(Stage::Contextual, n)
            .with_provider(provider_id)
            .with_failed_providers(failed),
        ReasoningPath::Skipped { reason } => StageOutcome::skipped(Stage::Contextual, reason),
        ReasoningPath::Unavailable | ReasoningPath::KeywordFallback => {
            StageOutcome::degraded(Stage::Contextual, n, "assistant providers failed")
                .with_failed_providers(failed)
        }
    };
    StageResult::new(outcome.issues, stage_outcome)
}
