use crate::completeness::parse_inspection_date;
use crate::config::ValidationConfig;
use crate::model::checklist::{Checklist, ChecklistValue};
use crate::model::document::{DocumentRecord, RiskLevel};
use crate::model::issue::{Severity, ValidationIssue};
use crate::policy::types::{PolicyAction, SiteSafetyPolicy, ThresholdRule};
use time::Date;

const CATEGORY: &str = "policy";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyActivity {
    Height,
    HotWork,
    ConfinedSpace,
    Excavation,
    Electrical,
}

impl PolicyActivity {
    pub const ALL: [PolicyActivity; 5] = [
        PolicyActivity::Height,
        PolicyActivity::HotWork,
        PolicyActivity::ConfinedSpace,
        PolicyActivity::Excavation,
        PolicyActivity::Electrical,
    ];

    /// Checklist item that marks the activity as performed.
    pub fn item_id(&self) -> &'static str {
        match self {
            PolicyActivity::Height => "height_work",
            PolicyActivity::HotWork => "hot_work",
            PolicyActivity::ConfinedSpace => "confined_space",
            PolicyActivity::Excavation => "excavation",
            PolicyActivity::Electrical => "electrical_work",
        }
    }

    fn rule_key(&self) -> &'static str {
        match self {
            PolicyActivity::Height => "height",
            PolicyActivity::HotWork => "hot_work",
            PolicyActivity::ConfinedSpace => "confined_space",
            PolicyActivity::Excavation => "excavation",
            PolicyActivity::Electrical => "electrical",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PolicyActivity::Height => "work at height",
            PolicyActivity::HotWork => "hot work",
            PolicyActivity::ConfinedSpace => "confined space entry",
            PolicyActivity::Excavation => "excavation",
            PolicyActivity::Electrical => "electrical work",
        }
    }
}

/// One mandatory policy requirement, verified by checklist lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyRequirement {
    pub activity: PolicyActivity,
    pub key: String,
    pub item_id: String,
    pub label: String,
    pub clause: String,
    pub remediation: String,
}

impl PolicyRequirement {
    fn new(
        activity: PolicyActivity,
        key: &str,
        item_id: &str,
        label: &str,
        clause: &str,
        remediation: String,
    ) -> Self {
        Self {
            activity,
            key: key.to_string(),
            item_id: item_id.to_string(),
            label: label.to_string(),
            clause: clause.to_string(),
            remediation,
        }
    }

    pub fn rule_id(&self) -> String {
        format!("structured_{}_{}", self.activity.rule_key(), self.key)
    }
}

/// Mandatory requirements the policy attaches to `activity`. Empty when the policy does not govern it.
pub fn requirements_for(policy: &SiteSafetyPolicy, activity: PolicyActivity) -> Vec<PolicyRequirement> {
    let a = &policy.activities;
    let mut out = Vec::new();
    match activity {
        PolicyActivity::Height => {
            if let Some(p) = &a.height {
                for ppe in &p.required_ppe {
                    out.push(PolicyRequirement::new(
                        activity,
                        &format!("ppe_{}", ppe),
                        ppe,
                        &ppe.replace('_', " "),
                        &p.clause,
                        format!(
                            "Issue and verify '{}' for everyone working above {} m.",
                            ppe, p.height_threshold_m
                        ),
                    ));
                }
                if p.fall_protection {
                    out.push(PolicyRequirement::new(
                        activity,
                        "fall_protection",
                        "fall_protection",
                        "fall protection",
                        &p.clause,
                        format!(
                            "Install guardrails or nets at open edges above {} m.",
                            p.height_threshold_m
                        ),
                    ));
                }
            }
        }
        PolicyActivity::HotWork => {
            if let Some(p) = &a.hot_work {
                if p.extinguisher_count > 0 {
                    let placement = p
                        .extinguisher_max_distance_m
                        .map(|d| format!(" within {} m of the work", d))
                        .unwrap_or_default();
                    out.push(PolicyRequirement::new(
                        activity,
                        "extinguisher",
                        "fire_extinguisher",
                        "fire extinguisher",
                        &p.clause,
                        format!(
                            "Place at least {} extinguisher(s){}.",
                            p.extinguisher_count, placement
                        ),
                    ));
                }
                if p.fire_watch {
                    out.push(PolicyRequirement::new(
                        activity,
                        "fire_watch",
                        "fire_watch",
                        "fire watch",
                        &p.clause,
                        "Assign a dedicated fire watch during and after the work.".to_string(),
                    ));
                }
                if p.permit {
                    out.push(PolicyRequirement::new(
                        activity,
                        "permit",
                        "hot_work_permit",
                        "hot work permit",
                        &p.clause,
                        "Obtain the site hot work permit before starting.".to_string(),
                    ));
                }
            }
        }
        PolicyActivity::ConfinedSpace => {
            if let Some(p) = &a.confined_space {
                if p.gas_test {
                    let range = match (p.min_oxygen_pct, p.max_oxygen_pct) {
                        (Some(lo), Some(hi)) => format!(" Oxygen must read {}%-{}%.", lo, hi),
                        (Some(lo), None) => format!(" Oxygen must read at least {}%.", lo),
                        (None, Some(hi)) => format!(" Oxygen must not exceed {}%.", hi),
                        (None, None) => String::new(),
                    };
                    out.push(PolicyRequirement::new(
                        activity,
                        "gas_test",
                        "gas_test",
                        "gas and oxygen test",
                        &p.clause,
                        format!("Measure atmosphere before entry and record the readings.{}", range),
                    ));
                }
                if p.ventilation {
                    out.push(PolicyRequirement::new(
                        activity,
                        "ventilation",
                        "ventilation",
                        "ventilation",
                        &p.clause,
                        "Run forced-air ventilation for the whole entry.".to_string(),
                    ));
                }
                if p.attendant {
                    out.push(PolicyRequirement::new(
                        activity,
                        "attendant",
                        "standby_attendant",
                        "standby attendant",
                        &p.clause,
                        "Station an attendant at the entry point.".to_string(),
                    ));
                }
            }
        }
        PolicyActivity::Excavation => {
            if let Some(p) = &a.excavation {
                if let Some(depth) = p.shoring_depth_m {
                    out.push(PolicyRequirement::new(
                        activity,
                        "shoring",
                        "shoring",
                        "shoring",
                        &p.clause,
                        format!("Shore or slope walls of excavations deeper than {} m.", depth),
                    ));
                }
                if let Some(distance) = p.exit_ladder_max_distance_m {
                    out.push(PolicyRequirement::new(
                        activity,
                        "exit_ladder",
                        "exit_ladder",
                        "exit ladder",
                        &p.clause,
                        format!("Provide an exit ladder within {} m of every worker.", distance),
                    ));
                }
            }
        }
        PolicyActivity::Electrical => {
            if let Some(p) = &a.electrical {
                if p.lockout_tagout {
                    out.push(PolicyRequirement::new(
                        activity,
                        "lockout_tagout",
                        "lockout_tagout",
                        "lockout/tagout",
                        &p.clause,
                        "Lock and tag every energy source before work starts.".to_string(),
                    ));
                }
                if p.insulated_tools {
                    out.push(PolicyRequirement::new(
                        activity,
                        "insulated_tools",
                        "insulated_tools",
                        "insulated tools",
                        &p.clause,
                        "Use insulated tools rated for the circuit voltage.".to_string(),
                    ));
                }
            }
        }
    }
    out
}

/// Stage 3a: the document against its site policy.
pub fn check_policy_compliance(
    doc: &DocumentRecord,
    policy: &SiteSafetyPolicy,
    as_of: Option<Date>,
    config: &ValidationConfig,
) -> Vec<ValidationIssue> {
    let checklist = doc.checklist();
    let mut issues = Vec::new();

    for activity in PolicyActivity::ALL {
        if !checklist.is_checked(activity.item_id()) {
            continue;
        }
        for req in requirements_for(policy, activity) {
            if let Some(issue) = check_requirement(&checklist, &req) {
                issues.push(issue);
            }
        }
    }

    check_weather(doc, policy, &mut issues);
    check_personnel(doc, policy, &mut issues);
    check_risk_baseline(doc, policy, &mut issues);
    if let Some(as_of) = as_of {
        check_inspection_cadence(doc, policy, as_of, &mut issues);
    }

    config.retain_enabled(&mut issues);
    issues
}

fn check_requirement(checklist: &Checklist<'_>, req: &PolicyRequirement) -> Option<ValidationIssue> {
    let state = match checklist.value_of(&req.item_id) {
        Some(ChecklistValue::Checked) => return None,
        Some(v) => format!("recorded as {}", v.as_str()),
        None => "not on the checklist".to_string(),
    };
    Some(
        ValidationIssue::error(
            req.rule_id(),
            format!("Site policy: {} requires {}", req.activity.label(), req.label),
            format!(
                "Policy clause {} makes {} mandatory for {}, but it is {}. {}",
                clause_or_default(&req.clause),
                req.label,
                req.activity.label(),
                state,
                req.remediation
            ),
        )
        .with_category(CATEGORY),
    )
}

fn clause_or_default(clause: &str) -> &str {
    if clause.trim().is_empty() {
        "(unnumbered)"
    } else {
        clause
    }
}

fn threshold_issue(
    rule: &ThresholdRule,
    rule_id: &str,
    title: &str,
    detail: String,
) -> ValidationIssue {
    let (severity, consequence) = match rule.action {
        PolicyAction::Stop => (Severity::Error, "Work must stop until conditions improve."),
        PolicyAction::Warn => (Severity::Warn, "Apply additional precautions."),
    };
    ValidationIssue::new(
        severity,
        rule_id,
        title,
        format!(
            "{} Policy clause {}: {}",
            detail,
            clause_or_default(&rule.clause),
            consequence
        ),
    )
    .with_category(CATEGORY)
}

fn check_weather(doc: &DocumentRecord, policy: &SiteSafetyPolicy, out: &mut Vec<ValidationIssue>) {
    let w = &policy.weather;
    let f = &doc.fields;

    if let (Some(rule), Some(v)) = (&w.max_wind_speed_ms, f.wind_speed_ms) {
        if v > rule.limit {
            out.push(threshold_issue(
                rule,
                "structured_weather_wind",
                "Wind speed above site limit",
                format!("Recorded wind speed {} m/s exceeds the limit of {} m/s.", v, rule.limit),
            ));
        }
    }
    if let (Some(rule), Some(v)) = (&w.max_temperature_c, f.temperature_c) {
        if v > rule.limit {
            out.push(threshold_issue(
                rule,
                "structured_weather_heat",
                "Temperature above site limit",
                format!("Recorded temperature {} °C exceeds the limit of {} °C.", v, rule.limit),
            ));
        }
    }
    if let (Some(rule), Some(v)) = (&w.min_temperature_c, f.temperature_c) {
        if v < rule.limit {
            out.push(threshold_issue(
                rule,
                "structured_weather_cold",
                "Temperature below site limit",
                format!("Recorded temperature {} °C is below the limit of {} °C.", v, rule.limit),
            ));
        }
    }
    if let (Some(rule), Some(v)) = (&w.max_precipitation_mm, f.precipitation_mm) {
        if v > rule.limit {
            out.push(threshold_issue(
                rule,
                "structured_weather_precipitation",
                "Precipitation above site limit",
                format!("Recorded precipitation {} mm exceeds the limit of {} mm.", v, rule.limit),
            ));
        }
    }
}

fn check_personnel(doc: &DocumentRecord, policy: &SiteSafetyPolicy, out: &mut Vec<ValidationIssue>) {
    let Some(count) = doc.fields.worker_count else {
        return;
    };
    let p = &policy.personnel;
    if let Some(min) = p.min_workers {
        if count < min {
            out.push(
                ValidationIssue::error(
                    "structured_personnel_min",
                    "Crew below site minimum",
                    format!(
                        "{} worker(s) recorded; policy clause {} requires at least {}.",
                        count,
                        clause_or_default(&p.clause),
                        min
                    ),
                )
                .with_category(CATEGORY),
            );
        }
    }
    if let Some(max) = p.max_workers {
        if count > max {
            out.push(
                ValidationIssue::warn(
                    "structured_personnel_max",
                    "Crew above site maximum",
                    format!(
                        "{} worker(s) recorded; policy clause {} allows at most {}.",
                        count,
                        clause_or_default(&p.clause),
                        max
                    ),
                )
                .with_category(CATEGORY),
            );
        }
    }
}

fn check_risk_baseline(doc: &DocumentRecord, policy: &SiteSafetyPolicy, out: &mut Vec<ValidationIssue>) {
    let Some(baseline) = policy.baseline_risk_level else {
        return;
    };
    if baseline < RiskLevel::High {
        return;
    }
    match doc.risk_level {
        Some(declared) if declared < baseline => out.push(
            ValidationIssue::error(
                "structured_risk_baseline",
                "Declared risk below site baseline",
                format!(
                    "The document declares '{}' risk but the site baseline is '{}'. Re-assess the work before it proceeds.",
                    declared.as_str(),
                    baseline.as_str()
                ),
            )
            .with_category(CATEGORY),
        ),
        Some(_) => {}
        None => out.push(
            ValidationIssue::warn(
                "structured_risk_undeclared",
                "Risk level not declared",
                format!(
                    "The site baseline is '{}'; the document must state an assessed risk level.",
                    baseline.as_str()
                ),
            )
            .with_category(CATEGORY),
        ),
    }
}

fn check_inspection_cadence(
    doc: &DocumentRecord,
    policy: &SiteSafetyPolicy,
    as_of: Date,
    out: &mut Vec<ValidationIssue>,
) {
    let Some(date) = doc
        .fields
        .inspection_date
        .as_deref()
        .and_then(parse_inspection_date)
    else {
        return;
    };
    if date > as_of {
        out.push(
            ValidationIssue::warn(
                "structured_inspection_future",
                "Inspection dated in the future",
                format!("Inspection date {} is after {}.", date, as_of),
            )
            .with_category(CATEGORY),
        );
        return;
    }
    if let Some(max_age) = policy.inspection.max_report_age_days {
        let age = (as_of - date).whole_days();
        if age > i64::from(max_age) {
            out.push(
                ValidationIssue::warn(
                    "structured_inspection_stale",
                    "Inspection record out of date",
                    format!(
                        "Inspection is {} day(s) old; policy clause {} requires a new inspection every {} day(s).",
                        age,
                        clause_or_default(&policy.inspection.clause),
                        max_age
                    ),
                )
                .with_category(CATEGORY),
            );
        }
    }
}
