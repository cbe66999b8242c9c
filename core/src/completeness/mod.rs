use crate::config::ValidationConfig;
use crate::model::document::{non_blank, DocumentRecord};
use crate::model::issue::ValidationIssue;
use time::macros::format_description;
use time::Date;

const CATEGORY: &str = "completeness";

/// Stage 1: required scalar fields and signature slots.
pub fn check_required_fields(doc: &DocumentRecord, config: &ValidationConfig) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    match non_blank(doc.fields.inspection_date.as_deref()) {
        None => issues.push(
            ValidationIssue::error(
                "completeness_inspection_date",
                "Inspection date missing",
                "The inspection date is required to place the record on the site timeline.",
            )
            .with_category(CATEGORY),
        ),
        Some(raw) => {
            if parse_inspection_date(raw).is_none() {
                issues.push(
                    ValidationIssue::warn(
                        "completeness_inspection_date_format",
                        "Inspection date unreadable",
                        format!("Inspection date '{}' is not in YYYY-MM-DD form.", raw),
                    )
                    .with_category(CATEGORY),
                );
            }
        }
    }

    if non_blank(doc.fields.site_name.as_deref()).is_none() {
        issues.push(
            ValidationIssue::error(
                "completeness_site_name",
                "Site name missing",
                "The site name is required to match the record against the site policy.",
            )
            .with_category(CATEGORY),
        );
    }

    if doc.work_description().is_none() {
        issues.push(
            ValidationIssue::error(
                "completeness_work_description",
                "Work description missing",
                "Describe the work performed so hazards can be assessed.",
            )
            .with_category(CATEGORY),
        );
    }

    if doc.fields.worker_count.is_none() {
        issues.push(
            ValidationIssue::warn(
                "completeness_worker_count",
                "Personnel count missing",
                "Record how many workers took part in the work.",
            )
            .with_category(CATEGORY),
        );
    }

    if non_blank(doc.signatures.worker.as_deref()).is_none() {
        issues.push(
            ValidationIssue::error(
                "completeness_signature_worker",
                "Worker signature missing",
                "The worker signature confirms the briefing was received.",
            )
            .with_category(CATEGORY),
        );
    }

    if non_blank(doc.signatures.supervisor.as_deref()).is_none() {
        issues.push(
            ValidationIssue::warn(
                "completeness_signature_supervisor",
                "Supervisor signature missing",
                "A supervisor should countersign the inspection record.",
            )
            .with_category(CATEGORY),
        );
    }

    config.retain_enabled(&mut issues);
    issues
}

pub fn parse_inspection_date(raw: &str) -> Option<Date> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]")).ok()
}
