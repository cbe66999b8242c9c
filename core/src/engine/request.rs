use crate::completeness::parse_inspection_date;
use crate::error::{CoreError, CoreResult};
use crate::history::patterns::ReporterRef;
use crate::model::briefing::BriefingContext;
use crate::model::document::DocumentRecord;
use crate::policy::types::SiteSafetyPolicy;
use serde::{Deserialize, Serialize};
use time::Date;

/// Everything one validation call looks at. Optional context only enables the stages that need it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ValidationRequest {
    pub document: DocumentRecord,
    #[serde(default)]
    pub policy: Option<SiteSafetyPolicy>,
    #[serde(default)]
    pub briefing: Option<BriefingContext>,
    #[serde(default)]
    pub reporter: Option<ReporterRef>,
    #[serde(default)]
    pub policy_text: Option<String>,
    /// `YYYY-MM-DD`; enables the inspection cadence checks.
    #[serde(default)]
    pub as_of: Option<String>,
}

impl ValidationRequest {
    pub fn new(document: DocumentRecord) -> Self {
        Self {
            document,
            policy: None,
            briefing: None,
            reporter: None,
            policy_text: None,
            as_of: None,
        }
    }

    /// Boundary entry point for raw collaborator payloads.
    pub fn from_json_parts(
        document_json: &str,
        policy_json: Option<&str>,
        briefing_json: Option<&str>,
    ) -> CoreResult<Self> {
        let mut req = Self::new(DocumentRecord::from_json_str(document_json)?);
        if let Some(raw) = policy_json {
            req.policy = Some(SiteSafetyPolicy::from_json_str(raw)?);
        }
        if let Some(raw) = briefing_json {
            req.briefing = Some(BriefingContext::from_json_str(raw)?);
        }
        Ok(req)
    }

    pub fn with_policy(mut self, policy: SiteSafetyPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn with_briefing(mut self, briefing: BriefingContext) -> Self {
        self.briefing = Some(briefing);
        self
    }

    pub fn with_reporter(mut self, reporter_id: &str, site_id: Option<&str>) -> Self {
        self.reporter = Some(ReporterRef {
            reporter_id: reporter_id.to_string(),
            site_id: site_id.map(str::to_string),
        });
        self
    }

    pub fn with_policy_text(mut self, text: impl Into<String>) -> Self {
        self.policy_text = Some(text.into());
        self
    }

    pub fn with_as_of(mut self, date: &str) -> Self {
        self.as_of = Some(date.to_string());
        self
    }

    pub fn as_of_date(&self) -> CoreResult<Option<Date>> {
        match self.as_of.as_deref() {
            None => Ok(None),
            Some(raw) => parse_inspection_date(raw).map(Some).ok_or_else(|| {
                CoreError::InvalidInput(format!("asOf '{}' is not a YYYY-MM-DD date", raw))
            }),
        }
    }

    /// Re-checks shape for requests built in code rather than parsed.
    pub fn validate_shape(&self) -> CoreResult<()> {
        self.document.validate_shape()?;
        if let Some(p) = &self.policy {
            p.validate_shape()?;
        }
        if let Some(r) = &self.reporter {
            if r.reporter_id.trim().is_empty() {
                return Err(CoreError::InvalidInput(
                    "reporterId cannot be empty".to_string(),
                ));
            }
        }
        self.as_of_date()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{"documentType":"tbm","fields":{"siteName":"North Tower"}}"#;

    #[test]
    fn parses_parts_and_rejects_bad_briefing() {
        let req = ValidationRequest::from_json_parts(
            DOC,
            Some(r#"{"siteId":"s1"}"#),
            Some(r#"{"hazards":["fall from roof edge"],"summary":"roofing"}"#),
        )
        .unwrap();
        assert_eq!(req.policy.as_ref().map(|p| p.site_id.as_str()), Some("s1"));
        assert_eq!(req.briefing.as_ref().map(|b| b.hazards.len()), Some(1));

        let err = ValidationRequest::from_json_parts(DOC, None, Some(r#"{"hazard":[]}"#))
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
    }

    #[test]
    fn as_of_must_be_a_date() {
        let doc = DocumentRecord::from_json_str(DOC).unwrap();
        let ok = ValidationRequest::new(doc.clone()).with_as_of("2026-03-02");
        assert!(ok.validate_shape().is_ok());
        let bad = ValidationRequest::new(doc).with_as_of("March 2nd");
        assert!(bad.validate_shape().is_err());
    }
}
