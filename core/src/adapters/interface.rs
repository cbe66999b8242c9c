use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AssistantErrorKind {
    TIMEOUT,
    UNAVAILABLE,
    RATE_LIMITED,
    REFUSED,
    MALFORMED_RESPONSE,
    RUNTIME_ERROR,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssistantError {
    pub kind: AssistantErrorKind,
    pub provider_id: String,
    pub message: String,
    pub retryable: bool,
}

impl AssistantError {
    pub fn new(kind: AssistantErrorKind, provider_id: &str, message: impl Into<String>) -> Self {
        let retryable = matches!(
            kind,
            AssistantErrorKind::TIMEOUT
                | AssistantErrorKind::UNAVAILABLE
                | AssistantErrorKind::RATE_LIMITED
        );
        Self {
            kind,
            provider_id: provider_id.to_string(),
            message: message.into(),
            retryable,
        }
    }
}

impl fmt::Display for AssistantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{:?}]: {}", self.provider_id, self.kind, self.message)
    }
}

impl std::error::Error for AssistantError {}

/// A natural-language inference service: prompt in, raw text out.
#[async_trait]
pub trait ReasoningAssistant: Send + Sync {
    fn provider_id(&self) -> &str;
    async fn complete(&self, prompt: &str) -> Result<String, AssistantError>;
}

/// Maps a raw transport error message onto an error kind.
pub fn classify_assistant_error(provider_id: &str, err: &str) -> AssistantError {
    let lower = err.to_lowercase();
    let kind = if lower.contains("timeout") || lower.contains("timed out") {
        AssistantErrorKind::TIMEOUT
    } else if lower.contains("429") || lower.contains("rate limit") {
        AssistantErrorKind::RATE_LIMITED
    } else if lower.contains("connection") || lower.contains("unavailable") || lower.contains("503")
    {
        AssistantErrorKind::UNAVAILABLE
    } else if lower.contains("refus") || lower.contains("content policy") {
        AssistantErrorKind::REFUSED
    } else {
        AssistantErrorKind::RUNTIME_ERROR
    };
    AssistantError::new(kind, provider_id, err)
}
