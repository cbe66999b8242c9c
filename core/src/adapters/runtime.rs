use crate::adapters::interface::{AssistantError, AssistantErrorKind, ReasoningAssistant};
use crate::adapters::response::extract_json_object;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, warn};

#[derive(Debug)]
pub struct ChainSuccess<T> {
    pub provider_id: String,
    pub value: T,
    /// Providers that failed before this one answered.
    pub failures: Vec<AssistantError>,
}

#[derive(Debug, Error)]
#[error("all {} assistant provider(s) failed", .failures.len())]
pub struct ChainExhausted {
    pub failures: Vec<AssistantError>,
}

/// Ordered, independently failing providers tried one at a time.
#[derive(Clone)]
pub struct AssistantChain {
    providers: Vec<Arc<dyn ReasoningAssistant>>,
    call_timeout: Duration,
}

impl AssistantChain {
    pub fn new(providers: Vec<Arc<dyn ReasoningAssistant>>, call_timeout: Duration) -> Self {
        Self {
            providers,
            call_timeout,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn provider_ids(&self) -> Vec<String> {
        self.providers
            .iter()
            .map(|p| p.provider_id().to_string())
            .collect()
    }

    /// Each provider is awaited to completion before the next is tried.
    pub async fn complete_json<T: DeserializeOwned>(
        &self,
        prompt: &str,
    ) -> Result<ChainSuccess<T>, ChainExhausted> {
        let mut failures = Vec::new();
        for provider in &self.providers {
            let id = provider.provider_id();
            match self.call_one::<T>(provider.as_ref(), prompt).await {
                Ok(value) => {
                    debug!(provider = %id, "assistant answered");
                    return Ok(ChainSuccess {
                        provider_id: id.to_string(),
                        value,
                        failures,
                    });
                }
                Err(e) => {
                    warn!(provider = %id, kind = ?e.kind, "assistant call failed: {}", e.message);
                    failures.push(e);
                }
            }
        }
        Err(ChainExhausted { failures })
    }

    async fn call_one<T: DeserializeOwned>(
        &self,
        provider: &dyn ReasoningAssistant,
        prompt: &str,
    ) -> Result<T, AssistantError> {
        let id = provider.provider_id();
        let text = match timeout(self.call_timeout, provider.complete(prompt)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(AssistantError::new(
                    AssistantErrorKind::TIMEOUT,
                    id,
                    format!("no answer within {} ms", self.call_timeout.as_millis()),
                ))
            }
        };
        let json = extract_json_object(&text).ok_or_else(|| {
            AssistantError::new(
                AssistantErrorKind::MALFORMED_RESPONSE,
                id,
                "response contains no JSON object",
            )
        })?;
        serde_json::from_str(json).map_err(|e| {
            AssistantError::new(
                AssistantErrorKind::MALFORMED_RESPONSE,
                id,
                format!("response does not match schema: {}", e),
            )
        })
    }
}
