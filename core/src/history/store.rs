use crate::model::history::HistoricalReportSample;
use async_trait::async_trait;
use std::cmp::Reverse;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history store unavailable: {0}")]
    Unavailable(String),
    #[error("history query failed: {0}")]
    Query(String),
}

/// Read-only query over a reporter's past submissions.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    fn backend_tag(&self) -> &'static str;

    /// Most recent first, at most `limit` samples.
    async fn fetch_recent(
        &self,
        reporter_id: &str,
        site_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<HistoricalReportSample>, HistoryError>;
}

#[derive(Debug, Clone)]
struct StoredSample {
    reporter_id: String,
    site_id: Option<String>,
    sample: HistoricalReportSample,
}

/// In-process store for tools and tests.
#[derive(Default)]
pub struct InMemoryHistoryStore {
    samples: RwLock<Vec<StoredSample>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(
        &self,
        reporter_id: &str,
        site_id: Option<&str>,
        sample: HistoricalReportSample,
    ) {
        self.samples.write().await.push(StoredSample {
            reporter_id: reporter_id.to_string(),
            site_id: site_id.map(str::to_string),
            sample,
        });
    }
}

#[async_trait]
impl HistoryStore for InMemoryHistoryStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn fetch_recent(
        &self,
        reporter_id: &str,
        site_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<HistoricalReportSample>, HistoryError> {
        let guard = self.samples.read().await;
        let mut matching: Vec<&StoredSample> = guard
            .iter()
            .filter(|s| s.reporter_id == reporter_id)
            .filter(|s| match site_id {
                Some(site) => s.site_id.as_deref() == Some(site),
                None => true,
            })
            .collect();
        matching.sort_by_key(|s| Reverse(s.sample.created_at()));
        Ok(matching
            .into_iter()
            .take(limit)
            .map(|s| s.sample.clone())
            .collect())
    }
}
