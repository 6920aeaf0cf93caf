//! Primary/fallback evidence source.
//!
//! Wraps an optional primary backend and a keyless fallback. Whatever goes
//! wrong, `search` returns `Ok`, possibly with no records: a primary failure
//! switches to the fallback, a fallback failure yields an empty list.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::{DuckDuckGoSearch, EvidenceSource, GoogleSearch, SearchError, MAX_RESULTS_PER_CALL};
use crate::config::SearchSettings;
use crate::domain::EvidenceRecord;

/// Evidence source with a primary backend and a fallback
pub struct FallbackSearch {
    primary: Option<Box<dyn EvidenceSource>>,
    fallback: Box<dyn EvidenceSource>,
}

impl FallbackSearch {
    pub fn new(
        primary: Option<Box<dyn EvidenceSource>>,
        fallback: Box<dyn EvidenceSource>,
    ) -> Self {
        Self { primary, fallback }
    }

    /// Build from settings. Google is the primary only when both the API key
    /// and the engine id are present.
    pub fn from_settings(settings: &SearchSettings) -> Self {
        let primary = match (&settings.api_key, &settings.engine_id) {
            (Some(key), Some(cx)) => Some(Box::new(GoogleSearch::with_endpoint(
                key.clone(),
                cx.clone(),
                settings.endpoint.clone(),
            )) as Box<dyn EvidenceSource>),
            _ => None,
        };
        let fallback = Box::new(DuckDuckGoSearch::with_endpoint(
            settings.fallback_endpoint.clone(),
        ));
        Self::new(primary, fallback)
    }

    /// Whether a primary backend is configured
    pub fn has_primary(&self) -> bool {
        self.primary.is_some()
    }

    async fn search_fallback(
        &self,
        query: &str,
        limit: usize,
        timeout: Duration,
    ) -> Vec<EvidenceRecord> {
        match bounded(self.fallback.as_ref(), query, limit, timeout).await {
            Ok(records) => {
                debug!(
                    backend = self.fallback.name(),
                    count = records.len(),
                    "Fallback search returned results"
                );
                records
            }
            Err(e) => {
                warn!(backend = self.fallback.name(), error = %e, "Fallback search failed");
                Vec::new()
            }
        }
    }
}

/// Run a backend search under the call timeout, whether or not the backend
/// enforces one itself
async fn bounded(
    source: &dyn EvidenceSource,
    query: &str,
    limit: usize,
    timeout: Duration,
) -> Result<Vec<EvidenceRecord>, SearchError> {
    tokio::time::timeout(timeout, source.search(query, limit, timeout))
        .await
        .unwrap_or(Err(SearchError::Timeout(timeout)))
}

#[async_trait]
impl EvidenceSource for FallbackSearch {
    fn name(&self) -> &str {
        match &self.primary {
            Some(primary) => primary.name(),
            None => self.fallback.name(),
        }
    }

    async fn search(
        &self,
        query: &str,
        limit: usize,
        timeout: Duration,
    ) -> Result<Vec<EvidenceRecord>, SearchError> {
        let limit = limit.min(MAX_RESULTS_PER_CALL);

        let Some(primary) = &self.primary else {
            debug!("No primary search backend configured, using fallback");
            return Ok(self.search_fallback(query, limit, timeout).await);
        };

        match bounded(primary.as_ref(), query, limit, timeout).await {
            Ok(mut records) => {
                records.truncate(limit);
                debug!(
                    backend = primary.name(),
                    count = records.len(),
                    "Primary search returned results"
                );
                Ok(records)
            }
            Err(e) => {
                warn!(
                    backend = primary.name(),
                    error = %e,
                    "Primary search failed, switching to fallback"
                );
                Ok(self.search_fallback(query, limit, timeout).await)
            }
        }
    }
}
