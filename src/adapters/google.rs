//! Google Custom Search adapter (primary evidence backend).
//!
//! Endpoint: GET https://www.googleapis.com/customsearch/v1
//! Auth: `key` (API key) and `cx` (search engine id) query parameters

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::time::timeout;
use tracing::debug;

use super::{EvidenceSource, SearchError, MAX_RESULTS_PER_CALL};
use crate::domain::EvidenceRecord;

/// Default Custom Search endpoint
pub const DEFAULT_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";

/// Google Custom Search client
pub struct GoogleSearch {
    api_key: String,
    engine_id: String,
    endpoint: String,
    client: reqwest::Client,
}

/// Response from the Custom Search API
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    link: String,
    #[serde(default)]
    snippet: String,
}

impl GoogleSearch {
    /// Create a client for the default endpoint
    pub fn new(api_key: impl Into<String>, engine_id: impl Into<String>) -> Self {
        Self::with_endpoint(api_key, engine_id, DEFAULT_ENDPOINT)
    }

    /// Create a client for a custom endpoint
    pub fn with_endpoint(
        api_key: impl Into<String>,
        engine_id: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            engine_id: engine_id.into(),
            endpoint: endpoint.into(),
            client: reqwest::Client::new(),
        }
    }

    async fn fetch(&self, query: &str, num: usize) -> Result<Vec<EvidenceRecord>, SearchError> {
        let num = num.to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.engine_id.as_str()),
                ("q", query),
                ("num", num.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let data: SearchResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Decode(e.to_string()))?;

        Ok(into_records(data))
    }
}

/// Convert API items to records. Items without a link are dropped.
fn into_records(data: SearchResponse) -> Vec<EvidenceRecord> {
    data.items
        .into_iter()
        .filter_map(|item| {
            let link = item.link.trim();
            if link.is_empty() {
                return None;
            }
            Some(EvidenceRecord::new(item.title, link, item.snippet))
        })
        .collect()
}

#[async_trait]
impl EvidenceSource for GoogleSearch {
    fn name(&self) -> &str {
        "google"
    }

    async fn search(
        &self,
        query: &str,
        limit: usize,
        call_timeout: Duration,
    ) -> Result<Vec<EvidenceRecord>, SearchError> {
        let num = limit.clamp(1, MAX_RESULTS_PER_CALL);
        debug!(query, num, "Querying Google Custom Search");

        let mut records = timeout(call_timeout, self.fetch(query, num))
            .await
            .map_err(|_| SearchError::Timeout(call_timeout))??;

        records.truncate(num);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_decoding() {
        let body = r#"{
            "kind": "customsearch#search",
            "items": [
                {"title": "Moon landing hoax claims", "link": "https://www.reuters.com/fact-check/moon", "snippet": "Claims are false."},
                {"title": "No snippet", "link": "https://example-news.test/x"}
            ]
        }"#;

        let data: SearchResponse = serde_json::from_str(body).unwrap();
        let records = into_records(data);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].publisher, "Reuters");
        assert_eq!(records[1].snippet, "");
        assert_eq!(records[1].publisher, "Example-News");
    }

    #[test]
    fn test_items_without_link_are_dropped() {
        let body = r#"{"items": [
            {"title": "Missing link item"},
            {"title": "Blank link", "link": "  "},
            {"title": "Real", "link": "https://www.reuters.com/a"}
        ]}"#;

        let data: SearchResponse = serde_json::from_str(body).unwrap();
        let records = into_records(data);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].url, "https://www.reuters.com/a");
        assert_eq!(records[0].publisher, "Reuters");
    }

    #[test]
    fn test_missing_items_is_empty() {
        let data: SearchResponse = serde_json::from_str(r#"{"kind": "customsearch#search"}"#).unwrap();
        assert!(into_records(data).is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_error() {
        let search = GoogleSearch::with_endpoint("key", "cx", "http://127.0.0.1:9/customsearch");
        let result = search
            .search("anything", 5, Duration::from_secs(5))
            .await;
        assert!(result.is_err());
    }
}
