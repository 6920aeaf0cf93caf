//! Test doubles for the evidence source and language model traits

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use factcheck::adapters::{ChatMessage, EvidenceSource, LanguageModel, ModelError, SearchError};
use factcheck::domain::EvidenceRecord;

pub fn fixed_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 7, 20).unwrap()
}

pub fn record(title: &str, url: &str) -> EvidenceRecord {
    EvidenceRecord::new(title, url, format!("Snippet for {}", title))
}

/// Returns fixed records per query: the augmented query gets `primary`,
/// any other query gets `secondary`
pub struct StaticSource {
    pub primary: Vec<EvidenceRecord>,
    pub secondary: Vec<EvidenceRecord>,
    pub queries: Arc<Mutex<Vec<(String, usize)>>>,
}

impl StaticSource {
    pub fn new(primary: Vec<EvidenceRecord>, secondary: Vec<EvidenceRecord>) -> Self {
        Self {
            primary,
            secondary,
            queries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new())
    }
}

#[async_trait]
impl EvidenceSource for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn search(
        &self,
        query: &str,
        limit: usize,
        _timeout: Duration,
    ) -> Result<Vec<EvidenceRecord>, SearchError> {
        self.queries.lock().unwrap().push((query.to_string(), limit));

        let batch = if query.ends_with("fact check verification") {
            &self.primary
        } else {
            &self.secondary
        };
        Ok(batch.iter().take(limit).cloned().collect())
    }
}

/// Always fails with a transport error
pub struct FailingSource;

#[async_trait]
impl EvidenceSource for FailingSource {
    fn name(&self) -> &str {
        "failing"
    }

    async fn search(
        &self,
        _query: &str,
        _limit: usize,
        _timeout: Duration,
    ) -> Result<Vec<EvidenceRecord>, SearchError> {
        Err(SearchError::Transport("connection refused".to_string()))
    }
}

/// Sleeps before answering, ignoring the timeout it is given
pub struct SlowSource {
    pub delay: Duration,
    pub records: Vec<EvidenceRecord>,
}

#[async_trait]
impl EvidenceSource for SlowSource {
    fn name(&self) -> &str {
        "slow"
    }

    async fn search(
        &self,
        _query: &str,
        _limit: usize,
        _timeout: Duration,
    ) -> Result<Vec<EvidenceRecord>, SearchError> {
        tokio::time::sleep(self.delay).await;
        Ok(self.records.clone())
    }
}

/// Replies with a fixed text after an optional delay and counts calls.
///
/// When a delay is set, the timeout handed to `complete` is honoured the way
/// the real client does.
pub struct ScriptedModel {
    pub reply: String,
    pub delay: Option<Duration>,
    pub calls: Arc<AtomicUsize>,
    pub prompts: Arc<Mutex<Vec<ChatMessage>>>,
}

impl ScriptedModel {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            delay: None,
            calls: Arc::new(AtomicUsize::new(0)),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        timeout: Duration,
    ) -> Result<String, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().extend_from_slice(messages);

        if let Some(delay) = self.delay {
            if delay > timeout {
                tokio::time::sleep(timeout).await;
                return Err(ModelError::Timeout(timeout));
            }
            tokio::time::sleep(delay).await;
        }

        Ok(self.reply.clone())
    }
}

/// Fails every call with an HTTP status error and counts calls
pub struct FailingModel {
    pub calls: Arc<AtomicUsize>,
}

impl FailingModel {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl LanguageModel for FailingModel {
    fn name(&self) -> &str {
        "failing"
    }

    async fn complete(
        &self,
        _messages: &[ChatMessage],
        _timeout: Duration,
    ) -> Result<String, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ModelError::Status {
            status: 429,
            body: "rate limited".to_string(),
        })
    }
}
