//! Adapter interfaces for external systems.
//!
//! Adapters hide the search backends and the language model behind two
//! capabilities: "produce evidence for a query" and "produce text for a
//! prompt". The pipeline only talks to these traits, so any backend can be
//! swapped in without touching the stages.

pub mod duckduckgo;
pub mod fallback;
pub mod google;
pub mod openrouter;

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::domain::EvidenceRecord;

// Re-export the concrete adapters
pub use duckduckgo::DuckDuckGoSearch;
pub use fallback::FallbackSearch;
pub use google::GoogleSearch;
pub use openrouter::OpenRouterModel;

/// Hard cap on results requested from a backend in one call
pub const MAX_RESULTS_PER_CALL: usize = 10;

/// Browser user agent sent to HTML endpoints
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Failures raised by a search backend
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search backend '{0}' is not configured")]
    NotConfigured(String),

    #[error("search request failed: {0}")]
    Transport(String),

    #[error("search backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not decode search response: {0}")]
    Decode(String),

    #[error("search timed out after {0:?}")]
    Timeout(Duration),
}

/// Failures raised by a language model backend
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model API key is not configured")]
    NotConfigured,

    #[error("model request failed: {0}")]
    Transport(String),

    #[error("model returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not decode model response: {0}")]
    Decode(String),

    #[error("model response contained no message content")]
    EmptyResponse,

    #[error("model call timed out after {0:?}")]
    Timeout(Duration),
}

/// Something that can turn a query into evidence records
#[async_trait]
pub trait EvidenceSource: Send + Sync {
    /// Human-readable backend name
    fn name(&self) -> &str;

    /// Search for `query`, returning at most `limit` records
    async fn search(
        &self,
        query: &str,
        limit: usize,
        timeout: Duration,
    ) -> Result<Vec<EvidenceRecord>, SearchError>;
}

/// Chat message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// One message of a chat-style prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Something that can answer a chat prompt with free text
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Human-readable model name
    fn name(&self) -> &str;

    /// Run one completion and return the raw message text
    async fn complete(
        &self,
        messages: &[ChatMessage],
        timeout: Duration,
    ) -> Result<String, ModelError>;
}

impl From<reqwest::Error> for SearchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}

impl From<reqwest::Error> for ModelError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}
