//! OpenRouter chat-completions adapter.
//!
//! Endpoint: POST {base_url}/chat/completions
//! Auth: Bearer token, plus `HTTP-Referer` and `X-Title` identification headers
//!
//! Any OpenAI-compatible endpoint works by pointing `base_url` at it.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::debug;

use super::{ChatMessage, LanguageModel, ModelError};
use crate::config::ModelSettings;

/// OpenRouter chat client
pub struct OpenRouterModel {
    api_key: Option<String>,
    base_url: String,
    model: String,
    temperature: f32,
    referer: String,
    title: String,
    client: reqwest::Client,
}

/// Request body for /chat/completions
#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: &'a [ChatMessage],
}

/// Response from /chat/completions
#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenRouterModel {
    /// Create a client from model settings
    pub fn from_settings(settings: &ModelSettings) -> Self {
        Self {
            api_key: settings.api_key.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            temperature: settings.temperature,
            referer: settings.referer.clone(),
            title: settings.title.clone(),
            client: reqwest::Client::new(),
        }
    }

    /// Build API URL
    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    async fn send(&self, api_key: &str, messages: &[ChatMessage]) -> Result<String, ModelError> {
        let body = CompletionRequest {
            model: &self.model,
            temperature: self.temperature,
            messages,
        };

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(api_key)
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.title)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let data: CompletionResponse = response
            .json()
            .await
            .map_err(|e| ModelError::Decode(e.to_string()))?;

        first_content(data)
    }
}

fn first_content(data: CompletionResponse) -> Result<String, ModelError> {
    data.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(ModelError::EmptyResponse)
}

#[async_trait]
impl LanguageModel for OpenRouterModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        call_timeout: Duration,
    ) -> Result<String, ModelError> {
        let api_key = self.api_key.as_deref().ok_or(ModelError::NotConfigured)?;

        debug!(
            model = %self.model,
            temperature = self.temperature,
            prompt_chars = messages.iter().map(|m| m.content.len()).sum::<usize>(),
            "Sending chat completion request"
        );

        timeout(call_timeout, self.send(api_key, messages))
            .await
            .map_err(|_| ModelError::Timeout(call_timeout))?
    }
}
