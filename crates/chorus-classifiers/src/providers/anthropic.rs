//! Anthropic Messages API provider
//!
//! ```text
//! POST {base_url}/v1/messages
//! {"model":"...","max_tokens":1024,"system":"<instruction>","messages":[{"role":"user","content":"<text>"}]}
//! ```

use async_trait::async_trait;
use chorus_core::ChatMessage;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::provider::{api_key_from_env, Provider, ProviderError};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Provider backed by the Anthropic Messages API
#[derive(Debug, Clone)]
pub struct AnthropicProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key_env: String,
    max_tokens: u32,
}

impl AnthropicProvider {
    /// Create a provider; the API key is read from `api_key_env` on each call
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key_env: impl Into<String>,
        max_tokens: u32,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            model: model.into(),
            api_key_env: api_key_env.into(),
            max_tokens,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/messages", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// Pull the first text block out of a Messages API response
fn reply_text(response: MessagesResponse) -> Result<String, ProviderError> {
    response
        .content
        .into_iter()
        .find(|block| block.kind == "text")
        .and_then(|block| block.text)
        .ok_or_else(|| ProviderError::malformed("no text content block in response"))
}

#[async_trait]
impl Provider for AnthropicProvider {
    async fn send(&self, instruction: &str, request_text: &str) -> Result<String, ProviderError> {
        let api_key = api_key_from_env(&self.api_key_env)?;

        let body = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system: instruction,
            messages: vec![ChatMessage::user(request_text)],
        };

        debug!("Sending classification request to {} ({})", self.endpoint(), self.model);

        let response = self
            .client
            .post(self.endpoint())
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::status(status.as_u16(), &text));
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::malformed(e.to_string()))?;

        reply_text(parsed)
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}
