//! OpenAI-compatible Chat Completions provider
//!
//! Serves both OpenAI and Together AI:
//! ```text
//! POST {base_url}/chat/completions
//! {"model":"...","messages":[{"role":"system",...},{"role":"user",...}],"max_completion_tokens":1024}
//! ```
//! OpenAI's newer models take `max_completion_tokens`; Together takes
//! `max_tokens`. Which one is sent is configured per provider.

use async_trait::async_trait;
use chorus_core::ChatMessage;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::provider::{api_key_from_env, Provider, ProviderError};

/// Name of the request field carrying the output token limit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenLimitParam {
    #[default]
    MaxTokens,
    MaxCompletionTokens,
}

/// Provider backed by an OpenAI-compatible Chat Completions endpoint
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key_env: String,
    max_tokens: u32,
    token_limit_param: TokenLimitParam,
}

impl OpenAiCompatibleProvider {
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
            token_limit_param: TokenLimitParam::default(),
        }
    }

    /// Choose which token-limit field is sent
    pub fn with_token_limit_param(mut self, param: TokenLimitParam) -> Self {
        self.token_limit_param = param;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    fn request_body(&self, instruction: &str, request_text: &str) -> ChatCompletionRequest<'_> {
        let (max_tokens, max_completion_tokens) = match self.token_limit_param {
            TokenLimitParam::MaxTokens => (Some(self.max_tokens), None),
            TokenLimitParam::MaxCompletionTokens => (None, Some(self.max_tokens)),
        };

        ChatCompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage::system(instruction), ChatMessage::user(request_text)],
            max_tokens,
            max_completion_tokens,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

fn reply_text(response: ChatCompletionResponse) -> Result<String, ProviderError> {
    response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::malformed("response contained no choices"))?
        .message
        .content
        .ok_or_else(|| ProviderError::malformed("first choice has no message content"))
}

#[async_trait]
impl Provider for OpenAiCompatibleProvider {
    async fn send(&self, instruction: &str, request_text: &str) -> Result<String, ProviderError> {
        let api_key = api_key_from_env(&self.api_key_env)?;
        let body = self.request_body(instruction, request_text);

        debug!("Sending classification request to {} ({})", self.endpoint(), self.model);

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::status(status.as_u16(), &text));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::malformed(e.to_string()))?;

        reply_text(parsed)
    }

    fn name(&self) -> &str {
        "openai-compatible"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(param: TokenLimitParam) -> OpenAiCompatibleProvider {
        OpenAiCompatibleProvider::new(
            reqwest::Client::new(),
            "https://api.openai.com/v1",
            "gpt-5.2",
            "OPENAI_API_KEY",
            1024,
        )
        .with_token_limit_param(param)
    }

    #[test]
    fn test_token_limit_field_selection() {
        let together = provider(TokenLimitParam::MaxTokens);
        let value = serde_json::to_value(together.request_body("sys", "hi")).unwrap();
        assert_eq!(value["max_tokens"], 1024);
        assert!(value.get("max_completion_tokens").is_none());

        let openai = provider(TokenLimitParam::MaxCompletionTokens);
        let value = serde_json::to_value(openai.request_body("sys", "hi")).unwrap();
        assert_eq!(value["max_completion_tokens"], 1024);
        assert!(value.get("max_tokens").is_none());
    }

    #[test]
    fn test_system_message_first() {
        let value = serde_json::to_value(provider(TokenLimitParam::MaxTokens).request_body("sys", "hi"))
            .unwrap();
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][0]["content"], "sys");
        assert_eq!(value["messages"][1]["content"], "hi");
    }

    #[test]
    fn test_reply_text_parsing() {
        let ok: ChatCompletionResponse = serde_json::from_str(
            r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"VERDICT: UNSAFE\nNo."}}]}"#,
        )
        .unwrap();
        assert_eq!(reply_text(ok).unwrap(), "VERDICT: UNSAFE\nNo.");

        let null_content: ChatCompletionResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#,
        )
        .unwrap();
        assert!(reply_text(null_content).is_err());

        let empty: ChatCompletionResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(reply_text(empty).is_err());
    }
}
