//! Configuration for the three-model panel

use chorus_core::{ModelId, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::classifier::{Classifier, ModelAdapter};
use crate::orchestrator::Panel;
use crate::prompt::SAFETY_INSTRUCTION;
use crate::provider::Provider;
use crate::providers::{AnthropicProvider, OpenAiCompatibleProvider, TokenLimitParam};

/// Which wire protocol a provider speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Anthropic,
    OpenaiCompatible,
}

/// Provider settings for one panel seat
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSpec {
    /// Wire protocol
    pub kind: ProviderKind,

    /// Human-readable model name shown in results
    pub display_name: String,

    /// Provider-side model identifier
    pub model: String,

    /// API base URL
    pub base_url: String,

    /// Environment variable holding the API key
    pub api_key_env: String,

    /// Output token limit
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Token-limit field name (OpenAI-compatible providers only)
    #[serde(default)]
    pub token_limit_param: TokenLimitParam,
}

impl ProviderSpec {
    /// Build the provider client these settings describe
    pub fn build_provider(&self, client: &reqwest::Client) -> Arc<dyn Provider> {
        match self.kind {
            ProviderKind::Anthropic => Arc::new(AnthropicProvider::new(
                client.clone(),
                &self.base_url,
                &self.model,
                &self.api_key_env,
                self.max_tokens,
            )),
            ProviderKind::OpenaiCompatible => Arc::new(
                OpenAiCompatibleProvider::new(
                    client.clone(),
                    &self.base_url,
                    &self.model,
                    &self.api_key_env,
                    self.max_tokens,
                )
                .with_token_limit_param(self.token_limit_param),
            ),
        }
    }
}

/// Configuration for all three panel seats
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelConfig {
    #[serde(default = "default_claude")]
    pub claude: ProviderSpec,

    #[serde(default = "default_gpt5")]
    pub gpt5: ProviderSpec,

    #[serde(default = "default_llama")]
    pub llama: ProviderSpec,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            claude: default_claude(),
            gpt5: default_gpt5(),
            llama: default_llama(),
        }
    }
}

impl PanelConfig {
    /// Provider settings for one seat
    pub fn spec(&self, model: ModelId) -> &ProviderSpec {
        match model {
            ModelId::Claude => &self.claude,
            ModelId::Gpt5 => &self.gpt5,
            ModelId::Llama => &self.llama,
        }
    }

    /// Build the panel of adapters sharing one HTTP client and instruction
    ///
    /// `instruction` overrides the built-in safety instruction when set.
    pub fn build(&self, client: &reqwest::Client, instruction: Option<&str>) -> Result<Panel> {
        let instruction: Arc<str> = Arc::from(instruction.unwrap_or(SAFETY_INSTRUCTION));

        let adapter = |model: ModelId| -> Arc<dyn Classifier> {
            let spec = self.spec(model);
            Arc::new(ModelAdapter::new(
                model,
                spec.display_name.clone(),
                Arc::clone(&instruction),
                spec.build_provider(client),
            ))
        };

        Panel::new(
            adapter(ModelId::Claude),
            adapter(ModelId::Gpt5),
            adapter(ModelId::Llama),
        )
    }
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_claude() -> ProviderSpec {
    ProviderSpec {
        kind: ProviderKind::Anthropic,
        display_name: "Claude Sonnet 4".to_string(),
        model: "claude-sonnet-4-20250514".to_string(),
        base_url: "https://api.anthropic.com".to_string(),
        api_key_env: "ANTHROPIC_API_KEY".to_string(),
        max_tokens: default_max_tokens(),
        token_limit_param: TokenLimitParam::MaxTokens,
    }
}

fn default_gpt5() -> ProviderSpec {
    ProviderSpec {
        kind: ProviderKind::OpenaiCompatible,
        display_name: "GPT 5.2 Thinking".to_string(),
        model: "gpt-5.2".to_string(),
        base_url: "https://api.openai.com/v1".to_string(),
        api_key_env: "OPENAI_API_KEY".to_string(),
        max_tokens: default_max_tokens(),
        token_limit_param: TokenLimitParam::MaxCompletionTokens,
    }
}

fn default_llama() -> ProviderSpec {
    ProviderSpec {
        kind: ProviderKind::OpenaiCompatible,
        display_name: "Llama 3.1 70B".to_string(),
        model: "meta-llama/Meta-Llama-3.1-70B-Instruct-Turbo".to_string(),
        base_url: "https://api.together.xyz/v1".to_string(),
        api_key_env: "TOGETHERAI_API_KEY".to_string(),
        max_tokens: default_max_tokens(),
        token_limit_param: TokenLimitParam::MaxTokens,
    }
}
