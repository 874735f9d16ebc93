//! Remote model providers
//!
//! - `AnthropicProvider`: Anthropic Messages API
//! - `OpenAiCompatibleProvider`: OpenAI and Together AI chat completions

mod anthropic;
mod openai;

pub use anthropic::AnthropicProvider;
pub use openai::{OpenAiCompatibleProvider, TokenLimitParam};
