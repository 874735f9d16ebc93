//! Classifier trait and the per-provider model adapter

use async_trait::async_trait;
use chorus_core::{truncate_chars, ModelId, ModelResult, SNIPPET_LIMIT};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use crate::provider::{Provider, ProviderError};
use crate::verdict::{extract_verdict, Verdict};

/// Reasoning recorded when no opinion could be obtained
pub const ERROR_REASONING: &str = "Error occurred during analysis";

/// Trait for all panel classifiers
///
/// `classify` never fails: an inability to get an opinion is itself a
/// (fail-closed) result.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify the given text
    async fn classify(&self, text: &str) -> ModelResult;

    /// Which panel seat this classifier fills
    fn model(&self) -> ModelId;

    /// Human-readable name of the remote model
    fn name(&self) -> &str;
}

/// Outcome of one provider call before policy is applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome {
    /// The provider replied; the reply was parsed
    Replied { verdict: Verdict, raw: String },
    /// The provider call failed
    Failed { error: String },
}

impl CallOutcome {
    /// Parse a provider response into an outcome
    pub fn from_response(response: Result<String, ProviderError>) -> Self {
        match response {
            Ok(raw) => Self::Replied {
                verdict: extract_verdict(&raw),
                raw,
            },
            Err(e) => Self::Failed {
                error: e.to_string(),
            },
        }
    }

    /// Apply the fail-closed policy and build the model's result
    ///
    /// Only an explicit safe verdict counts as safe. Unknown and failed
    /// outcomes vote unsafe.
    pub fn into_model_result(self, model: ModelId, model_name: &str) -> ModelResult {
        match self {
            Self::Replied { verdict, raw } => {
                let concerns = match &verdict {
                    Verdict::Unsafe { concern: Some(concern) } => vec![concern.clone()],
                    _ => Vec::new(),
                };

                ModelResult {
                    model,
                    model_name: model_name.to_string(),
                    safe: verdict.is_safe(),
                    concerns,
                    reasoning: truncate_chars(&raw, SNIPPET_LIMIT),
                }
            }
            Self::Failed { error } => ModelResult {
                model,
                model_name: model_name.to_string(),
                safe: false,
                concerns: vec![format!("API Error: {}", error)],
                reasoning: ERROR_REASONING.to_string(),
            },
        }
    }
}

/// Adapter binding one provider to one panel seat
///
/// Holds read-only configuration only: the seat, the display name, the
/// shared instruction, and the provider client.
#[derive(Clone)]
pub struct ModelAdapter {
    model: ModelId,
    model_name: String,
    instruction: Arc<str>,
    provider: Arc<dyn Provider>,
}

impl ModelAdapter {
    /// Create a new adapter
    pub fn new(
        model: ModelId,
        model_name: impl Into<String>,
        instruction: Arc<str>,
        provider: Arc<dyn Provider>,
    ) -> Self {
        Self {
            model,
            model_name: model_name.into(),
            instruction,
            provider,
        }
    }
}

#[async_trait]
impl Classifier for ModelAdapter {
    async fn classify(&self, text: &str) -> ModelResult {
        let start = Instant::now();
        let outcome = CallOutcome::from_response(self.provider.send(&self.instruction, text).await);

        match &outcome {
            CallOutcome::Replied { verdict, .. } => {
                if matches!(verdict, Verdict::Unknown) {
                    warn!(model = %self.model, "Reply had no verdict marker, failing closed");
                }
                debug!(
                    model = %self.model,
                    verdict = verdict.label(),
                    latency_ms = start.elapsed().as_millis() as u64,
                    "Classification complete"
                );
            }
            CallOutcome::Failed { error } => {
                warn!(model = %self.model, provider = self.provider.name(), "Provider call failed, failing closed: {}", error);
                metrics::counter!("chorus_provider_failures_total", "model" => self.model.key())
                    .increment(1);
            }
        }

        outcome.into_model_result(self.model, &self.model_name)
    }

    fn model(&self) -> ModelId {
        self.model
    }

    fn name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProvider(Result<&'static str, u16>);

    #[async_trait]
    impl Provider for FixedProvider {
        async fn send(&self, _instruction: &str, _text: &str) -> Result<String, ProviderError> {
            match self.0 {
                Ok(reply) => Ok(reply.to_string()),
                Err(status) => Err(ProviderError::status(status, "rate limited")),
            }
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn adapter(response: Result<&'static str, u16>) -> ModelAdapter {
        ModelAdapter::new(
            ModelId::Llama,
            "Llama 3.1 70B",
            Arc::from("instruction"),
            Arc::new(FixedProvider(response)),
        )
    }

    #[tokio::test]
    async fn test_safe_reply() {
        let result = adapter(Ok("VERDICT: SAFE\nHarmless.")).classify("hi").await;
        assert!(result.safe);
        assert!(result.concerns.is_empty());
        assert_eq!(result.reasoning, "VERDICT: SAFE\nHarmless.");
        assert_eq!(result.model, ModelId::Llama);
        assert_eq!(result.model_name, "Llama 3.1 70B");
    }

    #[tokio::test]
    async fn test_unsafe_reply_carries_concern() {
        let result = adapter(Ok("VERDICT: UNSAFE\nWeapons.")).classify("hi").await;
        assert!(!result.safe);
        assert_eq!(result.concerns, vec!["Weapons.".to_string()]);
    }

    #[tokio::test]
    async fn test_unknown_reply_fails_closed() {
        let reply = "I think this is fine.";
        let result = adapter(Ok(reply)).classify("hi").await;
        assert!(!result.safe);
        assert!(result.concerns.is_empty());
        assert_eq!(result.reasoning, reply);
    }

    #[tokio::test]
    async fn test_provider_error_fails_closed() {
        let result = adapter(Err(429)).classify("hi").await;
        assert!(!result.safe);
        assert_eq!(result.reasoning, ERROR_REASONING);
        assert_eq!(result.concerns.len(), 1);
        assert!(result.concerns[0].starts_with("API Error:"));
        assert!(result.concerns[0].contains("429"));
    }

    #[test]
    fn test_reasoning_truncated_to_snippet() {
        let raw = format!("VERDICT: SAFE\n{}", "a".repeat(400));
        let result = CallOutcome::from_response(Ok(raw)).into_model_result(ModelId::Claude, "Claude");
        assert!(result.safe);
        assert_eq!(result.reasoning.chars().count(), SNIPPET_LIMIT);
    }
}
