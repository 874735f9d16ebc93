//! Provider call interface
//!
//! A provider sends the shared instruction plus the request text to one
//! remote model and returns its raw text reply. Every failure mode is a
//! `ProviderError`; the adapter layer turns those into fail-closed results.

use async_trait::async_trait;
use chorus_core::truncate_chars;

/// Longest response body excerpt kept in a status error
const ERROR_BODY_LIMIT: usize = 300;

/// Failure talking to a remote model
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Connection, TLS, timeout or body-read failure
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The provider answered with a non-success status (auth, rate limit, ...)
    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },

    /// No API key in the configured environment variable
    #[error("missing API key: environment variable {0} is not set")]
    MissingApiKey(String),

    /// The response parsed but did not contain a text reply
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ProviderError {
    /// Build a status error, keeping only a short excerpt of the body
    pub fn status(status: u16, body: &str) -> Self {
        Self::Status {
            status,
            body: truncate_chars(body.trim(), ERROR_BODY_LIMIT),
        }
    }

    /// Build a malformed-response error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }
}

/// One remote classifier endpoint
#[async_trait]
pub trait Provider: Send + Sync {
    /// Send the instruction and request text, returning the raw reply
    async fn send(&self, instruction: &str, request_text: &str) -> Result<String, ProviderError>;

    /// Provider name for logging
    fn name(&self) -> &str;
}

/// Read an API key from the environment
pub(crate) fn api_key_from_env(var: &str) -> Result<String, ProviderError> {
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(ProviderError::MissingApiKey(var.to_string())),
    }
}
