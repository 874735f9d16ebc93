//! Chorus Classifiers
//!
//! Three remote language models act as a content-safety panel. Each reply is
//! parsed into a verdict, failures fail closed, and the three votes are
//! combined into a single consensus.
//!
//! - `verdict`: first-line verdict extraction (safe / unsafe / unknown)
//! - `provider` / `providers`: remote model clients
//! - `classifier`: per-seat adapters applying the fail-closed policy
//! - `consensus`: three-way vote resolution
//! - `orchestrator`: concurrent panel execution and persistence

pub mod classifier;
pub mod config;
pub mod consensus;
pub mod orchestrator;
pub mod prompt;
pub mod provider;
pub mod providers;
pub mod verdict;

pub use classifier::{CallOutcome, Classifier, ModelAdapter, ERROR_REASONING};
pub use config::{PanelConfig, ProviderKind, ProviderSpec};
pub use consensus::resolve_consensus;
pub use orchestrator::{AnalysisError, Orchestrator, Panel};
pub use prompt::SAFETY_INSTRUCTION;
pub use provider::{Provider, ProviderError};
pub use providers::{AnthropicProvider, OpenAiCompatibleProvider, TokenLimitParam};
pub use verdict::{extract_verdict, Verdict};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::classifier::{Classifier, ModelAdapter};
    pub use crate::consensus::resolve_consensus;
    pub use crate::orchestrator::{AnalysisError, Orchestrator, Panel};
    pub use crate::provider::{Provider, ProviderError};
    pub use crate::verdict::{extract_verdict, Verdict};
}
