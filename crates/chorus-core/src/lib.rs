//! Chorus Core
//!
//! Core types, traits, and utilities shared across Chorus components.
//!
//! This crate provides:
//! - The per-model result, consensus, and stored-row data model
//! - Error types and result handling
//! - The `ResultStore` sink trait implemented by storage backends

pub mod error;
pub mod store;
pub mod types;

pub use error::{Error, Result};
pub use store::ResultStore;
pub use types::{
    now_timestamp, truncate_chars, AnalysisBundle, ChatMessage, Confidence, ConsensusRecord,
    ConsensusVerdict, ModelId, ModelResult, PanelResults, StoreStats, StoredTestResult,
    StoredVote, SNIPPET_LIMIT,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::store::ResultStore;
    pub use crate::types::{
        AnalysisBundle, Confidence, ConsensusRecord, ConsensusVerdict, ModelId, ModelResult,
        PanelResults,
    };
}
