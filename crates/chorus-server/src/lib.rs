//! Chorus Server
//!
//! HTTP surface for multi-model safety analysis. Each analysis request is
//! sent to three independent LLM classifiers concurrently; their verdicts are
//! resolved into a consensus and stored for later review.

pub mod cli;
pub mod config;
pub mod routes;
pub mod state;

pub use cli::Cli;
pub use config::ServerConfig;
pub use routes::{create_router, AppError, AnalysisRequest, SingleModelResponse};
pub use state::AppState;
