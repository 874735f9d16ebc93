//! HTTP routes and handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chorus_classifiers::AnalysisError;
use chorus_core::{
    now_timestamp, AnalysisBundle, ModelId, ModelResult, StoreStats, StoredTestResult,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{debug, info};

use crate::state::AppState;

/// Largest accepted request body
const MAX_BODY_BYTES: usize = 1024 * 1024;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/analyze", post(analyze))
        .route("/analyze/:model", post(analyze_single))
        .route("/results", get(results))
        .route("/results/disagreements", get(disagreements))
        .route("/stats", get(stats))
        .fallback(fallback)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "name": "Chorus API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "description": "Multi-model AI safety verification",
        "models": state.orchestrator.panel().model_names(),
    }))
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn metrics(State(state): State<AppState>) -> String {
    state
        .metrics_handle
        .as_ref()
        .map(|handle| handle.render())
        .unwrap_or_default()
}

/// Text to be analysed
#[derive(Debug, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub content: String,
}

/// Outcome of a single-model check
#[derive(Debug, Serialize, Deserialize)]
pub struct SingleModelResponse {
    pub content: String,
    pub model: ModelId,
    pub result: ModelResult,
    pub timestamp: String,
}

async fn analyze(
    State(state): State<AppState>,
    Json(req): Json<AnalysisRequest>,
) -> Result<Json<AnalysisBundle>, AppError> {
    info!(chars = req.content.chars().count(), "Received analysis request");

    let bundle = state.orchestrator.analyze(&req.content).await?;
    Ok(Json(bundle))
}

async fn analyze_single(
    State(state): State<AppState>,
    Path(model): Path<String>,
    Json(req): Json<AnalysisRequest>,
) -> Result<Json<SingleModelResponse>, AppError> {
    let model: ModelId = model.parse()?;
    debug!(%model, "Received single-model request");

    let result = state.orchestrator.analyze_single(model, &req.content).await?;

    Ok(Json(SingleModelResponse {
        content: req.content,
        model,
        result,
        timestamp: now_timestamp(),
    }))
}

async fn results(State(state): State<AppState>) -> Result<Json<Vec<StoredTestResult>>, AppError> {
    Ok(Json(state.orchestrator.store().read_all().await?))
}

async fn disagreements(
    State(state): State<AppState>,
) -> Result<Json<Vec<StoredTestResult>>, AppError> {
    Ok(Json(state.orchestrator.store().read_disagreements().await?))
}

async fn stats(State(state): State<AppState>) -> Result<Json<StoreStats>, AppError> {
    Ok(Json(state.orchestrator.store().read_stats().await?))
}

async fn fallback() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not found")
}

/// Error handling
#[derive(Debug)]
pub enum AppError {
    InvalidRequest(String),
    Analysis(AnalysisError),
    Internal(String),
}

impl From<AnalysisError> for AppError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::EmptyInput => AppError::InvalidRequest(err.to_string()),
            other => AppError::Analysis(other),
        }
    }
}

impl From<chorus_core::Error> for AppError {
    fn from(err: chorus_core::Error) -> Self {
        if err.is_input_error() {
            AppError::InvalidRequest(err.to_string())
        } else {
            AppError::Internal(err.to_string())
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::InvalidRequest(message) => error_response(
                StatusCode::BAD_REQUEST,
                &message,
                "invalid_request_error",
            ),
            AppError::Internal(message) => {
                error_response(StatusCode::INTERNAL_SERVER_ERROR, &message, "internal_error")
            }
            AppError::Analysis(err) => {
                // The analysis itself succeeded; hand the verdicts back anyway
                let body = json!({
                    "error": {
                        "message": err.to_string(),
                        "type": "storage_error",
                    },
                    "bundle": err.bundle(),
                });
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

fn error_response(status: StatusCode, message: &str, kind: &str) -> Response {
    let body = json!({
        "error": {
            "message": message,
            "type": kind,
        }
    });

    (status, Json(body)).into_response()
}
