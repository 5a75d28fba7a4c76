//! JSON HTTP API for the chat widget backend.
//!
//! The widget's request handler calls this service once per conversation
//! turn to get the knowledge-base context for the model prompt, and after
//! assistant replies to refresh the BANT progress bar.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `POST` | `/chatbots/{id}/context` | Retrieve sources and build prompt context |
//! | `POST` | `/bant/progress` | Score a transcript |
//! | `GET`  | `/chatbots/{id}/sources` | List a chatbot's sources |
//! | `POST` | `/chatbots/{id}/sources` | Ingest text as new sources |
//! | `DELETE` | `/chatbots/{id}/sources/{source_id}` | Remove a source |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "threshold must be in [0.0, 1.0]" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404),
//! `embedding_failed` (502), `internal` (500). Retrieval itself never
//! produces an error: provider and store failures degrade to an empty
//! context.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use leadqual_core::bant::{bant_report, BantStep};
use leadqual_core::context::build_source_context;
use leadqual_core::models::{ChatMessage, Source};
use leadqual_core::retrieve::{retrieve_with_outcome, Tier};

use crate::backend::Backend;
use crate::config::{Config, RetrievalConfig, MAX_REQUEST_LIMIT};
use crate::ingest::{ingest_text, IngestRejection};

/// Shared state for all route handlers.
#[derive(Clone)]
pub struct AppState {
    backend: Backend,
    retrieval: Arc<RetrievalConfig>,
    max_tokens: usize,
}

impl AppState {
    pub fn new(config: &Config, backend: Backend) -> Self {
        Self {
            backend,
            retrieval: Arc::new(config.retrieval.clone()),
            max_tokens: config.chunking.max_tokens,
        }
    }
}

/// Build the router with all routes, CORS, and request tracing.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/chatbots/{id}/context", post(handle_context))
        .route("/bant/progress", post(handle_bant))
        .route(
            "/chatbots/{id}/sources",
            get(handle_list_sources).post(handle_add_source),
        )
        .route("/chatbots/{id}/sources/{source_id}", delete(handle_delete_source))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the server on `[server].bind` with the configured backend.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let backend = Backend::open(config).await?;
    run_server_with_backend(config, backend).await
}

/// Start the server with an explicit backend (custom stores or providers).
pub async fn run_server_with_backend(config: &Config, backend: Backend) -> anyhow::Result<()> {
    let app = router(AppState::new(config, backend));
    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    tracing::info!(bind = %config.server.bind, "server listening");
    axum::serve(listener, app).await?;
    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request",
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found",
        message: message.into(),
    }
}

fn internal(err: anyhow::Error) -> AppError {
    tracing::error!(error = %format!("{:#}", err), "request failed");
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal",
        message: err.to_string(),
    }
}

fn check_limit(limit: Option<usize>) -> Result<(), AppError> {
    match limit {
        Some(n) if n == 0 || n > MAX_REQUEST_LIMIT => Err(bad_request(format!(
            "limit must be between 1 and {}",
            MAX_REQUEST_LIMIT
        ))),
        _ => Ok(()),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ============ POST /chatbots/{id}/context ============

#[derive(Deserialize)]
struct ContextRequest {
    query: String,
    #[serde(default)]
    limit: Option<usize>,
    #[serde(default)]
    threshold: Option<f64>,
}

#[derive(Serialize)]
struct ContextResponse {
    sources: Vec<Source>,
    context: String,
    tier: Tier,
}

/// Retrieve sources for the latest user message and render them as
/// prompt context. Always `200` for a well-formed request.
async fn handle_context(
    State(state): State<AppState>,
    Path(chatbot_id): Path<String>,
    Json(req): Json<ContextRequest>,
) -> Result<Json<ContextResponse>, AppError> {
    let params = state
        .retrieval
        .checked_params(req.limit, req.threshold)
        .map_err(|e| bad_request(e.to_string()))?;
    let outcome = retrieve_with_outcome(
        state.backend.store.as_ref(),
        state.backend.embedder.as_ref(),
        &chatbot_id,
        &req.query,
        &params,
    )
    .await;

    let context = build_source_context(&outcome.sources);
    Ok(Json(ContextResponse {
        sources: outcome.sources,
        context,
        tier: outcome.tier,
    }))
}

// ============ POST /bant/progress ============

#[derive(Deserialize)]
struct BantRequest {
    messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
struct BantResponse {
    progress: u8,
    asked: Vec<BantStep>,
}

async fn handle_bant(Json(req): Json<BantRequest>) -> Json<BantResponse> {
    let report = bant_report(&req.messages);
    Json(BantResponse {
        progress: report.progress,
        asked: report.asked,
    })
}

// ============ /chatbots/{id}/sources ============

#[derive(Deserialize)]
struct ListQuery {
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Serialize)]
struct ListResponse {
    total: u64,
    sources: Vec<Source>,
}

async fn handle_list_sources(
    State(state): State<AppState>,
    Path(chatbot_id): Path<String>,
    Query(q): Query<ListQuery>,
) -> Result<Json<ListResponse>, AppError> {
    check_limit(q.limit)?;
    let store = &state.backend.store;
    let total = store.count_sources(&chatbot_id).await.map_err(internal)?;
    let sources = store
        .list_sources(&chatbot_id, q.limit.unwrap_or(MAX_REQUEST_LIMIT))
        .await
        .map_err(internal)?;
    Ok(Json(ListResponse { total, sources }))
}

#[derive(Deserialize)]
struct AddSourceRequest {
    #[serde(default)]
    title: Option<String>,
    content: String,
}

#[derive(Serialize)]
struct AddSourceResponse {
    ids: Vec<String>,
}

async fn handle_add_source(
    State(state): State<AppState>,
    Path(chatbot_id): Path<String>,
    Json(req): Json<AddSourceRequest>,
) -> Result<(StatusCode, Json<AddSourceResponse>), AppError> {
    if req.content.trim().is_empty() {
        return Err(bad_request("content must not be empty"));
    }

    let report = ingest_text(
        state.backend.store.as_ref(),
        state.backend.embedder.as_ref(),
        &chatbot_id,
        req.title.as_deref(),
        &req.content,
        state.max_tokens,
    )
    .await
    .map_err(|e| match e.downcast_ref::<IngestRejection>() {
        Some(IngestRejection::EmbeddingFailed) => {
            tracing::warn!(error = %format!("{:#}", e), "embedding failed during ingestion");
            AppError {
                status: StatusCode::BAD_GATEWAY,
                code: "embedding_failed",
                message: format!("{:#}", e),
            }
        }
        Some(_) => bad_request(e.to_string()),
        None => internal(e),
    })?;

    Ok((StatusCode::CREATED, Json(AddSourceResponse { ids: report.ids })))
}

async fn handle_delete_source(
    State(state): State<AppState>,
    Path((chatbot_id, source_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let deleted = state
        .backend
        .store
        .delete_source(&chatbot_id, &source_id)
        .await
        .map_err(internal)?;
    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(format!("source not found: {}", source_id)))
    }
}
