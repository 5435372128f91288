//! HTTP chat server.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/chat` | Answer `{ "prompt": "..." }` with `{ "answer": "..." }` |
//! | `GET`  | `/health` | Health check (version and corpus size) |
//!
//! # Error Contract
//!
//! Failures keep the `answer` field so a chat widget can render them
//! verbatim, and add a machine-readable `code`:
//!
//! ```json
//! { "answer": "Prompt is missing", "code": "bad_request" }
//! ```
//!
//! Codes: `bad_request` (400), `method_not_allowed` (405),
//! `retrieval_unavailable` (503), `completion_failed` (502).
//!
//! # Corpus lifecycle
//!
//! The corpus is read once, before the listener binds, and shared
//! read-only by every request. A missing or unreadable artifact is served
//! as an empty corpus rather than aborting startup.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so the portfolio site
//! can call the endpoint cross-origin.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use portfolio_rag_core::Retriever;

use crate::chat::{self, ChatError};
use crate::completion::CompletionClient;
use crate::config::Config;
use crate::corpus::load_corpus_or_empty;
use crate::embedding::create_embedder;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub retriever: Arc<Retriever>,
    pub completion: Arc<CompletionClient>,
}

/// Build the router over already-loaded state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/api/chat",
            post(handle_chat).fallback(handle_method_not_allowed),
        )
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state)
}

/// Load the corpus, build the providers, and serve until terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let corpus = Arc::new(load_corpus_or_empty(&config.corpus.path));
    let embedder = create_embedder(&config.query_embedding())?;
    let completion = CompletionClient::new(&config.completion)?;

    if !completion.is_enabled() {
        tracing::warn!("completion provider is disabled; /api/chat will return 502");
    }

    let state = AppState {
        retriever: Arc::new(Retriever::new(
            corpus,
            embedder,
            config.retrieval.params(),
        )),
        completion: Arc::new(completion),
    };
    let records = state.retriever.corpus().len();

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    tracing::info!(bind = %config.server.bind, records, "chat server listening");
    println!("Chat server listening on http://{}", config.server.bind);

    axum::serve(listener, router(state)).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    answer: String,
    code: &'static str,
}

struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            answer: self.message,
            code: self.code,
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

impl From<ChatError> for AppError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::Retrieval(_) => AppError {
                status: StatusCode::SERVICE_UNAVAILABLE,
                code: "retrieval_unavailable",
                message: err.to_string(),
            },
            ChatError::Completion(_) => AppError {
                status: StatusCode::BAD_GATEWAY,
                code: "completion_failed",
                message: err.to_string(),
            },
        }
    }
}

// ============ POST /api/chat ============

#[derive(Deserialize)]
struct ChatRequest {
    #[serde(default)]
    prompt: Option<String>,
}

#[derive(Serialize)]
struct ChatResponse {
    answer: String,
}

async fn handle_chat(
    State(state): State<AppState>,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let Json(request) = body.map_err(|e| bad_request(e.body_text()))?;

    let prompt = match request.prompt {
        Some(p) if !p.trim().is_empty() => p,
        _ => return Err(bad_request("Prompt is missing")),
    };

    match chat::answer(&state.retriever, &state.completion, &prompt).await {
        Ok(answer) => Ok(Json(ChatResponse { answer })),
        Err(e) => {
            tracing::error!(error = %e, "chat request failed");
            Err(e.into())
        }
    }
}

async fn handle_method_not_allowed() -> AppError {
    AppError {
        status: StatusCode::METHOD_NOT_ALLOWED,
        code: "method_not_allowed",
        message: "Method not allowed".to_string(),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    records: usize,
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        records: state.retriever.corpus().len(),
    })
}
