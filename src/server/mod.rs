//! HTTP surface: router assembly, shared state, and the route handlers.

pub mod chat;
pub mod files;
pub mod sessions;

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::ai::AiGateway;
use crate::schema::{ApiResponse, FileRecord, SessionRecord};
use crate::storage::FileStorage;
use crate::store::SharedStore;

/// Upload size limit (50 MiB).
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Shared dependencies, constructed once at process start and passed by
/// reference into every handler.
#[derive(Clone)]
pub struct AppState {
    pub files: SharedStore<FileRecord>,
    pub sessions: SharedStore<SessionRecord>,
    pub gateway: Arc<AiGateway>,
    pub storage: Arc<FileStorage>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/files/upload", post(files::upload))
        .route("/api/files", get(files::list))
        .route("/api/files/tags/all", get(files::all_tags))
        .route("/api/files/{id}", get(files::get_one).delete(files::delete))
        .route("/api/files/{id}/content", get(files::content))
        .route("/api/chat", post(chat::send))
        .route("/api/chat/export", post(chat::export))
        .route("/api/sessions", post(sessions::save).get(sessions::list))
        .route(
            "/api/sessions/{id}",
            get(sessions::get_one).delete(sessions::delete),
        )
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    message: &'static str,
    timestamp: String,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        message: "Enterprise NotebookLM API is running",
        timestamp: Utc::now().to_rfc3339(),
    })
}

async fn not_found() -> (StatusCode, Json<ApiResponse<()>>) {
    (StatusCode::NOT_FOUND, Json(ApiResponse::err("Not found")))
}
