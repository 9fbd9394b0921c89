//! Session routes: save a conversation as both a session record and a
//! browsable Markdown file, plus listing/detail/delete.

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::AppState;
use crate::error::ApiError;
use crate::export;
use crate::parser::format_file_size;
use crate::schema::{
    ApiResponse, ChatMessage, ContentMode, FileFormat, FileRecord, FileStatus, SessionRecord,
    SessionSummary,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest {
    #[serde(default)]
    pub name: String,
    pub messages: Option<Vec<ChatMessage>>,
    #[serde(default)]
    pub context_file_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveResponse {
    pub session_id: String,
    pub file_id: String,
    pub name: String,
    pub summary: String,
    pub tags: Vec<String>,
}

/// `POST /api/sessions` — summarize the conversation, persist the rendered
/// Markdown, and store both a session record and a companion file record so
/// the transcript is citable like any uploaded file.
pub async fn save(
    State(state): State<AppState>,
    Json(request): Json<SaveRequest>,
) -> Result<Json<ApiResponse<SaveResponse>>, ApiError> {
    let Some(messages) = request.messages else {
        return Err(ApiError::BadRequest(
            "Name and messages are required".to_string(),
        ));
    };
    if request.name.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Name and messages are required".to_string(),
        ));
    }

    let session_id = Uuid::new_v4().to_string();
    let now = Utc::now();

    // Never fails; degrades to a fixed default summary.
    let analysis = state.gateway.session_summary(&messages).await;
    let markdown = export::render_session(&request.name, &analysis, &messages);

    let file_path = state
        .storage
        .write_named(&format!("session_{session_id}.md"), &markdown)
        .await?;

    let file_id = Uuid::new_v4().to_string();
    let session_file = FileRecord {
        id: file_id.clone(),
        name: format!("{}.md", request.name),
        format: FileFormat::Markdown,
        size: format_file_size(markdown.len() as u64),
        uploaded_at: now,
        summary: analysis.summary.clone(),
        tags: analysis.tags.clone(),
        file_path,
        content_mode: ContentMode::Summary,
        status: FileStatus::Ready,
        error_message: None,
        content: Some(markdown),
    };
    state.files.insert(file_id.clone(), session_file);

    let session = SessionRecord {
        id: session_id.clone(),
        name: request.name.clone(),
        created_at: now,
        updated_at: now,
        messages,
        context_file_ids: request.context_file_ids,
    };
    state.sessions.insert(session_id.clone(), session);

    info!(%session_id, %file_id, name = %request.name, "session saved");

    Ok(Json(ApiResponse::ok(SaveResponse {
        session_id,
        file_id,
        name: format!("{}.md", request.name),
        summary: analysis.summary,
        tags: analysis.tags,
    })))
}

/// `GET /api/sessions` — newest first by update time.
pub async fn list(State(state): State<AppState>) -> Json<ApiResponse<Vec<SessionSummary>>> {
    let mut sessions = state.sessions.list();
    sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    Json(ApiResponse::ok(
        sessions.iter().map(SessionRecord::summary_view).collect(),
    ))
}

/// `GET /api/sessions/{id}` — full session including messages.
pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<SessionRecord>>, ApiError> {
    let session = state
        .sessions
        .get(&id)
        .ok_or(ApiError::NotFound("Session"))?;
    Ok(Json(ApiResponse::ok(session)))
}

/// `DELETE /api/sessions/{id}` — removes the session record only; the
/// companion file record stays browsable until deleted itself.
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    state
        .sessions
        .remove(&id)
        .ok_or(ApiError::NotFound("Session"))?;
    info!(session_id = %id, "session deleted");
    Ok(Json(ApiResponse::success()))
}
