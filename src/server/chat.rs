//! Chat routes: context-grounded question answering and conversation export.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::AppState;
use crate::ai::ContextItem;
use crate::error::ApiError;
use crate::export;
use crate::schema::{ApiResponse, ChatMessage, ContentMode, Role};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub context_file_ids: Vec<String>,
    #[serde(default)]
    pub context_type: ContentMode,
}

/// `POST /api/chat` — gather the selected files' summaries or contents and
/// ask the model. Ids that resolve to no record are silently skipped.
pub async fn send(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ApiResponse<ChatMessage>>, ApiError> {
    if request.message.trim().is_empty() {
        return Err(ApiError::BadRequest("Message is required".to_string()));
    }

    let mut context = Vec::new();
    for file_id in &request.context_file_ids {
        let Some(file) = state.files.get(file_id) else {
            debug!(%file_id, "skipping unknown context file");
            continue;
        };
        let content = match request.context_type {
            ContentMode::Full => file.content.unwrap_or_else(|| file.summary.clone()),
            ContentMode::Summary => file.summary.clone(),
        };
        context.push(ContextItem {
            filename: file.name,
            content,
        });
    }

    let reply = state.gateway.chat(&request.message, &context).await?;

    let message = ChatMessage {
        id: Uuid::new_v4().to_string(),
        role: Role::Assistant,
        content: reply,
        timestamp: Utc::now(),
        context_files: Some(request.context_file_ids),
    };

    Ok(Json(ApiResponse::ok(message)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub format: String,
    pub session_name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportPayload {
    pub content: String,
    pub filename: String,
    pub mime_type: String,
}

/// `POST /api/chat/export` — render the conversation to Markdown. The
/// `docx` format relabels the same Markdown with a DOCX MIME type and
/// filename; real conversion is deferred to a collaborator.
pub async fn export(
    Json(request): Json<ExportRequest>,
) -> Result<Json<ApiResponse<ExportPayload>>, ApiError> {
    if request.messages.is_empty() {
        return Err(ApiError::BadRequest("Messages are required".to_string()));
    }

    let (extension, mime_type) = match request.format.as_str() {
        "markdown" => ("md", export::MARKDOWN_MIME),
        "docx" => ("docx", export::DOCX_MIME),
        _ => {
            return Err(ApiError::BadRequest(
                "Invalid format. Use \"markdown\" or \"docx\"".to_string(),
            ))
        }
    };

    let name = request.session_name.as_deref();
    let payload = ExportPayload {
        content: export::render_export(name, &request.messages),
        filename: export::export_filename(name, extension),
        mime_type: mime_type.to_string(),
    };

    Ok(Json(ApiResponse::ok(payload)))
}
