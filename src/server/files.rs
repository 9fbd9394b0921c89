//! File routes: the upload pipeline and the file listing/detail surface.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::{info, warn};
use uuid::Uuid;

use super::AppState;
use crate::error::ApiError;
use crate::parser;
use crate::schema::{
    ApiResponse, ContentMode, FileFormat, FileRecord, FileStatus, FileSummary,
};

#[derive(Debug, Serialize)]
pub struct UploadAccepted {
    pub id: String,
    pub name: String,
    pub format: FileFormat,
    pub size: String,
    pub status: FileStatus,
}

/// `POST /api/files/upload` — accept a multipart upload, create the record
/// in `analyzing`, respond 202, and run the analysis detached.
///
/// A bad extension aborts before any record is created. Once the record
/// exists the spawned task always runs to completion; its outcome is
/// observable only through the record's status.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<UploadAccepted>>), ApiError> {
    let mut filename = String::new();
    let mut data: Vec<u8> = Vec::new();
    let mut content_mode = ContentMode::Summary;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("multipart error: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                filename = field.file_name().unwrap_or("upload").to_string();
                data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("failed to read upload: {e}")))?
                    .to_vec();
            }
            "contextType" => {
                let value = field.text().await.unwrap_or_default();
                if value == "full" {
                    content_mode = ContentMode::Full;
                }
            }
            _ => {}
        }
    }

    if data.is_empty() {
        return Err(ApiError::BadRequest("No file uploaded".to_string()));
    }

    let format = parser::detect_format(&filename)?;
    let file_path = state.storage.store(&filename, &data).await?;

    let id = Uuid::new_v4().to_string();
    let record = FileRecord {
        id: id.clone(),
        name: filename.clone(),
        format,
        size: parser::format_file_size(data.len() as u64),
        uploaded_at: Utc::now(),
        summary: String::new(),
        tags: Vec::new(),
        file_path: file_path.clone(),
        content_mode,
        status: FileStatus::Analyzing,
        error_message: None,
        content: None,
    };
    state.files.insert(id.clone(), record);

    info!(file_id = %id, name = %filename, %format, bytes = data.len(), "upload accepted");

    let accepted = UploadAccepted {
        id: id.clone(),
        name: filename.clone(),
        format,
        size: parser::format_file_size(data.len() as u64),
        status: FileStatus::Analyzing,
    };

    tokio::spawn(analyze_in_background(state, id, file_path, format, filename));

    Ok((StatusCode::ACCEPTED, Json(ApiResponse::ok(accepted))))
}

/// Detached analysis phase: parse, then summarize/tag, then mutate the
/// record to `ready` or `error`. Parse happens-before analyze
/// happens-before the status mutation.
async fn analyze_in_background(
    state: AppState,
    id: String,
    path: PathBuf,
    format: FileFormat,
    name: String,
) {
    let content = match parser::parse_file(&path, format).await {
        Ok(content) => {
            if let Some(mut record) = state.files.get(&id) {
                record.content = Some(content.clone());
                state.files.insert(id.clone(), record);
            }
            content
        }
        Err(e) => {
            mark_error(&state, &id, &e.to_string());
            return;
        }
    };

    match state.gateway.analyze_file(&content, &name).await {
        Ok(analysis) => {
            if let Some(mut record) = state.files.get(&id) {
                record.summary = analysis.summary;
                record.tags = analysis.tags;
                record.status = FileStatus::Ready;
                state.files.insert(id.clone(), record);
            }
            info!(file_id = %id, "file analysis completed");
        }
        Err(e) => mark_error(&state, &id, &e.to_string()),
    }
}

fn mark_error(state: &AppState, id: &str, message: &str) {
    warn!(file_id = %id, error = %message, "file analysis failed");
    if let Some(mut record) = state.files.get(id) {
        record.status = FileStatus::Error;
        record.error_message = Some(message.to_string());
        state.files.insert(id.to_string(), record);
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Comma-separated tag filter, OR semantics.
    pub tags: Option<String>,
    /// Case-insensitive substring match on name and summary.
    pub search: Option<String>,
}

/// `GET /api/files` — filtered listing, newest first.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<ApiResponse<Vec<FileSummary>>> {
    let mut files = state.files.list();

    if let Some(tags) = query.tags.as_deref().filter(|t| !t.is_empty()) {
        let wanted: Vec<&str> = tags.split(',').map(str::trim).collect();
        files.retain(|f| f.tags.iter().any(|t| wanted.contains(&t.as_str())));
    }

    if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
        let needle = search.to_lowercase();
        files.retain(|f| {
            f.name.to_lowercase().contains(&needle) || f.summary.to_lowercase().contains(&needle)
        });
    }

    files.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));

    Json(ApiResponse::ok(
        files.iter().map(FileRecord::summary_view).collect(),
    ))
}

/// `GET /api/files/{id}`
pub async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<FileSummary>>, ApiError> {
    let record = state.files.get(&id).ok_or(ApiError::NotFound("File"))?;
    Ok(Json(ApiResponse::ok(record.summary_view())))
}

#[derive(Debug, Serialize)]
pub struct ContentBody {
    pub content: String,
}

/// `GET /api/files/{id}/content` — empty string until analysis populates it.
pub async fn content(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ContentBody>>, ApiError> {
    let record = state.files.get(&id).ok_or(ApiError::NotFound("File"))?;
    Ok(Json(ApiResponse::ok(ContentBody {
        content: record.content.unwrap_or_default(),
    })))
}

/// `DELETE /api/files/{id}` — removes the record and the stored file.
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let record = state.files.remove(&id).ok_or(ApiError::NotFound("File"))?;
    state.storage.delete(&record.file_path).await?;
    info!(file_id = %id, "file deleted");
    Ok(Json(ApiResponse::success()))
}

/// `GET /api/files/tags/all` — sorted distinct tags across all files.
pub async fn all_tags(State(state): State<AppState>) -> Json<ApiResponse<Vec<String>>> {
    let tags: BTreeSet<String> = state
        .files
        .list()
        .into_iter()
        .flat_map(|f| f.tags)
        .collect();
    Json(ApiResponse::ok(tags.into_iter().collect()))
}
