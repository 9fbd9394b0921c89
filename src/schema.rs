//! Wire and storage types shared across the pipelines.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Logical document format, detected from the filename extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Csv,
    Excel,
    Pdf,
    Html,
    Markdown,
    Docx,
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FileFormat::Csv => "csv",
            FileFormat::Excel => "excel",
            FileFormat::Pdf => "pdf",
            FileFormat::Html => "html",
            FileFormat::Markdown => "markdown",
            FileFormat::Docx => "docx",
        };
        f.write_str(s)
    }
}

/// Lifecycle of an uploaded file. Records are created in `Analyzing` and move
/// exactly once to `Ready` or `Error` when the background analysis finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Uploading,
    Analyzing,
    Ready,
    Error,
}

/// Which representation of a file is fed to the chat context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContentMode {
    #[default]
    Summary,
    Full,
}

/// A stored file record with metadata, parsed content, and analysis output.
#[derive(Debug, Clone)]
pub struct FileRecord {
    pub id: String,
    pub name: String,
    pub format: FileFormat,
    pub size: String,
    pub uploaded_at: DateTime<Utc>,
    pub summary: String,
    pub tags: Vec<String>,
    pub file_path: PathBuf,
    pub content_mode: ContentMode,
    pub status: FileStatus,
    pub error_message: Option<String>,
    /// Parsed full content, populated by the analysis task.
    pub content: Option<String>,
}

impl FileRecord {
    /// Projection returned by listing and detail routes. Omits the parsed
    /// content and the on-disk path.
    pub fn summary_view(&self) -> FileSummary {
        FileSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            format: self.format,
            size: self.size.clone(),
            uploaded_at: self.uploaded_at,
            summary: self.summary.clone(),
            tags: self.tags.clone(),
            status: self.status,
            error_message: self.error_message.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSummary {
    pub id: String,
    pub name: String,
    pub format: FileFormat,
    pub size: String,
    pub uploaded_at: DateTime<Utc>,
    pub summary: String,
    pub tags: Vec<String>,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single conversation turn. Immutable once created; insertion order is
/// chronological order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_files: Option<Vec<String>>,
}

/// A saved conversation. Created once on save, never mutated.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub messages: Vec<ChatMessage>,
    pub context_file_ids: Vec<String>,
}

impl SessionRecord {
    pub fn summary_view(&self) -> SessionSummary {
        SessionSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            message_count: self.messages.len(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub message_count: usize,
}

/// Summary and tags produced by the AI gateway for a file or a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub summary: String,
    pub tags: Vec<String>,
}

/// Uniform response envelope for every API route.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    /// `{"success": true}` with no payload.
    pub fn success() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}
