//! Format detection and per-format content parsing.
//!
//! Every parser produces a bounded, descriptive plain-text rendering of the
//! file (headers plus sampled rows for tabular data, extracted text and
//! tables for documents). The output feeds both the AI summarizer and the
//! "full" chat context mode; it is not round-trippable to the original.

mod document;
mod tabular;

use std::path::Path;

use crate::error::ApiError;
use crate::schema::FileFormat;

/// Cap on parser output (and on the DOCX/PDF/HTML raw text feeding it).
pub const MAX_CONTENT_LEN: usize = 50_000;

/// Tabular parsers sample at most this many data rows.
pub const MAX_SAMPLE_ROWS: usize = 50;

const TRUNCATION_MARKER: &str = "\n\n[Content truncated...]";

/// Map a filename to its logical format by extension.
pub fn detect_format(filename: &str) -> Result<FileFormat, ApiError> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "csv" => Ok(FileFormat::Csv),
        "xlsx" | "xls" => Ok(FileFormat::Excel),
        "pdf" => Ok(FileFormat::Pdf),
        "html" | "htm" => Ok(FileFormat::Html),
        "md" | "markdown" => Ok(FileFormat::Markdown),
        "docx" | "doc" => Ok(FileFormat::Docx),
        _ => Err(ApiError::UnsupportedFormat(format!(".{ext}"))),
    }
}

/// Parse a stored file into its bounded text representation.
///
/// Fails with `FileNotFound` when the path is absent and propagates
/// format-specific parse errors, except DOCX which degrades to a fixed
/// placeholder string on any read failure.
pub async fn parse_file(path: &Path, format: FileFormat) -> Result<String, ApiError> {
    if !path.exists() {
        return Err(ApiError::FileNotFound(path.display().to_string()));
    }

    match format {
        FileFormat::Csv => tabular::parse_csv(path).await,
        FileFormat::Excel => tabular::parse_excel(path).await,
        FileFormat::Pdf => document::parse_pdf(path).await,
        FileFormat::Html => document::parse_html(path).await,
        FileFormat::Markdown => document::parse_markdown(path).await,
        FileFormat::Docx => document::parse_docx(path).await,
    }
}

/// Human-readable size label for display. Pure helper, not used in parsing.
pub fn format_file_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / 1024.0 / 1024.0)
    }
}

/// Cap output at [`MAX_CONTENT_LEN`], appending an explicit marker when
/// anything was cut.
pub(crate) fn truncate_content(text: String) -> String {
    if text.len() <= MAX_CONTENT_LEN {
        return text;
    }
    let mut end = MAX_CONTENT_LEN;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    let mut out = text[..end].to_string();
    out.push_str(TRUNCATION_MARKER);
    out
}
