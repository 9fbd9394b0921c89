//! Parsers for document formats: PDF, HTML, Markdown, and the lossy DOCX
//! fallback.

use scraper::{ElementRef, Html, Selector};
use std::fmt::Write as _;
use std::path::Path;

use super::{truncate_content, MAX_CONTENT_LEN};
use crate::error::ApiError;

/// PDF: page count prefix plus extracted text, capped at 50,000 chars.
pub async fn parse_pdf(path: &Path) -> Result<String, ApiError> {
    let bytes = tokio::fs::read(path).await?;

    // pdf-extract is CPU-bound and blocking.
    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| ApiError::Parse(format!("PDF extraction task failed: {e}")))?
        .map_err(|e| ApiError::Parse(format!("PDF extraction failed: {e}")))?;

    let pages = estimate_page_count(&text);
    let result = format!("PDF Document with {pages} page(s).\n\nContent:\n{text}");
    Ok(truncate_content(result))
}

/// HTML: title, visible body text, and every table as pipe-delimited rows.
/// Script and style content is dropped.
pub async fn parse_html(path: &Path) -> Result<String, ApiError> {
    let content = tokio::fs::read_to_string(path).await?;
    Ok(truncate_content(render_html(&content)))
}

/// Markdown: raw pass-through behind a one-line label.
pub async fn parse_markdown(path: &Path) -> Result<String, ApiError> {
    let content = tokio::fs::read_to_string(path).await?;
    Ok(format!("Markdown Document:\n\n{content}"))
}

/// DOCX: lossy byte-level fallback, not a real OOXML parser. Raw bytes are
/// filtered to printable ASCII, whitespace-collapsed, and capped. A read
/// failure degrades to a fixed placeholder string instead of propagating.
pub async fn parse_docx(path: &Path) -> Result<String, ApiError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => {
            let filtered: String = bytes
                .iter()
                .map(|&b| match b {
                    0x20..=0x7E | b'\n' | b'\r' | b'\t' => b as char,
                    _ => ' ',
                })
                .collect();
            let collapsed = filtered.split_whitespace().collect::<Vec<_>>().join(" ");
            let capped: String = collapsed.chars().take(MAX_CONTENT_LEN).collect();
            Ok(format!("DOCX Document:\n\n{capped}"))
        }
        Err(_) => Ok("Unable to parse DOCX file. Content extraction failed.".to_string()),
    }
}

// `scraper::Html` is not Send, so all DOM work stays inside this sync
// function and never crosses an await point.
fn render_html(content: &str) -> String {
    let document = Html::parse_document(content);

    let title_sel = Selector::parse("title").expect("static selector");
    let body_sel = Selector::parse("body").expect("static selector");
    let table_sel = Selector::parse("table").expect("static selector");
    let row_sel = Selector::parse("tr").expect("static selector");
    let cell_sel = Selector::parse("th, td").expect("static selector");

    let title = document
        .select(&title_sel)
        .next()
        .map(|t| t.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "No title".to_string());

    let body = document
        .select(&body_sel)
        .next()
        .unwrap_or_else(|| document.root_element());
    let text_content = visible_text(body);

    let mut tables = Vec::new();
    for table in document.select(&table_sel) {
        let mut rows = Vec::new();
        for tr in table.select(&row_sel) {
            let cells: Vec<String> = tr
                .select(&cell_sel)
                .map(|cell| cell.text().collect::<String>().trim().to_string())
                .collect();
            if !cells.is_empty() {
                rows.push(cells.join(" | "));
            }
        }
        if !rows.is_empty() {
            tables.push(rows.join("\n"));
        }
    }

    let mut result = format!("HTML Document: {title}\n\n");
    let _ = write!(result, "Text Content:\n{text_content}\n\n");

    if !tables.is_empty() {
        let _ = writeln!(result, "Tables found: {}", tables.len());
        for (i, table) in tables.iter().enumerate() {
            let _ = write!(result, "\nTable {}:\n{}\n", i + 1, table);
        }
    }

    result
}

/// Collect whitespace-collapsed text, skipping script and style subtrees.
fn visible_text(root: ElementRef) -> String {
    let mut out = String::new();
    for node in root.descendants() {
        if let Some(text) = node.value().as_text() {
            let hidden = node
                .ancestors()
                .filter_map(ElementRef::wrap)
                .any(|el| matches!(el.value().name(), "script" | "style"));
            if !hidden {
                out.push_str(&text.text);
                out.push(' ');
            }
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn estimate_page_count(text: &str) -> usize {
    let form_feeds = text.matches('\x0C').count();
    if form_feeds > 0 {
        return form_feeds + 1;
    }
    // Rough estimate when the extractor emits no page breaks.
    std::cmp::max(1, text.len() / 3000)
}
