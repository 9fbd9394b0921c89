//! Conversation-to-Markdown rendering for session saves and exports.

use chrono::Local;

use crate::schema::{AnalysisResult, ChatMessage, Role};

/// MIME type used when relabeling a Markdown export as DOCX. Actual binary
/// conversion is a collaborator's job; the server only relabels.
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const MARKDOWN_MIME: &str = "text/markdown";

/// Render an export document: title, export timestamp, and the transcript.
pub fn render_export(session_name: Option<&str>, messages: &[ChatMessage]) -> String {
    let title = session_name.unwrap_or("Conversation");
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");

    let mut markdown = format!("# {title}\n\n");
    markdown.push_str(&format!("Exported: {timestamp}\n\n---\n\n"));
    markdown.push_str(&render_transcript(messages));
    markdown
}

/// Render a saved session: title, creation timestamp, AI summary and tags,
/// then the transcript.
pub fn render_session(
    name: &str,
    analysis: &AnalysisResult,
    messages: &[ChatMessage],
) -> String {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");

    let mut markdown = format!("# {name}\n\n");
    markdown.push_str(&format!("Created: {timestamp}\n\n"));
    markdown.push_str(&format!("## Summary\n\n{}\n\n", analysis.summary));
    markdown.push_str(&format!("## Tags\n\n{}\n\n", analysis.tags.join(", ")));
    markdown.push_str("---\n\n## Conversation\n\n");
    markdown.push_str(&render_transcript(messages));
    markdown
}

/// Export filename: `<name>_<millis>.<ext>`.
pub fn export_filename(session_name: Option<&str>, extension: &str) -> String {
    let base = session_name.unwrap_or("conversation");
    format!("{base}_{}.{extension}", chrono::Utc::now().timestamp_millis())
}

fn render_transcript(messages: &[ChatMessage]) -> String {
    let mut out = String::new();
    for message in messages {
        let role = match message.role {
            Role::User => "**User**",
            Role::Assistant => "**AI Assistant**",
        };
        out.push_str(&format!("{role}:\n\n{}\n\n---\n\n", message.content));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn message(role: Role, content: &str) -> ChatMessage {
        ChatMessage {
            id: "id".to_string(),
            role,
            content: content.to_string(),
            timestamp: Utc::now(),
            context_files: None,
        }
    }

    #[test]
    fn export_renders_role_labeled_blocks() {
        let messages = [
            message(Role::User, "What grew fastest?"),
            message(Role::Assistant, "EU revenue."),
        ];
        let md = render_export(Some("Q3 review"), &messages);

        assert!(md.starts_with("# Q3 review\n\n"));
        assert!(md.contains("Exported: "));
        assert!(md.contains("**User**:\n\nWhat grew fastest?"));
        assert!(md.contains("**AI Assistant**:\n\nEU revenue."));
        assert_eq!(md.matches("---").count(), 3);
    }

    #[test]
    fn export_without_name_uses_default_title() {
        let md = render_export(None, &[message(Role::User, "hi")]);
        assert!(md.starts_with("# Conversation\n\n"));
    }

    #[test]
    fn session_prepends_summary_and_tags_before_transcript() {
        let analysis = AnalysisResult {
            summary: "Revenue discussion.".to_string(),
            tags: vec!["finance".to_string(), "data".to_string()],
        };
        let md = render_session("Budget talk", &analysis, &[message(Role::User, "hi")]);

        assert!(md.starts_with("# Budget talk\n\n"));
        let summary_pos = md.find("## Summary\n\nRevenue discussion.").unwrap();
        let tags_pos = md.find("## Tags\n\nfinance, data").unwrap();
        let transcript_pos = md.find("## Conversation").unwrap();
        assert!(summary_pos < tags_pos && tags_pos < transcript_pos);
    }

    #[test]
    fn filenames_carry_name_and_extension() {
        let name = export_filename(Some("weekly"), "md");
        assert!(name.starts_with("weekly_"));
        assert!(name.ends_with(".md"));

        let fallback = export_filename(None, "docx");
        assert!(fallback.starts_with("conversation_"));
        assert!(fallback.ends_with(".docx"));
    }
}
