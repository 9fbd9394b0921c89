//! AI gateway: prompt construction, single-call delegation to a generative
//! text model, and response parsing.
//!
//! Every operation is a single best-effort attempt — no retries, backoff, or
//! rate limiting. Each operation declares its own degrade-vs-fail contract:
//! `analyze_file` and `chat` fail hard, `session_summary` degrades to a
//! fixed default.

mod gemini;

pub use gemini::GeminiModel;

use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::warn;

use crate::error::ApiError;
use crate::schema::{AnalysisResult, ChatMessage, Role};

/// Prompt in, raw text out. The concrete model is injected so tests can
/// script replies.
#[async_trait]
pub trait TextModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}

pub type SharedModel = Arc<dyn TextModel>;

/// Fixed management-taxonomy suggestion list embedded in analysis prompts.
/// The model is prompted with it but not hard-constrained to it.
const MANAGEMENT_TAGS: &str = "\
Financial Management: finance, budget, cost, revenue, profit, cash flow, assets, liabilities, investment, ROI
Operations Management: operations, process, efficiency, quality, inventory, supply chain, production, logistics, KPI, performance
Marketing: market, marketing, sales, customer, brand, promotion, channel, pricing, competition, growth
Human Resources: HR, recruiting, training, performance review, compensation, organization, team, leadership, culture, employee
Strategy: strategy, planning, goals, risk, opportunity, competition, innovation, transformation, partnership, M&A
Data Analysis: data, analysis, report, trend, forecast, comparison, statistics, metrics, dashboard, visualization
";

const ANALYZE_CONTENT_CAP: usize = 30_000;
const CONTEXT_ITEM_CAP: usize = 10_000;
const TRANSCRIPT_CAP: usize = 20_000;
const MAX_TAGS: usize = 10;

/// One file's contribution to a chat context.
#[derive(Debug, Clone)]
pub struct ContextItem {
    pub filename: String,
    pub content: String,
}

/// Wraps the external generative model for the three tasks this service
/// delegates: summarize-and-tag a document, answer a chat question over
/// context excerpts, and summarize-and-tag a conversation.
pub struct AiGateway {
    model: SharedModel,
}

impl AiGateway {
    pub fn new(model: SharedModel) -> Self {
        Self { model }
    }

    /// Summarize and tag a parsed document. Fails hard on transport errors
    /// or when the reply contains no parseable JSON object.
    pub async fn analyze_file(
        &self,
        content: &str,
        filename: &str,
    ) -> Result<AnalysisResult, ApiError> {
        let prompt = build_analyze_prompt(content, filename);
        let reply = self
            .model
            .generate(&prompt)
            .await
            .map_err(|e| ApiError::AiAnalysis(e.to_string()))?;
        parse_analysis(&reply).map_err(ApiError::AiAnalysis)
    }

    /// Answer a chat message over the gathered context excerpts. Returns the
    /// model's raw prose.
    pub async fn chat(&self, message: &str, context: &[ContextItem]) -> Result<String, ApiError> {
        let prompt = build_chat_prompt(message, context);
        self.model
            .generate(&prompt)
            .await
            .map_err(|e| ApiError::AiChat(e.to_string()))
    }

    /// Summarize and tag a conversation. Never fails: any transport or parse
    /// failure degrades to a fixed default so a session save cannot be
    /// blocked by the summarizer.
    pub async fn session_summary(&self, messages: &[ChatMessage]) -> AnalysisResult {
        match self.try_session_summary(messages).await {
            Ok(analysis) => analysis,
            Err(e) => {
                warn!(error = %e, "session summary failed, using default");
                AnalysisResult {
                    summary: "Conversation session".to_string(),
                    tags: vec!["conversation".to_string(), "analysis".to_string()],
                }
            }
        }
    }

    async fn try_session_summary(&self, messages: &[ChatMessage]) -> anyhow::Result<AnalysisResult> {
        let prompt = build_session_prompt(messages);
        let reply = self.model.generate(&prompt).await?;
        parse_analysis(&reply).map_err(anyhow::Error::msg)
    }
}

fn build_analyze_prompt(content: &str, filename: &str) -> String {
    format!(
        r#"You are a professional document analysis assistant. Analyze the following file content and provide:

1. **Summary**: a 100-200 word summary covering the file's main content, key figures, and important findings.

2. **Tags**: choose the most relevant tags (at most 10) from this list of common management tags:
{MANAGEMENT_TAGS}
Return the result as JSON in exactly this shape:
{{
  "summary": "file summary...",
  "tags": ["tag1", "tag2", "tag3"]
}}

Filename: {filename}

File content:
{content}

Return only the JSON, with no extra text or markdown code fences."#,
        content = clamp(content, ANALYZE_CONTENT_CAP),
    )
}

fn build_chat_prompt(message: &str, context: &[ContextItem]) -> String {
    let mut context_prompt = String::new();
    if !context.is_empty() {
        context_prompt.push_str("The following file contents are provided as context:\n\n");
        for (index, item) in context.iter().enumerate() {
            let _ = writeln!(context_prompt, "--- File {}: {} ---", index + 1, item.filename);
            context_prompt.push_str(clamp(&item.content, CONTEXT_ITEM_CAP));
            context_prompt.push_str("\n\n");
        }
    }

    format!(
        r#"You are a professional enterprise data analysis assistant. Answer the user's question based on the provided context.
If the context contains no relevant information, say so honestly.
Keep the answer professional, accurate, and well structured.

{context_prompt}
User question: {message}"#
    )
}

fn build_session_prompt(messages: &[ChatMessage]) -> String {
    let transcript = messages
        .iter()
        .map(|m| {
            let role = match m.role {
                Role::User => "User",
                Role::Assistant => "AI",
            };
            format!("{role}: {}", m.content)
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        r#"Analyze the following conversation and provide:

1. **Summary**: a 100-200 word summary covering the conversation's topics and key conclusions.

2. **Tags**: choose the most relevant tags (at most 10) from this list of common management tags:
{MANAGEMENT_TAGS}
Return the result as JSON:
{{
  "summary": "conversation summary...",
  "tags": ["tag1", "tag2"]
}}

Conversation:
{transcript}

Return only the JSON, with no extra text."#,
        transcript = clamp(&transcript, TRANSCRIPT_CAP),
    )
}

/// Extract the first top-level `{...}` block from a raw model reply,
/// tolerating wrapper prose and code fences.
fn extract_json_block(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

fn parse_analysis(reply: &str) -> Result<AnalysisResult, String> {
    let block = extract_json_block(reply.trim())
        .ok_or_else(|| "Invalid response format from model".to_string())?;
    let value: Value =
        serde_json::from_str(block).map_err(|e| format!("invalid JSON in model reply: {e}"))?;

    let summary = value
        .get("summary")
        .and_then(Value::as_str)
        .unwrap_or("Unable to generate summary")
        .to_string();
    let tags = value
        .get("tags")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .take(MAX_TAGS)
                .collect()
        })
        .unwrap_or_default();

    Ok(AnalysisResult { summary, tags })
}

/// Cap a string at a char boundary at or below `max` bytes.
fn clamp(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
