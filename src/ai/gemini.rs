//! Gemini REST client implementing [`TextModel`].

use anyhow::Context;
use async_trait::async_trait;
use serde_json::{json, Value};

use super::TextModel;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Client for the Google generative-language `generateContent` endpoint.
pub struct GeminiModel {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiModel {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl TextModel for GeminiModel {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        let url = format!(
            "{API_BASE}/{}:generateContent?key={}",
            self.model, self.api_key
        );
        let payload = json!({
            "contents": [
                { "parts": [ { "text": prompt } ] }
            ]
        });

        let response = self.client.post(&url).json(&payload).send().await?;
        if !response.status().is_success() {
            anyhow::bail!("Gemini call failed with status {}", response.status());
        }

        let body: Value = response.json().await?;
        let text = body
            .get("candidates")
            .and_then(Value::as_array)
            .and_then(|arr| arr.first())
            .and_then(|c| c.get("content"))
            .and_then(|c| c.get("parts"))
            .and_then(Value::as_array)
            .and_then(|parts| parts.first())
            .and_then(|p| p.get("text"))
            .and_then(Value::as_str)
            .context("Gemini response missing text content")?;

        Ok(text.to_string())
    }
}
