use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use super::{parse, prompts, SuggestionApi};
use crate::models::{CatalogRecord, Constraints, PickSuggestion, Suggestion};

const GEMINI_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    temperature: f32,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String, temperature: f32) -> Result<Self> {
        let user_agent = format!("reelpick/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(60))
            .user_agent(user_agent)
            .build()
            .context("Failed to build Gemini HTTP client")?;
        Ok(Self {
            client,
            api_key,
            model,
            temperature,
        })
    }

    /// One generation call, returning the concatenated text parts.
    async fn generate_text(&self, prompt: &str) -> Result<String> {
        #[derive(Deserialize)]
        struct GenerateResponse {
            candidates: Option<Vec<Candidate>>,
        }

        #[derive(Deserialize)]
        struct Candidate {
            content: Option<Content>,
        }

        #[derive(Deserialize)]
        struct Content {
            #[serde(default)]
            parts: Vec<Part>,
        }

        #[derive(Deserialize)]
        struct Part {
            text: Option<String>,
        }

        let url = format!("{GEMINI_BASE}/{}:generateContent", self.model);
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "temperature": self.temperature,
                "responseMimeType": "application/json"
            }
        });

        let res = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("Gemini request failed")?;
        let status = res.status();
        let text = res.text().await.context("reading Gemini body failed")?;
        if !status.is_success() {
            return Err(anyhow!("Gemini returned {status}: {text}"));
        }

        let parsed: GenerateResponse =
            serde_json::from_str(&text).context("Gemini response JSON parse failed")?;
        let output: String = parsed
            .candidates
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        if output.trim().is_empty() {
            return Err(anyhow!("Gemini returned no text"));
        }
        debug!(model = %self.model, chars = output.len(), "Gemini generation finished");
        Ok(output)
    }
}

#[async_trait]
impl SuggestionApi for GeminiClient {
    async fn generate_suggestions(
        &self,
        constraints: &Constraints,
        count: usize,
    ) -> Result<Vec<Suggestion>> {
        let prompt = prompts::deck_prompt(constraints, count);
        let text = self.generate_text(&prompt).await?;
        parse::parse_suggestions(&text, count)
    }

    async fn generate_final_pick(
        &self,
        liked: &[CatalogRecord],
        disliked: &[CatalogRecord],
        excluded_titles: &[String],
    ) -> Result<PickSuggestion> {
        let prompt = prompts::final_pick_prompt(liked, disliked, excluded_titles);
        let text = self.generate_text(&prompt).await?;
        parse::parse_pick(&text)
    }
}
