use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::LlmConfig;
use crate::services::conversation::{Generator, Prompt};

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Ollama completion client (`POST /api/generate`, non-streaming)
#[derive(Clone)]
pub struct OllamaGenerator {
    client: Client,
    config: LlmConfig,
}

impl OllamaGenerator {
    pub fn new(config: LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, config })
    }

    /// Generate a full completion for the given prompt text
    pub async fn generate_text(&self, prompt: String) -> Result<String> {
        let request = GenerateRequest {
            model: &self.config.model,
            prompt,
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.config.base_url.trim_end_matches('/')))
            .json(&request)
            .send()
            .await
            .context("Failed to call LLM API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("LLM API error: {} - {}", status, body);
        }

        let generated: GenerateResponse = response
            .json()
            .await
            .context("Failed to parse LLM response")?;

        Ok(generated.response)
    }
}

#[async_trait::async_trait]
impl Generator for OllamaGenerator {
    async fn generate(&self, prompt: &Prompt) -> Result<String> {
        debug!(
            "Generating with model {} (path: {}, variables: {:?})",
            self.config.model,
            prompt.path().as_str(),
            prompt.variables().keys().collect::<Vec<_>>()
        );
        self.generate_text(prompt.render()).await
    }
}
