use anyhow::{Context, Result};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::config::EmbeddingConfig;

#[cfg(test)]
use mockall::automock;

/// Trait for embedding service
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

/// Ollama embedding client (`POST /api/embed`)
#[derive(Clone)]
pub struct OllamaEmbedder {
    client: Client,
    config: EmbeddingConfig,
}

impl OllamaEmbedder {
    pub fn new(config: EmbeddingConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, config })
    }

    async fn request(&self, input: Vec<&str>) -> Result<Vec<Vec<f32>>> {
        let expected = input.len();
        debug!("Requesting {} embeddings from model {}", expected, self.config.model);

        let request = EmbedRequest {
            model: &self.config.model,
            input,
        };

        let response = self
            .client
            .post(format!("{}/api/embed", self.config.base_url.trim_end_matches('/')))
            .json(&request)
            .send()
            .await
            .context("Failed to connect to embedding server")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Embedding API error ({}): {}", status, body);
        }

        let json_value: Value = response
            .json()
            .await
            .context("Failed to parse embedding response as JSON")?;

        let embeddings = parse_embeddings(&json_value)?;
        if embeddings.len() != expected {
            anyhow::bail!(
                "Embedding server returned {} vectors for {} inputs",
                embeddings.len(),
                expected
            );
        }

        Ok(embeddings)
    }
}

/// Accepts `{"embeddings": [[..]]}` (api/embed) and `{"embedding": [..]}` (legacy api/embeddings)
fn parse_embeddings(json_value: &Value) -> Result<Vec<Vec<f32>>> {
    fn to_vector(value: &Value) -> Option<Vec<f32>> {
        value
            .as_array()
            .map(|arr| arr.iter().filter_map(|v| v.as_f64().map(|f| f as f32)).collect())
    }

    if let Some(list) = json_value.get("embeddings").and_then(Value::as_array) {
        return list
            .iter()
            .map(|v| to_vector(v).context("Embedding entry is not an array"))
            .collect();
    }

    if let Some(single) = json_value.get("embedding").and_then(to_vector) {
        return Ok(vec![single]);
    }

    anyhow::bail!("Unrecognized embedding response format: {}", json_value)
}

#[async_trait::async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.request(vec![text])
            .await?
            .pop()
            .context("Empty embedding response")
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request(texts.iter().map(String::as_str).collect()).await
    }
}
