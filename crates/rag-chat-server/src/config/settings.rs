use anyhow::Result;
use config::{builder::DefaultState, Config, ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub embedding: EmbeddingConfig,
    pub retrieval: RetrievalConfig,
    pub session: SessionConfig,
    pub idempotency: IdempotencyConfig,
    pub ingestion: IngestionConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EmbeddingConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RetrievalConfig {
    /// Collection searched when the caller does not name one
    pub default_collection: String,
    pub top_k: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SessionConfig {
    pub context_expiry_seconds: u64,
    pub sweep_interval_seconds: u64,
}

impl SessionConfig {
    pub fn context_expiry(&self) -> Duration {
        Duration::from_secs(self.context_expiry_seconds)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds.max(1))
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct IdempotencyConfig {
    pub retention_seconds: u64,
}

impl IdempotencyConfig {
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_seconds)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct IngestionConfig {
    /// CSV columns joined (in this order) into the document text
    pub content_columns: Vec<String>,
    pub max_upload_bytes: usize,
}

impl Settings {
    /// Load settings: defaults -> config/settings.toml -> APP__* environment
    pub fn load() -> Result<Self> {
        dotenvy::from_filename("config/.env").ok();
        dotenvy::dotenv().ok();

        let config = Self::defaults_builder()?
            .add_source(File::with_name("config/settings").required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("ingestion.content_columns")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        Ok(settings)
    }

    /// Built-in defaults only, without reading files or the environment
    pub fn defaults() -> Result<Self> {
        let settings: Settings = Self::defaults_builder()?.build()?.try_deserialize()?;
        Ok(settings)
    }

    fn defaults_builder() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000_i64)?
            .set_default("llm.base_url", "http://localhost:11434")?
            .set_default("llm.model", "llama3")?
            .set_default("llm.timeout_seconds", 120_i64)?
            .set_default("embedding.base_url", "http://localhost:11434")?
            .set_default("embedding.model", "nomic-embed-text")?
            .set_default("embedding.timeout_seconds", 60_i64)?
            .set_default("retrieval.default_collection", "documents")?
            .set_default("retrieval.top_k", 4_i64)?
            .set_default("session.context_expiry_seconds", 3600_i64)?
            .set_default("session.sweep_interval_seconds", 300_i64)?
            .set_default("idempotency.retention_seconds", 86_400_i64)?
            .set_default("ingestion.content_columns", vec!["name", "summary"])?
            .set_default("ingestion.max_upload_bytes", 10_i64 * 1024 * 1024)
    }
}
