pub mod settings;

pub use settings::{
    EmbeddingConfig, IdempotencyConfig, IngestionConfig, LlmConfig, RetrievalConfig,
    ServerConfig, SessionConfig, Settings,
};
