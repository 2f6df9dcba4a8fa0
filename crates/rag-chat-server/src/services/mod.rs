pub mod conversation;
pub mod document_service;
pub mod embedding_service;
pub mod llm_service;
pub mod rag_service;

pub use document_service::DocumentService;
pub use embedding_service::{Embedder, OllamaEmbedder};
pub use llm_service::OllamaGenerator;
pub use rag_service::VectorRetriever;
