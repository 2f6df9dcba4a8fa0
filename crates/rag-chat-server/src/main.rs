use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use rag_chat_server::config::Settings;
use rag_chat_server::create_router;
use rag_chat_server::logging::init_logger;
use rag_chat_server::services::conversation::{
    ChatOrchestrator, IdempotencyCache, SessionContextStore, StateSweeper,
};
use rag_chat_server::services::{
    DocumentService, Embedder, OllamaEmbedder, OllamaGenerator, VectorRetriever,
};
use rag_chat_server::state::AppState;
use rag_chat_server::vector::VectorIndex;

#[tokio::main]
async fn main() -> Result<()> {
    init_logger()?;

    info!("Starting RAG chat server v{}", env!("CARGO_PKG_VERSION"));

    let settings = Settings::load()?;
    info!(
        "Configuration loaded (llm: {} @ {}, embedding: {})",
        settings.llm.model, settings.llm.base_url, settings.embedding.model
    );

    // Stores
    let sessions = Arc::new(SessionContextStore::new(settings.session.context_expiry()));
    let idempotency = Arc::new(IdempotencyCache::new(settings.idempotency.retention()));
    let index = Arc::new(VectorIndex::new());

    // Model adapters
    let embedder: Arc<dyn Embedder> = Arc::new(OllamaEmbedder::new(settings.embedding.clone())?);
    let generator = Arc::new(OllamaGenerator::new(settings.llm.clone())?);
    let retriever = Arc::new(VectorRetriever::new(
        Arc::clone(&index),
        Arc::clone(&embedder),
        settings.retrieval.top_k,
    ));

    let orchestrator = Arc::new(ChatOrchestrator::new(
        Arc::clone(&sessions),
        Arc::clone(&idempotency),
        retriever,
        generator,
        settings.retrieval.default_collection.clone(),
    ));

    let documents = Arc::new(DocumentService::new(
        index,
        embedder,
        settings.ingestion.content_columns.clone(),
    ));

    let _sweeper =
        StateSweeper::new(sessions, idempotency, settings.session.sweep_interval()).spawn();

    let addr = SocketAddr::from((
        settings.server.host.parse::<std::net::IpAddr>()?,
        settings.server.port,
    ));

    let app = create_router(AppState {
        orchestrator,
        documents,
        settings: Arc::new(settings),
    });

    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
