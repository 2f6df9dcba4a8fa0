use anyhow::Result;
use std::sync::Arc;
use tracing::debug;

use crate::services::conversation::{RetrievedItem, Retriever};
use crate::services::embedding_service::Embedder;
use crate::vector::{ScoredDocument, VectorIndex};

/// Similarity search over the in-memory index
#[derive(Clone)]
pub struct VectorRetriever {
    index: Arc<VectorIndex>,
    embedder: Arc<dyn Embedder>,
    top_k: usize,
}

impl VectorRetriever {
    pub fn new(index: Arc<VectorIndex>, embedder: Arc<dyn Embedder>, top_k: usize) -> Self {
        Self {
            index,
            embedder,
            top_k,
        }
    }
}

impl From<ScoredDocument> for RetrievedItem {
    fn from(hit: ScoredDocument) -> Self {
        Self {
            id: hit.document.id,
            content: hit.document.text,
            metadata: hit.document.metadata,
            score: hit.score,
        }
    }
}

#[async_trait::async_trait]
impl Retriever for VectorRetriever {
    async fn retrieve(&self, query: &str, collection: &str) -> Result<Vec<RetrievedItem>> {
        // Skip the embedding round-trip when there is nothing to search
        if self.index.len(collection) == 0 {
            debug!("Collection '{}' is empty or missing", collection);
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(query).await?;
        let hits = self.index.search(collection, &query_embedding, self.top_k);

        debug!(
            "Retrieved {} items from '{}' (top_k: {})",
            hits.len(),
            collection,
            self.top_k
        );

        Ok(hits.into_iter().map(RetrievedItem::from).collect())
    }
}
