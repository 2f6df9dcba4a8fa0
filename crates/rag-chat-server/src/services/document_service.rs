use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info};

use crate::document::parse_csv;
use crate::services::embedding_service::Embedder;
use crate::vector::{IndexedDocument, VectorIndex};

const EMBED_BATCH_SIZE: usize = 32;

/// CSV ingestion: parse -> embed -> upsert
pub struct DocumentService {
    index: Arc<VectorIndex>,
    embedder: Arc<dyn Embedder>,
    content_columns: Vec<String>,
}

impl DocumentService {
    pub fn new(
        index: Arc<VectorIndex>,
        embedder: Arc<dyn Embedder>,
        content_columns: Vec<String>,
    ) -> Self {
        Self {
            index,
            embedder,
            content_columns,
        }
    }

    /// Returns the number of rows ingested into `collection`
    pub async fn ingest_csv(
        &self,
        filename: &str,
        bytes: &[u8],
        collection: &str,
    ) -> Result<usize> {
        info!(
            "Ingesting {} ({} bytes) into collection '{}'",
            filename,
            bytes.len(),
            collection
        );

        let rows = parse_csv(bytes, &self.content_columns)
            .with_context(|| format!("Failed to parse {}", filename))?;
        debug!("Parsed {} rows from {}", rows.len(), filename);

        if rows.is_empty() {
            return Ok(0);
        }

        let mut documents = Vec::with_capacity(rows.len());
        for batch in rows.chunks(EMBED_BATCH_SIZE) {
            let texts: Vec<String> = batch.iter().map(|row| row.text.clone()).collect();
            let embeddings = self
                .embedder
                .embed_batch(&texts)
                .await
                .context("Failed to embed CSV rows")?;

            if embeddings.len() != batch.len() {
                anyhow::bail!(
                    "Expected {} embeddings, got {}",
                    batch.len(),
                    embeddings.len()
                );
            }

            documents.extend(batch.iter().cloned().zip(embeddings).map(|(row, embedding)| {
                IndexedDocument {
                    id: row.id,
                    text: row.text,
                    metadata: row.metadata,
                    embedding,
                }
            }));
        }

        let count = self.index.upsert(collection, documents);
        info!(
            "Upserted {} documents into '{}' (total: {})",
            count,
            collection,
            self.index.len(collection)
        );
        Ok(count)
    }
}
