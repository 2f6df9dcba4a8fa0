use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// A stored document with its embedding
#[derive(Debug, Clone)]
pub struct IndexedDocument {
    pub id: String,
    pub text: String,
    pub metadata: Map<String, Value>,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct ScoredDocument {
    pub document: IndexedDocument,
    pub score: f32,
}

/// Brute-force cosine index, one map per collection.
/// Upserting an existing id replaces the previous document.
#[derive(Default)]
pub struct VectorIndex {
    collections: RwLock<HashMap<String, HashMap<String, IndexedDocument>>>,
}

impl VectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, collection: &str, documents: Vec<IndexedDocument>) -> usize {
        let count = documents.len();
        let mut collections = self.collections.write();
        let entries = collections.entry(collection.to_string()).or_default();
        for doc in documents {
            entries.insert(doc.id.clone(), doc);
        }
        count
    }

    /// Top `k` by descending similarity. Unknown collection yields nothing.
    pub fn search(&self, collection: &str, query: &[f32], k: usize) -> Vec<ScoredDocument> {
        if k == 0 {
            return Vec::new();
        }

        let collections = self.collections.read();
        let Some(entries) = collections.get(collection) else {
            return Vec::new();
        };

        let mut scored: Vec<ScoredDocument> = entries
            .values()
            .filter(|doc| doc.embedding.len() == query.len())
            .map(|doc| ScoredDocument {
                score: cosine_similarity(query, &doc.embedding),
                document: doc.clone(),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.document.id.cmp(&b.document.id))
        });
        scored.truncate(k);
        scored
    }

    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .get(collection)
            .map_or(0, HashMap::len)
    }
}

/// Calculate cosine similarity between two vectors
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}
