//! In-memory vector store keyed by collection name

pub mod index;

pub use index::{IndexedDocument, ScoredDocument, VectorIndex};
