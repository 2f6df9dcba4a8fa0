//! Conversation state and answer orchestration
//!
//! Provides:
//! - Session context store with lazy expiry (DashMap)
//! - Idempotency cache for retried chat requests
//! - Lexical relevance gate for retrieved items
//! - Prompt path selection and the chat orchestrator

pub mod idempotency;
pub mod orchestrator;
pub mod prompt;
pub mod relevance;
pub mod session_store;
mod sweeper;
pub mod types;

pub use idempotency::IdempotencyCache;
pub use orchestrator::{ChatCommand, ChatOrchestrator, ChatOutcome, Generator, Retriever};
pub use prompt::{select_prompt, Prompt};
pub use relevance::RelevanceEvaluator;
pub use session_store::SessionContextStore;
pub use sweeper::StateSweeper;
pub use types::{PromptPath, RetrievedItem};
