use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

#[cfg(test)]
use mockall::automock;

use crate::models::chat::{ChatAnswer, ChatReply};
use crate::utils::error::ApiError;

use super::idempotency::IdempotencyCache;
use super::prompt::{select_prompt, Prompt};
use super::session_store::SessionContextStore;
use super::types::RetrievedItem;

/// Trait for the language-model completion call
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &Prompt) -> Result<String>;
}

/// Trait for the similarity-search call
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, query: &str, collection: &str) -> Result<Vec<RetrievedItem>>;
}

/// One inbound chat turn, as handed over by the transport layer
#[derive(Debug, Clone)]
pub struct ChatCommand {
    pub session_id: String,
    pub idempotency_token: Option<String>,
    pub question: String,
    pub collection: Option<String>,
}

/// Reply plus whether it came out of the idempotency cache
#[derive(Debug, Clone)]
pub struct ChatOutcome {
    pub reply: Arc<ChatReply>,
    pub replayed: bool,
}

pub struct ChatOrchestrator {
    sessions: Arc<SessionContextStore>,
    idempotency: Arc<IdempotencyCache>,
    retriever: Arc<dyn Retriever>,
    generator: Arc<dyn Generator>,
    default_collection: String,
}

impl ChatOrchestrator {
    pub fn new(
        sessions: Arc<SessionContextStore>,
        idempotency: Arc<IdempotencyCache>,
        retriever: Arc<dyn Retriever>,
        generator: Arc<dyn Generator>,
        default_collection: String,
    ) -> Self {
        Self {
            sessions,
            idempotency,
            retriever,
            generator,
            default_collection,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionContextStore> {
        &self.sessions
    }

    pub fn idempotency(&self) -> &Arc<IdempotencyCache> {
        &self.idempotency
    }

    /// Handle a chat turn.
    ///
    /// Only validation failures come back as `Err`; everything after that,
    /// including a failed generation, is a `ChatReply` (cached when a token
    /// was supplied).
    pub async fn chat(&self, command: ChatCommand) -> Result<ChatOutcome, ApiError> {
        if command.question.trim().is_empty() {
            return Err(ApiError::BadRequest("Question is required".to_string()));
        }

        let token = command
            .idempotency_token
            .as_deref()
            .filter(|t| !t.is_empty());

        let Some(token) = token else {
            let reply = self.run_turn(&command).await;
            return Ok(ChatOutcome {
                reply: Arc::new(reply),
                replayed: false,
            });
        };

        // Fast path: completed earlier, return verbatim without side effects
        if let Some(reply) = self.idempotency.lookup(token) {
            info!(
                "Replaying cached reply for session {} (idempotency token {})",
                command.session_id, token
            );
            return Ok(ChatOutcome {
                reply,
                replayed: true,
            });
        }

        let (reply, executed) = self
            .idempotency
            .get_or_execute(token, || self.run_turn(&command))
            .await;

        if !executed {
            info!(
                "Joined in-flight turn for idempotency token {} (session {})",
                token, command.session_id
            );
        }

        Ok(ChatOutcome {
            reply,
            replayed: !executed,
        })
    }

    /// Clear a session's accumulated context
    pub fn clear_context(&self, session_id: &str) {
        if self.sessions.clear(session_id) {
            info!("Context cleared for session {}", session_id);
        }
    }

    async fn run_turn(&self, command: &ChatCommand) -> ChatReply {
        let start_time = Instant::now();
        let session_id = command.session_id.as_str();
        let question = command.question.as_str();

        // Store lock is only held inside get(); released before any external call
        let context = self.sessions.get(session_id);

        let collection = command
            .collection
            .as_deref()
            .filter(|c| !c.is_empty())
            .unwrap_or(&self.default_collection);

        let summary = self.retrieve(question, context.as_deref(), collection).await;

        let prompt = select_prompt(question, context.as_deref(), &summary);
        info!(
            "Session {}: path={}, context_chars={}, retrieved={}",
            session_id,
            prompt.path().as_str(),
            context.as_ref().map(|c| c.len()).unwrap_or(0),
            summary.len()
        );

        let answer = match self.generator.generate(&prompt).await {
            Ok(answer) if !answer.trim().is_empty() => answer,
            Ok(_) => {
                error!("Generation for session {} returned an empty answer", session_id);
                return ChatReply::failed("Model returned an empty answer");
            }
            Err(e) => {
                error!("Error processing chat request for session {}: {:#}", session_id, e);
                return ChatReply::failed(format!("{:#}", e));
            }
        };

        self.sessions.append(session_id, question, &answer);

        info!(
            "Chat turn for session {} completed in {}ms",
            session_id,
            start_time.elapsed().as_millis()
        );

        ChatReply::answered(ChatAnswer {
            question: question.to_string(),
            answer,
            timestamp: Utc::now().to_rfc3339(),
            session_id: session_id.to_string(),
        })
    }

    /// Best-effort retrieval: failures degrade to no summary
    async fn retrieve(
        &self,
        question: &str,
        context: Option<&str>,
        collection: &str,
    ) -> Vec<RetrievedItem> {
        let query = match context.filter(|c| !c.is_empty()) {
            Some(context) => format!("{}\n\n{}", context, question),
            None => question.to_string(),
        };

        match self.retriever.retrieve(&query, collection).await {
            Ok(items) => {
                debug!("Retrieved {} items from collection '{}'", items.len(), collection);
                items
            }
            Err(e) => {
                warn!(
                    "Retrieval from collection '{}' failed, continuing without summary: {:#}",
                    collection, e
                );
                Vec::new()
            }
        }
    }
}
