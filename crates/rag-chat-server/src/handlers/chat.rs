use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::{info, warn};

use super::session::SessionKey;
use crate::models::chat::ChatRequest;
use crate::services::conversation::{ChatCommand, ChatOrchestrator};
use crate::utils::error::ApiError;

pub const IDEMPOTENCY_HEADER: &str = "idempotency-key";
pub const REPLAYED_HEADER: &str = "idempotency-replayed";

/// POST /api/v1/chat
pub async fn chat_handler(
    State(orchestrator): State<Arc<ChatOrchestrator>>,
    SessionKey(session_id): SessionKey,
    headers: HeaderMap,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        warn!("Invalid chat body from session {}: {}", session_id, rejection.body_text());
        ApiError::BadRequest("Invalid JSON body".to_string())
    })?;

    // A non-empty header takes precedence over the body field
    let idempotency_token = headers
        .get(IDEMPOTENCY_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.trim().is_empty())
        .map(str::to_string)
        .or(request.idempotency_key);

    info!(
        "Chat request from session {} (idempotency token: {})",
        session_id,
        idempotency_token.as_deref().unwrap_or("-")
    );

    let outcome = orchestrator
        .chat(ChatCommand {
            session_id,
            idempotency_token,
            question: request.question,
            collection: request.collection,
        })
        .await?;

    let mut response = outcome.reply.as_ref().into_response();
    if outcome.replayed {
        response
            .headers_mut()
            .insert(REPLAYED_HEADER, HeaderValue::from_static("true"));
    }

    Ok(response)
}
