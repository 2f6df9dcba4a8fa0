use axum::{extract::State, Json};
use std::sync::Arc;

use super::session::SessionKey;
use crate::models::chat::StatusMessage;
use crate::services::conversation::ChatOrchestrator;

/// DELETE /api/v1/context
pub async fn clear_context_handler(
    State(orchestrator): State<Arc<ChatOrchestrator>>,
    SessionKey(session_id): SessionKey,
) -> Json<StatusMessage> {
    orchestrator.clear_context(&session_id);
    Json(StatusMessage::success("Context cleared successfully"))
}
