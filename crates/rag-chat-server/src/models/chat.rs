use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

// ===== REQUEST MODELS =====

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub question: String,
    /// Vector collection to search, passed to the retriever unmodified
    #[serde(default)]
    pub collection: Option<String>,
    /// Fallback for clients that cannot set the Idempotency-Key header
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

// ===== RESPONSE MODELS =====

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatAnswer {
    pub question: String,
    pub answer: String,
    pub timestamp: String,
    pub session_id: String,
}

/// Body of a chat reply, in the service-wide `status` envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChatResponseBody {
    Success { data: ChatAnswer },
    Error { message: String, error: String },
}

/// A finished chat turn: exactly what is sent back and what is cached per idempotency token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub status: StatusCode,
    pub body: ChatResponseBody,
}

impl ChatReply {
    pub fn answered(answer: ChatAnswer) -> Self {
        Self {
            status: StatusCode::OK,
            body: ChatResponseBody::Success { data: answer },
        }
    }

    pub fn failed(detail: impl ToString) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: ChatResponseBody::Error {
                message: "Internal server error".to_string(),
                error: detail.to_string(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.body, ChatResponseBody::Success { .. })
    }

    pub fn answer(&self) -> Option<&ChatAnswer> {
        match &self.body {
            ChatResponseBody::Success { data } => Some(data),
            ChatResponseBody::Error { .. } => None,
        }
    }
}

impl IntoResponse for &ChatReply {
    fn into_response(self) -> Response {
        (self.status, Json(&self.body)).into_response()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusMessage {
    pub status: String,
    pub message: String,
}

impl StatusMessage {
    pub fn success(message: &str) -> Self {
        Self {
            status: "success".to_string(),
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
    pub timestamp: String,
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IngestionSummary {
    pub filename: String,
    pub rows_processed: usize,
    pub collection: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IngestionResponse {
    pub status: String,
    pub message: String,
    pub data: IngestionSummary,
}
