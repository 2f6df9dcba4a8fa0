use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::request::Parts,
};
use std::net::SocketAddr;

use crate::utils::error::ApiError;

pub const SESSION_HEADER: &str = "x-session-id";

/// Session identifier: `X-Session-ID` header, else the peer IP address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionKey(pub String);

impl<S> FromRequestParts<S> for SessionKey
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let from_header = parts
            .headers
            .get(SESSION_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty());

        if let Some(id) = from_header {
            return Ok(Self(id.to_string()));
        }

        // Extractor rather than the raw extension: also resolves MockConnectInfo
        ConnectInfo::<SocketAddr>::from_request_parts(parts, state)
            .await
            .ok()
            .map(|ConnectInfo(addr)| Self(addr.ip().to_string()))
            .ok_or_else(|| {
                ApiError::BadRequest("Unable to determine session identifier".to_string())
            })
    }
}
