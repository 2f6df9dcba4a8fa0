use axum::extract::FromRef;
use std::sync::Arc;

use crate::config::Settings;
use crate::services::conversation::ChatOrchestrator;
use crate::services::DocumentService;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<ChatOrchestrator>,
    pub documents: Arc<DocumentService>,
    pub settings: Arc<Settings>,
}

impl FromRef<AppState> for Arc<ChatOrchestrator> {
    fn from_ref(state: &AppState) -> Self {
        state.orchestrator.clone()
    }
}

impl FromRef<AppState> for Arc<DocumentService> {
    fn from_ref(state: &AppState) -> Self {
        state.documents.clone()
    }
}
