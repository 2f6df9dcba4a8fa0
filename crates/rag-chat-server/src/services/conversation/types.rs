use serde_json::{Map, Value};

/// Item returned by the retriever for a query
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedItem {
    pub id: String,
    pub content: String,
    pub metadata: Map<String, Value>,
    pub score: f32,
}

impl RetrievedItem {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            metadata: Map::new(),
            score: 0.0,
        }
    }

    pub fn with_metadata(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    /// Text form used for relevance checks and the summary prompt field:
    /// content followed by `key: value` metadata pairs
    pub fn render(&self) -> String {
        let mut text = self.content.clone();
        for (key, value) in &self.metadata {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            text.push_str(&format!(" | {}: {}", key, value));
        }
        text
    }
}

/// Which prompt shape a turn was answered with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptPath {
    /// Question alone
    Bare,
    /// Prior context + question
    Contextual,
    /// Retrieved summary + question + prior context
    Augmented,
}

impl PromptPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bare => "bare",
            Self::Contextual => "contextual",
            Self::Augmented => "augmented",
        }
    }
}
