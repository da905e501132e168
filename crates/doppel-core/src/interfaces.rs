//! Contracts between the analysis/chat pipelines and the services they call out to.
//!
//! Implementations live elsewhere: the HTTP completion client and the
//! retrievers in `doppel-ai`, scripted fakes in tests.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Who authored a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    /// Capitalized label used when history is rendered as plain text.
    pub fn label(&self) -> &'static str {
        match self {
            Self::System => "System",
            Self::User => "User",
            Self::Assistant => "Assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// A passage returned by similarity search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    /// Lower is closer. `None` when the retriever does not score.
    #[serde(default)]
    pub distance: Option<f32>,
}

impl RetrievedChunk {
    pub fn source_type(&self) -> &str {
        self.metadata
            .get("source_type")
            .map(String::as_str)
            .unwrap_or("unknown")
    }

    pub fn context(&self) -> &str {
        self.metadata
            .get("context")
            .map(String::as_str)
            .unwrap_or("unknown")
    }
}

/// Text-generation backend.
///
/// Both calls are single attempts. Retry and backoff around transient
/// failures belong to the implementation, never to the callers in the
/// analysis or chat pipelines.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Free-form completion over a list of chat messages.
    async fn generate_chat_completion(&self, messages: &[ChatMessage]) -> anyhow::Result<String>;

    /// JSON-producing completion used by extraction and synthesis.
    ///
    /// The result is either raw JSON or JSON inside one fenced block.
    async fn generate_structured_completion(
        &self,
        prompt: &str,
        system: &str,
        max_tokens: u32,
    ) -> anyhow::Result<String>;

    /// Model identifier recorded in analysis and message metadata.
    fn model_name(&self) -> &str;
}

/// Similarity search over previously stored source chunks.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, query: &str, k: usize) -> anyhow::Result<Vec<RetrievedChunk>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_metadata_falls_back_to_unknown() {
        let chunk = RetrievedChunk {
            id: "chunk:1".into(),
            content: "hello".into(),
            metadata: BTreeMap::new(),
            distance: None,
        };
        assert_eq!(chunk.source_type(), "unknown");
        assert_eq!(chunk.context(), "unknown");
    }

    #[test]
    fn chat_role_serializes_lowercase() {
        let msg = ChatMessage::assistant("hi");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"role\":\"assistant\""));
        assert_eq!(ChatRole::User.label(), "User");
    }

    #[test]
    fn traits_are_object_safe() {
        fn _backend(_: &dyn CompletionBackend) {}
        fn _retriever(_: &dyn Retriever) {}
    }
}
