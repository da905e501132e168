use std::sync::Arc;
use std::time::Instant;

use doppel_core::config::{ChatConfig, PersonaConfig};
use doppel_core::interfaces::{ChatMessage, ChatRole, CompletionBackend, RetrievedChunk, Retriever};
use doppel_db::schema::{ChunkReference, Conversation, Message};
use doppel_db::{DbError, PersonaDB};
use serde::Serialize;

use super::context::classify_query;
use super::prompt::PromptBuilder;
use super::validator::ResponseValidator;
use crate::error::{AiError, AiResult};
use crate::text::{tail, truncate_chars};

pub const NO_PROFILE_RESPONSE: &str =
    "Please create a personality profile first by uploading and processing your documents.";
pub const NO_PROFILE_ERROR: &str = "no_profile";
pub const DEFAULT_CONVERSATION_TITLE: &str = "New Conversation";

/// Retrieved chunks kept on the assistant message and in the turn result.
const KEPT_CHUNKS: usize = 5;
const STORED_CHUNK_CHARS: usize = 200;

#[derive(Debug, Clone, Serialize)]
pub struct ChatTurnResult {
    pub response: String,
    pub confidence_score: f32,
    pub style_match: f32,
    pub conversation_id: String,
    pub message_id: String,
    pub retrieved_chunks: Vec<RetrievedChunk>,
    pub validation_issues: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ChatOutcome {
    Answered(ChatTurnResult),
    /// No active profile; nothing was retrieved, generated or stored.
    NoProfile { response: String, error: String },
}

impl ChatOutcome {
    fn no_profile() -> Self {
        Self::NoProfile {
            response: NO_PROFILE_RESPONSE.to_string(),
            error: NO_PROFILE_ERROR.to_string(),
        }
    }

    pub fn response(&self) -> &str {
        match self {
            Self::Answered(turn) => &turn.response,
            Self::NoProfile { response, .. } => response,
        }
    }
}

/// Runs one chat turn: retrieve, prompt, generate, validate, persist.
pub struct ConversationEngine {
    db: Arc<dyn PersonaDB>,
    retriever: Arc<dyn Retriever>,
    backend: Arc<dyn CompletionBackend>,
    chat: ChatConfig,
    persona: PersonaConfig,
}

impl ConversationEngine {
    pub fn new(
        db: Arc<dyn PersonaDB>,
        retriever: Arc<dyn Retriever>,
        backend: Arc<dyn CompletionBackend>,
        chat: ChatConfig,
        persona: PersonaConfig,
    ) -> Self {
        Self {
            db,
            retriever,
            backend,
            chat,
            persona,
        }
    }

    /// Answer `query` in the persona's voice.
    ///
    /// The active profile is read once at the start and used for the whole
    /// turn. Nothing is written until the reply has been generated and
    /// validated; any failure before that aborts the turn without retry and
    /// leaves the store untouched.
    pub async fn chat(&self, query: &str, conversation_id: Option<&str>) -> AiResult<ChatOutcome> {
        let profile = match self.db.get_active_profile().await {
            Ok(p) => p,
            Err(DbError::NoActiveProfile) => {
                tracing::warn!("Chat requested without an active profile");
                return Ok(ChatOutcome::no_profile());
            }
            Err(e) => return Err(e.into()),
        };
        let started = Instant::now();

        let existing = self.find_conversation(conversation_id).await?;
        let history = match &existing {
            Some(id) => self.load_history(id).await?,
            None => Vec::new(),
        };

        let context = classify_query(query);
        // Stamped now so it sorts before the reply.
        let mut user_message = Message::new(String::new(), ChatRole::User, query.to_string());
        user_message.query_formality = Some(context.formality.to_string());
        user_message.query_intent = Some(context.intent.to_string());

        let chunks = self
            .retriever
            .retrieve(query, self.chat.retrieval_k)
            .await
            .map_err(AiError::Retrieval)?;
        tracing::debug!(
            retrieved = chunks.len(),
            formality = %context.formality,
            intent = %context.intent,
            "Context prepared"
        );

        let messages = PromptBuilder::new(&profile, &self.persona)
            .build_messages(query, &chunks, &context, &history);
        let response = self
            .backend
            .generate_chat_completion(&messages)
            .await
            .map_err(AiError::Generation)?;

        let report = ResponseValidator::new(&profile, &self.persona.name).validate(&response);

        let kept: Vec<RetrievedChunk> = chunks.into_iter().take(KEPT_CHUNKS).collect();
        let mut assistant = Message::new(String::new(), ChatRole::Assistant, response.clone());
        assistant.confidence_score = Some(report.confidence_score);
        assistant.style_match = Some(report.style_match);
        assistant.validation_issues = report.issues.clone();
        assistant.retrieved_chunks = kept.iter().map(chunk_reference).collect();
        assistant.model = Some(self.backend.model_name().to_string());

        let conv_id = match existing {
            Some(id) => id,
            None => self.start_conversation().await?,
        };
        user_message.conversation_id = conv_id.clone();
        assistant.conversation_id = conv_id.clone();
        let stored = self.db.add_messages(vec![user_message, assistant]).await?;
        let message_id = stored
            .last()
            .and_then(Message::id_string)
            .ok_or_else(|| DbError::InvalidId("message stored without id".into()))?;

        tracing::info!(
            conversation = %conv_id,
            confidence = report.confidence_score,
            issues = report.issues.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Chat turn complete"
        );

        Ok(ChatOutcome::Answered(ChatTurnResult {
            response,
            confidence_score: report.confidence_score,
            style_match: report.style_match,
            conversation_id: conv_id,
            message_id,
            retrieved_chunks: kept,
            validation_issues: report.issues,
        }))
    }

    /// Id of the requested conversation if it exists. Unknown or malformed
    /// ids yield `None`, and the turn starts a new conversation on persist.
    async fn find_conversation(&self, id: Option<&str>) -> AiResult<Option<String>> {
        let Some(id) = id else {
            return Ok(None);
        };
        match self.db.get_conversation(id).await {
            Ok(c) => Ok(c.id_string()),
            Err(DbError::NotFound(_) | DbError::InvalidId(_)) => {
                tracing::debug!(id, "Conversation not found, starting a new one");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn start_conversation(&self) -> AiResult<String> {
        let conversation = self
            .db
            .create_conversation(Conversation::new(DEFAULT_CONVERSATION_TITLE.into()))
            .await?;
        Ok(conversation
            .id_string()
            .ok_or_else(|| DbError::InvalidId("conversation stored without id".into()))?)
    }

    async fn load_history(&self, conversation_id: &str) -> AiResult<Vec<ChatMessage>> {
        let messages = self.db.list_messages(conversation_id).await?;
        let history: Vec<ChatMessage> = messages
            .into_iter()
            .map(|m| ChatMessage {
                role: m.role,
                content: m.content,
            })
            .collect();
        Ok(tail(&history, self.chat.max_history_messages).to_vec())
    }
}

fn chunk_reference(chunk: &RetrievedChunk) -> ChunkReference {
    ChunkReference {
        id: chunk.id.clone(),
        content: truncate_chars(&chunk.content, STORED_CHUNK_CHARS),
        source_type: chunk.source_type().to_string(),
        context: chunk.context().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doppel_core::testing::{FailingRetriever, FixedRetriever, ScriptedBackend};
    use doppel_core::profile::PersonalityProfile;
    use doppel_db::mock::MockPersonaDB;
    use std::collections::BTreeMap;

    fn chunks(n: usize) -> Vec<RetrievedChunk> {
        (0..n)
            .map(|i| RetrievedChunk {
                id: format!("chunk:{i}"),
                content: "x".repeat(300),
                metadata: BTreeMap::from([("source_type".to_string(), "blog".to_string())]),
                distance: Some(i as f32 / 10.0),
            })
            .collect()
    }

    fn engine(db: Arc<MockPersonaDB>, backend: Arc<ScriptedBackend>, n_chunks: usize) -> ConversationEngine {
        ConversationEngine::new(
            db,
            Arc::new(FixedRetriever(chunks(n_chunks))),
            backend,
            ChatConfig::default(),
            PersonaConfig::default(),
        )
    }

    #[tokio::test]
    async fn no_profile_short_circuits() {
        let db = Arc::new(MockPersonaDB::new());
        let backend = Arc::new(ScriptedBackend::new(vec![]).with_chat_reply("hi"));
        let outcome = engine(db.clone(), backend.clone(), 3).chat("hello", None).await.unwrap();

        match outcome {
            ChatOutcome::NoProfile { response, error } => {
                assert_eq!(response, NO_PROFILE_RESPONSE);
                assert_eq!(error, "no_profile");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(backend.chat_calls().is_empty());
        assert_eq!(db.message_count(), 0);
        assert!(db.list_conversations().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn turn_persists_both_messages() {
        let db = Arc::new(MockPersonaDB::new());
        db.save_profile(PersonalityProfile::default()).await.unwrap();
        let backend = Arc::new(ScriptedBackend::new(vec![]).with_chat_reply("Griffin would say yes."));

        let outcome = engine(db.clone(), backend.clone(), 7)
            .chat("Could you explain?", None)
            .await
            .unwrap();
        let ChatOutcome::Answered(turn) = outcome else {
            panic!("expected an answer");
        };

        assert_eq!(turn.retrieved_chunks.len(), 5);
        assert_eq!(turn.validation_issues.len(), 1);
        assert!((turn.confidence_score - 0.85).abs() < 1e-6);

        let stored = db.list_messages(&turn.conversation_id).await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].role, ChatRole::User);
        assert_eq!(stored[0].query_formality.as_deref(), Some("professional"));
        assert_eq!(stored[0].query_intent.as_deref(), Some("question"));

        let assistant = db.get_message(&turn.message_id).await.unwrap();
        assert_eq!(assistant.retrieved_chunks.len(), 5);
        assert_eq!(assistant.retrieved_chunks[0].content.chars().count(), 200);
        assert_eq!(assistant.retrieved_chunks[0].context, "unknown");
        assert_eq!(assistant.model.as_deref(), Some("scripted-model"));
        assert_eq!(assistant.confidence_score, Some(turn.confidence_score));
    }

    #[tokio::test]
    async fn follow_up_turn_sees_history() {
        let db = Arc::new(MockPersonaDB::new());
        db.save_profile(PersonalityProfile::default()).await.unwrap();
        let backend = Arc::new(ScriptedBackend::new(vec![]).with_chat_reply("Sure."));
        let engine = engine(db.clone(), backend.clone(), 0);

        let ChatOutcome::Answered(first) = engine.chat("first question", None).await.unwrap() else {
            panic!("expected an answer");
        };
        engine.chat("second", Some(&first.conversation_id)).await.unwrap();

        let calls = backend.chat_calls();
        assert_eq!(calls[0].len(), 2);
        // system + two history entries + user
        assert_eq!(calls[1].len(), 4);
        assert_eq!(calls[1][1].content, "first question");
        assert_eq!(db.list_conversations().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_conversation_starts_new_one() {
        let db = Arc::new(MockPersonaDB::new());
        db.save_profile(PersonalityProfile::default()).await.unwrap();
        let backend = Arc::new(ScriptedBackend::new(vec![]).with_chat_reply("Sure."));

        let ChatOutcome::Answered(turn) = engine(db.clone(), backend, 0)
            .chat("hi", Some("conversation:missing"))
            .await
            .unwrap()
        else {
            panic!("expected an answer");
        };
        assert_ne!(turn.conversation_id, "conversation:missing");
        let conv = db.get_conversation(&turn.conversation_id).await.unwrap();
        assert_eq!(conv.title, DEFAULT_CONVERSATION_TITLE);
    }

    #[tokio::test]
    async fn generation_failure_aborts_without_messages() {
        let db = Arc::new(MockPersonaDB::new());
        db.save_profile(PersonalityProfile::default()).await.unwrap();
        let backend = Arc::new(ScriptedBackend::failing("upstream 503"));

        let err = engine(db.clone(), backend, 2).chat("hi", None).await.unwrap_err();
        assert!(matches!(err, AiError::Generation(_)));
        assert!(err.to_string().contains("upstream 503"));
        assert_eq!(db.message_count(), 0);
        assert!(db.list_conversations().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn retrieval_failure_leaves_store_untouched() {
        let db = Arc::new(MockPersonaDB::new());
        db.save_profile(PersonalityProfile::default()).await.unwrap();
        let backend = Arc::new(ScriptedBackend::new(vec![]).with_chat_reply("Sure."));
        let engine = ConversationEngine::new(
            db.clone(),
            Arc::new(FailingRetriever("index offline".into())),
            backend.clone(),
            ChatConfig::default(),
            PersonaConfig::default(),
        );

        let err = engine.chat("hi", Some("conversation:missing")).await.unwrap_err();
        assert!(matches!(err, AiError::Retrieval(_)));
        assert!(backend.chat_calls().is_empty());
        assert_eq!(db.message_count(), 0);
        assert!(db.list_conversations().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_follow_up_keeps_existing_history_intact() {
        let db = Arc::new(MockPersonaDB::new());
        db.save_profile(PersonalityProfile::default()).await.unwrap();
        let ok = Arc::new(ScriptedBackend::new(vec![]).with_chat_reply("Sure."));
        let ChatOutcome::Answered(first) = engine(db.clone(), ok, 1).chat("first", None).await.unwrap() else {
            panic!("expected an answer");
        };

        let failing = Arc::new(ScriptedBackend::failing("timeout"));
        engine(db.clone(), failing, 1)
            .chat("second", Some(&first.conversation_id))
            .await
            .unwrap_err();

        assert_eq!(db.list_messages(&first.conversation_id).await.unwrap().len(), 2);
        assert_eq!(db.list_conversations().await.unwrap().len(), 1);
    }
}
