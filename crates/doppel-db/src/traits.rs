use async_trait::async_trait;
use doppel_core::profile::PersonalityProfile;

use crate::error::DbResult;
use crate::schema::{Conversation, Feedback, Message, StoredProfile, TextChunk};

/// Storage abstraction for source text, profile versions, conversations and feedback.
///
/// Uses `async-trait` for object safety (`dyn PersonaDB`).
#[async_trait]
pub trait PersonaDB: Send + Sync {
    /// Connect to the database backend.
    async fn connect(&self) -> DbResult<()>;

    /// Initialize schema (tables, indexes).
    async fn init_schema(&self) -> DbResult<()>;

    // -- Source chunks ---

    async fn add_chunk(&self, chunk: TextChunk) -> DbResult<TextChunk>;

    /// All chunks, ordered by document then chunk index.
    async fn list_chunks(&self) -> DbResult<Vec<TextChunk>>;

    /// Text of every stored chunk, in `list_chunks` order. May be empty.
    async fn load_text_samples(&self) -> DbResult<Vec<String>> {
        Ok(self
            .list_chunks()
            .await?
            .into_iter()
            .map(|c| c.content)
            .collect())
    }

    // -- Profiles ---

    /// Append a new version and make it the active one in a single step.
    ///
    /// The store assigns the version (previous maximum + 1); any version
    /// already set on `profile` is overwritten.
    async fn save_profile(&self, profile: PersonalityProfile) -> DbResult<StoredProfile>;

    /// The active profile, or `DbError::NoActiveProfile`.
    async fn get_active_profile(&self) -> DbResult<PersonalityProfile>;

    async fn get_profile(&self, version: u32) -> DbResult<StoredProfile>;

    /// All versions, newest first.
    async fn list_profiles(&self) -> DbResult<Vec<StoredProfile>>;

    async fn active_version(&self) -> DbResult<Option<u32>>;

    /// Point the active pointer at an existing version.
    async fn activate_profile(&self, version: u32) -> DbResult<StoredProfile>;

    // -- Conversations ---

    async fn create_conversation(&self, conversation: Conversation) -> DbResult<Conversation>;
    async fn get_conversation(&self, id: &str) -> DbResult<Conversation>;
    async fn list_conversations(&self) -> DbResult<Vec<Conversation>>;

    async fn add_message(&self, message: Message) -> DbResult<Message>;

    /// Store several messages in one write; either all land or none do.
    /// Returned in input order.
    async fn add_messages(&self, messages: Vec<Message>) -> DbResult<Vec<Message>>;
    async fn get_message(&self, id: &str) -> DbResult<Message>;

    /// Messages of one conversation, oldest first.
    async fn list_messages(&self, conversation_id: &str) -> DbResult<Vec<Message>>;

    // -- Feedback ---

    /// Insert or replace the feedback for `feedback.message_id`.
    async fn upsert_feedback(&self, feedback: Feedback) -> DbResult<Feedback>;
    async fn list_feedback(&self) -> DbResult<Vec<Feedback>>;
}
