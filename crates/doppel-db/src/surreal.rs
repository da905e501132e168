use async_trait::async_trait;
use chrono::Utc;
use doppel_core::profile::PersonalityProfile;
use serde::Deserialize;
use surrealdb::engine::local::{Db, Mem, RocksDb};
use surrealdb::Surreal;
use tokio::sync::Mutex;

use crate::error::{DbError, DbResult};
use crate::schema::{
    ActivePointer, Conversation, Feedback, Message, StoredProfile, TextChunk,
};
use crate::traits::PersonaDB;

const POINTER: (&str, &str) = ("profile_pointer", "active");

/// Storage mode for SurrealDB
pub enum StorageMode {
    Memory,
    Persistent(String),
}

/// SurrealDB implementation of the PersonaDB trait.
///
/// Profile versions are append-only rows in `profile`; the active version
/// lives in the single record `profile_pointer:active`. Every write that
/// reads the current maximum or moves the pointer holds `profile_lock`, so
/// version numbers never collide and the pointer names exactly one version.
/// RocksDB storage is opened by one process at a time, which makes the
/// in-process lock sufficient.
pub struct SurrealPersonaDB {
    db: Surreal<Db>,
    profile_lock: Mutex<()>,
}

impl SurrealPersonaDB {
    /// Create a new SurrealPersonaDB with the given storage mode.
    pub async fn new(mode: StorageMode) -> DbResult<Self> {
        let db = match mode {
            StorageMode::Memory => Surreal::new::<Mem>(()).await?,
            StorageMode::Persistent(ref path) => Surreal::new::<RocksDb>(path).await?,
        };
        Ok(Self {
            db,
            profile_lock: Mutex::new(()),
        })
    }

    async fn latest_version(&self) -> DbResult<Option<u32>> {
        #[derive(Deserialize)]
        struct VersionRow {
            version: u32,
        }

        let mut result = self
            .db
            .query("SELECT version FROM profile ORDER BY version DESC LIMIT 1")
            .await?;
        let rows: Vec<VersionRow> = result.take(0)?;
        Ok(rows.first().map(|r| r.version))
    }

    async fn set_pointer(&self, version: u32) -> DbResult<()> {
        let pointer = ActivePointer {
            version,
            updated_at: Utc::now(),
        };
        let _: Option<ActivePointer> = self.db.upsert(POINTER).content(pointer).await?;
        Ok(())
    }
}

/// Parse a SurrealDB thing string like "message:abc123" into ("message", "abc123").
fn parse_thing(id: &str) -> DbResult<(&str, &str)> {
    id.split_once(':')
        .ok_or_else(|| DbError::InvalidId(format!("Expected 'table:id' format, got: {id}")))
}

fn expect_table<'a>(id: &'a str, expected: &str) -> DbResult<(&'a str, &'a str)> {
    let (table, key) = parse_thing(id)?;
    if table != expected {
        return Err(DbError::InvalidId(format!(
            "Expected {expected} ID, got table: {table}"
        )));
    }
    Ok((table, key))
}

#[async_trait]
impl PersonaDB for SurrealPersonaDB {
    async fn connect(&self) -> DbResult<()> {
        self.db
            .use_ns("doppel")
            .use_db("main")
            .await
            .map_err(|e| DbError::Connection(e.to_string()))
    }

    async fn init_schema(&self) -> DbResult<()> {
        let queries = [
            "DEFINE INDEX idx_chunk_document ON chunk FIELDS document, chunk_index",
            "DEFINE INDEX idx_profile_version ON profile FIELDS version UNIQUE",
            "DEFINE INDEX idx_message_conversation ON message FIELDS conversation_id",
            "DEFINE INDEX idx_message_created ON message FIELDS created_at",
            "DEFINE INDEX idx_feedback_message ON feedback FIELDS message_id UNIQUE",
        ];
        for q in queries {
            self.db
                .query(q)
                .await
                .map_err(|e| DbError::SchemaInit(e.to_string()))?;
        }
        Ok(())
    }

    // ── Chunks ──────────────────────────────────────────────

    async fn add_chunk(&self, chunk: TextChunk) -> DbResult<TextChunk> {
        let created: Option<TextChunk> = self.db.create("chunk").content(chunk).await?;
        created.ok_or_else(|| DbError::Query("Failed to create chunk".into()))
    }

    async fn list_chunks(&self) -> DbResult<Vec<TextChunk>> {
        let mut result = self
            .db
            .query("SELECT * FROM chunk ORDER BY document ASC, chunk_index ASC")
            .await?;
        let chunks: Vec<TextChunk> = result.take(0)?;
        Ok(chunks)
    }

    // ── Profiles ────────────────────────────────────────────

    async fn save_profile(&self, profile: PersonalityProfile) -> DbResult<StoredProfile> {
        let _guard = self.profile_lock.lock().await;

        let version = self.latest_version().await?.map_or(1, |v| v + 1);
        let record = StoredProfile::new(version, profile);
        let created: Option<StoredProfile> = self.db.create("profile").content(record).await?;
        let created = created.ok_or_else(|| DbError::Query("Failed to create profile".into()))?;
        self.set_pointer(version).await?;

        tracing::info!(version, "Profile version saved and activated");
        Ok(created)
    }

    async fn get_active_profile(&self) -> DbResult<PersonalityProfile> {
        let pointer: Option<ActivePointer> = self.db.select(POINTER).await?;
        let pointer = pointer.ok_or(DbError::NoActiveProfile)?;
        match self.get_profile(pointer.version).await {
            Ok(stored) => Ok(stored.profile),
            Err(DbError::NotFound(_)) => Err(DbError::NoActiveProfile),
            Err(e) => Err(e),
        }
    }

    async fn get_profile(&self, version: u32) -> DbResult<StoredProfile> {
        let mut result = self
            .db
            .query("SELECT * FROM profile WHERE version = $version")
            .bind(("version", version))
            .await?;
        let rows: Vec<StoredProfile> = result.take(0)?;
        rows.into_iter()
            .next()
            .ok_or_else(|| DbError::NotFound(format!("profile version {version}")))
    }

    async fn list_profiles(&self) -> DbResult<Vec<StoredProfile>> {
        let mut result = self
            .db
            .query("SELECT * FROM profile ORDER BY version DESC")
            .await?;
        let rows: Vec<StoredProfile> = result.take(0)?;
        Ok(rows)
    }

    async fn active_version(&self) -> DbResult<Option<u32>> {
        let pointer: Option<ActivePointer> = self.db.select(POINTER).await?;
        Ok(pointer.map(|p| p.version))
    }

    async fn activate_profile(&self, version: u32) -> DbResult<StoredProfile> {
        let _guard = self.profile_lock.lock().await;

        let stored = self.get_profile(version).await?;
        self.set_pointer(version).await?;

        tracing::info!(version, "Profile version activated");
        Ok(stored)
    }

    // ── Conversations ───────────────────────────────────────

    async fn create_conversation(&self, conversation: Conversation) -> DbResult<Conversation> {
        let created: Option<Conversation> =
            self.db.create("conversation").content(conversation).await?;
        created.ok_or_else(|| DbError::Query("Failed to create conversation".into()))
    }

    async fn get_conversation(&self, id: &str) -> DbResult<Conversation> {
        let (table, key) = expect_table(id, "conversation")?;
        let conversation: Option<Conversation> = self.db.select((table, key)).await?;
        conversation.ok_or_else(|| DbError::NotFound(id.to_string()))
    }

    async fn list_conversations(&self) -> DbResult<Vec<Conversation>> {
        let mut result = self
            .db
            .query("SELECT * FROM conversation ORDER BY created_at DESC")
            .await?;
        let conversations: Vec<Conversation> = result.take(0)?;
        Ok(conversations)
    }

    async fn add_message(&self, message: Message) -> DbResult<Message> {
        let created: Option<Message> = self.db.create("message").content(message).await?;
        created.ok_or_else(|| DbError::Query("Failed to create message".into()))
    }

    async fn add_messages(&self, messages: Vec<Message>) -> DbResult<Vec<Message>> {
        let expected = messages.len();
        // A single INSERT statement commits atomically.
        let created: Vec<Message> = self.db.insert("message").content(messages).await?;
        if created.len() != expected {
            return Err(DbError::Query(format!(
                "Inserted {} of {expected} messages",
                created.len()
            )));
        }
        Ok(created)
    }

    async fn get_message(&self, id: &str) -> DbResult<Message> {
        let (table, key) = expect_table(id, "message")?;
        let message: Option<Message> = self.db.select((table, key)).await?;
        message.ok_or_else(|| DbError::NotFound(id.to_string()))
    }

    async fn list_messages(&self, conversation_id: &str) -> DbResult<Vec<Message>> {
        let cid = conversation_id.to_string();
        let mut result = self
            .db
            .query("SELECT * FROM message WHERE conversation_id = $cid ORDER BY created_at ASC")
            .bind(("cid", cid))
            .await?;
        let messages: Vec<Message> = result.take(0)?;
        Ok(messages)
    }

    // ── Feedback ────────────────────────────────────────────

    async fn upsert_feedback(&self, feedback: Feedback) -> DbResult<Feedback> {
        // One record per message, keyed by the message key.
        let (_, key) = expect_table(&feedback.message_id, "message")?;
        let key = key.to_string();
        let stored: Option<Feedback> = self
            .db
            .upsert(("feedback", key.as_str()))
            .content(feedback)
            .await?;
        stored.ok_or_else(|| DbError::Query("Failed to store feedback".into()))
    }

    async fn list_feedback(&self) -> DbResult<Vec<Feedback>> {
        let feedback: Vec<Feedback> = self.db.select("feedback").await?;
        Ok(feedback)
    }
}
