//! Record types persisted by the Doppel store.

use chrono::{DateTime, Utc};
use doppel_core::interfaces::ChatRole;
use doppel_core::profile::PersonalityProfile;
use serde::{Deserialize, Serialize};
use surrealdb::sql::Thing;

/// Format a Thing ID as "table:key" without backtick escaping.
pub fn thing_to_raw(t: &Thing) -> String {
    format!("{}:{}", t.tb, t.id)
}

/// A plain-text passage taken from an ingested document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextChunk {
    pub id: Option<Thing>,
    /// Source file or document name.
    pub document: String,
    pub chunk_index: u32,
    pub content: String,
    pub source_type: String,
    pub context: String,
    pub created_at: DateTime<Utc>,
}

impl TextChunk {
    pub fn new(
        document: String,
        chunk_index: u32,
        content: String,
        source_type: String,
        context: String,
    ) -> Self {
        Self {
            id: None,
            document,
            chunk_index,
            content,
            source_type,
            context,
            created_at: Utc::now(),
        }
    }

    pub fn id_string(&self) -> Option<String> {
        self.id.as_ref().map(thing_to_raw)
    }
}

/// One immutable profile version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredProfile {
    pub id: Option<Thing>,
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub profile: PersonalityProfile,
}

impl StoredProfile {
    pub fn new(version: u32, mut profile: PersonalityProfile) -> Self {
        profile.version = version;
        Self {
            id: None,
            version,
            created_at: Utc::now(),
            profile,
        }
    }
}

/// The single "current version" pointer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivePointer {
    pub version: u32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Option<Thing>,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(title: String) -> Self {
        Self {
            id: None,
            title,
            created_at: Utc::now(),
        }
    }

    pub fn id_string(&self) -> Option<String> {
        self.id.as_ref().map(thing_to_raw)
    }
}

/// Retrieved passage kept alongside an assistant message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkReference {
    pub id: String,
    pub content: String,
    pub source_type: String,
    pub context: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Option<Thing>,
    pub conversation_id: String,
    pub role: ChatRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub confidence_score: Option<f32>,
    #[serde(default)]
    pub style_match: Option<f32>,
    #[serde(default)]
    pub validation_issues: Vec<String>,
    #[serde(default)]
    pub retrieved_chunks: Vec<ChunkReference>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub query_formality: Option<String>,
    #[serde(default)]
    pub query_intent: Option<String>,
}

impl Message {
    pub fn new(conversation_id: String, role: ChatRole, content: String) -> Self {
        Self {
            id: None,
            conversation_id,
            role,
            content,
            created_at: Utc::now(),
            confidence_score: None,
            style_match: None,
            validation_issues: Vec::new(),
            retrieved_chunks: Vec::new(),
            model: None,
            query_formality: None,
            query_intent: None,
        }
    }

    pub fn id_string(&self) -> Option<String> {
        self.id.as_ref().map(thing_to_raw)
    }
}

/// A 1–5 rating on one assistant message. At most one per message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feedback {
    pub id: Option<Thing>,
    pub message_id: String,
    pub rating: u8,
    #[serde(default)]
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Feedback {
    pub fn new(message_id: String, rating: u8, comment: Option<String>) -> Self {
        Self {
            id: None,
            message_id,
            rating,
            comment,
            created_at: Utc::now(),
        }
    }
}
