//! In-memory mock implementation of PersonaDB for testing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;
use doppel_core::profile::PersonalityProfile;
use surrealdb::sql::Thing;

use crate::error::{DbError, DbResult};
use crate::schema::*;
use crate::traits::PersonaDB;

#[derive(Default)]
struct ProfileState {
    versions: Vec<StoredProfile>,
    active: Option<u32>,
}

/// In-memory PersonaDB implementation for unit testing.
pub struct MockPersonaDB {
    chunks: RwLock<Vec<TextChunk>>,
    profiles: Mutex<ProfileState>,
    conversations: RwLock<HashMap<String, Conversation>>,
    messages: RwLock<Vec<Message>>,
    feedback: RwLock<HashMap<String, Feedback>>,
    next_id: AtomicU64,
}

impl Default for MockPersonaDB {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPersonaDB {
    pub fn new() -> Self {
        Self {
            chunks: RwLock::new(Vec::new()),
            profiles: Mutex::new(ProfileState::default()),
            conversations: RwLock::new(HashMap::new()),
            messages: RwLock::new(Vec::new()),
            feedback: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn next_key(&self) -> String {
        self.next_id.fetch_add(1, Ordering::Relaxed).to_string()
    }

    fn make_thing(table: &str, key: &str) -> Thing {
        Thing::from((table.to_string(), key.to_string()))
    }

    /// Number of stored profile versions.
    pub fn profile_count(&self) -> usize {
        self.profiles.lock().unwrap().versions.len()
    }

    /// Number of stored messages across all conversations.
    pub fn message_count(&self) -> usize {
        self.messages.read().unwrap().len()
    }
}

#[async_trait]
impl PersonaDB for MockPersonaDB {
    async fn connect(&self) -> DbResult<()> { Ok(()) }
    async fn init_schema(&self) -> DbResult<()> { Ok(()) }

    async fn add_chunk(&self, mut chunk: TextChunk) -> DbResult<TextChunk> {
        let key = self.next_key();
        chunk.id = Some(Self::make_thing("chunk", &key));
        self.chunks.write().unwrap().push(chunk.clone());
        Ok(chunk)
    }

    async fn list_chunks(&self) -> DbResult<Vec<TextChunk>> {
        let mut chunks = self.chunks.read().unwrap().clone();
        chunks.sort_by(|a, b| {
            a.document
                .cmp(&b.document)
                .then(a.chunk_index.cmp(&b.chunk_index))
        });
        Ok(chunks)
    }

    async fn save_profile(&self, profile: PersonalityProfile) -> DbResult<StoredProfile> {
        let mut state = self.profiles.lock().unwrap();
        let version = state.versions.iter().map(|p| p.version).max().unwrap_or(0) + 1;
        let mut stored = StoredProfile::new(version, profile);
        stored.id = Some(Self::make_thing("profile", &self.next_key()));
        state.versions.push(stored.clone());
        state.active = Some(version);
        Ok(stored)
    }

    async fn get_active_profile(&self) -> DbResult<PersonalityProfile> {
        let state = self.profiles.lock().unwrap();
        let version = state.active.ok_or(DbError::NoActiveProfile)?;
        state
            .versions
            .iter()
            .find(|p| p.version == version)
            .map(|p| p.profile.clone())
            .ok_or(DbError::NoActiveProfile)
    }

    async fn get_profile(&self, version: u32) -> DbResult<StoredProfile> {
        self.profiles
            .lock()
            .unwrap()
            .versions
            .iter()
            .find(|p| p.version == version)
            .cloned()
            .ok_or_else(|| DbError::NotFound(format!("profile version {version}")))
    }

    async fn list_profiles(&self) -> DbResult<Vec<StoredProfile>> {
        let mut versions = self.profiles.lock().unwrap().versions.clone();
        versions.sort_by(|a, b| b.version.cmp(&a.version));
        Ok(versions)
    }

    async fn active_version(&self) -> DbResult<Option<u32>> {
        Ok(self.profiles.lock().unwrap().active)
    }

    async fn activate_profile(&self, version: u32) -> DbResult<StoredProfile> {
        let mut state = self.profiles.lock().unwrap();
        let stored = state
            .versions
            .iter()
            .find(|p| p.version == version)
            .cloned()
            .ok_or_else(|| DbError::NotFound(format!("profile version {version}")))?;
        state.active = Some(version);
        Ok(stored)
    }

    async fn create_conversation(&self, mut conversation: Conversation) -> DbResult<Conversation> {
        let key = self.next_key();
        let id_str = format!("conversation:{key}");
        conversation.id = Some(Self::make_thing("conversation", &key));
        self.conversations
            .write()
            .unwrap()
            .insert(id_str, conversation.clone());
        Ok(conversation)
    }

    async fn get_conversation(&self, id: &str) -> DbResult<Conversation> {
        if !id.starts_with("conversation:") {
            return Err(DbError::InvalidId(format!("Expected conversation ID, got: {id}")));
        }
        self.conversations
            .read()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| DbError::NotFound(id.to_string()))
    }

    async fn list_conversations(&self) -> DbResult<Vec<Conversation>> {
        let mut all: Vec<_> = self.conversations.read().unwrap().values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn add_message(&self, mut message: Message) -> DbResult<Message> {
        let key = self.next_key();
        message.id = Some(Self::make_thing("message", &key));
        self.messages.write().unwrap().push(message.clone());
        Ok(message)
    }

    async fn add_messages(&self, messages: Vec<Message>) -> DbResult<Vec<Message>> {
        let mut all = self.messages.write().unwrap();
        let stored: Vec<Message> = messages
            .into_iter()
            .map(|mut m| {
                m.id = Some(Self::make_thing("message", &self.next_key()));
                m
            })
            .collect();
        all.extend(stored.iter().cloned());
        Ok(stored)
    }

    async fn get_message(&self, id: &str) -> DbResult<Message> {
        self.messages
            .read()
            .unwrap()
            .iter()
            .find(|m| m.id_string().as_deref() == Some(id))
            .cloned()
            .ok_or_else(|| DbError::NotFound(id.to_string()))
    }

    async fn list_messages(&self, conversation_id: &str) -> DbResult<Vec<Message>> {
        // Insertion order is chronological.
        Ok(self
            .messages
            .read()
            .unwrap()
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect())
    }

    async fn upsert_feedback(&self, mut feedback: Feedback) -> DbResult<Feedback> {
        let mut all = self.feedback.write().unwrap();
        let key = feedback.message_id.clone();
        let existing_id = all.get(&key).and_then(|f| f.id.clone());
        feedback.id = Some(existing_id.unwrap_or_else(|| Self::make_thing("feedback", &self.next_key())));
        all.insert(key, feedback.clone());
        Ok(feedback)
    }

    async fn list_feedback(&self) -> DbResult<Vec<Feedback>> {
        Ok(self.feedback.read().unwrap().values().cloned().collect())
    }
}
