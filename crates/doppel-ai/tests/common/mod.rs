//! Shared fakes and fixtures for doppel-ai integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use doppel_db::schema::TextChunk;
use doppel_db::surreal::{StorageMode, SurrealPersonaDB};
use doppel_db::PersonaDB;

pub use doppel_core::testing::ScriptedBackend;

/// Six well-formed extraction replies followed by a synthesis reply.
pub fn analysis_script() -> Vec<String> {
    vec![
        r#"{"voice_description": "Wry and compact", "confidence": 0.9,
            "stylistic_markers": {"signature_phrases": ["Here's the thing"]},
            "tonal_range": {"formality_spectrum": "casual, relaxed", "default_tone": "warm"}}"#
            .to_string(),
        r#"{"reasoning_patterns": {"primary_mode": "inductive"}, "confidence": 0.8}"#.to_string(),
        "```json\n{\"passion_map\": {\"high_passion\": [\"sailing\"]}, \"confidence\": 0.7}\n```"
            .to_string(),
        r#"{"genuine_interests": ["boats", {"topic": "compilers", "depth": 0.9}], "confidence": 0.6}"#
            .to_string(),
        r#"{"core_beliefs": {"values_hierarchy": ["honesty", "craft"]}, "confidence": null}"#
            .to_string(),
        r#"{"collaboration_style": "pairing", "confidence": 0.5}"#.to_string(),
        r#"{"personality_essence": "A builder who writes like they talk.",
            "key_characteristics": ["curious", "direct"],
            "context_variations": {"professional": "terse"},
            "overall_confidence": 0.95}"#
            .to_string(),
    ]
}

pub async fn memory_db() -> Arc<SurrealPersonaDB> {
    let db = SurrealPersonaDB::new(StorageMode::Memory).await.unwrap();
    db.connect().await.unwrap();
    db.init_schema().await.unwrap();
    Arc::new(db)
}

pub async fn seed_chunks(db: &SurrealPersonaDB, texts: &[&str]) {
    for (i, text) in texts.iter().enumerate() {
        let chunk = TextChunk::new(
            "notes.md".into(),
            i as u32,
            text.to_string(),
            "notes".into(),
            "general".into(),
        );
        db.add_chunk(chunk).await.unwrap();
    }
}
