mod common;

use std::sync::Arc;

use common::{memory_db, seed_chunks, ScriptedBackend};
use doppel_ai::chat::{ChatOutcome, ConversationEngine};
use doppel_ai::feedback::FeedbackService;
use doppel_ai::retrieval::{DiversityRetriever, LexicalRetriever};
use doppel_core::config::{ChatConfig, PersonaConfig};
use doppel_core::interfaces::{ChatRole, Retriever};
use doppel_core::profile::PersonalityProfile;
use doppel_db::surreal::SurrealPersonaDB;
use doppel_db::PersonaDB;

fn casual_profile() -> PersonalityProfile {
    let mut p = PersonalityProfile::default();
    p.writing_style.tonal_range.formality_spectrum = "casual, relaxed".into();
    p.writing_style.stylistic_markers.signature_phrases = vec!["Here's the thing".into()];
    p.emotional.passion_map.high_passion = vec!["sailing".into()];
    p
}

fn engine(db: Arc<SurrealPersonaDB>, backend: Arc<ScriptedBackend>) -> ConversationEngine {
    let lexical: Arc<dyn Retriever> = Arc::new(LexicalRetriever::new(db.clone()));
    let retriever = Arc::new(DiversityRetriever::new(lexical, 0.5));
    ConversationEngine::new(db, retriever, backend, ChatConfig::default(), PersonaConfig::default())
}

#[tokio::test]
async fn chat_turn_end_to_end() {
    let db = memory_db().await;
    seed_chunks(
        &db,
        &[
            "sailing in the morning is the best part of the week",
            "compilers are just careful bookkeeping",
            "the weather decides every sailing plan",
        ],
    )
    .await;
    db.save_profile(casual_profile()).await.unwrap();

    let backend = Arc::new(ScriptedBackend::new(Vec::new()).with_chat_reply("Here's the thing: sailing clears my head."));
    let engine = engine(db.clone(), backend.clone());

    let ChatOutcome::Answered(turn) = engine.chat("what do you love about sailing", None).await.unwrap() else {
        panic!("expected an answer");
    };
    assert!(turn.validation_issues.is_empty());
    assert_eq!(turn.confidence_score, 1.0);
    assert_eq!(turn.style_match, 1.0);
    assert_eq!(turn.retrieved_chunks.len(), 3);
    assert!(turn.retrieved_chunks[0].content.contains("sailing"));

    let sent = backend.chat_calls()[0].clone();
    assert_eq!(sent.len(), 2);
    assert!(sent[1].content.contains("(sailing) is a HIGH PASSION area"));
    assert!(sent[1].content.contains("Example 1 (from notes, general context)"));

    let messages = db.list_messages(&turn.conversation_id).await.unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, ChatRole::User);
    assert_eq!(messages[1].model.as_deref(), Some("scripted-model"));

    let feedback = FeedbackService::new(db.clone());
    feedback.submit(&turn.message_id, 2, Some("too short".into())).await.unwrap();
    feedback.submit(&turn.message_id, 5, None).await.unwrap();
    let stats = feedback.stats().await.unwrap();
    assert_eq!(stats.total, 1);
    assert_eq!(stats.average_rating, 5.0);
}

#[tokio::test]
async fn history_carries_across_turns() {
    let db = memory_db().await;
    db.save_profile(casual_profile()).await.unwrap();
    let backend = Arc::new(ScriptedBackend::new(Vec::new()).with_chat_reply("Yeah, sure."));
    let engine = engine(db.clone(), backend.clone());

    let ChatOutcome::Answered(first) = engine.chat("hey there", None).await.unwrap() else {
        panic!("expected an answer");
    };
    let ChatOutcome::Answered(second) = engine
        .chat("and then?", Some(&first.conversation_id))
        .await
        .unwrap()
    else {
        panic!("expected an answer");
    };
    assert_eq!(first.conversation_id, second.conversation_id);

    let calls = backend.chat_calls();
    let user_prompt = &calls[1].last().unwrap().content;
    assert!(user_prompt.contains("RECENT CONVERSATION:\nUser: hey there\nAssistant: Yeah, sure."));
    assert!(user_prompt.contains("(No directly relevant examples found"));
}

#[tokio::test]
async fn rollback_changes_the_persona_for_new_turns() {
    let db = memory_db().await;
    let mut formal = PersonalityProfile::default();
    formal.writing_style.tonal_range.formality_spectrum = "formal".into();
    db.save_profile(formal).await.unwrap();
    db.save_profile(casual_profile()).await.unwrap();

    let reply = "Yeah I'm gonna go, kinda tired btw.";
    let backend = Arc::new(ScriptedBackend::new(Vec::new()).with_chat_reply(reply));
    let engine = engine(db.clone(), backend);

    let ChatOutcome::Answered(casual_turn) = engine.chat("bye", None).await.unwrap() else {
        panic!("expected an answer");
    };
    assert!(casual_turn.validation_issues.is_empty());

    db.activate_profile(1).await.unwrap();
    let ChatOutcome::Answered(formal_turn) = engine.chat("bye", None).await.unwrap() else {
        panic!("expected an answer");
    };
    assert_eq!(
        formal_turn.validation_issues,
        vec!["Response too casual for profile's formal style".to_string()]
    );
}
