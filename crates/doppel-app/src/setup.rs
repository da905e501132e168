use std::sync::Arc;

use anyhow::Result;
use doppel_ai::analysis::{AnalysisOrchestrator, ProfileManager};
use doppel_ai::chat::ConversationEngine;
use doppel_ai::retrieval::{DiversityRetriever, LexicalRetriever};
use doppel_ai::HttpCompletionBackend;
use doppel_core::config::AppConfig;
use doppel_core::interfaces::Retriever;
use doppel_db::surreal::{StorageMode, SurrealPersonaDB};
use doppel_db::PersonaDB;

pub async fn create_db(config: &AppConfig) -> Result<Arc<SurrealPersonaDB>> {
    let mode = match config.database.mode.as_str() {
        "memory" => StorageMode::Memory,
        _ => StorageMode::Persistent(config.database.path.clone()),
    };
    let db = SurrealPersonaDB::new(mode).await?;
    db.connect().await?;
    db.init_schema().await?;
    Ok(Arc::new(db))
}

pub fn retriever(config: &AppConfig, db: Arc<SurrealPersonaDB>) -> Arc<dyn Retriever> {
    let mut lexical = LexicalRetriever::new(db);
    if let Some(source_type) = &config.chat.source_type {
        lexical = lexical.with_source_type(source_type.clone());
    }
    let lexical: Arc<dyn Retriever> = Arc::new(lexical);
    if config.chat.diversify {
        Arc::new(DiversityRetriever::new(lexical, config.chat.diversity_lambda))
    } else {
        lexical
    }
}

pub fn profile_manager(config: &AppConfig, db: Arc<SurrealPersonaDB>) -> Result<ProfileManager> {
    let backend = Arc::new(HttpCompletionBackend::for_analysis(&config.llm)?);
    Ok(ProfileManager::new(
        db,
        AnalysisOrchestrator::new(backend, &config.analysis),
    ))
}

pub fn conversation_engine(
    config: &AppConfig,
    db: Arc<SurrealPersonaDB>,
) -> Result<ConversationEngine> {
    let backend = Arc::new(HttpCompletionBackend::for_chat(&config.llm)?);
    Ok(ConversationEngine::new(
        db.clone(),
        retriever(config, db),
        backend,
        config.chat.clone(),
        config.persona.clone(),
    ))
}
