use std::path::Path;

use anyhow::{Context, Result};
use doppel_ai::chat::ResponseValidator;
use doppel_ai::feedback::FeedbackService;
use doppel_ai::metrics;
use doppel_ai::AiError;
use doppel_core::config::AppConfig;
use doppel_core::interfaces::Retriever;
use doppel_core::profile::{decode_with_defaults, PersonalityProfile};
use doppel_db::PersonaDB;
use serde::Serialize;

use crate::cli::{FeedbackCommand, ProfileCommand};
use crate::ingest::ingest_dir;
use crate::setup::{conversation_engine, create_db, profile_manager, retriever};

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub async fn ingest(config: &AppConfig, dir: &Path) -> Result<()> {
    let db = create_db(config).await?;
    let (files, chunks) = ingest_dir(&*db, dir, &config.ingest).await?;
    println!("Ingested {chunks} chunks from {files} files");
    Ok(())
}

pub async fn list_chunks(config: &AppConfig) -> Result<()> {
    let db = create_db(config).await?;
    let chunks = db.list_chunks().await?;
    for c in &chunks {
        let id = c.id_string().unwrap_or_default();
        println!(
            "{id}\t{}#{}\t{}\t{} chars",
            c.document,
            c.chunk_index,
            c.source_type,
            c.content.chars().count()
        );
    }
    println!("({} chunks)", chunks.len());
    Ok(())
}

pub async fn analyze(config: &AppConfig) -> Result<()> {
    let db = create_db(config).await?;
    let manager = profile_manager(config, db)?;
    let progress = |stage: &str, current: usize, total: usize| {
        eprintln!("[{current}/{total}] {stage}");
    };
    let stored = manager.create_from_documents(Some(&progress)).await?;
    println!(
        "Created profile version {} (confidence {:.2})",
        stored.version, stored.profile.overall_confidence
    );
    Ok(())
}

pub async fn profile(config: &AppConfig, command: ProfileCommand) -> Result<()> {
    let db = create_db(config).await?;
    match command {
        ProfileCommand::Show { version, text } => {
            let profile = match version {
                Some(v) => db.get_profile(v).await?.profile,
                None => db.get_active_profile().await.map_err(AiError::from)?,
            };
            if text {
                println!("{}", profile.to_prompt_text());
            } else {
                print_json(&profile)?;
            }
        }
        ProfileCommand::List => {
            let active = db.active_version().await?;
            let versions = db.list_profiles().await?;
            for p in &versions {
                let marker = if Some(p.version) == active { "*" } else { " " };
                println!(
                    "{marker} v{}\t{}\tconfidence={:.2}",
                    p.version,
                    p.created_at.format("%Y-%m-%d %H:%M:%S"),
                    p.profile.overall_confidence
                );
            }
            println!("({} versions)", versions.len());
        }
        ProfileCommand::Activate { version } => {
            db.activate_profile(version).await?;
            println!("Activated profile version {version}");
        }
        ProfileCommand::Edit { file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let value: serde_json::Value = serde_json::from_str(&raw)?;
            let profile: PersonalityProfile = decode_with_defaults("profile", &value)?;
            let manager = profile_manager(config, db)?;
            let stored = manager.update_profile(profile).await?;
            println!("Saved profile version {}", stored.version);
        }
    }
    Ok(())
}

pub async fn chat(config: &AppConfig, message: &str, conversation: Option<&str>) -> Result<()> {
    let db = create_db(config).await?;
    let engine = conversation_engine(config, db)?;
    let outcome = engine.chat(message, conversation).await?;
    print_json(&outcome)
}

pub async fn validate(config: &AppConfig, response: &str) -> Result<()> {
    let db = create_db(config).await?;
    let profile = db.get_active_profile().await.map_err(AiError::from)?;
    let report = ResponseValidator::new(&profile, &config.persona.name).validate(response);
    print_json(&report)
}

#[derive(Serialize)]
struct Evaluation {
    style: metrics::StyleScores,
    quality: metrics::QualityScores,
    references: usize,
}

pub async fn evaluate(config: &AppConfig, response: &str, query: &str) -> Result<()> {
    let db = create_db(config).await?;
    let references: Vec<String> = retriever(config, db)
        .retrieve(query, metrics::MAX_REFERENCES)
        .await?
        .into_iter()
        .map(|c| c.content)
        .collect();
    print_json(&Evaluation {
        style: metrics::style_match(response, &references),
        quality: metrics::quality(response, query),
        references: references.len(),
    })
}

pub async fn feedback(config: &AppConfig, command: FeedbackCommand) -> Result<()> {
    let db = create_db(config).await?;
    let service = FeedbackService::new(db);
    match command {
        FeedbackCommand::Submit {
            message_id,
            rating,
            comment,
        } => {
            service.submit(&message_id, rating, comment).await?;
            println!("Feedback recorded for {message_id}");
        }
        FeedbackCommand::Stats => print_json(&service.stats().await?)?,
        FeedbackCommand::Improvements { threshold } => {
            print_json(&service.improvement_areas(threshold).await?)?
        }
    }
    Ok(())
}

pub async fn conversations(config: &AppConfig, id: Option<&str>) -> Result<()> {
    let db = create_db(config).await?;
    match id {
        Some(id) => {
            let conversation = db.get_conversation(id).await?;
            println!("{}", conversation.title);
            for m in db.list_messages(id).await? {
                let score = m
                    .confidence_score
                    .map(|c| format!(" [{c:.2}]"))
                    .unwrap_or_default();
                println!("{}{score}: {}", m.role.label(), m.content);
            }
        }
        None => {
            let all = db.list_conversations().await?;
            for c in &all {
                let cid = c.id_string().unwrap_or_default();
                println!("{cid}\t{}\t{}", c.title, c.created_at.format("%Y-%m-%d %H:%M"));
            }
            println!("({} conversations)", all.len());
        }
    }
    Ok(())
}
