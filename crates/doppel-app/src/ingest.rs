//! Plain-text ingestion: walk a directory, split files into paragraph
//! chunks and store them for analysis and retrieval.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use doppel_core::config::IngestConfig;
use doppel_db::schema::TextChunk;
use doppel_db::PersonaDB;

const DEFAULT_CONTEXT: &str = "general";

/// Split on blank lines and pack paragraphs into chunks of at most
/// `max_chars` characters. Oversized paragraphs are cut at char boundaries.
pub fn split_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();

    let paragraphs = text
        .split("\n\n")
        .flat_map(|block| block.split("\r\n\r\n"))
        .map(str::trim)
        .filter(|p| !p.is_empty());

    for paragraph in paragraphs {
        let para_len = paragraph.chars().count();
        let current_len = current.chars().count();

        if !current.is_empty() && current_len + 2 + para_len > max_chars {
            chunks.push(std::mem::take(&mut current));
        }
        if para_len > max_chars {
            let chars: Vec<char> = paragraph.chars().collect();
            for piece in chars.chunks(max_chars) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }
        if !current.is_empty() {
            current.push_str("\n\n");
        }
        current.push_str(paragraph);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn collect_files(dir: &Path, extensions: &[String], out: &mut Vec<PathBuf>) -> Result<()> {
    let entries = std::fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(&path, extensions, out)?;
        } else if path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
        {
            out.push(path);
        }
    }
    Ok(())
}

/// Source type of a file: the name of the directory it sits in.
fn source_type(path: &Path) -> String {
    path.parent()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string()
}

/// Ingest every matching file under `dir`. Returns `(files, chunks)` stored.
pub async fn ingest_dir(
    db: &dyn PersonaDB,
    dir: &Path,
    config: &IngestConfig,
) -> Result<(usize, usize)> {
    let mut files = Vec::new();
    collect_files(dir, &config.extensions, &mut files)?;
    files.sort();

    let mut stored = 0;
    for path in &files {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let document = path
            .strip_prefix(dir)
            .unwrap_or(path)
            .display()
            .to_string();
        let source = source_type(path);

        for (i, content) in split_chunks(&text, config.chunk_chars).into_iter().enumerate() {
            let chunk = TextChunk::new(
                document.clone(),
                i as u32,
                content,
                source.clone(),
                DEFAULT_CONTEXT.to_string(),
            );
            db.add_chunk(chunk).await?;
            stored += 1;
        }
        tracing::debug!(document = %document, "Ingested file");
    }

    tracing::info!(files = files.len(), chunks = stored, "Ingestion complete");
    Ok((files.len(), stored))
}
