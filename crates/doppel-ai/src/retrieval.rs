//! Retriever implementations over the chunk store.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use doppel_core::interfaces::{RetrievedChunk, Retriever};
use doppel_db::PersonaDB;

fn word_set(text: &str) -> HashSet<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}

/// Word-set Jaccard similarity in [0, 1]. Empty input scores 0.
pub fn jaccard(a: &str, b: &str) -> f32 {
    jaccard_sets(&word_set(a), &word_set(b))
}

fn jaccard_sets(a: &HashSet<String>, b: &HashSet<String>) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let shared = a.intersection(b).count();
    let union = a.len() + b.len() - shared;
    shared as f32 / union as f32
}

/// Ranks stored chunks by word overlap with the query.
///
/// Stands in for a vector store: `distance = 1 - similarity`, so smaller is
/// closer, as with embedding distances.
pub struct LexicalRetriever {
    db: Arc<dyn PersonaDB>,
    source_type: Option<String>,
}

impl LexicalRetriever {
    pub fn new(db: Arc<dyn PersonaDB>) -> Self {
        Self {
            db,
            source_type: None,
        }
    }

    /// Only consider chunks from one source type.
    pub fn with_source_type(mut self, source_type: impl Into<String>) -> Self {
        self.source_type = Some(source_type.into());
        self
    }
}

#[async_trait]
impl Retriever for LexicalRetriever {
    async fn retrieve(&self, query: &str, k: usize) -> anyhow::Result<Vec<RetrievedChunk>> {
        let query_words = word_set(query);
        let mut scored: Vec<(f32, RetrievedChunk)> = self
            .db
            .list_chunks()
            .await?
            .into_iter()
            .filter(|c| self.source_type.as_ref().map_or(true, |s| &c.source_type == s))
            .map(|c| {
                let similarity = jaccard_sets(&query_words, &word_set(&c.content));
                let id = c
                    .id_string()
                    .unwrap_or_else(|| format!("{}#{}", c.document, c.chunk_index));
                let metadata = BTreeMap::from([
                    ("source_type".to_string(), c.source_type),
                    ("context".to_string(), c.context),
                    ("document".to_string(), c.document),
                ]);
                let chunk = RetrievedChunk {
                    id,
                    content: c.content,
                    metadata,
                    distance: Some(1.0 - similarity),
                };
                (similarity, chunk)
            })
            .collect();

        // Stable sort keeps store order among equal scores.
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
        let hits: Vec<_> = scored.into_iter().take(k).map(|(_, c)| c).collect();
        tracing::debug!(k, returned = hits.len(), "Lexical retrieval");
        Ok(hits)
    }
}

/// Maximal-marginal-relevance reranking on top of another retriever.
///
/// Fetches `2k` candidates, keeps the best hit, then repeatedly adds the
/// candidate with the highest `lambda * relevance - (1 - lambda) * redundancy`
/// where relevance is `1 - distance` and redundancy is the highest Jaccard
/// similarity to anything already selected. Both terms live in [0, 1].
pub struct DiversityRetriever {
    inner: Arc<dyn Retriever>,
    lambda: f32,
}

impl DiversityRetriever {
    pub fn new(inner: Arc<dyn Retriever>, lambda: f32) -> Self {
        Self {
            inner,
            lambda: lambda.clamp(0.0, 1.0),
        }
    }
}

#[async_trait]
impl Retriever for DiversityRetriever {
    async fn retrieve(&self, query: &str, k: usize) -> anyhow::Result<Vec<RetrievedChunk>> {
        let mut remaining = self.inner.retrieve(query, k.saturating_mul(2)).await?;
        if remaining.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let mut words: Vec<HashSet<String>> = remaining.iter().map(|c| word_set(&c.content)).collect();
        let mut selected = vec![remaining.remove(0)];
        let mut selected_words = vec![words.remove(0)];

        while selected.len() < k && !remaining.is_empty() {
            let mut best = 0;
            let mut best_score = f32::NEG_INFINITY;
            for (idx, candidate) in remaining.iter().enumerate() {
                let relevance = 1.0 - candidate.distance.unwrap_or(1.0).clamp(0.0, 1.0);
                let redundancy = selected_words
                    .iter()
                    .map(|s| jaccard_sets(&words[idx], s))
                    .fold(0.0_f32, f32::max);
                let score = self.lambda * relevance - (1.0 - self.lambda) * redundancy;
                // Strictly greater: earlier rank wins ties.
                if score > best_score {
                    best_score = score;
                    best = idx;
                }
            }
            selected.push(remaining.remove(best));
            selected_words.push(words.remove(best));
        }

        tracing::debug!(k, selected = selected.len(), "Diversity rerank");
        Ok(selected)
    }
}
