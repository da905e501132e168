//! Offline evaluation of generated replies: lexical style similarity to
//! reference passages and a few cheap quality heuristics.

use std::collections::HashSet;

use serde::Serialize;

use crate::retrieval::jaccard;

pub const MAX_REFERENCES: usize = 5;

const VOCAB_WEIGHT: f64 = 0.2;
const LENGTH_WEIGHT: f64 = 0.2;
const PHRASE_WEIGHT: f64 = 0.3;

const STOP_WORDS: &[&str] = &["the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for"];

fn sentences(text: &str) -> impl Iterator<Item = &str> {
    text.split(['.', '!', '?']).map(str::trim).filter(|s| !s.is_empty())
}

pub fn vocabulary_overlap(a: &str, b: &str) -> f64 {
    f64::from(jaccard(a, b))
}

/// `1 - |a - b| / max(a, b)` over mean words per sentence.
pub fn sentence_length_similarity(a: &str, b: &str) -> f64 {
    let mean = |text: &str| {
        let lens: Vec<usize> = sentences(text).map(|s| s.split_whitespace().count()).collect();
        (!lens.is_empty()).then(|| lens.iter().sum::<usize>() as f64 / lens.len() as f64)
    };
    match (mean(a), mean(b)) {
        (Some(x), Some(y)) if x.max(y) > 0.0 => 1.0 - ((x - y).abs() / x.max(y)).min(1.0),
        _ => 0.0,
    }
}

fn phrases(text: &str) -> HashSet<String> {
    let words: Vec<String> = text.split_whitespace().map(str::to_lowercase).collect();
    let mut out = HashSet::new();
    for n in [2, 3] {
        for w in words.windows(n) {
            out.insert(w.join(" "));
        }
    }
    out
}

/// Jaccard overlap of word bigrams and trigrams.
pub fn phrase_similarity(a: &str, b: &str) -> f64 {
    let (pa, pb) = (phrases(a), phrases(b));
    if pa.is_empty() || pb.is_empty() {
        return 0.0;
    }
    let shared = pa.intersection(&pb).count();
    shared as f64 / (pa.len() + pb.len() - shared) as f64
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StyleScores {
    pub vocabulary_overlap: f64,
    pub sentence_length_similarity: f64,
    pub phrase_similarity: f64,
    pub composite_score: f64,
}

/// Average each metric over the first five references and combine them.
///
/// The composite is renormalized over the three lexical weights.
pub fn style_match(generated: &str, references: &[String]) -> StyleScores {
    let refs: Vec<&String> = references.iter().take(MAX_REFERENCES).collect();
    if refs.is_empty() {
        return StyleScores::default();
    }
    let n = refs.len() as f64;
    let avg = |f: fn(&str, &str) -> f64| refs.iter().map(|r| f(generated, r.as_str())).sum::<f64>() / n;

    let vocab = avg(vocabulary_overlap);
    let length = avg(sentence_length_similarity);
    let phrase = avg(phrase_similarity);
    let composite = (vocab * VOCAB_WEIGHT + length * LENGTH_WEIGHT + phrase * PHRASE_WEIGHT)
        / (VOCAB_WEIGHT + LENGTH_WEIGHT + PHRASE_WEIGHT);

    StyleScores {
        vocabulary_overlap: vocab,
        sentence_length_similarity: length,
        phrase_similarity: phrase,
        composite_score: composite,
    }
}

/// Share of sentences between 3 and 50 words.
pub fn coherence(text: &str) -> f64 {
    let lens: Vec<usize> = sentences(text).map(|s| s.split_whitespace().count()).collect();
    if lens.is_empty() {
        return 0.0;
    }
    let ok = lens.iter().filter(|&&l| (3..=50).contains(&l)).count();
    ok as f64 / lens.len() as f64
}

/// Fraction of non-stop-word query terms present in the response.
pub fn relevance(response: &str, query: &str) -> f64 {
    let query_words: HashSet<String> = query
        .split_whitespace()
        .map(str::to_lowercase)
        .filter(|w| !STOP_WORDS.contains(&w.as_str()))
        .collect();
    if query_words.is_empty() {
        return 0.5;
    }
    let response_words: HashSet<String> =
        response.split_whitespace().map(str::to_lowercase).collect();
    let overlap = query_words.intersection(&response_words).count();
    (overlap as f64 / query_words.len() as f64).min(1.0)
}

pub fn completeness(response: &str) -> f64 {
    let trimmed = response.trim();
    if trimmed.chars().count() < 10 {
        return 0.0;
    }
    let ends_properly = trimmed.ends_with(['.', '!', '?']);
    let length = (response.split_whitespace().count() as f64 / 50.0).min(1.0);
    (if ends_properly { 0.5 } else { 0.2 }) + length * 0.5
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityScores {
    pub coherence: f64,
    pub relevance: f64,
    pub completeness: f64,
}

pub fn quality(response: &str, query: &str) -> QualityScores {
    QualityScores {
        coherence: coherence(response),
        relevance: relevance(response, query),
        completeness: completeness(response),
    }
}
