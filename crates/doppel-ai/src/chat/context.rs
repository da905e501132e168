//! Lightweight query classification for chat turns.

use std::fmt;

use serde::{Deserialize, Serialize};

const FORMAL_INDICATORS: &[&str] = &["please", "would you", "could you", "kindly"];
const CASUAL_INDICATORS: &[&str] = &["hey", "what's", "gonna", "wanna", "yeah"];
const QUESTION_WORDS: &[&str] = &["what", "why", "how", "when", "where", "who", "which"];
const REQUEST_INDICATORS: &[&str] = &["please", "can you", "could you"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Formality {
    Casual,
    Neutral,
    Professional,
}

impl Formality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Casual => "casual",
            Self::Neutral => "neutral",
            Self::Professional => "professional",
        }
    }
}

impl fmt::Display for Formality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Question,
    Request,
    Statement,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Question => "question",
            Self::Request => "request",
            Self::Statement => "statement",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryContext {
    pub formality: Formality,
    pub intent: Intent,
    /// Whitespace-separated word count.
    pub query_length: usize,
}

/// Classify register and intent of a user query by keyword.
pub fn classify_query(query: &str) -> QueryContext {
    let lower = query.to_lowercase();
    let contains_any = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));

    let formality = if contains_any(FORMAL_INDICATORS) {
        Formality::Professional
    } else if contains_any(CASUAL_INDICATORS) {
        Formality::Casual
    } else {
        Formality::Neutral
    };

    let trimmed = lower.trim();
    let intent = if trimmed.ends_with('?')
        || QUESTION_WORDS.iter().any(|w| trimmed.starts_with(w))
    {
        Intent::Question
    } else if contains_any(REQUEST_INDICATORS) {
        Intent::Request
    } else {
        Intent::Statement
    };

    QueryContext {
        formality,
        intent,
        query_length: query.split_whitespace().count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polite_request_is_professional() {
        let ctx = classify_query("Could you please summarize your thesis");
        assert_eq!(ctx.formality, Formality::Professional);
        assert_eq!(ctx.intent, Intent::Request);
        assert_eq!(ctx.query_length, 6);
    }

    #[test]
    fn slang_is_casual() {
        let ctx = classify_query("hey, you gonna ship it");
        assert_eq!(ctx.formality, Formality::Casual);
        assert_eq!(ctx.intent, Intent::Statement);
    }

    #[test]
    fn formal_indicator_wins_over_casual() {
        let ctx = classify_query("hey, kindly check this");
        assert_eq!(ctx.formality, Formality::Professional);
    }

    #[test]
    fn question_detection() {
        assert_eq!(classify_query("Is this fine?  ").intent, Intent::Question);
        assert_eq!(classify_query("Why do you write at night").intent, Intent::Question);
        assert_eq!(classify_query("I think so.").intent, Intent::Statement);
    }

    #[test]
    fn question_beats_request() {
        assert_eq!(classify_query("can you help?").intent, Intent::Question);
    }

    #[test]
    fn neutral_default() {
        let ctx = classify_query("Tell me about sailing");
        assert_eq!(ctx.formality, Formality::Neutral);
        assert_eq!(ctx.formality.to_string(), "neutral");
    }
}
