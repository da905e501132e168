//! User ratings on assistant replies and simple aggregates over them.

use std::collections::BTreeMap;
use std::sync::Arc;

use doppel_db::schema::Feedback;
use doppel_db::PersonaDB;
use serde::Serialize;

use crate::error::{AiError, AiResult};

pub const DEFAULT_LOW_RATING_THRESHOLD: u8 = 3;
pub const IMPROVEMENT_SUGGESTION: &str =
    "Consider uploading more diverse data or rebuilding personality profile";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackStats {
    pub total: usize,
    pub average_rating: f64,
    /// Count per rating 1..=5; empty when there is no feedback.
    pub distribution: BTreeMap<u8, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImprovementAreas {
    pub needs_improvement: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_rated_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_confidence_of_low_rated: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

pub struct FeedbackService {
    db: Arc<dyn PersonaDB>,
}

impl FeedbackService {
    pub fn new(db: Arc<dyn PersonaDB>) -> Self {
        Self { db }
    }

    /// Rate a stored message. A second rating for the same message replaces the first.
    pub async fn submit(
        &self,
        message_id: &str,
        rating: u8,
        comment: Option<String>,
    ) -> AiResult<Feedback> {
        if !(1..=5).contains(&rating) {
            return Err(AiError::InvalidRating(rating));
        }
        self.db.get_message(message_id).await?;
        let saved = self
            .db
            .upsert_feedback(Feedback::new(message_id.to_string(), rating, comment))
            .await?;
        tracing::info!(message_id, rating, "Feedback recorded");
        Ok(saved)
    }

    pub async fn stats(&self) -> AiResult<FeedbackStats> {
        let all = self.db.list_feedback().await?;
        if all.is_empty() {
            return Ok(FeedbackStats {
                total: 0,
                average_rating: 0.0,
                distribution: BTreeMap::new(),
            });
        }
        let total = all.len();
        let sum: u32 = all.iter().map(|f| u32::from(f.rating)).sum();
        let distribution = (1..=5u8)
            .map(|r| (r, all.iter().filter(|f| f.rating == r).count()))
            .collect();
        Ok(FeedbackStats {
            total,
            average_rating: round2(f64::from(sum) / total as f64),
            distribution,
        })
    }

    /// Summarize replies rated at or below `threshold`.
    ///
    /// Feedback whose message no longer exists is ignored.
    pub async fn improvement_areas(&self, threshold: u8) -> AiResult<ImprovementAreas> {
        let mut confidences = Vec::new();
        for fb in self.db.list_feedback().await? {
            if fb.rating > threshold {
                continue;
            }
            match self.db.get_message(&fb.message_id).await {
                Ok(m) => confidences.push(f64::from(m.confidence_score.unwrap_or(0.0))),
                Err(doppel_db::DbError::NotFound(_)) => continue,
                Err(e) => return Err(e.into()),
            }
        }

        if confidences.is_empty() {
            return Ok(ImprovementAreas {
                needs_improvement: false,
                low_rated_count: None,
                avg_confidence_of_low_rated: None,
                suggestion: None,
            });
        }
        let mean = confidences.iter().sum::<f64>() / confidences.len() as f64;
        Ok(ImprovementAreas {
            needs_improvement: true,
            low_rated_count: Some(confidences.len()),
            avg_confidence_of_low_rated: Some(round2(mean)),
            suggestion: Some(IMPROVEMENT_SUGGESTION.to_string()),
        })
    }
}
