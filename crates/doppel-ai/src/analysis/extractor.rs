use std::sync::Arc;
use std::time::Instant;

use doppel_core::interfaces::CompletionBackend;
use doppel_core::profile::{
    decode_with_defaults, CognitiveProfile, Dimension, EmotionalProfile, InterestProfile,
    ProfileError, RawAnalyses, SocialProfile, WorldviewProfile, WritingStyleProfile,
};
use serde_json::Value;

use super::prompts::{extraction_prompt, EXTRACTION_SYSTEM_PROMPT};
use super::ProgressCallback;
use crate::error::{AiError, AiResult};
use crate::llm::parse_structured;

/// First pass: one structured-extraction call per dimension.
///
/// Unparsable output is a hard failure naming the dimension. It is not
/// retried here.
pub struct PatternExtractor {
    backend: Arc<dyn CompletionBackend>,
    max_tokens: u32,
}

impl PatternExtractor {
    pub fn new(backend: Arc<dyn CompletionBackend>, max_tokens: u32) -> Self {
        Self {
            backend,
            max_tokens,
        }
    }

    /// Extract one dimension, addressed by its key.
    pub async fn extract_by_key(&self, key: &str, samples: &[String]) -> AiResult<Value> {
        let dimension: Dimension = key.parse()?;
        self.extract_dimension(dimension, samples).await
    }

    /// Extract one dimension and check that its payload decodes.
    pub async fn extract_dimension(
        &self,
        dimension: Dimension,
        samples: &[String],
    ) -> AiResult<Value> {
        let prompt = extraction_prompt(dimension, samples);
        tracing::debug!(%dimension, sample_count = samples.len(), "Extracting dimension");

        let content = self
            .backend
            .generate_structured_completion(&prompt, EXTRACTION_SYSTEM_PROMPT, self.max_tokens)
            .await
            .map_err(|e| {
                tracing::error!(%dimension, "Extraction call failed: {e:#}");
                AiError::Generation(e)
            })?;

        let value = parse_structured(&content).map_err(|e| {
            tracing::error!(%dimension, "Extraction output is not valid JSON: {e}");
            AiError::MalformedExtraction {
                dimension,
                reason: e.to_string(),
            }
        })?;

        check_shape(dimension, &value)?;
        Ok(value)
    }

    /// Extract all six dimensions in their fixed order, strictly one after another.
    pub async fn extract_all(
        &self,
        samples: &[String],
        progress: Option<&ProgressCallback>,
    ) -> AiResult<RawAnalyses> {
        let total = Dimension::ALL.len();
        let mut results = RawAnalyses::new();

        for (i, dimension) in Dimension::ALL.into_iter().enumerate() {
            if let Some(report) = progress {
                report(dimension.display_name(), i + 1, total);
            }

            let started = Instant::now();
            let value = self.extract_dimension(dimension, samples).await?;
            tracing::info!(
                %dimension,
                confidence = value.get("confidence").and_then(serde_json::Value::as_f64).unwrap_or(0.0),
                duration_ms = started.elapsed().as_millis() as u64,
                "Dimension extracted"
            );
            results.insert(dimension, value);
        }

        Ok(results)
    }
}

/// Decode into the dimension's record to surface wrong field shapes now,
/// rather than at assembly time.
fn check_shape(dimension: Dimension, value: &Value) -> Result<(), ProfileError> {
    let key = dimension.key();
    match dimension {
        Dimension::WritingStyle => decode_with_defaults::<WritingStyleProfile>(key, value).map(drop),
        Dimension::Cognitive => decode_with_defaults::<CognitiveProfile>(key, value).map(drop),
        Dimension::Emotional => decode_with_defaults::<EmotionalProfile>(key, value).map(drop),
        Dimension::Interests => decode_with_defaults::<InterestProfile>(key, value).map(drop),
        Dimension::Worldview => decode_with_defaults::<WorldviewProfile>(key, value).map(drop),
        Dimension::Social => decode_with_defaults::<SocialProfile>(key, value).map(drop),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doppel_core::testing::ScriptedBackend;
    use std::sync::Mutex;

    fn samples() -> Vec<String> {
        vec!["I build things.".into(), "Then I break them.".into()]
    }

    #[tokio::test]
    async fn extracts_fenced_json() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            "```json\n{\"voice_description\": \"Wry\", \"confidence\": 0.8}\n```".into(),
        ]));
        let extractor = PatternExtractor::new(backend.clone(), 2000);
        let value = extractor
            .extract_dimension(Dimension::WritingStyle, &samples())
            .await
            .unwrap();
        assert_eq!(value["voice_description"], "Wry");

        let calls = backend.structured_calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].0.contains("I build things.\n\n---\n\nThen I break them."));
        assert_eq!(calls[0].1, EXTRACTION_SYSTEM_PROMPT);
        assert_eq!(calls[0].2, 2000);
    }

    #[tokio::test]
    async fn unparsable_output_names_dimension() {
        let backend = Arc::new(ScriptedBackend::new(vec!["I'd rather not.".into()]));
        let extractor = PatternExtractor::new(backend, 2000);
        let err = extractor
            .extract_dimension(Dimension::Cognitive, &samples())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AiError::MalformedExtraction { dimension: Dimension::Cognitive, .. }
        ));
    }

    #[tokio::test]
    async fn non_object_is_malformed() {
        let backend = Arc::new(ScriptedBackend::new(vec!["[1, 2, 3]".into()]));
        let extractor = PatternExtractor::new(backend, 2000);
        let err = extractor
            .extract_dimension(Dimension::Social, &samples())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AiError::MalformedExtraction { dimension: Dimension::Social, .. }
        ));
    }

    #[tokio::test]
    async fn wrong_field_shape_is_malformed() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            "{\"passion_map\": \"everything\"}".into(),
        ]));
        let extractor = PatternExtractor::new(backend, 2000);
        let err = extractor
            .extract_dimension(Dimension::Emotional, &samples())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AiError::MalformedExtraction { dimension: Dimension::Emotional, .. }
        ));
    }

    #[tokio::test]
    async fn unknown_key_rejected_before_any_call() {
        let backend = Arc::new(ScriptedBackend::new(vec![]));
        let extractor = PatternExtractor::new(backend.clone(), 2000);
        let err = extractor.extract_by_key("humor", &samples()).await.unwrap_err();
        assert!(matches!(err, AiError::UnknownDimension(ref d) if d == "humor"));
        assert!(backend.structured_calls().is_empty());
    }

    #[tokio::test]
    async fn backend_failure_is_generation_error() {
        let backend = Arc::new(ScriptedBackend::failing("rate limited"));
        let extractor = PatternExtractor::new(backend, 2000);
        let err = extractor
            .extract_dimension(Dimension::Worldview, &samples())
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::Generation(ref e) if e.to_string() == "rate limited"));
    }

    #[tokio::test]
    async fn extract_all_runs_in_order_and_reports_progress() {
        let replies = Dimension::ALL
            .iter()
            .map(|d| format!("{{\"confidence\": 0.7, \"tag\": \"{}\"}}", d.key()))
            .collect();
        let backend = Arc::new(ScriptedBackend::new(replies));
        let extractor = PatternExtractor::new(backend.clone(), 2000);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let progress = {
            let seen = Arc::clone(&seen);
            move |stage: &str, current: usize, total: usize| {
                seen.lock().unwrap().push((stage.to_string(), current, total));
            }
        };
        let raw = extractor.extract_all(&samples(), Some(&progress)).await.unwrap();

        assert_eq!(raw.len(), 6);
        assert_eq!(raw[&Dimension::Interests]["tag"], "interests");

        let seen = seen.lock().unwrap().clone();
        assert_eq!(seen.len(), 6);
        assert_eq!(seen[0], ("Writing Style".to_string(), 1, 6));
        assert_eq!(seen[5], ("Social Dynamics".to_string(), 6, 6));

        let calls = backend.structured_calls();
        assert!(calls[0].0.contains("writing style"));
        assert!(calls[1].0.contains("how this person thinks and reasons"));
    }

    #[tokio::test]
    async fn extract_all_stops_at_first_failure() {
        let backend = Arc::new(ScriptedBackend::new(vec![
            "{}".into(),
            "not json".into(),
            "{}".into(),
        ]));
        let extractor = PatternExtractor::new(backend.clone(), 2000);
        let err = extractor.extract_all(&samples(), None).await.unwrap_err();
        assert!(matches!(
            err,
            AiError::MalformedExtraction { dimension: Dimension::Cognitive, .. }
        ));
        assert_eq!(backend.structured_calls().len(), 2);
    }
}
