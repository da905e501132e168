use std::sync::Arc;
use std::time::Instant;

use doppel_core::config::AnalysisConfig;
use doppel_core::interfaces::CompletionBackend;
use doppel_core::profile::{AnalysisMetadata, PersonalityProfile};

use super::extractor::PatternExtractor;
use super::sampler::{select_samples, SampleLimits};
use super::synthesizer::ProfileSynthesizer;
use super::ProgressCallback;
use crate::error::{AiError, AiResult};

/// Progress steps for a full run: start, six dimensions, synthesis, done.
const TOTAL_STAGES: usize = 8;

/// Runs the complete analysis: sample selection, six sequential
/// extractions, one synthesis, profile assembly.
///
/// Any extraction or synthesis failure aborts the run; no partial profile
/// is ever returned.
pub struct AnalysisOrchestrator {
    extractor: PatternExtractor,
    synthesizer: ProfileSynthesizer,
    limits: SampleLimits,
    model: String,
}

impl AnalysisOrchestrator {
    pub fn new(backend: Arc<dyn CompletionBackend>, config: &AnalysisConfig) -> Self {
        Self {
            model: backend.model_name().to_string(),
            extractor: PatternExtractor::new(backend.clone(), config.extraction_max_tokens),
            synthesizer: ProfileSynthesizer::new(backend, config.synthesis_max_tokens),
            limits: SampleLimits::from(config),
        }
    }

    pub async fn analyze(
        &self,
        texts: &[String],
        progress: Option<&ProgressCallback>,
    ) -> AiResult<PersonalityProfile> {
        if texts.is_empty() {
            return Err(AiError::InsufficientData);
        }

        let started = Instant::now();
        let total_chars: usize = texts.iter().map(|t| t.chars().count()).sum();
        let estimated_tokens = total_chars / 4;
        tracing::info!(
            text_count = texts.len(),
            estimated_tokens,
            model = %self.model,
            "Analysis started"
        );

        let samples = select_samples(texts, self.limits);
        if samples.is_empty() {
            return Err(AiError::InsufficientData);
        }

        let report = |stage: &str, current: usize| {
            if let Some(cb) = progress {
                cb(stage, current, TOTAL_STAGES);
            }
        };

        report("Starting pattern extraction", 0);
        let raw = self.extractor.extract_all(&samples, progress).await?;

        report("Synthesizing personality profile", 7);
        let synthesis = self.synthesizer.synthesize(&raw).await?;

        let duration = started.elapsed().as_secs_f64();
        let metadata = AnalysisMetadata {
            documents_analyzed: texts.len(),
            total_tokens_analyzed: estimated_tokens,
            analysis_duration_seconds: duration,
            model_used: self.model.clone(),
            reported_confidence: None,
        };
        let profile = self.synthesizer.build_profile(&raw, synthesis, metadata)?;

        report("Analysis complete", 8);
        tracing::info!(
            duration_seconds = duration,
            overall_confidence = profile.overall_confidence,
            "Analysis complete"
        );
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doppel_core::testing::ScriptedBackend;
    use doppel_core::profile::Dimension;
    use std::sync::Mutex;

    fn full_script() -> Vec<String> {
        let mut replies: Vec<String> = Dimension::ALL
            .iter()
            .map(|_| "{\"confidence\": 0.6}".to_string())
            .collect();
        replies.push("{\"personality_essence\": \"Steady.\", \"overall_confidence\": 0.95}".into());
        replies
    }

    #[tokio::test]
    async fn empty_input_is_insufficient_data() {
        let backend = Arc::new(ScriptedBackend::new(full_script()));
        let orchestrator = AnalysisOrchestrator::new(backend.clone(), &AnalysisConfig::default());
        let err = orchestrator.analyze(&[], None).await.unwrap_err();
        assert!(matches!(err, AiError::InsufficientData));
        assert!(backend.structured_calls().is_empty());
    }

    #[tokio::test]
    async fn blank_only_input_is_insufficient_data() {
        let backend = Arc::new(ScriptedBackend::new(full_script()));
        let orchestrator = AnalysisOrchestrator::new(backend.clone(), &AnalysisConfig::default());
        let texts = vec!["  ".to_string(), "\n".to_string()];
        let err = orchestrator.analyze(&texts, None).await.unwrap_err();
        assert!(matches!(err, AiError::InsufficientData));
        assert!(backend.structured_calls().is_empty());
    }

    #[tokio::test]
    async fn full_run_builds_profile_with_metadata() {
        let backend = Arc::new(ScriptedBackend::new(full_script()));
        let orchestrator = AnalysisOrchestrator::new(backend.clone(), &AnalysisConfig::default());
        let texts = vec!["a".repeat(400), "b".repeat(400)];

        let stages = Arc::new(Mutex::new(Vec::new()));
        let progress = {
            let stages = Arc::clone(&stages);
            move |stage: &str, current: usize, total: usize| {
                stages.lock().unwrap().push((stage.to_string(), current, total));
            }
        };
        let profile = orchestrator.analyze(&texts, Some(&progress)).await.unwrap();

        assert_eq!(profile.personality_essence, "Steady.");
        assert!((profile.overall_confidence - 0.6).abs() < 1e-6);
        assert_eq!(profile.analysis_metadata.documents_analyzed, 2);
        assert_eq!(profile.analysis_metadata.total_tokens_analyzed, 200);
        assert_eq!(profile.analysis_metadata.model_used, "scripted-model");
        assert_eq!(profile.analysis_metadata.reported_confidence, Some(0.95));
        assert_eq!(backend.structured_calls().len(), 7);

        let stages = stages.lock().unwrap().clone();
        assert_eq!(stages.first().unwrap(), &("Starting pattern extraction".to_string(), 0, 8));
        assert_eq!(stages[1], ("Writing Style".to_string(), 1, 6));
        assert_eq!(stages[7], ("Synthesizing personality profile".to_string(), 7, 8));
        assert_eq!(stages.last().unwrap(), &("Analysis complete".to_string(), 8, 8));
    }

    #[tokio::test]
    async fn extraction_failure_aborts_before_synthesis() {
        let mut replies = full_script();
        replies[1] = "definitely not json".into();
        let backend = Arc::new(ScriptedBackend::new(replies));
        let orchestrator = AnalysisOrchestrator::new(backend.clone(), &AnalysisConfig::default());

        let err = orchestrator
            .analyze(&["some text".to_string()], None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AiError::MalformedExtraction { dimension: Dimension::Cognitive, .. }
        ));
        assert_eq!(backend.structured_calls().len(), 2);
    }
}
