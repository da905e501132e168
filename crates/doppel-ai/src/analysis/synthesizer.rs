use std::sync::Arc;

use doppel_core::interfaces::CompletionBackend;
use doppel_core::profile::{
    decode_with_defaults, AnalysisMetadata, PersonalityProfile, RawAnalyses, Synthesis,
};

use super::prompts::{synthesis_prompt, SYNTHESIS_SYSTEM_PROMPT};
use crate::error::{AiError, AiResult};
use crate::llm::parse_structured;

/// Second pass: merge the six raw extractions into essence, key
/// characteristics and context variations, then assemble the profile.
pub struct ProfileSynthesizer {
    backend: Arc<dyn CompletionBackend>,
    max_tokens: u32,
}

impl ProfileSynthesizer {
    pub fn new(backend: Arc<dyn CompletionBackend>, max_tokens: u32) -> Self {
        Self {
            backend,
            max_tokens,
        }
    }

    pub async fn synthesize(&self, raw: &RawAnalyses) -> AiResult<Synthesis> {
        let formatted = serde_json::to_string_pretty(raw)
            .map_err(|e| AiError::MalformedSynthesis(e.to_string()))?;
        let prompt = synthesis_prompt(&formatted);

        tracing::info!("Synthesizing profile");
        let content = self
            .backend
            .generate_structured_completion(&prompt, SYNTHESIS_SYSTEM_PROMPT, self.max_tokens)
            .await
            .map_err(|e| {
                tracing::error!("Synthesis call failed: {e:#}");
                AiError::Generation(e)
            })?;

        let value = parse_structured(&content).map_err(|e| {
            tracing::error!("Synthesis output is not valid JSON: {e}");
            AiError::MalformedSynthesis(e.to_string())
        })?;
        Ok(decode_with_defaults("synthesis", &value)?)
    }

    /// Build the typed profile. Absent sub-fields take schema defaults;
    /// `overall_confidence` is the mean of the six dimension confidences.
    pub fn build_profile(
        &self,
        raw: &RawAnalyses,
        synthesis: Synthesis,
        metadata: AnalysisMetadata,
    ) -> AiResult<PersonalityProfile> {
        Ok(PersonalityProfile::assemble(raw, synthesis, metadata)?)
    }
}
