//! Representative sample selection under a token budget.

use doppel_core::config::AnalysisConfig;

use crate::text::truncate_chars;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleLimits {
    pub max_samples: usize,
    pub max_chars_per_sample: usize,
}

impl Default for SampleLimits {
    fn default() -> Self {
        Self {
            max_samples: 50,
            max_chars_per_sample: 3000,
        }
    }
}

impl From<&AnalysisConfig> for SampleLimits {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            max_samples: config.max_samples,
            max_chars_per_sample: config.max_chars_per_sample,
        }
    }
}

/// Pick at most `max_samples` non-blank texts, each cut to
/// `max_chars_per_sample` characters.
///
/// Small corpora are taken whole. Larger ones are walked with a fixed
/// stride of `len / max_samples`, which spreads the picks across the
/// corpus order (usually chronological). Whitespace only decides whether a
/// text is blank; kept texts are returned as given, apart from the cut.
pub fn select_samples(texts: &[String], limits: SampleLimits) -> Vec<String> {
    let max_samples = limits.max_samples.max(1);
    let max_chars = limits.max_chars_per_sample.max(1);

    if texts.len() <= max_samples {
        return texts
            .iter()
            .filter(|t| !t.trim().is_empty())
            .map(|t| truncate_chars(t, max_chars))
            .collect();
    }

    let step = texts.len() / max_samples;
    let samples: Vec<String> = texts
        .iter()
        .step_by(step)
        .filter(|t| !t.trim().is_empty())
        .take(max_samples)
        .map(|t| truncate_chars(t, max_chars))
        .collect();

    tracing::debug!(
        original_count = texts.len(),
        selected_count = samples.len(),
        "Samples selected"
    );
    samples
}
