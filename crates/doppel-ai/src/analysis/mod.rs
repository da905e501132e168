//! Multi-pass personality analysis: sample selection, one extraction call
//! per dimension, one synthesis call, then profile assembly and storage.

pub mod extractor;
pub mod manager;
pub mod pipeline;
pub mod prompts;
pub mod sampler;
pub mod synthesizer;

pub use extractor::PatternExtractor;
pub use manager::ProfileManager;
pub use pipeline::AnalysisOrchestrator;
pub use sampler::{select_samples, SampleLimits};
pub use synthesizer::ProfileSynthesizer;

/// Progress observer: `(stage, current, total)`. Purely informational.
pub type ProgressCallback = dyn Fn(&str, usize, usize) + Send + Sync;
