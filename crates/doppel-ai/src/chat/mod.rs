//! Per-turn chat pipeline: classify, prompt, generate, validate, persist.

pub mod context;
pub mod engine;
pub mod prompt;
pub mod validator;

pub use context::{classify_query, Formality, Intent, QueryContext};
pub use engine::{ChatOutcome, ChatTurnResult, ConversationEngine};
pub use prompt::PromptBuilder;
pub use validator::{ResponseValidator, ValidationReport, ValidatorRules};
