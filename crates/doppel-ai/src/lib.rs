pub mod analysis;
pub mod chat;
pub mod error;
pub mod feedback;
pub mod llm;
pub mod metrics;
pub mod retrieval;
mod text;

pub use analysis::{AnalysisOrchestrator, ProfileManager};
pub use chat::{ChatOutcome, ChatTurnResult, ConversationEngine};
pub use error::{AiError, AiResult};
pub use feedback::FeedbackService;
pub use llm::HttpCompletionBackend;
pub use retrieval::{DiversityRetriever, LexicalRetriever};
