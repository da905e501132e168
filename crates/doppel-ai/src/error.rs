use doppel_core::profile::{Dimension, ProfileError};
use doppel_db::DbError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AiError {
    /// No usable text samples; nothing was analyzed and no profile was saved.
    #[error("Insufficient data: no usable text samples, upload documents first")]
    InsufficientData,

    #[error("Malformed extraction for dimension '{dimension}': {reason}")]
    MalformedExtraction { dimension: Dimension, reason: String },

    #[error("Malformed synthesis output: {0}")]
    MalformedSynthesis(String),

    #[error("Unknown dimension: {0}")]
    UnknownDimension(String),

    #[error("No active personality profile")]
    ProfileNotFound,

    /// The completion backend failed. The underlying error is kept intact.
    #[error("Generation failed: {0:#}")]
    Generation(anyhow::Error),

    #[error("Retrieval failed: {0:#}")]
    Retrieval(anyhow::Error),

    #[error("Invalid rating {0}: expected 1 to 5")]
    InvalidRating(u8),

    #[error("Database error: {0}")]
    Db(DbError),
}

impl From<DbError> for AiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NoActiveProfile => AiError::ProfileNotFound,
            other => AiError::Db(other),
        }
    }
}

impl From<ProfileError> for AiError {
    fn from(e: ProfileError) -> Self {
        match e {
            ProfileError::UnknownDimension(d) => AiError::UnknownDimension(d),
            ProfileError::NotAnObject { subject } => malformed(&subject, "expected a JSON object".into()),
            ProfileError::Invalid { subject, reason } => malformed(&subject, reason),
        }
    }
}

fn malformed(subject: &str, reason: String) -> AiError {
    match subject.parse::<Dimension>() {
        Ok(dimension) => AiError::MalformedExtraction { dimension, reason },
        Err(_) => AiError::MalformedSynthesis(format!("{subject}: {reason}")),
    }
}

pub type AiResult<T> = Result<T, AiError>;
