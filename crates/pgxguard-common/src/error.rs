use thiserror::Error;

#[derive(Debug, Error)]
pub enum PgxError {
    #[error("Rule table unavailable: {0}")]
    RuleTableUnavailable(String),

    #[error("Batch of {requested} drugs exceeds the per-request limit of {limit}")]
    BatchTooLarge { requested: usize, limit: usize },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, PgxError>;
