use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AttainError {
    /// Reference data or grades contradict each other. Fatal to the batch.
    #[error("data integrity error: {0}")]
    DataIntegrity(String),

    #[error("unknown top outcome: {0}")]
    UnknownOutcome(String),

    #[error("batch of {requested} path evaluations exceeds budget of {limit}")]
    BatchTooLarge { requested: usize, limit: usize },
}

impl AttainError {
    pub(crate) fn integrity(msg: impl Into<String>) -> Self {
        Self::DataIntegrity(msg.into())
    }
}
