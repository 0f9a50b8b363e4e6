use attain_core::AttainError;
use attain_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("attainment error: {0}")]
    Attain(#[from] AttainError),

    #[error("unknown subject: {0}")]
    UnknownSubject(String),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
