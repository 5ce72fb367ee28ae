use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("key not found: {0}")]
    NotFound(String),

    #[error("duplicate verification code: {0}")]
    DuplicateCode(String),

    #[error("invalid state transition: {0}")]
    InvalidState(String),

    #[error("claim already held: {0}")]
    ClaimHeld(String),

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("database is corrupted: {0}")]
    Corruption(String),
}

impl StoreError {
    /// Whether the failure came from the storage engine rather than from the
    /// state of the data (missing key, duplicate, wrong status).
    pub fn is_backend(&self) -> bool {
        matches!(self, Self::Backend(_))
    }
}
