use cvup_issuance::IssuanceError;
use cvup_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BotError {
    /// The command was malformed; the payload is the usage hint to show.
    #[error("usage: {0}")]
    Usage(&'static str),

    #[error("invalid email address '{0}'")]
    InvalidEmail(String),

    #[error("issuance error: {0}")]
    Issuance(#[from] IssuanceError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
