use thiserror::Error;

#[derive(Debug, Error)]
pub enum GateError {
    #[error("verification service unreachable: {0}")]
    Unreachable(String),

    #[error("verification request failed: {0}")]
    RequestFailed(String),

    #[error("invalid response from verification service: {0}")]
    InvalidResponse(String),

    #[error("verification gate misconfigured: {0}")]
    Config(String),
}
