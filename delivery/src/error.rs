use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("template for '{document_type}' unavailable: {reason}")]
    TemplateUnavailable {
        document_type: String,
        reason: String,
    },

    #[error("failed to build message: {0}")]
    Message(String),

    #[error("mail transport error: {0}")]
    Transport(String),

    #[error("mail server rejected message: {0}")]
    Rejected(String),

    #[error("delivery misconfigured: {0}")]
    Config(String),
}
