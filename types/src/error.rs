//! Parse and validation errors for domain types.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    #[error("unknown document type '{0}' (expected 'junior' or 'senior')")]
    InvalidDocumentType(String),

    #[error("invalid verification code '{0}'")]
    InvalidCode(String),

    #[error("invalid email address '{0}'")]
    InvalidEmail(String),

    #[error("inconsistent record: {0}")]
    InconsistentRecord(String),
}
