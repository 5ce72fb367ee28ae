use cvup_store::StoreError;
use cvup_types::{DocumentType, OwnerId, VerificationCode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IssuanceError {
    #[error("unknown document type '{0}'")]
    InvalidDocumentType(String),

    #[error("owner {owner} already received a {document_type} document")]
    AlreadyIssued {
        owner: OwnerId,
        document_type: DocumentType,
    },

    #[error("no unused verification code after {attempts} attempts")]
    GeneratorExhausted { attempts: u32 },

    #[error("unknown verification code '{0}'")]
    UnknownCode(String),

    #[error("verification code {0} was already claimed")]
    AlreadyClaimed(VerificationCode),

    #[error("a claim for code {0} is already in progress")]
    ClaimInProgress(VerificationCode),

    #[error("verification for code {0} not found yet")]
    NotVerified(VerificationCode),

    #[error("verification gate unavailable: {0}")]
    GateUnavailable(String),

    #[error("document delivery failed: {0}")]
    DeliveryFailed(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// How a failure should be surfaced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    /// Bad caller input; nothing was changed.
    Validation,
    /// Business-rule rejection; safe to show the user as-is.
    Policy,
    /// The user has to act (or wait) and then retry.
    NotYetSatisfied,
    /// Infrastructure trouble; the request was left retryable.
    Dependency,
    /// Defect or data problem; needs operator attention.
    Consistency,
}

impl IssuanceError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidDocumentType(_) => ErrorClass::Validation,
            Self::AlreadyIssued { .. } | Self::AlreadyClaimed(_) => ErrorClass::Policy,
            Self::NotVerified(_) | Self::ClaimInProgress(_) => ErrorClass::NotYetSatisfied,
            Self::GateUnavailable(_) | Self::DeliveryFailed(_) => ErrorClass::Dependency,
            Self::Store(e) if e.is_backend() => ErrorClass::Dependency,
            Self::UnknownCode(_) | Self::GeneratorExhausted { .. } | Self::Store(_) => {
                ErrorClass::Consistency
            }
        }
    }

    /// Whether repeating the same call later can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.class(),
            ErrorClass::NotYetSatisfied | ErrorClass::Dependency
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code() -> VerificationCode {
        VerificationCode::parse("AB12CD34").unwrap()
    }

    #[test]
    fn dependency_failures_are_retryable() {
        assert!(IssuanceError::DeliveryFailed("smtp down".into()).is_retryable());
        assert!(IssuanceError::GateUnavailable("timeout".into()).is_retryable());
        assert!(IssuanceError::Store(StoreError::Backend("io".into())).is_retryable());
    }

    #[test]
    fn policy_and_consistency_failures_are_final() {
        assert!(!IssuanceError::AlreadyClaimed(code()).is_retryable());
        assert!(!IssuanceError::UnknownCode("X".into()).is_retryable());
        assert_eq!(
            IssuanceError::Store(StoreError::DuplicateCode("AB12CD34".into())).class(),
            ErrorClass::Consistency
        );
    }

    #[test]
    fn not_verified_asks_user_to_retry() {
        let err = IssuanceError::NotVerified(code());
        assert_eq!(err.class(), ErrorClass::NotYetSatisfied);
        assert!(err.is_retryable());
    }
}
