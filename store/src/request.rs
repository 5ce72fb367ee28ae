//! CV request storage trait.

use cvup_types::{CvRequest, DocumentType, NewCvRequest, OwnerId, RequestId, Timestamp, VerificationCode};

use crate::StoreError;

/// Durable mapping of verification code -> request and owner -> requests.
///
/// Each method is atomic with respect to the record(s) it touches. Records
/// are never deleted, so the completed history remains available for the
/// one-per-type check.
pub trait RequestStore: Send + Sync {
    /// Whether `owner` already has a completed request of `document_type`.
    fn find_completed(
        &self,
        owner: OwnerId,
        document_type: DocumentType,
    ) -> Result<bool, StoreError>;

    /// Whether any record (pending or completed) uses `code`.
    fn code_exists(&self, code: &VerificationCode) -> Result<bool, StoreError>;

    /// Persist a new pending request.
    ///
    /// Fails with [`StoreError::DuplicateCode`] if the code is already taken.
    fn create(&self, request: &NewCvRequest) -> Result<RequestId, StoreError>;

    /// Fails with [`StoreError::NotFound`] if no record has this code.
    fn get_by_code(&self, code: &VerificationCode) -> Result<CvRequest, StoreError>;

    /// Take the delivery lease for a pending record until `lease_until`.
    ///
    /// At most one unexpired lease exists per owner and document type across
    /// every handle on the same data. Fails with [`StoreError::NotFound`] if
    /// no record has this code, [`StoreError::InvalidState`] if the record is
    /// not pending or its type was already completed, and
    /// [`StoreError::ClaimHeld`] if another unexpired lease covers the same
    /// owner and type. A lease that expired before `now` is taken over.
    fn begin_claim(
        &self,
        code: &VerificationCode,
        now: Timestamp,
        lease_until: Timestamp,
    ) -> Result<CvRequest, StoreError>;

    /// Release the lease held by `code`. A no-op when `code` holds none.
    fn end_claim(&self, code: &VerificationCode) -> Result<(), StoreError>;

    /// Conditionally move a record from pending to completed, releasing its
    /// lease in the same step.
    ///
    /// Fails with [`StoreError::InvalidState`] if the record is missing, is
    /// not pending, or another request of the same owner and document type
    /// has already completed.
    fn complete(
        &self,
        code: &VerificationCode,
        verified: bool,
        completed_at: Timestamp,
    ) -> Result<(), StoreError>;

    /// All requests of an owner, oldest first.
    fn requests_for_owner(&self, owner: OwnerId) -> Result<Vec<CvRequest>, StoreError>;

    fn request_count(&self) -> Result<u64, StoreError>;
}
