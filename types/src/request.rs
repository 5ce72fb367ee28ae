//! CV request records.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{DocumentType, EmailAddress, OwnerId, Timestamp, TypeError, VerificationCode};

/// Internal store-assigned identifier of a CV request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestId(u64);

impl RequestId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle of a request. Only ever moves `Pending -> Completed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Completed,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the workflow supplies when creating a request; the store
/// assigns the id and the initial `Pending` status.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewCvRequest {
    pub owner_id: OwnerId,
    pub email: EmailAddress,
    pub document_type: DocumentType,
    pub verification_code: VerificationCode,
    pub requested_at: Timestamp,
}

/// A persisted CV request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CvRequest {
    pub id: RequestId,
    pub owner_id: OwnerId,
    /// Delivery address captured at request time.
    pub email: EmailAddress,
    pub document_type: DocumentType,
    pub verification_code: VerificationCode,
    pub status: RequestStatus,
    pub requested_at: Timestamp,
    pub completed_at: Option<Timestamp>,
    pub verified: bool,
}

impl CvRequest {
    /// Build the initial pending record for a freshly allocated id.
    pub fn pending(id: RequestId, new: &NewCvRequest) -> Self {
        Self {
            id,
            owner_id: new.owner_id,
            email: new.email.clone(),
            document_type: new.document_type,
            verification_code: new.verification_code.clone(),
            status: RequestStatus::Pending,
            requested_at: new.requested_at,
            completed_at: None,
            verified: false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }

    /// Check that completion fields agree with the status: `completed_at`
    /// and `verified` are set exactly when the request is completed.
    pub fn validate(&self) -> Result<(), TypeError> {
        match self.status {
            RequestStatus::Pending if self.completed_at.is_some() || self.verified => {
                Err(TypeError::InconsistentRecord(format!(
                    "pending request {} carries completion fields",
                    self.verification_code
                )))
            }
            RequestStatus::Completed if self.completed_at.is_none() || !self.verified => {
                Err(TypeError::InconsistentRecord(format!(
                    "completed request {} is missing completion fields",
                    self.verification_code
                )))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_request() -> NewCvRequest {
        NewCvRequest {
            owner_id: OwnerId::new(42),
            email: EmailAddress::parse("a@x.com").unwrap(),
            document_type: DocumentType::Junior,
            verification_code: VerificationCode::parse("K1K1K1K1").unwrap(),
            requested_at: Timestamp::new(1_000),
        }
    }

    #[test]
    fn pending_record_is_consistent() {
        let req = CvRequest::pending(RequestId::new(1), &new_request());
        assert!(req.is_pending());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn verified_pending_record_is_rejected() {
        let mut req = CvRequest::pending(RequestId::new(1), &new_request());
        req.verified = true;
        assert!(req.validate().is_err());
    }

    #[test]
    fn completed_without_timestamp_is_rejected() {
        let mut req = CvRequest::pending(RequestId::new(1), &new_request());
        req.status = RequestStatus::Completed;
        req.verified = true;
        assert!(req.validate().is_err());
        req.completed_at = Some(Timestamp::new(2_000));
        assert!(req.validate().is_ok());
    }
}
