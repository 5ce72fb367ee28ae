//! LMDB implementation of RequestStore.
//!
//! Records live in `cv_requests` keyed by verification code. Two secondary
//! indexes are maintained in the same write transaction as the record:
//! `owner_requests` (owner ++ id -> code) for history listings and
//! `completed_types` (owner ++ type tag -> code) for the one-per-type rule.
//! `claims` (owner ++ type tag -> lease) records which code is currently
//! being delivered and until when.

use heed::RwTxn;
use serde::{Deserialize, Serialize};

use cvup_store::{RequestStore, StoreError};
use cvup_types::{
    CvRequest, DocumentType, NewCvRequest, OwnerId, RequestId, RequestStatus, Timestamp,
    VerificationCode,
};

use crate::environment::LmdbStore;
use crate::keys::{allocate_id, completed_key, owner_index_key, scan_prefix_values};
use crate::LmdbError;

const NEXT_REQUEST_ID_KEY: &[u8] = b"next_request_id";

/// Decode a stored record and check it against its key and its own
/// completion invariants.
pub(crate) fn decode_request(key: &[u8], bytes: &[u8]) -> Result<CvRequest, LmdbError> {
    let record: CvRequest = bincode::deserialize(bytes).map_err(|e| {
        LmdbError::Corruption(format!(
            "undecodable request under key '{}': {e}",
            String::from_utf8_lossy(key)
        ))
    })?;
    if record.verification_code.as_bytes() != key {
        return Err(LmdbError::Corruption(format!(
            "request {} stored under key '{}'",
            record.verification_code,
            String::from_utf8_lossy(key)
        )));
    }
    record
        .validate()
        .map_err(|e| LmdbError::Corruption(e.to_string()))?;
    Ok(record)
}

/// A delivery lease stored in the `claims` table.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ClaimLease {
    pub code: VerificationCode,
    pub expires_at: Timestamp,
}

pub(crate) fn decode_lease(bytes: &[u8]) -> Result<ClaimLease, LmdbError> {
    bincode::deserialize(bytes)
        .map_err(|e| LmdbError::Corruption(format!("undecodable claim lease: {e}")))
}

impl LmdbStore {
    /// Read and check a record inside a write transaction.
    fn pending_in(&self, wtxn: &RwTxn, code: &VerificationCode) -> Result<CvRequest, StoreError> {
        let bytes = self
            .requests_db
            .get(wtxn, code.as_bytes())
            .map_err(LmdbError::from)?
            .ok_or_else(|| StoreError::NotFound(format!("cv request {code}")))?;
        let record = decode_request(code.as_bytes(), bytes)?;
        if !record.is_pending() {
            return Err(StoreError::InvalidState(format!(
                "request {code} is already {}",
                record.status
            )));
        }
        let completed = self
            .completed_types_db
            .get(wtxn, &completed_key(record.owner_id, record.document_type))
            .map_err(LmdbError::from)?
            .is_some();
        if completed {
            return Err(StoreError::InvalidState(format!(
                "owner {} already completed a {} request",
                record.owner_id, record.document_type
            )));
        }
        Ok(record)
    }

    /// Delete the lease under `key` if `code` holds it.
    fn release_lease(
        &self,
        wtxn: &mut RwTxn,
        key: &[u8],
        code: &VerificationCode,
    ) -> Result<bool, StoreError> {
        let held = match self.claims_db.get(wtxn, key).map_err(LmdbError::from)? {
            Some(bytes) => decode_lease(bytes)?.code == *code,
            None => false,
        };
        if held {
            self.claims_db.delete(wtxn, key).map_err(LmdbError::from)?;
        }
        Ok(held)
    }
}

impl RequestStore for LmdbStore {
    fn find_completed(
        &self,
        owner: OwnerId,
        document_type: DocumentType,
    ) -> Result<bool, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let found = self
            .completed_types_db
            .get(&rtxn, &completed_key(owner, document_type))
            .map_err(LmdbError::from)?
            .is_some();
        Ok(found)
    }

    fn code_exists(&self, code: &VerificationCode) -> Result<bool, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let found = self
            .requests_db
            .get(&rtxn, code.as_bytes())
            .map_err(LmdbError::from)?
            .is_some();
        Ok(found)
    }

    fn create(&self, request: &NewCvRequest) -> Result<RequestId, StoreError> {
        let code = &request.verification_code;
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;

        let taken = self
            .requests_db
            .get(&wtxn, code.as_bytes())
            .map_err(LmdbError::from)?
            .is_some();
        if taken {
            return Err(StoreError::DuplicateCode(code.to_string()));
        }

        let id = allocate_id(&self.meta_db, &mut wtxn, NEXT_REQUEST_ID_KEY)?;
        let record = CvRequest::pending(RequestId::new(id), request);
        let bytes = bincode::serialize(&record).map_err(LmdbError::from)?;

        self.requests_db
            .put(&mut wtxn, code.as_bytes(), &bytes)
            .map_err(LmdbError::from)?;
        self.owner_requests_db
            .put(
                &mut wtxn,
                &owner_index_key(request.owner_id, id),
                code.as_bytes(),
            )
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;

        Ok(record.id)
    }

    fn get_by_code(&self, code: &VerificationCode) -> Result<CvRequest, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let bytes = self
            .requests_db
            .get(&rtxn, code.as_bytes())
            .map_err(LmdbError::from)?
            .ok_or_else(|| StoreError::NotFound(format!("cv request {code}")))?;
        Ok(decode_request(code.as_bytes(), bytes)?)
    }

    fn begin_claim(
        &self,
        code: &VerificationCode,
        now: Timestamp,
        lease_until: Timestamp,
    ) -> Result<CvRequest, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let record = self.pending_in(&wtxn, code)?;
        let key = completed_key(record.owner_id, record.document_type);

        if let Some(bytes) = self.claims_db.get(&wtxn, &key).map_err(LmdbError::from)? {
            let lease = decode_lease(bytes)?;
            if lease.expires_at > now {
                return Err(StoreError::ClaimHeld(format!(
                    "{} request of owner {} is being delivered for {} until {}",
                    record.document_type, record.owner_id, lease.code, lease.expires_at
                )));
            }
            tracing::warn!(
                code = %lease.code,
                expired_at = %lease.expires_at,
                "taking over an expired claim lease"
            );
        }

        let lease = ClaimLease {
            code: code.clone(),
            expires_at: lease_until,
        };
        let bytes = bincode::serialize(&lease).map_err(LmdbError::from)?;
        self.claims_db
            .put(&mut wtxn, &key, &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(record)
    }

    fn end_claim(&self, code: &VerificationCode) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let record = match self
            .requests_db
            .get(&wtxn, code.as_bytes())
            .map_err(LmdbError::from)?
        {
            Some(bytes) => decode_request(code.as_bytes(), bytes)?,
            None => return Ok(()),
        };
        let key = completed_key(record.owner_id, record.document_type);
        if self.release_lease(&mut wtxn, &key, code)? {
            wtxn.commit().map_err(LmdbError::from)?;
        }
        Ok(())
    }

    fn complete(
        &self,
        code: &VerificationCode,
        verified: bool,
        completed_at: Timestamp,
    ) -> Result<(), StoreError> {
        if !verified {
            return Err(StoreError::InvalidState(format!(
                "request {code} cannot complete without verification"
            )));
        }

        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;

        let bytes = self
            .requests_db
            .get(&wtxn, code.as_bytes())
            .map_err(LmdbError::from)?
            .map(|b| b.to_vec())
            .ok_or_else(|| StoreError::InvalidState(format!("no request with code {code}")))?;
        let mut record = decode_request(code.as_bytes(), &bytes)?;

        if !record.is_pending() {
            return Err(StoreError::InvalidState(format!(
                "request {code} is already {}",
                record.status
            )));
        }

        let ckey = completed_key(record.owner_id, record.document_type);
        let already = self
            .completed_types_db
            .get(&wtxn, &ckey)
            .map_err(LmdbError::from)?
            .is_some();
        if already {
            return Err(StoreError::InvalidState(format!(
                "owner {} already completed a {} request",
                record.owner_id, record.document_type
            )));
        }

        record.status = RequestStatus::Completed;
        record.verified = true;
        record.completed_at = Some(completed_at);
        let bytes = bincode::serialize(&record).map_err(LmdbError::from)?;

        self.requests_db
            .put(&mut wtxn, code.as_bytes(), &bytes)
            .map_err(LmdbError::from)?;
        self.completed_types_db
            .put(&mut wtxn, &ckey, code.as_bytes())
            .map_err(LmdbError::from)?;
        self.release_lease(&mut wtxn, &ckey, code)?;
        wtxn.commit().map_err(LmdbError::from)?;

        Ok(())
    }

    fn requests_for_owner(&self, owner: OwnerId) -> Result<Vec<CvRequest>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let codes = scan_prefix_values(&self.owner_requests_db, &rtxn, &owner.to_be_bytes())?;
        let mut results = Vec::with_capacity(codes.len());
        for code in codes {
            let bytes = self
                .requests_db
                .get(&rtxn, &code)
                .map_err(LmdbError::from)?
                .ok_or_else(|| {
                    LmdbError::Corruption(format!(
                        "owner index of {owner} points at missing request '{}'",
                        String::from_utf8_lossy(&code)
                    ))
                })?;
            results.push(decode_request(&code, bytes)?);
        }
        Ok(results)
    }

    fn request_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let count = self.requests_db.len(&rtxn).map_err(LmdbError::from)?;
        Ok(count)
    }
}
