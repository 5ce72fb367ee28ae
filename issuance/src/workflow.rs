//! The request/claim state machine.

use std::sync::Arc;

use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use cvup_delivery::DeliveryService;
use cvup_store::{RequestStore, StoreError};
use cvup_types::{
    Clock, CodeGenerator, CvRequest, DocumentType, EmailAddress, NewCvRequest, OwnerId,
    RandomCodeGenerator, SystemClock, Timestamp, VerificationCode,
};
use cvup_verification::VerificationGate;

use crate::guard::{ClaimGuards, StoreLease};
use crate::{IssuanceConfig, IssuanceError};

/// Result of a successful claim: the document went out and the record is
/// now completed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClaimReceipt {
    pub code: VerificationCode,
    pub owner_id: OwnerId,
    pub email: EmailAddress,
    pub document_type: DocumentType,
    pub completed_at: Timestamp,
}

pub struct IssuanceWorkflow<S, G, D> {
    store: Arc<S>,
    gate: G,
    delivery: D,
    clock: Arc<dyn Clock>,
    codes: Arc<dyn CodeGenerator>,
    config: IssuanceConfig,
    in_flight: ClaimGuards,
}

impl<S, G, D> IssuanceWorkflow<S, G, D>
where
    S: RequestStore,
    G: VerificationGate,
    D: DeliveryService,
{
    pub fn new(store: Arc<S>, gate: G, delivery: D) -> Self {
        Self {
            store,
            gate,
            delivery,
            clock: Arc::new(SystemClock),
            codes: Arc::new(RandomCodeGenerator),
            config: IssuanceConfig::default(),
            in_flight: ClaimGuards::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_code_generator(mut self, codes: Arc<dyn CodeGenerator>) -> Self {
        self.codes = codes;
        self
    }

    pub fn with_config(mut self, config: IssuanceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn gate(&self) -> &G {
        &self.gate
    }

    pub fn delivery(&self) -> &D {
        &self.delivery
    }

    /// Open a pending request and return its verification code.
    ///
    /// Nothing is written when the owner already holds a completed request
    /// of this type.
    pub fn request(
        &self,
        owner: OwnerId,
        email: &EmailAddress,
        document_type: &str,
    ) -> Result<VerificationCode, IssuanceError> {
        let document_type: DocumentType = document_type
            .parse()
            .map_err(|_| IssuanceError::InvalidDocumentType(document_type.to_string()))?;

        if self.store.find_completed(owner, document_type)? {
            info!(%owner, %document_type, "request refused, document already issued");
            return Err(IssuanceError::AlreadyIssued {
                owner,
                document_type,
            });
        }

        let requested_at = self.clock.now();
        let attempts = self.config.max_code_attempts;
        for attempt in 1..=attempts {
            let code = self.codes.generate();
            if self.store.code_exists(&code)? {
                debug!(%code, attempt, "generated code already in use");
                continue;
            }

            let new = NewCvRequest {
                owner_id: owner,
                email: email.clone(),
                document_type,
                verification_code: code.clone(),
                requested_at,
            };
            match self.store.create(&new) {
                Ok(id) => {
                    info!(%owner, %document_type, %code, request_id = %id, "cv request opened");
                    return Ok(code);
                }
                // Another request took the code between the check and the insert.
                Err(StoreError::DuplicateCode(_)) => {
                    debug!(%code, attempt, "code taken concurrently");
                }
                Err(e) => return Err(e.into()),
            }
        }

        error!(%owner, attempts, "could not mint an unused verification code");
        Err(IssuanceError::GeneratorExhausted { attempts })
    }

    /// Verify, deliver and complete the request behind `code`.
    ///
    /// On any failure the record stays pending and the call can be repeated.
    pub async fn claim(&self, code: &str) -> Result<ClaimReceipt, IssuanceError> {
        let code = VerificationCode::parse(code.trim())
            .map_err(|_| IssuanceError::UnknownCode(code.to_string()))?;

        let record = self.pending_record(&code)?;
        let Some(_guard) = self
            .in_flight
            .try_acquire(record.owner_id, record.document_type)
        else {
            debug!(%code, "claim rejected, another claim is running");
            return Err(IssuanceError::ClaimInProgress(code));
        };

        // The store lease spans every workflow sharing the data, and its
        // check runs in the same transaction as the pending re-read.
        let now = self.clock.now();
        let lease_until = Timestamp::new(
            now.as_secs()
                .saturating_add(self.config.claim_lease().as_secs()),
        );
        let record = match self.store.begin_claim(&code, now, lease_until) {
            Ok(record) => record,
            Err(StoreError::NotFound(_)) => {
                return Err(IssuanceError::UnknownCode(code.to_string()))
            }
            Err(StoreError::ClaimHeld(reason)) => {
                debug!(%code, %reason, "claim rejected, another process is delivering");
                return Err(IssuanceError::ClaimInProgress(code));
            }
            Err(StoreError::InvalidState(_)) => return Err(self.refusal(&code)),
            Err(e) => return Err(e.into()),
        };
        let _lease = StoreLease::held(&*self.store, code.clone());

        self.check_gate(&code).await?;
        self.deliver(&code, &record).await?;

        let completed_at = self.clock.now();
        if let Err(e) = self.store.complete(&code, true, completed_at) {
            error!(%code, error = %e, "document delivered but request could not be completed");
            return Err(e.into());
        }

        info!(owner = %record.owner_id, document_type = %record.document_type, %code,
            "cv delivered and request completed");
        Ok(ClaimReceipt {
            code,
            owner_id: record.owner_id,
            email: record.email,
            document_type: record.document_type,
            completed_at,
        })
    }

    /// All requests of an owner, oldest first.
    pub fn history(&self, owner: OwnerId) -> Result<Vec<CvRequest>, IssuanceError> {
        Ok(self.store.requests_for_owner(owner)?)
    }

    fn pending_record(&self, code: &VerificationCode) -> Result<CvRequest, IssuanceError> {
        let record = match self.store.get_by_code(code) {
            Ok(record) => record,
            Err(StoreError::NotFound(_)) => {
                return Err(IssuanceError::UnknownCode(code.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        if !record.is_pending() {
            debug!(%code, "claim refused, code already used");
            return Err(IssuanceError::AlreadyClaimed(code.clone()));
        }
        Ok(record)
    }

    /// Why a lease was refused on a record that is not claimable.
    fn refusal(&self, code: &VerificationCode) -> IssuanceError {
        match self.pending_record(code) {
            Ok(record) => {
                info!(owner = %record.owner_id, document_type = %record.document_type, %code,
                    "claim refused, another code of this type was already delivered");
                IssuanceError::AlreadyIssued {
                    owner: record.owner_id,
                    document_type: record.document_type,
                }
            }
            Err(e) => e,
        }
    }

    async fn check_gate(&self, code: &VerificationCode) -> Result<(), IssuanceError> {
        let limit = self.config.gate_timeout();
        match timeout(limit, self.gate.is_verified(code)).await {
            Ok(Ok(true)) => Ok(()),
            Ok(Ok(false)) => {
                info!(%code, gate = self.gate.name(), "verification not found yet");
                Err(IssuanceError::NotVerified(code.clone()))
            }
            Ok(Err(e)) => {
                warn!(%code, gate = self.gate.name(), error = %e, "verification gate failed");
                Err(IssuanceError::GateUnavailable(e.to_string()))
            }
            Err(_) => {
                warn!(%code, gate = self.gate.name(), ?limit, "verification gate timed out");
                Err(IssuanceError::GateUnavailable(format!(
                    "no answer within {limit:?}"
                )))
            }
        }
    }

    async fn deliver(
        &self,
        code: &VerificationCode,
        record: &CvRequest,
    ) -> Result<(), IssuanceError> {
        let limit = self.config.delivery_timeout();
        let send = self.delivery.deliver(&record.email, record.document_type);
        match timeout(limit, send).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                warn!(%code, service = self.delivery.name(), error = %e, "delivery failed");
                Err(IssuanceError::DeliveryFailed(e.to_string()))
            }
            Err(_) => {
                warn!(%code, service = self.delivery.name(), ?limit, "delivery timed out");
                Err(IssuanceError::DeliveryFailed(format!(
                    "no confirmation within {limit:?}"
                )))
            }
        }
    }
}
