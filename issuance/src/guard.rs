//! In-flight claim guards.
//!
//! At most one claim per `(owner, document type)` may be between "status is
//! pending" and "store completed" at a time; otherwise two concurrent claims
//! could both deliver. Guards are keyed by owner and type rather than by
//! code so that two pending codes of the same type cannot both complete.
//!
//! [`ClaimGuards`] only covers claims running through one workflow. The
//! store-level lease behind [`StoreLease`] covers every workflow and process
//! sharing the same data.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use cvup_store::RequestStore;
use cvup_types::{DocumentType, OwnerId, VerificationCode};

type ClaimKey = (OwnerId, DocumentType);

#[derive(Default)]
pub(crate) struct ClaimGuards {
    active: Mutex<HashSet<ClaimKey>>,
}

/// Releases its key on drop, including when the claim future is cancelled.
pub(crate) struct ClaimGuard<'a> {
    guards: &'a ClaimGuards,
    key: ClaimKey,
}

impl ClaimGuards {
    /// `None` when another claim holds the key.
    pub(crate) fn try_acquire(
        &self,
        owner: OwnerId,
        document_type: DocumentType,
    ) -> Option<ClaimGuard<'_>> {
        let key = (owner, document_type);
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if active.insert(key) {
            Some(ClaimGuard { guards: self, key })
        } else {
            None
        }
    }
}

impl Drop for ClaimGuard<'_> {
    fn drop(&mut self) {
        self.guards
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

/// A lease taken with [`RequestStore::begin_claim`], released on drop.
///
/// Completing the request clears the lease in the store as well, so the
/// release after a successful claim finds nothing to do.
pub(crate) struct StoreLease<'a, S: RequestStore> {
    store: &'a S,
    code: VerificationCode,
}

impl<'a, S: RequestStore> StoreLease<'a, S> {
    /// Wrap a lease the caller already holds for `code`.
    pub(crate) fn held(store: &'a S, code: VerificationCode) -> Self {
        Self { store, code }
    }
}

impl<S: RequestStore> Drop for StoreLease<'_, S> {
    fn drop(&mut self) {
        if let Err(e) = self.store.end_claim(&self.code) {
            tracing::warn!(code = %self.code, error = %e,
                "could not release claim lease, it stays held until it expires");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_until_release() {
        let guards = ClaimGuards::default();
        let owner = OwnerId::new(1);
        let first = guards.try_acquire(owner, DocumentType::Junior);
        assert!(first.is_some());
        assert!(guards.try_acquire(owner, DocumentType::Junior).is_none());
        assert!(guards.try_acquire(owner, DocumentType::Senior).is_some());
        drop(first);
        assert!(guards.try_acquire(owner, DocumentType::Junior).is_some());
    }
}
