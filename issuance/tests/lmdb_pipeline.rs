//! End-to-end request and claim against the LMDB backend.

use std::sync::Arc;

use cvup_issuance::{IssuanceError, IssuanceWorkflow};
use cvup_nullables::{NullDelivery, NullGate};
use cvup_store::RequestStore;
use cvup_store_lmdb::{LmdbEnvironment, LmdbStore};
use cvup_types::{DocumentType, EmailAddress, OwnerId, RequestStatus};

const MAP_SIZE: usize = 16 * 1024 * 1024;

fn workflow(env: &LmdbEnvironment) -> IssuanceWorkflow<LmdbStore, NullGate, NullDelivery> {
    IssuanceWorkflow::new(Arc::new(env.store()), NullGate::verified(), NullDelivery::new())
}

#[tokio::test]
async fn full_lifecycle_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let email = EmailAddress::parse("a@x.com").unwrap();
    let owner = OwnerId::new(42);

    let code = {
        let env = LmdbEnvironment::open(dir.path(), MAP_SIZE).unwrap();
        let workflow = workflow(&env);
        let code = workflow.request(owner, &email, "junior").unwrap();
        workflow.claim(code.as_str()).await.unwrap();
        assert_eq!(workflow.delivery().sent(), vec![(email.clone(), DocumentType::Junior)]);
        drop(workflow);
        env.close().unwrap();
        code
    };

    let env = LmdbEnvironment::open(dir.path(), MAP_SIZE).unwrap();
    let workflow = workflow(&env);

    let record = workflow.store().get_by_code(&code).unwrap();
    assert_eq!(record.status, RequestStatus::Completed);
    assert!(record.verified);

    assert!(matches!(
        workflow.claim(code.as_str()).await,
        Err(IssuanceError::AlreadyClaimed(_))
    ));
    assert!(matches!(
        workflow.request(owner, &email, "junior"),
        Err(IssuanceError::AlreadyIssued { .. })
    ));
    assert_eq!(workflow.delivery().attempt_count(), 0);
    assert!(env.check_integrity().unwrap().is_healthy());
}

#[tokio::test]
async fn failed_delivery_leaves_lmdb_record_pending() {
    let dir = tempfile::tempdir().unwrap();
    let env = LmdbEnvironment::open(dir.path(), MAP_SIZE).unwrap();
    let workflow = workflow(&env);
    let email = EmailAddress::parse("b@x.com").unwrap();

    let code = workflow.request(OwnerId::new(1), &email, "senior").unwrap();
    workflow.delivery().fail_next(1);
    assert!(workflow.claim(code.as_str()).await.is_err());
    assert!(workflow.store().get_by_code(&code).unwrap().is_pending());

    workflow.claim(code.as_str()).await.unwrap();
    assert!(workflow
        .store()
        .find_completed(OwnerId::new(1), DocumentType::Senior)
        .unwrap());
}

#[tokio::test(start_paused = true)]
async fn workflows_on_one_environment_deliver_once() {
    let dir = tempfile::tempdir().unwrap();
    let env = LmdbEnvironment::open(dir.path(), MAP_SIZE).unwrap();
    let left = workflow(&env);
    let right = workflow(&env);
    left.gate().set_delay(std::time::Duration::from_millis(100));
    right.gate().set_delay(std::time::Duration::from_millis(100));
    let email = EmailAddress::parse("c@x.com").unwrap();

    let code = left.request(OwnerId::new(9), &email, "junior").unwrap();
    let (a, b) = tokio::join!(left.claim(code.as_str()), right.claim(code.as_str()));

    assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
    assert_eq!(
        left.delivery().sent_count() + right.delivery().sent_count(),
        1
    );
    let report = env.check_integrity().unwrap();
    assert!(report.is_healthy());
    assert!(report.databases.contains(&("claims", 0)));
}
