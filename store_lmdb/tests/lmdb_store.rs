//! LMDB backend tests: request lifecycle, secondary indexes, users,
//! questions, and persistence across close/reopen.

use cvup_store::{MetaStore, QuestionStore, RequestStore, StoreError, UserStore};
use cvup_store_lmdb::migration::CURRENT_SCHEMA_VERSION;
use cvup_store_lmdb::LmdbEnvironment;
use cvup_types::{
    DocumentType, EmailAddress, NewCvRequest, NewQuestion, OwnerId, QuestionStatus,
    RequestStatus, Timestamp, User, VerificationCode,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const MAP_SIZE: usize = 16 * 1024 * 1024;

fn temp_env() -> (tempfile::TempDir, LmdbEnvironment) {
    let dir = tempfile::tempdir().expect("temp dir");
    let env = LmdbEnvironment::open(dir.path(), MAP_SIZE).expect("open env");
    (dir, env)
}

fn code(raw: &str) -> VerificationCode {
    VerificationCode::parse(raw).expect("valid code")
}

fn new_request(owner: u64, document_type: DocumentType, raw_code: &str) -> NewCvRequest {
    NewCvRequest {
        owner_id: OwnerId::new(owner),
        email: EmailAddress::parse("a@x.com").unwrap(),
        document_type,
        verification_code: code(raw_code),
        requested_at: Timestamp::new(1_000),
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[test]
fn create_then_get_by_code() {
    let (_dir, env) = temp_env();
    let store = env.store();

    let id = store
        .create(&new_request(42, DocumentType::Junior, "AAAA1111"))
        .unwrap();
    let record = store.get_by_code(&code("AAAA1111")).unwrap();

    assert_eq!(record.id, id);
    assert_eq!(record.owner_id, OwnerId::new(42));
    assert_eq!(record.status, RequestStatus::Pending);
    assert_eq!(record.completed_at, None);
    assert!(!record.verified);
    assert!(store.code_exists(&code("AAAA1111")).unwrap());
    assert_eq!(store.request_count().unwrap(), 1);
}

#[test]
fn ids_are_monotonic() {
    let (_dir, env) = temp_env();
    let store = env.store();
    let first = store
        .create(&new_request(1, DocumentType::Junior, "AAAA0001"))
        .unwrap();
    let second = store
        .create(&new_request(2, DocumentType::Junior, "AAAA0002"))
        .unwrap();
    assert!(second > first);
}

#[test]
fn duplicate_code_is_rejected() {
    let (_dir, env) = temp_env();
    let store = env.store();
    store
        .create(&new_request(1, DocumentType::Junior, "DUPE0001"))
        .unwrap();

    let err = store
        .create(&new_request(2, DocumentType::Senior, "DUPE0001"))
        .unwrap_err();
    assert!(matches!(err, StoreError::DuplicateCode(_)));
    assert_eq!(store.request_count().unwrap(), 1);
    assert!(store.requests_for_owner(OwnerId::new(2)).unwrap().is_empty());
}

#[test]
fn unknown_code_is_not_found() {
    let (_dir, env) = temp_env();
    let err = env.store().get_by_code(&code("UNKNOWN1")).unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[test]
fn complete_transitions_once() {
    let (_dir, env) = temp_env();
    let store = env.store();
    store
        .create(&new_request(42, DocumentType::Junior, "CMPL0001"))
        .unwrap();
    assert!(!store.find_completed(OwnerId::new(42), DocumentType::Junior).unwrap());

    store
        .complete(&code("CMPL0001"), true, Timestamp::new(2_000))
        .unwrap();

    let record = store.get_by_code(&code("CMPL0001")).unwrap();
    assert_eq!(record.status, RequestStatus::Completed);
    assert!(record.verified);
    assert_eq!(record.completed_at, Some(Timestamp::new(2_000)));
    assert!(store.find_completed(OwnerId::new(42), DocumentType::Junior).unwrap());
    assert!(!store.find_completed(OwnerId::new(42), DocumentType::Senior).unwrap());

    let err = store
        .complete(&code("CMPL0001"), true, Timestamp::new(3_000))
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidState(_)));
    let record = store.get_by_code(&code("CMPL0001")).unwrap();
    assert_eq!(record.completed_at, Some(Timestamp::new(2_000)));
}

#[test]
fn complete_missing_code_is_invalid_state() {
    let (_dir, env) = temp_env();
    let err = env
        .store()
        .complete(&code("MISSING1"), true, Timestamp::new(1))
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidState(_)));
}

#[test]
fn complete_without_verification_is_refused() {
    let (_dir, env) = temp_env();
    let store = env.store();
    store
        .create(&new_request(7, DocumentType::Senior, "NOVR0001"))
        .unwrap();
    let err = store
        .complete(&code("NOVR0001"), false, Timestamp::new(5))
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidState(_)));
    assert!(store.get_by_code(&code("NOVR0001")).unwrap().is_pending());
}

#[test]
fn second_completion_of_same_type_is_refused() {
    let (_dir, env) = temp_env();
    let store = env.store();
    store
        .create(&new_request(42, DocumentType::Junior, "FIRST001"))
        .unwrap();
    store
        .create(&new_request(42, DocumentType::Junior, "SECOND01"))
        .unwrap();

    store
        .complete(&code("FIRST001"), true, Timestamp::new(10))
        .unwrap();
    let err = store
        .complete(&code("SECOND01"), true, Timestamp::new(11))
        .unwrap_err();

    assert!(matches!(err, StoreError::InvalidState(_)));
    assert!(store.get_by_code(&code("SECOND01")).unwrap().is_pending());
}

// ---------------------------------------------------------------------------
// Claim leases
// ---------------------------------------------------------------------------

#[test]
fn claim_lease_is_shared_by_every_handle() {
    let (_dir, env) = temp_env();
    let (a, b) = (env.store(), env.store());
    a.create(&new_request(42, DocumentType::Junior, "LEASE001"))
        .unwrap();
    a.create(&new_request(42, DocumentType::Junior, "LEASE002"))
        .unwrap();

    let record = a
        .begin_claim(&code("LEASE001"), Timestamp::new(100), Timestamp::new(200))
        .unwrap();
    assert_eq!(record.verification_code, code("LEASE001"));

    for raw in ["LEASE001", "LEASE002"] {
        let err = b
            .begin_claim(&code(raw), Timestamp::new(150), Timestamp::new(250))
            .unwrap_err();
        assert!(matches!(err, StoreError::ClaimHeld(_)), "{raw}: {err}");
    }

    // Only the holder can release.
    b.end_claim(&code("LEASE002")).unwrap();
    assert!(b
        .begin_claim(&code("LEASE002"), Timestamp::new(150), Timestamp::new(250))
        .is_err());

    a.end_claim(&code("LEASE001")).unwrap();
    b.begin_claim(&code("LEASE002"), Timestamp::new(150), Timestamp::new(250))
        .unwrap();
}

#[test]
fn expired_claim_lease_is_taken_over() {
    let (_dir, env) = temp_env();
    let store = env.store();
    store
        .create(&new_request(7, DocumentType::Senior, "STALE001"))
        .unwrap();
    store
        .create(&new_request(7, DocumentType::Senior, "STALE002"))
        .unwrap();

    store
        .begin_claim(&code("STALE001"), Timestamp::new(10), Timestamp::new(20))
        .unwrap();
    store
        .begin_claim(&code("STALE002"), Timestamp::new(20), Timestamp::new(30))
        .unwrap();

    // The stale holder no longer owns the slot, so its release is a no-op.
    store.end_claim(&code("STALE001")).unwrap();
    assert!(matches!(
        store.begin_claim(&code("STALE001"), Timestamp::new(25), Timestamp::new(35)),
        Err(StoreError::ClaimHeld(_))
    ));
}

#[test]
fn begin_claim_requires_a_claimable_record() {
    let (_dir, env) = temp_env();
    let store = env.store();
    assert!(matches!(
        store.begin_claim(&code("MISSING1"), Timestamp::new(1), Timestamp::new(2)),
        Err(StoreError::NotFound(_))
    ));

    store
        .create(&new_request(42, DocumentType::Junior, "DONE0001"))
        .unwrap();
    store
        .create(&new_request(42, DocumentType::Junior, "DONE0002"))
        .unwrap();
    store
        .begin_claim(&code("DONE0001"), Timestamp::new(1), Timestamp::new(100))
        .unwrap();
    store
        .complete(&code("DONE0001"), true, Timestamp::new(2))
        .unwrap();

    for raw in ["DONE0001", "DONE0002"] {
        let err = store
            .begin_claim(&code(raw), Timestamp::new(3), Timestamp::new(100))
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidState(_)), "{raw}: {err}");
    }

    // Completion released the lease along with the record.
    let report = env.check_integrity().unwrap();
    assert!(report.is_healthy(), "{:?}", report.errors);
    assert!(report.databases.contains(&("claims", 0)));
}

#[test]
fn requests_for_owner_lists_oldest_first() {
    let (_dir, env) = temp_env();
    let store = env.store();
    store
        .create(&new_request(5, DocumentType::Senior, "OWNR0001"))
        .unwrap();
    store
        .create(&new_request(6, DocumentType::Junior, "OTHR0001"))
        .unwrap();
    store
        .create(&new_request(5, DocumentType::Junior, "OWNR0002"))
        .unwrap();

    let codes: Vec<String> = store
        .requests_for_owner(OwnerId::new(5))
        .unwrap()
        .into_iter()
        .map(|r| r.verification_code.to_string())
        .collect();
    assert_eq!(codes, vec!["OWNR0001", "OWNR0002"]);
}

#[test]
fn owner_with_max_id_is_scanned() {
    let (_dir, env) = temp_env();
    let store = env.store();
    store
        .create(&new_request(u64::MAX, DocumentType::Junior, "MAXOWN01"))
        .unwrap();
    assert_eq!(store.requests_for_owner(OwnerId::new(u64::MAX)).unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// Users and questions
// ---------------------------------------------------------------------------

#[test]
fn upsert_keeps_join_date_and_email() {
    let (_dir, env) = temp_env();
    let store = env.store();
    let owner = OwnerId::new(9);

    store
        .upsert_user(&User::new(owner, Some("alice".into()), Timestamp::new(100)))
        .unwrap();
    store
        .set_email(owner, &EmailAddress::parse("alice@x.com").unwrap())
        .unwrap();
    store
        .upsert_user(&User::new(owner, Some("alice2".into()), Timestamp::new(500)))
        .unwrap();

    let user = store.get_user(owner).unwrap().unwrap();
    assert_eq!(user.joined_at, Timestamp::new(100));
    assert_eq!(user.username.as_deref(), Some("alice2"));
    assert_eq!(user.email.unwrap().as_str(), "alice@x.com");
    assert_eq!(user.last_active, Some(Timestamp::new(500)));
}

#[test]
fn touch_and_set_email_on_unknown_user() {
    let (_dir, env) = temp_env();
    let store = env.store();
    store.touch_user(OwnerId::new(1), Timestamp::new(5)).unwrap();
    assert!(store.get_user(OwnerId::new(1)).unwrap().is_none());

    let err = store
        .set_email(OwnerId::new(1), &EmailAddress::parse("a@x.com").unwrap())
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[test]
fn question_lifecycle() {
    let (_dir, env) = temp_env();
    let store = env.store();
    let owner = OwnerId::new(3);
    let id = store
        .add_question(&NewQuestion {
            owner_id: owner,
            text: "How long should a CV be?".into(),
            category: "general".into(),
            created_at: Timestamp::new(10),
        })
        .unwrap();

    store
        .answer_question(id, "One page.", Timestamp::new(20))
        .unwrap();
    let question = store.get_question(id).unwrap();
    assert_eq!(question.status, QuestionStatus::Answered);
    assert_eq!(question.answer.as_deref(), Some("One page."));

    let err = store
        .answer_question(id, "Two pages.", Timestamp::new(30))
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidState(_)));

    store.close_question(id).unwrap();
    store.close_question(id).unwrap();
    assert_eq!(store.get_question(id).unwrap().status, QuestionStatus::Closed);

    let listed = store.questions_for_owner(owner).unwrap();
    assert_eq!(listed.len(), 1);
    assert!(store.questions_for_owner(OwnerId::new(4)).unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[test]
fn records_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let env = LmdbEnvironment::open(dir.path(), MAP_SIZE).unwrap();
        let store = env.store();
        store
            .create(&new_request(42, DocumentType::Junior, "PERS0001"))
            .unwrap();
        store
            .complete(&code("PERS0001"), true, Timestamp::new(99))
            .unwrap();
        drop(store);
        env.close().unwrap();
    }

    let env = LmdbEnvironment::open(dir.path(), MAP_SIZE).unwrap();
    let store = env.store();
    assert!(store.find_completed(OwnerId::new(42), DocumentType::Junior).unwrap());
    assert_eq!(store.get_schema_version().unwrap(), CURRENT_SCHEMA_VERSION);

    let report = env.check_integrity().unwrap();
    assert!(report.is_healthy(), "{:?}", report.errors);
    assert!(report.total_entries >= 3);
}

#[test]
fn first_schema_is_upgraded_on_open() {
    let dir = tempfile::tempdir().unwrap();
    {
        let env = LmdbEnvironment::open(dir.path(), MAP_SIZE).unwrap();
        let store = env.store();
        store
            .create(&new_request(3, DocumentType::Junior, "OLDSCHM1"))
            .unwrap();
        store.set_schema_version(1).unwrap();
        drop(store);
        env.close().unwrap();
    }

    let env = LmdbEnvironment::open(dir.path(), MAP_SIZE).unwrap();
    let store = env.store();
    assert_eq!(store.get_schema_version().unwrap(), CURRENT_SCHEMA_VERSION);
    store
        .begin_claim(&code("OLDSCHM1"), Timestamp::new(1), Timestamp::new(2))
        .unwrap();
}

#[test]
fn newer_schema_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    {
        let env = LmdbEnvironment::open(dir.path(), MAP_SIZE).unwrap();
        env.store()
            .set_schema_version(CURRENT_SCHEMA_VERSION + 1)
            .unwrap();
        env.close().unwrap();
    }
    assert!(LmdbEnvironment::open(dir.path(), MAP_SIZE).is_err());
}
