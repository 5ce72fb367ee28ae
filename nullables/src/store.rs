//! Nullable store: thread-safe in-memory storage for testing.

use cvup_store::{QuestionStore, RequestStore, StoreError, UserStore};
use cvup_types::{
    CvRequest, DocumentType, EmailAddress, NewCvRequest, NewQuestion, OwnerId, Question,
    QuestionId, QuestionStatus, RequestId, RequestStatus, Timestamp, User, VerificationCode,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct Requests {
    next_id: u64,
    by_code: HashMap<VerificationCode, CvRequest>,
    by_owner: BTreeMap<(OwnerId, RequestId), VerificationCode>,
    completed: HashMap<(OwnerId, DocumentType), VerificationCode>,
    claims: HashMap<(OwnerId, DocumentType), (VerificationCode, Timestamp)>,
}

impl Requests {
    fn pending(&self, code: &VerificationCode) -> Result<&CvRequest, StoreError> {
        let record = self
            .by_code
            .get(code)
            .ok_or_else(|| StoreError::NotFound(code.to_string()))?;
        if !record.is_pending() {
            return Err(StoreError::InvalidState(format!("{code}: not pending")));
        }
        if self
            .completed
            .contains_key(&(record.owner_id, record.document_type))
        {
            return Err(StoreError::InvalidState(format!(
                "{code}: owner {} already completed a {} request",
                record.owner_id, record.document_type
            )));
        }
        Ok(record)
    }

    fn release(&mut self, slot: (OwnerId, DocumentType), code: &VerificationCode) {
        if matches!(self.claims.get(&slot), Some((holder, _)) if holder == code) {
            self.claims.remove(&slot);
        }
    }
}

#[derive(Default)]
struct Questions {
    next_id: u64,
    by_id: BTreeMap<QuestionId, Question>,
}

/// An in-memory request, user and question store.
///
/// One mutex per table, so every check-then-write is atomic like an LMDB
/// write transaction. Thread-safe for use with tokio's multi-threaded
/// runtime.
pub struct NullStore {
    requests: Mutex<Requests>,
    users: Mutex<HashMap<OwnerId, User>>,
    questions: Mutex<Questions>,
    unavailable: AtomicBool,
}

impl NullStore {
    pub fn new() -> Self {
        Self {
            requests: Mutex::new(Requests::default()),
            users: Mutex::new(HashMap::new()),
            questions: Mutex::new(Questions::default()),
            unavailable: AtomicBool::new(false),
        }
    }

    /// While set, every operation fails with a backend error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Backend("null store marked unavailable".into()))
        } else {
            Ok(())
        }
    }

    fn requests(&self) -> Result<MutexGuard<'_, Requests>, StoreError> {
        self.check_available()?;
        Ok(self.requests.lock().unwrap())
    }

    fn users(&self) -> Result<MutexGuard<'_, HashMap<OwnerId, User>>, StoreError> {
        self.check_available()?;
        Ok(self.users.lock().unwrap())
    }

    fn questions(&self) -> Result<MutexGuard<'_, Questions>, StoreError> {
        self.check_available()?;
        Ok(self.questions.lock().unwrap())
    }
}

impl Default for NullStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestStore for NullStore {
    fn find_completed(
        &self,
        owner: OwnerId,
        document_type: DocumentType,
    ) -> Result<bool, StoreError> {
        Ok(self.requests()?.completed.contains_key(&(owner, document_type)))
    }

    fn code_exists(&self, code: &VerificationCode) -> Result<bool, StoreError> {
        Ok(self.requests()?.by_code.contains_key(code))
    }

    fn create(&self, request: &NewCvRequest) -> Result<RequestId, StoreError> {
        let mut requests = self.requests()?;
        if requests.by_code.contains_key(&request.verification_code) {
            return Err(StoreError::DuplicateCode(request.verification_code.to_string()));
        }
        requests.next_id += 1;
        let id = RequestId::new(requests.next_id);
        let record = CvRequest::pending(id, request);
        requests
            .by_owner
            .insert((request.owner_id, id), request.verification_code.clone());
        requests
            .by_code
            .insert(request.verification_code.clone(), record);
        Ok(id)
    }

    fn get_by_code(&self, code: &VerificationCode) -> Result<CvRequest, StoreError> {
        self.requests()?
            .by_code
            .get(code)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(code.to_string()))
    }

    fn begin_claim(
        &self,
        code: &VerificationCode,
        now: Timestamp,
        lease_until: Timestamp,
    ) -> Result<CvRequest, StoreError> {
        let mut requests = self.requests()?;
        let record = requests.pending(code)?.clone();
        let slot = (record.owner_id, record.document_type);
        if let Some((holder, expires_at)) = requests.claims.get(&slot) {
            if *expires_at > now {
                return Err(StoreError::ClaimHeld(format!(
                    "{code}: {holder} holds the lease until {expires_at}"
                )));
            }
        }
        requests.claims.insert(slot, (code.clone(), lease_until));
        Ok(record)
    }

    fn end_claim(&self, code: &VerificationCode) -> Result<(), StoreError> {
        let mut requests = self.requests()?;
        let slot = match requests.by_code.get(code) {
            Some(record) => (record.owner_id, record.document_type),
            None => return Ok(()),
        };
        requests.release(slot, code);
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
                "{code}: completion requires verification"
            )));
        }
        let mut requests = self.requests()?;
        let (owner, document_type) = match requests.by_code.get(code) {
            Some(record) if record.is_pending() => (record.owner_id, record.document_type),
            Some(_) => return Err(StoreError::InvalidState(format!("{code}: not pending"))),
            None => return Err(StoreError::InvalidState(format!("{code}: no such request"))),
        };
        if requests.completed.contains_key(&(owner, document_type)) {
            return Err(StoreError::InvalidState(format!(
                "{code}: owner {owner} already completed a {document_type} request"
            )));
        }
        if let Some(record) = requests.by_code.get_mut(code) {
            record.status = RequestStatus::Completed;
            record.verified = true;
            record.completed_at = Some(completed_at);
        }
        requests
            .completed
            .insert((owner, document_type), code.clone());
        requests.release((owner, document_type), code);
        Ok(())
    }

    fn requests_for_owner(&self, owner: OwnerId) -> Result<Vec<CvRequest>, StoreError> {
        let requests = self.requests()?;
        Ok(requests
            .by_owner
            .range((owner, RequestId::new(0))..=(owner, RequestId::new(u64::MAX)))
            .filter_map(|(_, code)| requests.by_code.get(code).cloned())
            .collect())
    }

    fn request_count(&self) -> Result<u64, StoreError> {
        Ok(self.requests()?.by_code.len() as u64)
    }
}

impl UserStore for NullStore {
    fn upsert_user(&self, user: &User) -> Result<(), StoreError> {
        let mut users = self.users()?;
        match users.get_mut(&user.owner_id) {
            Some(existing) => {
                existing.username = user.username.clone();
                existing.last_active = user.last_active;
                if user.email.is_some() {
                    existing.email = user.email.clone();
                }
            }
            None => {
                users.insert(user.owner_id, user.clone());
            }
        }
        Ok(())
    }

    fn get_user(&self, owner: OwnerId) -> Result<Option<User>, StoreError> {
        Ok(self.users()?.get(&owner).cloned())
    }

    fn touch_user(&self, owner: OwnerId, at: Timestamp) -> Result<(), StoreError> {
        if let Some(user) = self.users()?.get_mut(&owner) {
            user.last_active = Some(at);
        }
        Ok(())
    }

    fn set_email(&self, owner: OwnerId, email: &EmailAddress) -> Result<(), StoreError> {
        let mut users = self.users()?;
        let user = users
            .get_mut(&owner)
            .ok_or_else(|| StoreError::NotFound(format!("user {owner}")))?;
        user.email = Some(email.clone());
        Ok(())
    }
}

impl QuestionStore for NullStore {
    fn add_question(&self, question: &NewQuestion) -> Result<QuestionId, StoreError> {
        let mut questions = self.questions()?;
        questions.next_id += 1;
        let id = QuestionId::new(questions.next_id);
        questions.by_id.insert(id, Question::pending(id, question));
        Ok(id)
    }

    fn get_question(&self, id: QuestionId) -> Result<Question, StoreError> {
        self.questions()?
            .by_id
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("question {id}")))
    }

    fn questions_for_owner(&self, owner: OwnerId) -> Result<Vec<Question>, StoreError> {
        Ok(self
            .questions()?
            .by_id
            .values()
            .filter(|q| q.owner_id == owner)
            .cloned()
            .collect())
    }

    fn answer_question(
        &self,
        id: QuestionId,
        answer: &str,
        at: Timestamp,
    ) -> Result<(), StoreError> {
        let mut questions = self.questions()?;
        let question = questions
            .by_id
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("question {id}")))?;
        if question.status != QuestionStatus::Pending {
            return Err(StoreError::InvalidState(format!(
                "question {id} is {}",
                question.status
            )));
        }
        question.status = QuestionStatus::Answered;
        question.answer = Some(answer.to_string());
        question.answered_at = Some(at);
        Ok(())
    }

    fn close_question(&self, id: QuestionId) -> Result<(), StoreError> {
        let mut questions = self.questions()?;
        let question = questions
            .by_id
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("question {id}")))?;
        question.status = QuestionStatus::Closed;
        Ok(())
    }
}
