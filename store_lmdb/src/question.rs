//! LMDB implementation of QuestionStore.

use cvup_store::{QuestionStore, StoreError};
use cvup_types::{NewQuestion, OwnerId, Question, QuestionId, QuestionStatus, Timestamp};
use heed::RoTxn;

use crate::environment::LmdbStore;
use crate::keys::{allocate_id, owner_index_key, scan_prefix};
use crate::LmdbError;

const NEXT_QUESTION_ID_KEY: &[u8] = b"next_question_id";

impl LmdbStore {
    fn read_question(&self, txn: &RoTxn<'_>, id: QuestionId) -> Result<Question, StoreError> {
        let bytes = self
            .questions_db
            .get(txn, &id.as_u64().to_be_bytes())
            .map_err(LmdbError::from)?
            .ok_or_else(|| StoreError::NotFound(format!("question {id}")))?;
        let question: Question = bincode::deserialize(bytes)
            .map_err(|e| LmdbError::Corruption(format!("undecodable question {id}: {e}")))?;
        Ok(question)
    }

    fn write_question(
        &self,
        wtxn: &mut heed::RwTxn<'_>,
        question: &Question,
    ) -> Result<(), StoreError> {
        let bytes = bincode::serialize(question).map_err(LmdbError::from)?;
        self.questions_db
            .put(wtxn, &question.id.as_u64().to_be_bytes(), &bytes)
            .map_err(LmdbError::from)?;
        Ok(())
    }
}

impl QuestionStore for LmdbStore {
    fn add_question(&self, question: &NewQuestion) -> Result<QuestionId, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let id = QuestionId::new(allocate_id(&self.meta_db, &mut wtxn, NEXT_QUESTION_ID_KEY)?);
        let record = Question::pending(id, question);
        self.write_question(&mut wtxn, &record)?;
        self.owner_questions_db
            .put(
                &mut wtxn,
                &owner_index_key(question.owner_id, id.as_u64()),
                &[],
            )
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(id)
    }

    fn get_question(&self, id: QuestionId) -> Result<Question, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        self.read_question(&rtxn, id)
    }

    fn questions_for_owner(&self, owner: OwnerId) -> Result<Vec<Question>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let entries = scan_prefix(&self.owner_questions_db, &rtxn, &owner.to_be_bytes())?;

        // The question id is the key suffix; the index value is empty.
        let mut ids = Vec::with_capacity(entries.len());
        for (key, _) in entries {
            let suffix: [u8; 8] = key
                .get(8..)
                .and_then(|s| <[u8; 8]>::try_from(s).ok())
                .ok_or_else(|| {
                    LmdbError::Corruption(format!("malformed question index key for {owner}"))
                })?;
            ids.push(QuestionId::new(u64::from_be_bytes(suffix)));
        }

        ids.into_iter()
            .map(|id| self.read_question(&rtxn, id))
            .collect()
    }

    fn answer_question(
        &self,
        id: QuestionId,
        answer: &str,
        at: Timestamp,
    ) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let mut question = self.read_question(&wtxn, id)?;
        if question.status != QuestionStatus::Pending {
            return Err(StoreError::InvalidState(format!(
                "question {id} is {}",
                question.status
            )));
        }
        question.status = QuestionStatus::Answered;
        question.answer = Some(answer.to_string());
        question.answered_at = Some(at);
        self.write_question(&mut wtxn, &question)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn close_question(&self, id: QuestionId) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let mut question = self.read_question(&wtxn, id)?;
        if question.status == QuestionStatus::Closed {
            return Ok(());
        }
        question.status = QuestionStatus::Closed;
        self.write_question(&mut wtxn, &question)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}
