//! Question storage trait.

use cvup_types::{NewQuestion, OwnerId, Question, QuestionId, Timestamp};

use crate::StoreError;

pub trait QuestionStore: Send + Sync {
    fn add_question(&self, question: &NewQuestion) -> Result<QuestionId, StoreError>;

    fn get_question(&self, id: QuestionId) -> Result<Question, StoreError>;

    /// All questions of an owner, oldest first.
    fn questions_for_owner(&self, owner: OwnerId) -> Result<Vec<Question>, StoreError>;

    /// Attach an answer to a pending question.
    ///
    /// Fails with [`StoreError::InvalidState`] unless the question is pending.
    fn answer_question(
        &self,
        id: QuestionId,
        answer: &str,
        at: Timestamp,
    ) -> Result<(), StoreError>;

    /// Close a question without (further) answers. Closing twice is a no-op.
    fn close_question(&self, id: QuestionId) -> Result<(), StoreError>;
}
