//! Questions users ask through the assistant.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{OwnerId, Timestamp};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QuestionId(u64);

impl QuestionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionStatus {
    Pending,
    Answered,
    Closed,
}

impl QuestionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Answered => "answered",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for QuestionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewQuestion {
    pub owner_id: OwnerId,
    pub text: String,
    pub category: String,
    pub created_at: Timestamp,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub owner_id: OwnerId,
    pub text: String,
    pub category: String,
    pub status: QuestionStatus,
    pub created_at: Timestamp,
    pub answered_at: Option<Timestamp>,
    pub answer: Option<String>,
}

impl Question {
    pub fn pending(id: QuestionId, new: &NewQuestion) -> Self {
        Self {
            id,
            owner_id: new.owner_id,
            text: new.text.clone(),
            category: new.category.clone(),
            status: QuestionStatus::Pending,
            created_at: new.created_at,
            answered_at: None,
            answer: None,
        }
    }
}
