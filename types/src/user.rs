//! Chat-platform users.

use serde::{Deserialize, Serialize};

use crate::{EmailAddress, OwnerId, Timestamp};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub owner_id: OwnerId,
    pub username: Option<String>,
    pub joined_at: Timestamp,
    /// Most recent address the user asked documents to be sent to.
    pub email: Option<EmailAddress>,
    pub last_active: Option<Timestamp>,
}

impl User {
    pub fn new(owner_id: OwnerId, username: Option<String>, joined_at: Timestamp) -> Self {
        Self {
            owner_id,
            username,
            joined_at,
            email: None,
            last_active: Some(joined_at),
        }
    }
}
