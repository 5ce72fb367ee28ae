//! User storage trait.

use cvup_types::{EmailAddress, OwnerId, Timestamp, User};

use crate::StoreError;

pub trait UserStore: Send + Sync {
    /// Insert the user, or refresh username and activity of an existing one.
    ///
    /// An existing user's `joined_at` and stored email are kept.
    fn upsert_user(&self, user: &User) -> Result<(), StoreError>;

    fn get_user(&self, owner: OwnerId) -> Result<Option<User>, StoreError>;

    /// Record activity. Unknown users are ignored.
    fn touch_user(&self, owner: OwnerId, at: Timestamp) -> Result<(), StoreError>;

    /// Fails with [`StoreError::NotFound`] for unknown users.
    fn set_email(&self, owner: OwnerId, email: &EmailAddress) -> Result<(), StoreError>;
}
