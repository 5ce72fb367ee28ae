//! LMDB implementation of UserStore.

use cvup_store::{StoreError, UserStore};
use cvup_types::{EmailAddress, OwnerId, Timestamp, User};
use heed::RoTxn;

use crate::environment::LmdbStore;
use crate::LmdbError;

impl LmdbStore {
    fn read_user(&self, txn: &RoTxn<'_>, owner: OwnerId) -> Result<Option<User>, LmdbError> {
        match self.users_db.get(txn, &owner.to_be_bytes())? {
            Some(bytes) => {
                let user: User = bincode::deserialize(bytes).map_err(|e| {
                    LmdbError::Corruption(format!("undecodable user {owner}: {e}"))
                })?;
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }
}

impl UserStore for LmdbStore {
    fn upsert_user(&self, user: &User) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let merged = match self.read_user(&wtxn, user.owner_id)? {
            Some(existing) => User {
                owner_id: existing.owner_id,
                username: user.username.clone().or(existing.username),
                joined_at: existing.joined_at,
                email: user.email.clone().or(existing.email),
                last_active: user.last_active.or(existing.last_active),
            },
            None => user.clone(),
        };
        let bytes = bincode::serialize(&merged).map_err(LmdbError::from)?;
        self.users_db
            .put(&mut wtxn, &user.owner_id.to_be_bytes(), &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_user(&self, owner: OwnerId) -> Result<Option<User>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.read_user(&rtxn, owner)?)
    }

    fn touch_user(&self, owner: OwnerId, at: Timestamp) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let Some(mut user) = self.read_user(&wtxn, owner)? else {
            return Ok(());
        };
        user.last_active = Some(at);
        let bytes = bincode::serialize(&user).map_err(LmdbError::from)?;
        self.users_db
            .put(&mut wtxn, &owner.to_be_bytes(), &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn set_email(&self, owner: OwnerId, email: &EmailAddress) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let mut user = self
            .read_user(&wtxn, owner)?
            .ok_or_else(|| StoreError::NotFound(format!("user {owner}")))?;
        user.email = Some(email.clone());
        let bytes = bincode::serialize(&user).map_err(LmdbError::from)?;
        self.users_db
            .put(&mut wtxn, &owner.to_be_bytes(), &bytes)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}
