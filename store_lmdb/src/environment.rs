//! LMDB environment setup and lifecycle.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};

use crate::integrity::{check_data_dir, check_integrity, IntegrityReport};
use crate::migration::Migrator;
use crate::LmdbError;

/// Number of named databases the environment holds.
const MAX_DBS: u32 = 8;

pub(crate) const REQUESTS_DB: &str = "cv_requests";
pub(crate) const OWNER_REQUESTS_DB: &str = "owner_requests";
pub(crate) const COMPLETED_TYPES_DB: &str = "completed_types";
pub(crate) const USERS_DB: &str = "users";
pub(crate) const QUESTIONS_DB: &str = "questions";
pub(crate) const OWNER_QUESTIONS_DB: &str = "owner_questions";
pub(crate) const META_DB: &str = "meta";
pub(crate) const CLAIMS_DB: &str = "claims";

/// Owns the LMDB environment. Opened once at startup and closed on shutdown.
pub struct LmdbEnvironment {
    path: PathBuf,
    store: LmdbStore,
}

/// Handle implementing every storage trait over a shared environment.
///
/// Cheap to clone; all clones address the same databases.
#[derive(Clone)]
pub struct LmdbStore {
    pub(crate) env: Arc<Env>,
    /// verification code -> bincode `CvRequest`
    pub(crate) requests_db: Database<Bytes, Bytes>,
    /// owner ++ request id -> verification code
    pub(crate) owner_requests_db: Database<Bytes, Bytes>,
    /// owner ++ document type tag -> verification code of the completed request
    pub(crate) completed_types_db: Database<Bytes, Bytes>,
    /// owner ++ document type tag -> bincode lease of the claim in flight
    pub(crate) claims_db: Database<Bytes, Bytes>,
    /// owner -> bincode `User`
    pub(crate) users_db: Database<Bytes, Bytes>,
    /// question id -> bincode `Question`
    pub(crate) questions_db: Database<Bytes, Bytes>,
    /// owner ++ question id -> empty
    pub(crate) owner_questions_db: Database<Bytes, Bytes>,
    /// counters and schema version
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path and bring its
    /// schema up to date.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        check_data_dir(path).map_err(LmdbError::Corruption)?;
        std::fs::create_dir_all(path)?;

        // SAFETY: each data directory is opened by a single environment per
        // process and is never truncated or modified outside LMDB.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(MAX_DBS)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let requests_db = env.create_database::<Bytes, Bytes>(&mut wtxn, Some(REQUESTS_DB))?;
        let owner_requests_db =
            env.create_database::<Bytes, Bytes>(&mut wtxn, Some(OWNER_REQUESTS_DB))?;
        let completed_types_db =
            env.create_database::<Bytes, Bytes>(&mut wtxn, Some(COMPLETED_TYPES_DB))?;
        let claims_db = env.create_database::<Bytes, Bytes>(&mut wtxn, Some(CLAIMS_DB))?;
        let users_db = env.create_database::<Bytes, Bytes>(&mut wtxn, Some(USERS_DB))?;
        let questions_db = env.create_database::<Bytes, Bytes>(&mut wtxn, Some(QUESTIONS_DB))?;
        let owner_questions_db =
            env.create_database::<Bytes, Bytes>(&mut wtxn, Some(OWNER_QUESTIONS_DB))?;
        let meta_db = env.create_database::<Bytes, Bytes>(&mut wtxn, Some(META_DB))?;
        wtxn.commit()?;

        let store = LmdbStore {
            env: Arc::new(env),
            requests_db,
            owner_requests_db,
            completed_types_db,
            claims_db,
            users_db,
            questions_db,
            owner_questions_db,
            meta_db,
        };

        Migrator::run(&store)?;
        tracing::info!(path = %path.display(), "opened LMDB environment");

        Ok(Self {
            path: path.to_path_buf(),
            store,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A store handle sharing this environment.
    pub fn store(&self) -> LmdbStore {
        self.store.clone()
    }

    /// Count entries and cross-check the secondary indexes.
    pub fn check_integrity(&self) -> Result<IntegrityReport, LmdbError> {
        check_integrity(&self.store)
    }

    /// Flush to disk and release this handle.
    ///
    /// Store handles obtained from [`LmdbEnvironment::store`] keep the
    /// environment mapped until they are dropped as well.
    pub fn close(self) -> Result<(), LmdbError> {
        self.store.env.force_sync()?;
        tracing::info!(path = %self.path.display(), "closed LMDB environment");
        Ok(())
    }
}
