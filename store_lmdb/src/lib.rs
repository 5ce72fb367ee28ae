//! LMDB storage backend for the CV_UP issuance service.
//!
//! Implements the storage traits from `cvup-store` using the `heed` LMDB
//! bindings. Each logical table maps to a named database inside a single
//! environment; every check-then-write runs inside one LMDB write
//! transaction, which LMDB serialises across the whole environment.

pub mod environment;
pub mod error;
pub mod integrity;
mod keys;
pub mod meta;
pub mod migration;
pub mod question;
pub mod request;
pub mod user;

pub use environment::{LmdbEnvironment, LmdbStore};
pub use error::LmdbError;
pub use integrity::IntegrityReport;
