//! Abstract storage traits for the CV_UP issuance service.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The workflow and the chat command layer depend only on the traits.

pub mod error;
pub mod meta;
pub mod question;
pub mod request;
pub mod user;

pub use error::StoreError;
pub use meta::MetaStore;
pub use question::QuestionStore;
pub use request::RequestStore;
pub use user::UserStore;
