//! Fundamental types for the CV_UP issuance service.
//!
//! This crate defines the vocabulary shared across every other crate in the
//! workspace: owner ids, document types, verification codes, email
//! addresses, timestamps, and the persisted record shapes.

pub mod code;
pub mod document;
pub mod email;
pub mod error;
pub mod owner;
pub mod question;
pub mod request;
pub mod time;
pub mod user;

pub use code::{CodeGenerator, RandomCodeGenerator, VerificationCode};
pub use document::DocumentType;
pub use email::EmailAddress;
pub use error::TypeError;
pub use owner::OwnerId;
pub use question::{NewQuestion, Question, QuestionId, QuestionStatus};
pub use request::{CvRequest, NewCvRequest, RequestId, RequestStatus};
pub use time::{Clock, SystemClock, Timestamp};
pub use user::User;
