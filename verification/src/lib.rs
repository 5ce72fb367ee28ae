//! Verification gate.
//!
//! Answers "has the out-of-band action for this code been performed?"
//! (e.g. the user liked and commented the code on a social post). How the
//! check is done is up to the implementation; callers only see a boolean or
//! an error, and must treat the gate as slow and unreliable.

pub mod error;
pub mod http;

use std::future::Future;

use cvup_types::VerificationCode;

pub use error::GateError;
pub use http::HttpVerificationGate;

/// A pluggable verification capability.
///
/// `Ok(false)` means the action has not been seen (yet). Transport or
/// protocol problems are errors, never `Ok(false)`, so callers can tell
/// "not verified" apart from "could not ask".
pub trait VerificationGate: Send + Sync {
    /// Human-readable name used in logs.
    fn name(&self) -> &str;

    fn is_verified(
        &self,
        code: &VerificationCode,
    ) -> impl Future<Output = Result<bool, GateError>> + Send;
}
