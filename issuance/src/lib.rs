//! CV-request issuance workflow.
//!
//! Drives a request from creation to completion:
//!
//! 1. **request**: reject types the owner already received, mint a code that
//!    is unique across the store, persist a pending record.
//! 2. **claim**: re-check the external verification gate, deliver the
//!    document, and only then mark the record completed.
//!
//! A failed gate or delivery leaves the record pending so the user can
//! simply claim again. A completed record is never delivered twice.

pub mod config;
pub mod error;
mod guard;
pub mod workflow;

pub use config::IssuanceConfig;
pub use error::{ErrorClass, IssuanceError};
pub use workflow::{ClaimReceipt, IssuanceWorkflow};
