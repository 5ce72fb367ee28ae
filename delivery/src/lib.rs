//! Document delivery.
//!
//! A delivery service takes an email address and a document type and
//! attempts to send the matching CV template. Delivery is all-or-nothing:
//! there is no partial-delivery state, and failures are reported so the
//! caller can leave its request retryable.

pub mod error;
pub mod message;
pub mod smtp;
pub mod templates;

use std::future::Future;

use cvup_types::{DocumentType, EmailAddress};

pub use error::DeliveryError;
pub use message::{attachment_filename, compose, OutgoingDocument};
pub use smtp::{SmtpDelivery, SmtpSettings};
pub use templates::TemplateStore;

/// A pluggable delivery channel.
pub trait DeliveryService: Send + Sync {
    /// Human-readable name used in logs.
    fn name(&self) -> &str;

    fn deliver(
        &self,
        email: &EmailAddress,
        document_type: DocumentType,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send;
}
