//! SMTP delivery over a STARTTLS relay.

use std::time::Duration;

use cvup_types::{DocumentType, EmailAddress};
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};

use crate::message::{compose, OutgoingDocument};
use crate::{DeliveryError, DeliveryService, TemplateStore};

/// Connection settings for the outgoing mail relay.
#[derive(Clone, Debug)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Sender mailbox, e.g. `CV_UP <bot@example.com>`.
    pub from: String,
    pub timeout: Duration,
}

/// Sends CV templates through an authenticated SMTP relay.
pub struct SmtpDelivery {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    templates: TemplateStore,
}

impl SmtpDelivery {
    pub fn new(settings: &SmtpSettings, templates: TemplateStore) -> Result<Self, DeliveryError> {
        let from: Mailbox = settings
            .from
            .parse()
            .map_err(|e| DeliveryError::Config(format!("sender '{}': {e}", settings.from)))?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
            .map_err(|e| DeliveryError::Config(format!("relay '{}': {e}", settings.host)))?
            .port(settings.port)
            .credentials(Credentials::new(
                settings.username.clone(),
                settings.password.clone(),
            ))
            .timeout(Some(settings.timeout))
            .build();
        Ok(Self {
            transport,
            from,
            templates,
        })
    }
}

impl DeliveryService for SmtpDelivery {
    fn name(&self) -> &str {
        "smtp"
    }

    async fn deliver(
        &self,
        email: &EmailAddress,
        document_type: DocumentType,
    ) -> Result<(), DeliveryError> {
        let bytes = self.templates.load(document_type).await?;
        let message = compose(&self.from, email, OutgoingDocument::new(document_type, bytes))?;

        self.transport.send(message).await.map_err(|e| {
            if e.is_permanent() {
                DeliveryError::Rejected(e.to_string())
            } else {
                DeliveryError::Transport(e.to_string())
            }
        })?;

        tracing::info!(%email, %document_type, "template email sent");
        Ok(())
    }
}
