//! Composition of the outgoing template email.

use cvup_types::{DocumentType, EmailAddress};
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::Message;

use crate::DeliveryError;

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Name the attachment carries in the recipient's mailbox.
pub fn attachment_filename(document_type: DocumentType) -> String {
    format!("cv_template_{}.docx", document_type.as_str())
}

/// Transport-independent content of a template email.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutgoingDocument {
    pub subject: String,
    pub body: String,
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl OutgoingDocument {
    pub fn new(document_type: DocumentType, bytes: Vec<u8>) -> Self {
        Self {
            subject: format!("Your {} CV Template from CV_UP", document_type.title()),
            body: format!(
                "Thank you for using CV_UP!\n\n\
                 Please find attached your {} CV template.\n\n\
                 Best regards,\n\
                 CV_UP Team\n",
                document_type.as_str()
            ),
            filename: attachment_filename(document_type),
            bytes,
        }
    }
}

/// Build the MIME message: plain-text body plus the template attachment.
pub fn compose(
    from: &Mailbox,
    to: &EmailAddress,
    document: OutgoingDocument,
) -> Result<Message, DeliveryError> {
    let to: Mailbox = to
        .as_str()
        .parse()
        .map_err(|e| DeliveryError::Message(format!("recipient '{to}': {e}")))?;
    let content_type =
        ContentType::parse(DOCX_MIME).map_err(|e| DeliveryError::Message(e.to_string()))?;
    let attachment = Attachment::new(document.filename).body(document.bytes, content_type);

    Message::builder()
        .from(from.clone())
        .to(to)
        .subject(document.subject)
        .multipart(
            MultiPart::mixed()
                .singlepart(SinglePart::plain(document.body))
                .singlepart(attachment),
        )
        .map_err(|e| DeliveryError::Message(e.to_string()))
}
