//! Command dispatch.

use std::fmt::Write;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use cvup_delivery::DeliveryService;
use cvup_issuance::{ErrorClass, IssuanceError, IssuanceWorkflow};
use cvup_store::{QuestionStore, RequestStore, UserStore};
use cvup_types::{
    Clock, DocumentType, EmailAddress, NewQuestion, OwnerId, SystemClock, User,
};
use cvup_verification::VerificationGate;

use crate::texts;
use crate::{BotError, ChatMessage, Command, Reply};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotSettings {
    /// Post the user must like and comment on before claiming.
    pub verification_post_url: String,
}

/// Handles chat messages for one running assistant.
pub struct BotHandler<S, G, D> {
    workflow: Arc<IssuanceWorkflow<S, G, D>>,
    settings: BotSettings,
    clock: Arc<dyn Clock>,
}

impl<S, G, D> BotHandler<S, G, D>
where
    S: RequestStore + UserStore + QuestionStore,
    G: VerificationGate,
    D: DeliveryService,
{
    pub fn new(workflow: Arc<IssuanceWorkflow<S, G, D>>, settings: BotSettings) -> Self {
        Self {
            workflow,
            settings,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn workflow(&self) -> &Arc<IssuanceWorkflow<S, G, D>> {
        &self.workflow
    }

    fn store(&self) -> &S {
        self.workflow.store()
    }

    /// Answer one message. Never fails: errors become user-facing replies.
    pub async fn handle(&self, message: &ChatMessage) -> Reply {
        let owner = message.owner_id;
        if let Err(e) = self.store().touch_user(owner, self.clock.now()) {
            warn!(%owner, error = %e, "could not record user activity");
        }

        let result = match Command::parse(&message.text) {
            Ok(command) => {
                debug!(%owner, ?command, "handling command");
                self.dispatch(message, command).await
            }
            Err(e) => Err(e),
        };
        result.unwrap_or_else(|e| error_reply(owner, &e))
    }

    async fn dispatch(&self, message: &ChatMessage, command: Command) -> Result<Reply, BotError> {
        let owner = message.owner_id;
        match command {
            Command::Start => {
                self.ensure_user(message)?;
                Ok(Reply::text(texts::WELCOME))
            }
            Command::Help => Ok(Reply::text(texts::HELP)),
            Command::SendCv {
                email,
                document_type,
            } => self.send_cv(message, &email, &document_type),
            Command::Verify { code } => {
                let receipt = self.workflow.claim(&code).await?;
                Ok(Reply::text(texts::delivered(
                    &receipt.email,
                    receipt.document_type,
                )))
            }
            Command::Ask { category, text } => {
                let id = self.store().add_question(&NewQuestion {
                    owner_id: owner,
                    text,
                    category: category.clone(),
                    created_at: self.clock.now(),
                })?;
                debug!(%owner, question = %id, "question recorded");
                Ok(Reply::text(texts::question_recorded(&category)))
            }
            Command::MyQuestions => self.my_questions(owner),
            Command::MyCvs => self.my_cvs(owner),
            Command::Unknown(_) | Command::Text => Ok(Reply::text(texts::UNKNOWN_COMMAND)),
        }
    }

    fn send_cv(
        &self,
        message: &ChatMessage,
        email: &str,
        document_type: &str,
    ) -> Result<Reply, BotError> {
        let email =
            EmailAddress::parse(email).map_err(|_| BotError::InvalidEmail(email.to_string()))?;
        let document_type: DocumentType = document_type.parse().map_err(|_| {
            BotError::Issuance(IssuanceError::InvalidDocumentType(document_type.to_string()))
        })?;

        self.ensure_user(message)?;
        self.store().set_email(message.owner_id, &email)?;

        let code = self
            .workflow
            .request(message.owner_id, &email, document_type.as_str())?;
        Ok(Reply::text(texts::verification_steps(&code, &email)).with_link(
            texts::VERIFY_LINK_LABEL,
            self.settings.verification_post_url.clone(),
        ))
    }

    fn my_questions(&self, owner: OwnerId) -> Result<Reply, BotError> {
        let questions = self.store().questions_for_owner(owner)?;
        if questions.is_empty() {
            return Ok(Reply::text(texts::NO_QUESTIONS));
        }
        let mut text = String::from("Your questions:\n\n");
        for (i, q) in questions.iter().enumerate() {
            let _ = writeln!(text, "{}. Status: {} (#{})", i + 1, q.status, q.category);
            let _ = writeln!(text, "Q: {}", q.text);
            if let Some(answer) = &q.answer {
                let _ = writeln!(text, "A: {answer}");
            }
            text.push('\n');
        }
        Ok(Reply::text(text.trim_end()))
    }

    fn my_cvs(&self, owner: OwnerId) -> Result<Reply, BotError> {
        let requests = self.workflow.history(owner)?;
        if requests.is_empty() {
            return Ok(Reply::text(texts::NO_REQUESTS));
        }
        let mut text = String::from("Your CV requests:\n\n");
        for (i, r) in requests.iter().enumerate() {
            let _ = writeln!(
                text,
                "{}. {} CV to {} - {} (code {})",
                i + 1,
                r.document_type.title(),
                r.email,
                r.status,
                r.verification_code
            );
        }
        Ok(Reply::text(text.trim_end()))
    }

    /// Register the sender, keeping an existing join date.
    fn ensure_user(&self, message: &ChatMessage) -> Result<(), BotError> {
        let user = User::new(message.owner_id, message.username.clone(), self.clock.now());
        self.store().upsert_user(&user)?;
        Ok(())
    }
}

fn error_reply(owner: OwnerId, err: &BotError) -> Reply {
    let text = match err {
        BotError::Usage(hint) => (*hint).to_string(),
        BotError::InvalidEmail(_) => texts::INVALID_EMAIL.to_string(),
        BotError::Issuance(e) => {
            match e.class() {
                ErrorClass::Consistency => error!(%owner, error = %e, "issuance failed"),
                ErrorClass::Dependency => warn!(%owner, error = %e, "issuance dependency failed"),
                _ => debug!(%owner, error = %e, "issuance refused"),
            }
            issuance_text(e)
        }
        BotError::Store(e) => {
            error!(%owner, error = %e, "store failure while handling message");
            texts::INTERNAL_ERROR.to_string()
        }
    };
    Reply::text(text)
}

fn issuance_text(err: &IssuanceError) -> String {
    match err {
        IssuanceError::InvalidDocumentType(_) => texts::INVALID_TYPE.to_string(),
        IssuanceError::AlreadyIssued { .. } => texts::ALREADY_ISSUED.to_string(),
        IssuanceError::UnknownCode(_) | IssuanceError::AlreadyClaimed(_) => {
            texts::INVALID_CODE.to_string()
        }
        IssuanceError::NotVerified(code) => texts::not_verified(code),
        IssuanceError::ClaimInProgress(_) => texts::CLAIM_IN_PROGRESS.to_string(),
        IssuanceError::GateUnavailable(_) => texts::GATE_UNAVAILABLE.to_string(),
        IssuanceError::DeliveryFailed(_) => texts::DELIVERY_FAILED.to_string(),
        IssuanceError::GeneratorExhausted { .. } | IssuanceError::Store(_) => {
            texts::INTERNAL_ERROR.to_string()
        }
    }
}
