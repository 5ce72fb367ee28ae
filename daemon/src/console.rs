//! Line-oriented local chat session.
//!
//! Each input line is handled as a chat message from one fixed user, and the
//! reply is written back. Useful for trying the assistant without a chat
//! platform.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use cvup_bot::{BotHandler, ChatMessage, Reply};
use cvup_delivery::DeliveryService;
use cvup_store::{QuestionStore, RequestStore, UserStore};
use cvup_types::OwnerId;
use cvup_verification::VerificationGate;

use crate::error::DaemonError;

/// Run until end of input or `/quit`. Returns the number of handled lines.
pub async fn run_console<S, G, D, R, W>(
    handler: &BotHandler<S, G, D>,
    owner: OwnerId,
    username: Option<String>,
    input: R,
    mut output: W,
) -> Result<usize, DaemonError>
where
    S: RequestStore + UserStore + QuestionStore,
    G: VerificationGate,
    D: DeliveryService,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    let mut handled = 0;
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "/quit" || line == "/exit" {
            break;
        }

        let message = ChatMessage {
            owner_id: owner,
            username: username.clone(),
            text: line.to_string(),
        };
        let reply = handler.handle(&message).await;
        output.write_all(render(&reply).as_bytes()).await?;
        output.flush().await?;
        handled += 1;
    }
    Ok(handled)
}

fn render(reply: &Reply) -> String {
    let mut out = reply.text.clone();
    out.push('\n');
    if let Some(link) = &reply.link {
        out.push_str(&format!("[{}] {}\n", link.label, link.url));
    }
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use cvup_bot::BotSettings;
    use cvup_issuance::IssuanceWorkflow;
    use cvup_nullables::{NullDelivery, NullGate, NullStore};

    fn handler() -> BotHandler<NullStore, NullGate, NullDelivery> {
        let workflow =
            IssuanceWorkflow::new(Arc::new(NullStore::new()), NullGate::verified(), NullDelivery::new());
        BotHandler::new(
            Arc::new(workflow),
            BotSettings {
                verification_post_url: "https://social.example/post".into(),
            },
        )
    }

    #[tokio::test]
    async fn session_requests_and_claims() {
        let handler = handler();
        let mut output = Vec::new();
        let input: &[u8] = b"/start\n\n/sendcv a@x.com junior\n";

        let handled = run_console(&handler, OwnerId::new(1), None, input, &mut output)
            .await
            .unwrap();
        assert_eq!(handled, 2);

        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("Welcome to CV_UP!"));
        assert!(text.contains("[Open the verification post] https://social.example/post"));

        let code = handler.workflow().history(OwnerId::new(1)).unwrap()[0]
            .verification_code
            .clone();
        let claim = format!("/verify_{code}\n/quit\n/help\n");
        let mut output = Vec::new();
        let handled = run_console(&handler, OwnerId::new(1), None, claim.as_bytes(), &mut output)
            .await
            .unwrap();
        assert_eq!(handled, 1);
        assert!(String::from_utf8(output)
            .unwrap()
            .starts_with("Verification successful!"));
        assert_eq!(handler.workflow().delivery().sent_count(), 1);
    }
}
