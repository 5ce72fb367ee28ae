//! Command parsing.

use crate::BotError;

const SENDCV_USAGE: &str = "Please use the format: /sendcv email_address cv_type(junior/senior)";
const VERIFY_USAGE: &str = "Please use the verification link from your CV request, e.g. /verify_ABCD1234";
const ASK_USAGE: &str = "Please type your question after the command, e.g. /ask How long should my CV be?";

const DEFAULT_CATEGORY: &str = "general";
const VERIFY_PREFIX: &str = "verify_";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    SendCv { email: String, document_type: String },
    Verify { code: String },
    Ask { category: String, text: String },
    MyQuestions,
    MyCvs,
    /// A slash command we do not know.
    Unknown(String),
    /// Plain text that is not a command.
    Text,
}

impl Command {
    pub fn parse(input: &str) -> Result<Self, BotError> {
        let input = input.trim();
        let Some(body) = input.strip_prefix('/') else {
            return Ok(Self::Text);
        };

        let (head, rest) = match body.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (body, ""),
        };
        // Group chats address commands as `/name@botname`.
        let name = head.split('@').next().unwrap_or(head);

        // The code part keeps its case; only the command name is folded.
        let split = VERIFY_PREFIX.len();
        if let (Some(head), Some(code)) = (name.get(..split), name.get(split..)) {
            if head.eq_ignore_ascii_case(VERIFY_PREFIX) {
                return Ok(Self::Verify {
                    code: code.to_string(),
                });
            }
        }

        match name.to_ascii_lowercase().as_str() {
            "start" => Ok(Self::Start),
            "help" => Ok(Self::Help),
            "sendcv" => parse_sendcv(rest),
            "verify" => match rest.split_whitespace().next() {
                Some(code) => Ok(Self::Verify {
                    code: code.to_string(),
                }),
                None => Err(BotError::Usage(VERIFY_USAGE)),
            },
            "ask" => parse_ask(rest),
            "myquestions" => Ok(Self::MyQuestions),
            "mycvs" => Ok(Self::MyCvs),
            _ => Ok(Self::Unknown(name.to_string())),
        }
    }
}

/// `/sendcv <email> [...] <type>`: first argument is the address, last is the type.
fn parse_sendcv(args: &str) -> Result<Command, BotError> {
    let args: Vec<&str> = args.split_whitespace().collect();
    match (args.first(), args.last()) {
        (Some(email), Some(document_type)) if args.len() >= 2 => Ok(Command::SendCv {
            email: email.to_string(),
            document_type: document_type.to_string(),
        }),
        _ => Err(BotError::Usage(SENDCV_USAGE)),
    }
}

/// `/ask [#category] <text>`
fn parse_ask(args: &str) -> Result<Command, BotError> {
    let (category, text) = match args.strip_prefix('#') {
        Some(tagged) => match tagged.split_once(char::is_whitespace) {
            Some((category, text)) => (category.to_ascii_lowercase(), text.trim()),
            None => (tagged.to_ascii_lowercase(), ""),
        },
        None => (DEFAULT_CATEGORY.to_string(), args),
    };
    if text.is_empty() || category.is_empty() {
        return Err(BotError::Usage(ASK_USAGE));
    }
    Ok(Command::Ask {
        category,
        text: text.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_not_a_command() {
        assert_eq!(Command::parse("hello there").unwrap(), Command::Text);
    }

    #[test]
    fn bot_suffix_is_ignored() {
        assert_eq!(Command::parse("/start@CvUpBot").unwrap(), Command::Start);
        assert_eq!(Command::parse("/HELP").unwrap(), Command::Help);
    }

    #[test]
    fn sendcv_takes_first_and_last_argument() {
        assert_eq!(
            Command::parse("/sendcv a@x.com please junior").unwrap(),
            Command::SendCv {
                email: "a@x.com".into(),
                document_type: "junior".into()
            }
        );
        assert!(matches!(
            Command::parse("/sendcv a@x.com"),
            Err(BotError::Usage(_))
        ));
    }

    #[test]
    fn verify_accepts_both_forms() {
        let expected = Command::Verify {
            code: "AB12CD34".into(),
        };
        assert_eq!(Command::parse("/verify_AB12CD34").unwrap(), expected);
        assert_eq!(Command::parse("/verify AB12CD34").unwrap(), expected);
        assert!(matches!(Command::parse("/verify"), Err(BotError::Usage(_))));
    }

    #[test]
    fn verify_link_name_ignores_case() {
        for raw in ["/Verify_AB12CD34", "/VERIFY_AB12CD34", "/verify_AB12CD34@cvup_bot"] {
            assert_eq!(
                Command::parse(raw).unwrap(),
                Command::Verify {
                    code: "AB12CD34".to_string()
                },
                "{raw}"
            );
        }
    }

    #[test]
    fn ask_with_and_without_category() {
        assert_eq!(
            Command::parse("/ask Is one page enough?").unwrap(),
            Command::Ask {
                category: "general".into(),
                text: "Is one page enough?".into()
            }
        );
        assert_eq!(
            Command::parse("/ask #Interview What do I wear?").unwrap(),
            Command::Ask {
                category: "interview".into(),
                text: "What do I wear?".into()
            }
        );
        assert!(matches!(Command::parse("/ask"), Err(BotError::Usage(_))));
        assert!(matches!(Command::parse("/ask #jobs"), Err(BotError::Usage(_))));
    }

    #[test]
    fn unknown_commands_are_kept() {
        assert_eq!(
            Command::parse("/jobs now").unwrap(),
            Command::Unknown("jobs".into())
        );
    }
}
