use cvup_types::OwnerId;
use serde::{Deserialize, Serialize};

/// One inbound message from a chat user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub owner_id: OwnerId,
    pub username: Option<String>,
    pub text: String,
}

impl ChatMessage {
    pub fn new(owner_id: OwnerId, text: impl Into<String>) -> Self {
        Self {
            owner_id,
            username: None,
            text: text.into(),
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }
}

/// A URL button shown under a reply.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkButton {
    pub label: String,
    pub url: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    pub text: String,
    pub link: Option<LinkButton>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            link: None,
        }
    }

    pub fn with_link(mut self, label: impl Into<String>, url: impl Into<String>) -> Self {
        self.link = Some(LinkButton {
            label: label.into(),
            url: url.into(),
        });
        self
    }
}
