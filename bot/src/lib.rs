//! Chat command layer.
//!
//! Turns inbound chat messages into replies. The transport (receiving and
//! sending messages over a chat network) is not part of this crate: callers
//! hand in a [`ChatMessage`] and render the returned [`Reply`] however their
//! platform wants.

pub mod command;
pub mod error;
pub mod handler;
pub mod reply;
mod texts;

pub use command::Command;
pub use error::BotError;
pub use handler::{BotHandler, BotSettings};
pub use reply::{ChatMessage, LinkButton, Reply};
