//! Conversation core for mistral-chat.
//!
//! A [`Conversation`] binds one [`Mode`] to a [`RequestStrategy`] and a model,
//! then replays its whole [`History`] on every turn.

mod conversation;
mod error;
mod history;
mod image;
mod strategy;
#[cfg(test)]
mod testing;

pub use conversation::{
    Conversation, ConversationOptions, IMAGE_MODELS, Mode, TEXT_MODELS, TurnReport,
};
pub use error::{ChatError, Result};
pub use history::{History, HistoryEntry};
pub use image::{ImageEncoding, encode_image};
pub use strategy::{RequestStrategy, TurnInput, TurnOutcome};
