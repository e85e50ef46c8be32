//! BYO-key Mistral chat completion client.
//!
//! Pure HTTP client: one `POST /v1/chat/completions` per call, no retry.

mod client;
mod error;
mod mistral;
mod types;

pub use client::{CompletionService, LlmClient};
pub use error::{LlmError, Result};
pub use types::{ChatMessage, ChatResponse, ContentPart, MessageContent, Role, Usage};
