//! Conversation facade: mode selection, model binding and history bookkeeping.

use crate::error::{ChatError, Result};
use crate::history::{History, HistoryEntry};
use crate::image::ImageEncoding;
use crate::strategy::{RequestStrategy, TurnInput};
use mc_llm::{ChatMessage, CompletionService, LlmClient, Usage};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

pub const TEXT_MODELS: &[&str] = &["mistral-large-latest"];
pub const IMAGE_MODELS: &[&str] = &["pixtral-12b-2409"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Text,
    Image,
}

impl Mode {
    pub const ALL: [Mode; 2] = [Mode::Text, Mode::Image];

    pub fn selector(&self) -> &'static str {
        match self {
            Mode::Text => "1",
            Mode::Image => "2",
        }
    }

    pub fn strategy(&self) -> RequestStrategy {
        match self {
            Mode::Text => RequestStrategy::Text,
            Mode::Image => RequestStrategy::Image,
        }
    }

    /// Models this mode may bind, default first.
    pub fn allowed_models(&self) -> &'static [&'static str] {
        match self {
            Mode::Text => TEXT_MODELS,
            Mode::Image => IMAGE_MODELS,
        }
    }

    pub fn default_model(&self) -> &'static str {
        self.allowed_models()[0]
    }
}

impl FromStr for Mode {
    type Err = ChatError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1" | "text" => Ok(Mode::Text),
            "2" | "image" => Ok(Mode::Image),
            _ => Err(ChatError::InvalidMode(s.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.strategy().name())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConversationOptions {
    /// `1`/`text` or `2`/`image`.
    pub mode: String,
    /// Must be one of the mode's allowed models when set.
    pub model: Option<String>,
    /// Prepended to every request, never recorded in history.
    pub system_prompt: Option<String>,
}

impl ConversationOptions {
    pub fn new(mode: impl Into<String>) -> Self {
        Self {
            mode: mode.into(),
            ..Self::default()
        }
    }
}

/// Everything observable about one completed turn.
#[derive(Debug, Clone)]
pub struct TurnReport {
    pub reply: ChatMessage,
    pub usage: Usage,
    pub image: Option<ImageEncoding>,
}

pub struct Conversation {
    service: Arc<dyn CompletionService>,
    mode: Mode,
    strategy: RequestStrategy,
    model: String,
    system_prompt: Option<String>,
    history: History,
    usage_totals: Usage,
}

impl Conversation {
    #[tracing::instrument(level = "debug", skip_all, fields(mode = %options.mode))]
    pub fn new(
        service: Arc<dyn CompletionService>,
        options: ConversationOptions,
    ) -> Result<Self> {
        let mode: Mode = options.mode.parse()?;
        let model = resolve_model(mode, options.model.as_deref())?;
        let system_prompt = options
            .system_prompt
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        tracing::info!(mode = %mode, model = %model, "conversation started");
        Ok(Self {
            service,
            mode,
            strategy: mode.strategy(),
            model,
            system_prompt,
            history: History::new(),
            usage_totals: Usage::default(),
        })
    }

    /// Builds a conversation backed by the Mistral HTTP client.
    pub fn from_api_key(api_key: &str, options: ConversationOptions) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(ChatError::InvalidArgument(
                "api key must not be empty".to_string(),
            ));
        }
        Self::new(Arc::new(LlmClient::new(api_key)), options)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn strategy(&self) -> RequestStrategy {
        self.strategy
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn usage(&self) -> Usage {
        self.usage_totals
    }

    pub fn reset(&mut self) {
        self.history.clear();
        self.usage_totals = Usage::default();
    }

    pub async fn ask(&mut self, text: &str, image_path: Option<&Path>) -> Result<ChatMessage> {
        Ok(self.ask_detailed(text, image_path).await?.reply)
    }

    /// Runs one turn. History is only updated when the service replied.
    #[tracing::instrument(
        level = "info",
        skip_all,
        fields(mode = %self.mode, model = %self.model, turn = self.history.turns() + 1)
    )]
    pub async fn ask_detailed(
        &mut self,
        text: &str,
        image_path: Option<&Path>,
    ) -> Result<TurnReport> {
        let mut prior = Vec::with_capacity(self.history.len() + 1);
        if let Some(system) = self.system_prompt.as_deref() {
            prior.push(ChatMessage::system(system));
        }
        prior.extend(self.history.messages());

        let input = TurnInput { text, image_path };
        let outcome = self
            .strategy
            .execute(self.service.as_ref(), &self.model, &prior, input)
            .await?;

        let reply = outcome.response.message;
        self.usage_totals.add(&outcome.response.usage);
        self.history.record_turn(
            HistoryEntry {
                text: text.to_string(),
                message: outcome.user_message,
            },
            HistoryEntry {
                text: reply.content.text(),
                message: reply.clone(),
            },
        );
        tracing::debug!(
            history_len = self.history.len(),
            finish_reason = %outcome.response.finish_reason,
            "turn recorded"
        );

        Ok(TurnReport {
            reply,
            usage: outcome.response.usage,
            image: outcome.image,
        })
    }
}

impl fmt::Debug for Conversation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Conversation")
            .field("mode", &self.mode)
            .field("model", &self.model)
            .field("system_prompt", &self.system_prompt)
            .field("history_len", &self.history.len())
            .field("usage_totals", &self.usage_totals)
            .finish_non_exhaustive()
    }
}

fn resolve_model(mode: Mode, requested: Option<&str>) -> Result<String> {
    let Some(requested) = requested.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(mode.default_model().to_string());
    };
    mode.allowed_models()
        .iter()
        .find(|m| m.eq_ignore_ascii_case(requested))
        .map(|m| m.to_string())
        .ok_or_else(|| {
            ChatError::InvalidArgument(format!(
                "model {requested:?} is not available in {mode} mode; allowed: {}",
                mode.allowed_models().join(",")
            ))
        })
}
