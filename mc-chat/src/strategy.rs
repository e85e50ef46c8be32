//! Request strategies: how one turn is shaped into a completion call.

use crate::error::{ChatError, Result};
use crate::image::{ImageEncoding, encode_image};
use mc_llm::{ChatMessage, ChatResponse, CompletionService, ContentPart, MessageContent};
use std::path::Path;

/// The new input of one turn.
#[derive(Debug, Clone, Copy)]
pub struct TurnInput<'a> {
    pub text: &'a str,
    pub image_path: Option<&'a Path>,
}

impl<'a> TurnInput<'a> {
    pub fn text(text: &'a str) -> Self {
        Self {
            text,
            image_path: None,
        }
    }

    pub fn with_image(text: &'a str, image_path: &'a Path) -> Self {
        Self {
            text,
            image_path: Some(image_path),
        }
    }
}

/// What a strategy sent and got back for one turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// The new user message as sent, without the prior history.
    pub user_message: ChatMessage,
    pub response: ChatResponse,
    /// Set by the image strategy only.
    pub image: Option<ImageEncoding>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStrategy {
    Text,
    Image,
}

impl RequestStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            RequestStrategy::Text => "text",
            RequestStrategy::Image => "image",
        }
    }

    /// Sends `prior` followed by the new user message in a single completion call.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(strategy = self.name(), model = %model, prior = prior.len())
    )]
    pub async fn execute(
        &self,
        service: &dyn CompletionService,
        model: &str,
        prior: &[ChatMessage],
        input: TurnInput<'_>,
    ) -> Result<TurnOutcome> {
        let (user_message, image) = match self {
            RequestStrategy::Text => {
                if let Some(path) = input.image_path {
                    return Err(ChatError::InvalidArgument(format!(
                        "text mode does not accept an image (got {})",
                        path.display()
                    )));
                }
                (ChatMessage::user(input.text), None)
            }
            RequestStrategy::Image => {
                let Some(path) = input.image_path else {
                    return Err(ChatError::InvalidArgument(
                        "image mode requires an image path".to_string(),
                    ));
                };
                let image = encode_image(path).await;
                let message = ChatMessage::user(MessageContent::Parts(vec![
                    ContentPart::Text {
                        text: input.text.to_string(),
                    },
                    ContentPart::ImageUrl {
                        image_url: image.data_uri(),
                    },
                ]));
                (message, Some(image))
            }
        };

        let mut messages = Vec::with_capacity(prior.len() + 1);
        messages.extend(prior.iter().cloned());
        messages.push(user_message.clone());

        let response = service.complete(model, &messages).await?;
        Ok(TurnOutcome {
            user_message,
            response,
            image,
        })
    }
}
