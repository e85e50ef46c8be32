use crate::error::{LlmError, Result};
use crate::types::{ChatMessage, ChatResponse, MessageContent, Role, Usage};
use serde::{Deserialize, Serialize};

pub(crate) const MISTRAL_DEFAULT_BASE_URL: &str = "https://api.mistral.ai";
const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

#[derive(Clone)]
pub struct MistralClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl MistralClient {
    pub fn new(http: reqwest::Client, api_key: &str, base_url: &str) -> Self {
        Self {
            http,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn completions_url(&self) -> String {
        format!("{}{CHAT_COMPLETIONS_PATH}", self.base_url)
    }

    #[tracing::instrument(level = "info", skip_all, fields(model = %model, message_count = messages.len()))]
    pub async fn chat(&self, model: &str, messages: &[ChatMessage]) -> Result<ChatResponse> {
        if messages.is_empty() {
            return Err(LlmError::InvalidInput(
                "chat request needs at least one message".to_string(),
            ));
        }
        let req = MistralChatRequest::new(model, messages);

        let response = self
            .http
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: MistralChatResponse = serde_json::from_str(&body)?;
        let resp: ChatResponse = parsed.try_into()?;
        tracing::debug!(
            prompt_tokens = resp.usage.prompt_tokens,
            completion_tokens = resp.usage.completion_tokens,
            finish_reason = %resp.finish_reason,
            "mistral chat completed"
        );
        Ok(resp)
    }
}

#[derive(Debug, Serialize)]
struct MistralChatRequest<'a> {
    model: &'a str,
    messages: Vec<MistralMessage<'a>>,
}

impl<'a> MistralChatRequest<'a> {
    fn new(model: &'a str, messages: &'a [ChatMessage]) -> Self {
        Self {
            model,
            messages: messages.iter().map(to_mistral_message).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct MistralMessage<'a> {
    role: &'static str,
    content: &'a MessageContent,
}

fn to_mistral_message(m: &ChatMessage) -> MistralMessage<'_> {
    MistralMessage {
        role: m.role.as_str(),
        content: &m.content,
    }
}

#[derive(Debug, Deserialize)]
struct MistralChatResponse {
    choices: Vec<MistralChoice>,
    #[serde(default)]
    usage: Option<MistralUsage>,
}

#[derive(Debug, Deserialize)]
struct MistralChoice {
    message: MistralChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MistralChoiceMessage {
    #[serde(default)]
    content: Option<MistralReplyContent>,
}

/// Replies are normally a string; some models return typed chunks instead.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MistralReplyContent {
    Text(String),
    Chunks(Vec<MistralReplyChunk>),
}

#[derive(Debug, Deserialize)]
struct MistralReplyChunk {
    #[serde(default)]
    text: Option<String>,
}

impl MistralReplyContent {
    fn into_text(self) -> String {
        match self {
            MistralReplyContent::Text(s) => s,
            MistralReplyContent::Chunks(chunks) => {
                chunks.into_iter().filter_map(|c| c.text).collect()
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct MistralUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

impl TryFrom<MistralChatResponse> for ChatResponse {
    type Error = LlmError;

    fn try_from(v: MistralChatResponse) -> Result<Self> {
        let choice = v.choices.into_iter().next().ok_or_else(|| {
            LlmError::ResponseFormat("mistral response missing choices".to_string())
        })?;

        let usage = v.usage.unwrap_or(MistralUsage {
            prompt_tokens: 0,
            completion_tokens: 0,
        });

        Ok(ChatResponse {
            message: ChatMessage {
                role: Role::Assistant,
                content: MessageContent::Text(
                    choice
                        .message
                        .content
                        .map(MistralReplyContent::into_text)
                        .unwrap_or_default(),
                ),
            },
            usage: Usage {
                prompt_tokens: usage.prompt_tokens,
                completion_tokens: usage.completion_tokens,
            },
            finish_reason: choice
                .finish_reason
                .unwrap_or_else(|| "unknown".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ContentPart;
    use serde_json::json;

    #[test]
    fn request_carries_model_and_history_in_order() {
        let messages = vec![
            ChatMessage::user("hi"),
            ChatMessage::assistant("hello there"),
            ChatMessage::user(MessageContent::Parts(vec![
                ContentPart::Text {
                    text: "and this?".to_string(),
                },
                ContentPart::ImageUrl {
                    image_url: "data:image/jpeg;base64,".to_string(),
                },
            ])),
        ];
        let req = MistralChatRequest::new("pixtral-12b-2409", &messages);
        assert_eq!(
            serde_json::to_value(&req).expect("serialize"),
            json!({
                "model": "pixtral-12b-2409",
                "messages": [
                    { "role": "user", "content": "hi" },
                    { "role": "assistant", "content": "hello there" },
                    {
                        "role": "user",
                        "content": [
                            { "type": "text", "text": "and this?" },
                            { "type": "image_url", "image_url": "data:image/jpeg;base64," }
                        ]
                    }
                ]
            })
        );
    }

    #[test]
    fn response_takes_first_choice() {
        let parsed: MistralChatResponse = serde_json::from_value(json!({
            "id": "cmpl-1",
            "choices": [
                { "index": 0, "message": { "role": "assistant", "content": "first" }, "finish_reason": "stop" },
                { "index": 1, "message": { "role": "assistant", "content": "second" }, "finish_reason": "stop" }
            ],
            "usage": { "prompt_tokens": 7, "completion_tokens": 3, "total_tokens": 10 }
        }))
        .expect("parse");

        let resp = ChatResponse::try_from(parsed).expect("convert");
        assert_eq!(resp.message, ChatMessage::assistant("first"));
        assert_eq!(resp.usage.prompt_tokens, 7);
        assert_eq!(resp.usage.completion_tokens, 3);
        assert_eq!(resp.finish_reason, "stop");
    }

    #[test]
    fn chunked_reply_content_is_joined() {
        let parsed: MistralChatResponse = serde_json::from_value(json!({
            "choices": [
                { "message": { "content": [ { "type": "text", "text": "a " }, { "type": "text", "text": "cat" } ] } }
            ]
        }))
        .expect("parse");

        let resp = ChatResponse::try_from(parsed).expect("convert");
        assert_eq!(resp.message.content.text(), "a cat");
        assert_eq!(resp.finish_reason, "unknown");
        assert_eq!(resp.usage, Usage::default());
    }

    #[test]
    fn missing_choices_is_a_format_error() {
        let parsed: MistralChatResponse =
            serde_json::from_value(json!({ "choices": [] })).expect("parse");
        let err = ChatResponse::try_from(parsed).unwrap_err();
        assert!(matches!(err, LlmError::ResponseFormat(_)));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let c = MistralClient::new(reqwest::Client::new(), "k", "http://localhost:8080/");
        assert_eq!(
            c.completions_url(),
            "http://localhost:8080/v1/chat/completions"
        );
    }
}
