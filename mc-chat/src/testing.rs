//! Recording fake for the completion service.

use async_trait::async_trait;
use mc_llm::{ChatMessage, ChatResponse, CompletionService, LlmError, Usage};
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

pub(crate) struct RecordingService {
    reply: Result<String, String>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl RecordingService {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: &str) -> Self {
        Self {
            reply: Err(error.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionService for RecordingService {
    async fn complete(
        &self,
        model: &str,
        messages: &[ChatMessage],
    ) -> mc_llm::Result<ChatResponse> {
        self.calls.lock().unwrap().push(RecordedCall {
            model: model.to_string(),
            messages: messages.to_vec(),
        });
        match &self.reply {
            Ok(text) => Ok(ChatResponse {
                message: ChatMessage::assistant(text.as_str()),
                usage: Usage {
                    prompt_tokens: 10,
                    completion_tokens: 5,
                },
                finish_reason: "stop".to_string(),
            }),
            Err(e) => Err(LlmError::Http(e.clone())),
        }
    }
}
