//! Slash commands available inside the chat prompt.

use mc_chat::Conversation;
use mc_llm::Role;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Reply(String),
    Quit,
}

/// Returns `None` when `input` is an ordinary chat line.
pub fn handle_command(conversation: &mut Conversation, input: &str) -> Option<CommandOutcome> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let outcome = match trimmed {
        "/quit" | "/exit" => CommandOutcome::Quit,
        "/new" => {
            conversation.reset();
            CommandOutcome::Reply("History cleared.".to_string())
        }
        "/history" => CommandOutcome::Reply(render_history(conversation)),
        "/usage" => {
            let usage = conversation.usage();
            CommandOutcome::Reply(format!(
                "prompt_tokens={} completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            ))
        }
        "/status" => CommandOutcome::Reply(format!(
            "mode={}\nmodel={}\nturns={}\nsystem_prompt={}",
            conversation.mode(),
            conversation.model(),
            conversation.history().turns(),
            conversation.system_prompt().unwrap_or("-"),
        )),
        _ => CommandOutcome::Reply(
            "Unknown command. Supported: /history /status /usage /new /quit".to_string(),
        ),
    };
    Some(outcome)
}

fn render_history(conversation: &Conversation) -> String {
    let entries = conversation.history().entries();
    if entries.is_empty() {
        return "(no turns yet)".to_string();
    }
    entries
        .iter()
        .map(|entry| {
            let who = match entry.role() {
                Role::User => "you",
                Role::Assistant => "assistant",
                Role::System => "system",
            };
            let images = entry.message.content.image_urls().len();
            if images > 0 {
                format!("{who}> {} [+{images} image]", entry.text)
            } else {
                format!("{who}> {}", entry.text)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Splits `describe this @photos/cat.jpg` into text and image path. The
/// reference must end in a file extension, so `meet me @home` stays text.
pub fn split_image_reference(line: &str) -> (&str, Option<&str>) {
    let trimmed = line.trim();
    if let Some(idx) = trimmed.rfind(" @") {
        let path = &trimmed[idx + 2..];
        let has_extension = Path::new(path)
            .extension()
            .is_some_and(|ext| !ext.is_empty());
        if has_extension && !path.contains(char::is_whitespace) {
            return (trimmed[..idx].trim_end(), Some(path));
        }
    }
    (trimmed, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mc_chat::ConversationOptions;
    use mc_llm::{ChatMessage, ChatResponse, CompletionService, Usage};
    use std::sync::Arc;

    struct Echo;

    #[async_trait]
    impl CompletionService for Echo {
        async fn complete(
            &self,
            _model: &str,
            messages: &[ChatMessage],
        ) -> mc_llm::Result<ChatResponse> {
            let last = messages.last().map(|m| m.content.text()).unwrap_or_default();
            Ok(ChatResponse {
                message: ChatMessage::assistant(format!("echo: {last}")),
                usage: Usage {
                    prompt_tokens: 3,
                    completion_tokens: 2,
                },
                finish_reason: "stop".to_string(),
            })
        }
    }

    fn conversation() -> Conversation {
        Conversation::new(Arc::new(Echo), ConversationOptions::new("1")).unwrap()
    }

    #[test]
    fn plain_text_is_not_a_command() {
        let mut conv = conversation();
        assert_eq!(handle_command(&mut conv, "hello"), None);
    }

    #[tokio::test]
    async fn history_and_new_commands() {
        let mut conv = conversation();
        conv.ask("hi", None).await.unwrap();

        let Some(CommandOutcome::Reply(text)) = handle_command(&mut conv, "/history") else {
            panic!("expected reply");
        };
        assert_eq!(text, "you> hi\nassistant> echo: hi");

        let Some(CommandOutcome::Reply(text)) = handle_command(&mut conv, "/usage") else {
            panic!("expected reply");
        };
        assert_eq!(text, "prompt_tokens=3 completion_tokens=2");

        handle_command(&mut conv, "/new");
        assert!(conv.history().is_empty());
    }

    #[test]
    fn status_and_quit() {
        let mut conv = conversation();
        let Some(CommandOutcome::Reply(text)) = handle_command(&mut conv, " /status ") else {
            panic!("expected reply");
        };
        assert!(text.contains("mode=text"));
        assert!(text.contains("model=mistral-large-latest"));
        assert_eq!(handle_command(&mut conv, "/quit"), Some(CommandOutcome::Quit));
        assert!(matches!(
            handle_command(&mut conv, "/bogus"),
            Some(CommandOutcome::Reply(s)) if s.starts_with("Unknown command")
        ));
    }

    #[test]
    fn image_reference_is_split_from_text() {
        assert_eq!(
            split_image_reference("what is this @img/cat.jpg"),
            ("what is this", Some("img/cat.jpg"))
        );
        assert_eq!(split_image_reference("mail me @ noon"), ("mail me @ noon", None));
        assert_eq!(split_image_reference("no image"), ("no image", None));
        assert_eq!(split_image_reference("meet me @home"), ("meet me @home", None));
        assert_eq!(split_image_reference("see @notes."), ("see @notes.", None));
        assert_eq!(
            split_image_reference("compare @../shots/a.png"),
            ("compare", Some("../shots/a.png"))
        );
    }
}
