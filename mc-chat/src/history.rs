use mc_llm::{ChatMessage, Role};

/// One recorded turn half: the display text and the message as sent or received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub text: String,
    pub message: ChatMessage,
}

impl HistoryEntry {
    pub fn role(&self) -> Role {
        self.message.role
    }
}

/// Append-only record of the current session.
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one completed turn. Both halves are appended together so the
    /// history always alternates user, assistant.
    pub fn record_turn(&mut self, user: HistoryEntry, assistant: HistoryEntry) {
        debug_assert_eq!(user.role(), Role::User);
        debug_assert_eq!(assistant.role(), Role::Assistant);
        self.entries.push(user);
        self.entries.push(assistant);
    }

    /// Messages to replay as prior context, oldest first.
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.entries.iter().map(|e| e.message.clone()).collect()
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn turns(&self) -> usize {
        self.entries.len() / 2
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(user: &str, reply: &str) -> (HistoryEntry, HistoryEntry) {
        (
            HistoryEntry {
                text: user.to_string(),
                message: ChatMessage::user(user),
            },
            HistoryEntry {
                text: reply.to_string(),
                message: ChatMessage::assistant(reply),
            },
        )
    }

    #[test]
    fn messages_drop_display_text_and_keep_order() {
        let mut history = History::new();
        let (u, a) = turn("one", "1");
        history.record_turn(u, a);
        let (u, a) = turn("two", "2");
        history.record_turn(u, a);

        assert_eq!(history.len(), 4);
        assert_eq!(history.turns(), 2);
        assert_eq!(
            history.messages(),
            vec![
                ChatMessage::user("one"),
                ChatMessage::assistant("1"),
                ChatMessage::user("two"),
                ChatMessage::assistant("2"),
            ]
        );
    }

    #[test]
    fn clear_empties_history() {
        let mut history = History::new();
        let (u, a) = turn("hi", "hello");
        history.record_turn(u, a);
        history.clear();
        assert!(history.is_empty());
        assert!(history.messages().is_empty());
    }
}
