use serde::{Deserialize, Serialize};

/// Who is speaking in a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// One role-tagged message sent to a generative provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Ordered sequence of turns. Extended only by appending; retries operate on
/// a rebuilt value rather than a shared buffer, so an abandoned attempt can
/// never alias into a later one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new(turns: Vec<Turn>) -> Self {
        Self { turns }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Functional append: returns a new conversation one turn longer.
    #[must_use]
    pub fn with_turn(&self, turn: Turn) -> Self {
        let mut turns = self.turns.clone();
        turns.push(turn);
        Self { turns }
    }

    /// All system-turn text joined with newlines, or `None` when the
    /// conversation carries no system turns.
    pub fn system_text(&self) -> Option<String> {
        let joined = self
            .turns
            .iter()
            .filter(|turn| turn.role == Role::System)
            .map(|turn| turn.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        if joined.is_empty() {
            None
        } else {
            Some(joined)
        }
    }

    /// All user-turn text joined with newlines, in order.
    pub fn user_text(&self) -> String {
        self.turns
            .iter()
            .filter(|turn| turn.role == Role::User)
            .map(|turn| turn.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_turn_leaves_original_untouched() {
        let base = Conversation::new(vec![Turn::system("persona"), Turn::user("task")]);
        let extended = base.with_turn(Turn::user("fix it"));

        assert_eq!(base.len(), 2);
        assert_eq!(extended.len(), 3);
        assert_eq!(extended.turns()[2], Turn::user("fix it"));
    }

    #[test]
    fn splits_system_and_user_text() {
        let conversation = Conversation::new(vec![
            Turn::system("persona"),
            Turn::user("task"),
            Turn::user("correction"),
        ]);

        assert_eq!(conversation.system_text().as_deref(), Some("persona"));
        assert_eq!(conversation.user_text(), "task\ncorrection");
    }

    #[test]
    fn system_text_is_none_without_system_turns() {
        let conversation = Conversation::new(vec![Turn::user("task")]);
        assert_eq!(conversation.system_text(), None);
    }
}
