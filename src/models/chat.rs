use chrono::Local;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One message in the conversation panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub text: String,
    pub role: ChatRole,
    /// Local wall-clock time, `HH:MM`
    pub timestamp: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(text, ChatRole::User)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(text, ChatRole::Assistant)
    }

    fn new(text: impl Into<String>, role: ChatRole) -> Self {
        Self {
            text: text.into(),
            role,
            timestamp: Local::now().format("%H:%M").to_string(),
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == ChatRole::User
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_constructors() {
        let turn = ChatTurn::user("recommend a movie");
        assert!(turn.is_user());
        assert_eq!(turn.timestamp.len(), 5);
        assert_eq!(&turn.timestamp[2..3], ":");
        assert!(!ChatTurn::assistant("Try Heat").is_user());
    }
}
