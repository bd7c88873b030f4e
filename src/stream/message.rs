use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Shown in place of an answer whenever a turn fails.
pub const APOLOGY: &str = "عذراً، حدث خطأ أثناء معالجة سؤالك. يرجى المحاولة مرة أخرى.";

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry of the conversation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_error: bool,
}

impl ChatMessage {
    fn new(role: Role, content: String, is_error: bool) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content,
            created_at: Utc::now(),
            is_error,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content.into(), false)
    }

    /// Empty assistant reply, filled in as the stream arrives.
    pub fn assistant_placeholder() -> Self {
        Self::new(Role::Assistant, String::new(), false)
    }

    /// The fixed apology appended when a turn fails.
    pub fn failure() -> Self {
        Self::new(Role::Assistant, APOLOGY.to_string(), true)
    }
}
