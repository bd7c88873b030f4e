//! # Application State
//!
//! Core business state for Dalil. Domain logic only, no TUI types.
//! Presentation state lives in the `tui` module.
//!
//! ```text
//! App
//! ├── transport: Arc<dyn ChatTransport>  // where questions go
//! ├── conversation: Conversation         // id-indexed message list
//! ├── status_message: String             // status bar text
//! ├── busy: bool                         // a turn is in flight
//! ├── turn: u64                          // counter tagging each spawned session
//! └── live_reply: Option<String>         // id of the reply being streamed
//! ```
//!
//! State changes only happen through `update(state, action)` in action.rs.

use std::sync::Arc;

use crate::core::conversation::Conversation;
use crate::stream::{ChatMessage, ChatTransport};

pub struct App {
    pub transport: Arc<dyn ChatTransport>,
    pub conversation: Conversation,
    pub status_message: String,
    /// Input lock: true from send until the session reaches a terminal state.
    pub busy: bool,
    /// Bumped on every accepted submit; updates tagged with an older turn are stale.
    pub turn: u64,
    /// Only this message may be rewritten by streamed updates.
    pub live_reply: Option<String>,
}

impl App {
    pub fn new(transport: Arc<dyn ChatTransport>) -> Self {
        Self {
            transport,
            conversation: Conversation::new(),
            status_message: String::from("مرحباً! Posez votre question juridique."),
            busy: false,
            turn: 0,
            live_reply: None,
        }
    }

    /// Starts from previously saved history.
    pub fn with_history(transport: Arc<dyn ChatTransport>, history: Vec<ChatMessage>) -> Self {
        Self {
            conversation: Conversation::from_messages(history),
            ..Self::new(transport)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedTransport, test_app};

    #[test]
    fn test_app_new_defaults() {
        let app = test_app();
        assert!(!app.busy);
        assert!(app.live_reply.is_none());
        assert_eq!(app.turn, 0);
        assert!(app.conversation.is_empty());
    }

    #[test]
    fn test_app_with_history() {
        let history = vec![ChatMessage::user("a"), ChatMessage::failure()];
        let app = App::with_history(Arc::new(ScriptedTransport::ok(vec![])), history);
        assert_eq!(app.conversation.len(), 2);
        assert!(!app.busy);
    }
}
