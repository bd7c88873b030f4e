//! # Conversation
//!
//! Ordered list of messages plus an id → position index, so a streamed
//! reply can be replaced by id without scanning the list on every chunk.

use std::collections::HashMap;

use crate::stream::ChatMessage;

#[derive(Debug, Default, Clone)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
    index: HashMap<String, usize>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a conversation from saved history.
    pub fn from_messages(messages: Vec<ChatMessage>) -> Self {
        let mut conversation = Self::new();
        for message in messages {
            conversation.push(message);
        }
        conversation
    }

    /// Appends a message. A repeated id replaces the earlier entry in place.
    pub fn push(&mut self, message: ChatMessage) {
        if let Some(&pos) = self.index.get(&message.id) {
            self.messages[pos] = message;
            return;
        }
        self.index.insert(message.id.clone(), self.messages.len());
        self.messages.push(message);
    }

    /// Replaces the content of message `id`. Returns false if it is unknown.
    pub fn replace_content(&mut self, id: &str, content: String) -> bool {
        match self.index.get(id) {
            Some(&pos) => {
                self.messages[pos].content = content;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: &str) -> Option<&ChatMessage> {
        self.index.get(id).map(|&pos| &self.messages[pos])
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.index.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
