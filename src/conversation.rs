use log::warn;

use crate::web::models::{Message, Role};

/// Rolling conversation history sent upstream on every request.
///
/// The first message is always the system prompt. Once the history grows past
/// `limit` it is dropped wholesale (back to just the system prompt) rather
/// than windowed.
#[derive(Debug)]
pub struct Transcript {
    limit: usize,
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new(system_prompt: impl Into<String>, limit: usize) -> Self {
        Self {
            limit,
            messages: vec![Message::new(Role::System, system_prompt)],
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Drops everything but the system prompt.
    pub fn reset(&mut self) {
        self.messages.truncate(1);
    }

    /// Appends a user turn, resetting the history first if it has outgrown
    /// the limit.
    pub fn push_user(&mut self, content: impl Into<String>) {
        if self.messages.len() > self.limit {
            warn!(
                "Transcript has {} turns (limit {}), resetting",
                self.messages.len(),
                self.limit
            );
            self.reset();
        }
        self.messages.push(Message::new(Role::User, content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(Message::new(Role::Assistant, content));
    }
}
