use skillbridge_core::{Message, Role};

/// Message history and system prompt for one model session.
///
/// Oldest messages are dropped once `max_messages` is exceeded, except the
/// opening question, which the model must always see.
pub struct ContextWindow {
    messages: Vec<Message>,
    system_prompt: Option<String>,
    max_messages: usize,
}

impl ContextWindow {
    pub fn new(max_messages: usize) -> Self {
        Self {
            messages: Vec::new(),
            system_prompt: None,
            max_messages: max_messages.max(2),
        }
    }

    pub fn set_system_prompt(&mut self, prompt: impl Into<String>) {
        self.system_prompt = Some(prompt.into());
    }

    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
        self.truncate();
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    fn truncate(&mut self) {
        if self.messages.len() > self.max_messages {
            let excess = self.messages.len() - self.max_messages;
            self.messages.drain(1..=excess);
        }
        // A tool result must follow the assistant turn that requested it.
        while self.messages.len() > 1 && self.messages[1].role == Role::Tool {
            self.messages.remove(1);
        }
    }
}
