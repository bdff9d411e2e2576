//! Conversation state across turns.

use crate::domain::{ContentBlock, Message, Role};

pub const SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Append-only messages plus the requirement history that the closing
/// template embeds.
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<Message>,
    requirements_history: Vec<String>,
}

impl Conversation {
    /// Start with the system prompt and the assembled context message.
    pub fn start(requirements: impl Into<String>, context: Vec<ContentBlock>) -> Self {
        Self {
            messages: vec![
                Message::system(SYSTEM_PROMPT),
                Message::new(Role::User, context),
            ],
            requirements_history: vec![requirements.into()],
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn requirements_history(&self) -> &[String] {
        &self.requirements_history
    }

    /// Record a streamed reply. Empty replies are not kept.
    pub fn push_assistant(&mut self, text: &str) {
        if !text.trim().is_empty() {
            self.messages.push(Message::assistant(text));
        }
    }

    /// Add a follow-up requirement to both the history and the messages.
    pub fn add_follow_up(&mut self, requirement: impl Into<String>) {
        let requirement = requirement.into();
        self.messages.push(Message::user(requirement.clone()));
        self.requirements_history.push(requirement);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_follow_up_extends_history_and_messages() {
        let mut conversation = Conversation::start("add login", vec![ContentBlock::text("ctx")]);
        assert_eq!(conversation.messages().len(), 2);
        assert_eq!(conversation.messages()[0].role, Role::System);

        conversation.push_assistant("done");
        conversation.push_assistant("   ");
        conversation.add_follow_up("also logout");

        let roles: Vec<Role> = conversation.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant, Role::User]);
        assert_eq!(conversation.requirements_history(), ["add login", "also logout"]);
    }
}
