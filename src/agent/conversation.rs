//! Conversation history
//!
//! The ordered message sequence a session owns and every agent reads. It only
//! ever grows during a run.

use crate::core::{Message, Role};

/// Ordered chat history shared by the agents of one session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Create an empty conversation
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a user message
    pub fn add_user(&mut self, content: impl Into<String>) {
        self.push(Message::user(content));
    }

    /// Add a message authored by an agent
    pub fn add_agent(&mut self, author: impl Into<String>, content: impl Into<String>) {
        self.push(Message::agent(author, content));
    }

    /// Append a message to the end
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// All messages in order
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Get the last N messages
    pub fn last_n(&self, n: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }

    /// Get the last user message
    pub fn last_user_message(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == Role::User)
    }

    /// Get message count
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Build the model request for one agent: its instruction followed by the
    /// last `window` messages.
    ///
    /// Messages from other agents are handed over as user-role context, since
    /// from this agent's point of view they are input rather than its own turns.
    pub fn request_for(&self, agent_name: &str, instruction: &str, window: usize) -> Vec<Message> {
        let mut result = Vec::with_capacity(window.min(self.len()) + 1);
        result.push(Message::system(instruction));

        for msg in self.last_n(window) {
            match msg.role {
                Role::Agent if msg.author != agent_name => {
                    result.push(Message::user(format!(
                        "For context: [{}] said: {}",
                        msg.author, msg.content
                    )));
                }
                _ => result.push(msg.clone()),
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversation_basic() {
        let mut conv = Conversation::new();
        conv.add_user("Hello");
        conv.add_agent("location_input_agent", "Hi there!");

        assert_eq!(conv.len(), 2);
        assert_eq!(conv.last_user_message().unwrap().content, "Hello");
        assert_eq!(conv.messages()[1].author, "location_input_agent");
        assert_eq!(conv.last_n(1)[0].content, "Hi there!");
    }

    #[test]
    fn test_no_eviction() {
        let mut conv = Conversation::new();
        for i in 0..500 {
            conv.add_user(i.to_string());
        }
        assert_eq!(conv.len(), 500);
        assert_eq!(conv.messages()[0].content, "0");
    }

    #[test]
    fn test_request_reframes_other_agents() {
        let mut conv = Conversation::new();
        conv.add_user("Plan a trip from Jurong to Marina Bay.");
        conv.add_agent("location_input_agent", "Start: Jurong, Destination: Marina Bay");
        conv.add_agent("route_research_agent", "Earlier report");

        let request = conv.request_for("route_research_agent", "Research routes", 10);
        assert_eq!(request.len(), 4);
        assert_eq!(request[0].role, Role::System);
        assert_eq!(request[2].role, Role::User);
        assert!(request[2].content.contains("[location_input_agent] said:"));
        assert_eq!(request[3].role, Role::Agent);
    }

    #[test]
    fn test_request_window() {
        let mut conv = Conversation::new();
        conv.add_user("1");
        conv.add_user("2");
        conv.add_user("3");

        let request = conv.request_for("a", "instr", 2);
        assert_eq!(request.len(), 3);
        assert_eq!(request[1].content, "2");
    }
}
