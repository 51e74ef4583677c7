//! Events produced while an agent runs

use std::pin::Pin;

use futures::Stream;

use crate::core::{Result, ToolCall, ToolResult};

/// What happened
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    /// A fragment of text; more will follow
    Partial(String),
    /// The model asked for a tool
    ToolCall(ToolCall),
    /// A tool returned (successfully or not)
    ToolResult(ToolResult),
    /// Control handed to a child agent
    Transfer { to: String },
    /// The agent's complete answer for this turn
    Final(String),
}

/// One item of an agent's event stream
#[derive(Debug, Clone, PartialEq)]
pub struct AgentEvent {
    /// Name of the agent that produced the event
    pub author: String,
    pub kind: EventKind,
}

impl AgentEvent {
    pub fn partial(author: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(author, EventKind::Partial(text.into()))
    }

    pub fn tool_call(author: impl Into<String>, call: ToolCall) -> Self {
        Self::new(author, EventKind::ToolCall(call))
    }

    pub fn tool_result(author: impl Into<String>, result: ToolResult) -> Self {
        Self::new(author, EventKind::ToolResult(result))
    }

    pub fn transfer(author: impl Into<String>, to: impl Into<String>) -> Self {
        Self::new(author, EventKind::Transfer { to: to.into() })
    }

    pub fn final_response(author: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(author, EventKind::Final(text.into()))
    }

    fn new(author: impl Into<String>, kind: EventKind) -> Self {
        Self {
            author: author.into(),
            kind,
        }
    }

    /// Whether this is the author's final response for the turn
    pub fn is_final_response(&self) -> bool {
        matches!(self.kind, EventKind::Final(_))
    }

    /// Response text carried by partial and final events
    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            EventKind::Partial(text) | EventKind::Final(text) => Some(text),
            _ => None,
        }
    }
}

/// Lazy, finite, non-restartable sequence of events
pub type EventStream<'a> = Pin<Box<dyn Stream<Item = Result<AgentEvent>> + Send + 'a>>;
