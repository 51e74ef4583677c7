//! Error types for Wayfinder
//!
//! One error enum shared by the agents, the session store and the front end.

use thiserror::Error;

use crate::core::types::SessionKey;

/// Main error type for Wayfinder operations
#[derive(Error, Debug)]
pub enum WayfinderError {
    /// Append or run against a session that was never created
    #[error("Session not found: {0}")]
    SessionNotFound(SessionKey),

    /// Language model or search backend unreachable or failing
    #[error("Capability unavailable: {0}")]
    CapabilityUnavailable(String),

    /// A step finished without emitting a final response
    #[error("Agent '{0}' produced no final response")]
    EmptyResponse(String),

    /// Agent tree that cannot be run (e.g. a workflow without steps)
    #[error("Invalid workflow: {0}")]
    InvalidWorkflow(String),

    /// User input that cannot be turned into a query
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Page template failed to render
    #[error("Render error: {0}")]
    Render(#[from] askama::Error),

    /// Generic error for other cases
    #[error("{0}")]
    Other(String),
}

/// Convenience Result type for Wayfinder operations
pub type Result<T> = std::result::Result<T, WayfinderError>;

impl WayfinderError {
    /// Create a capability error
    pub fn capability(msg: impl Into<String>) -> Self {
        Self::CapabilityUnavailable(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an input validation error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether the front end should turn this error into a chat reply
    /// instead of failing the request.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::CapabilityUnavailable(_) | Self::EmptyResponse(_) | Self::Http(_) | Self::Json(_)
        )
    }

    /// Text shown to the user in place of an answer
    pub fn user_message(&self) -> String {
        match self {
            Self::CapabilityUnavailable(detail) => format!(
                "Sorry, the route planner could not reach its language model or search service ({}). Please try again.",
                detail
            ),
            Self::EmptyResponse(agent) => format!(
                "Sorry, the planner step '{}' did not produce an answer. Please rephrase and try again.",
                agent
            ),
            Self::Http(_) | Self::Json(_) => {
                "Sorry, the route planner received an unreadable reply. Please try again.".to_string()
            }
            other => format!("Sorry, something went wrong: {}", other),
        }
    }
}
