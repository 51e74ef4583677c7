//! Session store
//!
//! Conversation history keyed by (application, user, session). The store is
//! an ordinary owned value; whoever holds it is responsible for serialising
//! runs against it.

use std::collections::HashMap;

use crate::agent::Conversation;
use crate::core::{Message, Result, SessionKey, WayfinderError};

/// In-memory session storage with no eviction or size bound
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<SessionKey, Conversation>,
}

impl SessionStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty session under `key`.
    ///
    /// Returns false if the session already existed; its messages are kept.
    pub fn create(&mut self, key: SessionKey) -> bool {
        if self.sessions.contains_key(&key) {
            return false;
        }
        tracing::debug!(session = %key, "Session created");
        self.sessions.insert(key, Conversation::new());
        true
    }

    /// Get the session under `key`, creating it if needed
    pub fn ensure_created(&mut self, key: &SessionKey) -> &mut Conversation {
        self.sessions.entry(key.clone()).or_insert_with(|| {
            tracing::debug!(session = %key, "Session created");
            Conversation::new()
        })
    }

    /// Append a message to an existing session
    pub fn append(&mut self, key: &SessionKey, message: Message) -> Result<()> {
        let conversation = self
            .sessions
            .get_mut(key)
            .ok_or_else(|| WayfinderError::SessionNotFound(key.clone()))?;
        conversation.push(message);
        Ok(())
    }

    pub fn get(&self, key: &SessionKey) -> Option<&Conversation> {
        self.sessions.get(key)
    }

    pub fn get_mut(&mut self, key: &SessionKey) -> Option<&mut Conversation> {
        self.sessions.get_mut(key)
    }

    /// Messages of a session, in order
    pub fn messages(&self, key: &SessionKey) -> Option<&[Message]> {
        self.sessions.get(key).map(|c| c.messages())
    }

    /// Drop a session; the next `ensure_created` starts it fresh
    pub fn remove(&mut self, key: &SessionKey) -> Option<Conversation> {
        let removed = self.sessions.remove(key);
        if removed.is_some() {
            tracing::debug!(session = %key, "Session removed");
        }
        removed
    }

    pub fn contains(&self, key: &SessionKey) -> bool {
        self.sessions.contains_key(key)
    }

    /// Number of sessions
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
