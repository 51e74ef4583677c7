//! Chat front end
//!
//! Owns the session store and the chat history shown to the user. Each
//! submission runs the agent tree to completion before anything is displayed.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::agent::{collect_run, Agent, RunOutcome, Runner};
use crate::core::{Config, Message, ResponseMode, Result, SessionKey, WayfinderError};
use crate::planner::TripForm;
use crate::session::SessionStore;

/// Who a displayed chat entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl fmt::Display for ChatRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatRole::User => write!(f, "user"),
            ChatRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// One entry of the displayed chat history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    /// Agent name, shown when every step's answer is displayed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
            label: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
            label: None,
        }
    }

    fn labelled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// The single interactive session behind the web page and the REPL
pub struct ChatFrontEnd {
    runner: Runner,
    store: SessionStore,
    key: SessionKey,
    history: Vec<ChatMessage>,
    response_mode: ResponseMode,
}

impl ChatFrontEnd {
    pub fn new(runner: Runner, key: SessionKey, response_mode: ResponseMode) -> Self {
        Self {
            runner,
            store: SessionStore::new(),
            key,
            history: Vec::new(),
            response_mode,
        }
    }

    /// Front end for `agent` using the session identity from config
    pub fn from_config(config: &Config, agent: Arc<dyn Agent>) -> Self {
        let session = &config.session;
        let key = SessionKey::new(&session.app_name, &session.user_id, &session.session_id);
        Self::new(
            Runner::new(&session.app_name, agent),
            key,
            config.agent.response_mode,
        )
    }

    /// Displayed history, oldest first
    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    pub fn session_key(&self) -> &SessionKey {
        &self.key
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn response_mode(&self) -> ResponseMode {
        self.response_mode
    }

    pub fn set_response_mode(&mut self, mode: ResponseMode) {
        self.response_mode = mode;
    }

    /// Name of the entry agent
    pub fn agent_name(&self) -> &str {
        self.runner.agent().name()
    }

    /// Send a free-text message and wait for the run to finish.
    ///
    /// Returns the assistant entries added to the history. Model, search and
    /// empty-response failures come back as an assistant entry describing the
    /// problem; anything else is returned as an error and leaves the displayed
    /// history untouched.
    pub async fn submit_text(&mut self, text: &str) -> Result<Vec<ChatMessage>> {
        let text = text.trim();
        if text.is_empty() {
            return Err(WayfinderError::invalid_input("Message is empty"));
        }

        if self.store.create(self.key.clone()) {
            tracing::info!(session = %self.key, "Started new session");
        }

        let events = self
            .runner
            .run(&mut self.store, self.key.clone(), Message::user(text));

        let replies = match collect_run(events).await {
            Ok(outcome) => self.render(&outcome),
            Err(e) if e.is_recoverable() => {
                tracing::warn!(session = %self.key, error = %e, "Run failed, showing message");
                vec![ChatMessage::assistant(e.user_message())]
            }
            Err(e) => return Err(e),
        };

        self.history.push(ChatMessage::user(text));
        self.history.extend(replies.iter().cloned());
        Ok(replies)
    }

    /// Flatten a trip form into a sentence and submit it
    pub async fn submit_trip(&mut self, form: &TripForm) -> Result<Vec<ChatMessage>> {
        let prompt = form.to_prompt()?;
        self.submit_text(&prompt).await
    }

    /// Forget the displayed history and the session; the next submission
    /// starts a new one
    pub fn clear(&mut self) {
        self.history.clear();
        self.store.remove(&self.key);
        tracing::info!(session = %self.key, "Chat cleared");
    }

    fn render(&self, outcome: &RunOutcome) -> Vec<ChatMessage> {
        match self.response_mode {
            ResponseMode::Last => outcome
                .last_text()
                .map(|text| vec![ChatMessage::assistant(text)])
                .unwrap_or_default(),
            ResponseMode::EachStep => outcome
                .finals
                .iter()
                .filter_map(|event| {
                    event
                        .text()
                        .map(|text| ChatMessage::assistant(text).labelled(&event.author))
                })
                .collect(),
        }
    }
}
