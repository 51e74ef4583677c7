//! Runner - drives the entry agent over a stored session
//!
//! Appends the incoming user message to the session, runs the agent tree on
//! the session's conversation and hands the event stream back to the caller.

use std::sync::Arc;

use futures::StreamExt;

use crate::agent::event::{AgentEvent, EventStream};
use crate::agent::Agent;
use crate::core::{Message, Result, SessionKey, WayfinderError};
use crate::session::SessionStore;

/// Binds an application name to its entry agent
pub struct Runner {
    app_name: String,
    agent: Arc<dyn Agent>,
}

impl Runner {
    pub fn new(app_name: impl Into<String>, agent: Arc<dyn Agent>) -> Self {
        Self {
            app_name: app_name.into(),
            agent,
        }
    }

    /// The entry agent
    pub fn agent(&self) -> &Arc<dyn Agent> {
        &self.agent
    }

    /// Append `message` to the session and stream the entry agent's events.
    ///
    /// The session must already exist; a key never passed to `create` yields
    /// a single `SessionNotFound` error and nothing is run.
    pub fn run<'a>(
        &'a self,
        store: &'a mut SessionStore,
        key: SessionKey,
        message: Message,
    ) -> EventStream<'a> {
        Box::pin(async_stream::stream! {
            if let Err(e) = store.append(&key, message) {
                yield Err(e);
                return;
            }

            let conversation = match store.get_mut(&key) {
                Some(conversation) => conversation,
                None => {
                    yield Err(WayfinderError::SessionNotFound(key.clone()));
                    return;
                }
            };

            tracing::info!(
                app = %self.app_name,
                session = %key,
                agent = %self.agent.name(),
                "Run started"
            );

            let mut events = self.agent.run(conversation);
            while let Some(event) = events.next().await {
                yield event;
            }
        })
    }
}

/// Everything a finished run produced that the front end cares about
#[derive(Debug, Clone, Default)]
pub struct RunOutcome {
    /// Final responses in the order they were emitted
    pub finals: Vec<AgentEvent>,
    /// Total number of events observed
    pub event_count: usize,
}

impl RunOutcome {
    /// The last final response; the last step's output wins
    pub fn last_final(&self) -> Option<&AgentEvent> {
        self.finals.last()
    }

    pub fn last_text(&self) -> Option<&str> {
        self.last_final().and_then(|e| e.text())
    }
}

/// Drain an event stream to completion.
///
/// The first error ends the run. A run with no final response at all is an
/// `EmptyResponse` naming the last agent that produced anything.
pub async fn collect_run(mut events: EventStream<'_>) -> Result<RunOutcome> {
    let mut outcome = RunOutcome::default();
    let mut last_author: Option<String> = None;

    while let Some(event) = events.next().await {
        let event = event?;
        outcome.event_count += 1;
        last_author = Some(event.author.clone());
        if event.is_final_response() {
            outcome.finals.push(event);
        }
    }

    if outcome.finals.is_empty() {
        return Err(WayfinderError::EmptyResponse(
            last_author.unwrap_or_else(|| "agent".to_string()),
        ));
    }

    tracing::debug!(
        events = outcome.event_count,
        finals = outcome.finals.len(),
        "Run collected"
    );
    Ok(outcome)
}
