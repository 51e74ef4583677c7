//! Agent module - step agents, workflows and the runner
//!
//! Every agent, leaf or composite, implements the same [`Agent`] trait: given
//! a conversation it produces a stream of events.

pub mod conversation;
pub mod event;
pub mod llm_agent;
pub mod loop_state;
pub mod runner;
pub mod sequential;

use std::sync::Arc;

pub use conversation::Conversation;
pub use event::{AgentEvent, EventKind, EventStream};
pub use llm_agent::{LlmAgent, LlmAgentBuilder, TRANSFER_TOOL};
pub use loop_state::{Observation, ToolLoopState};
pub use runner::{collect_run, RunOutcome, Runner};
pub use sequential::SequentialAgent;

/// Uniform interface of leaf and composite agents
pub trait Agent: Send + Sync {
    /// Unique name; also the author of the messages it appends
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Child agents, in order
    fn sub_agents(&self) -> &[Arc<dyn Agent>] {
        &[]
    }

    /// Run over the conversation as it stands.
    ///
    /// The returned stream is lazy: nothing happens until it is polled, and it
    /// cannot be restarted once drained.
    fn run<'a>(&'a self, conversation: &'a mut Conversation) -> EventStream<'a>;
}

/// Depth-first search of an agent tree by name
pub fn find_agent<'a>(root: &'a Arc<dyn Agent>, name: &str) -> Option<&'a Arc<dyn Agent>> {
    if root.name() == name {
        return Some(root);
    }
    root.sub_agents().iter().find_map(|child| find_agent(child, name))
}
