//! Sequential workflow agent
//!
//! Runs a fixed list of steps exactly once each, in order, over one shared
//! conversation. Each step sees everything earlier steps appended.

use std::sync::Arc;

use futures::StreamExt;

use crate::agent::conversation::Conversation;
use crate::agent::event::EventStream;
use crate::agent::Agent;
use crate::core::{Result, WayfinderError};

/// Composite agent that runs its children one after another
pub struct SequentialAgent {
    name: String,
    description: String,
    steps: Vec<Arc<dyn Agent>>,
}

impl SequentialAgent {
    /// Create a workflow. At least one step is required.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        steps: Vec<Arc<dyn Agent>>,
    ) -> Result<Self> {
        let name = name.into();
        if steps.is_empty() {
            return Err(WayfinderError::InvalidWorkflow(format!(
                "workflow '{}' has no steps",
                name
            )));
        }

        Ok(Self {
            name,
            description: description.into(),
            steps,
        })
    }

    /// Step names in execution order
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }
}

impl Agent for SequentialAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn sub_agents(&self) -> &[Arc<dyn Agent>] {
        &self.steps
    }

    fn run<'a>(&'a self, conversation: &'a mut Conversation) -> EventStream<'a> {
        Box::pin(async_stream::stream! {
            let total = self.steps.len();

            for (index, step) in self.steps.iter().enumerate() {
                tracing::info!(
                    agent = %self.name,
                    step = %step.name(),
                    position = index + 1,
                    total,
                    "Running step"
                );

                let mut saw_final = false;
                let mut events = step.run(&mut *conversation);
                while let Some(event) = events.next().await {
                    match event {
                        Ok(event) => {
                            saw_final |= event.is_final_response();
                            yield Ok(event);
                        }
                        Err(e) => {
                            tracing::warn!(agent = %self.name, step = %step.name(), error = %e, "Step failed");
                            yield Err(e);
                            return;
                        }
                    }
                }

                if !saw_final {
                    yield Err(WayfinderError::EmptyResponse(step.name().to_string()));
                    return;
                }
            }

            tracing::info!(agent = %self.name, steps = total, "Workflow complete");
        })
    }
}
