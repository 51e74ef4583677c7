//! Tools module - capabilities an agent may invoke
//!
//! A tool is opaque to the orchestrator: the agent hands it a call from the
//! model and gets a textual result back.

pub mod registry;
pub mod search;

use async_trait::async_trait;

use crate::core::{Result, ToolCall, ToolDefinition};

pub use registry::ToolRegistry;
pub use search::GoogleSearchTool;

/// A capability handle that can be attached to an agent
#[async_trait]
pub trait Tool: Send + Sync {
    /// Definition advertised to the model
    fn definition(&self) -> ToolDefinition;

    /// Execute a call requested by the model
    async fn execute(&self, call: &ToolCall) -> Result<String>;

    /// Tool name, taken from the definition
    fn name(&self) -> String {
        self.definition().function.name
    }
}
