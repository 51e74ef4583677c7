//! Tool registry - manages and dispatches tool calls
//!
//! Central hub for registering tools and routing tool calls to handlers.
//! Execution never fails outright: errors come back as failed results so the
//! calling agent can still answer.

use std::collections::HashMap;
use std::sync::Arc;

use crate::core::{ToolCall, ToolDefinition, ToolResult};
use crate::tools::Tool;

/// Registry of available tools
#[derive(Clone, Default)]
pub struct ToolRegistry {
    /// Tools indexed by name
    tools: HashMap<String, Arc<dyn Tool>>,
    /// Registration order, so definitions are stable across requests
    order: Vec<String>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any tool with the same name
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name();
        if self.tools.insert(name.clone(), tool).is_none() {
            self.order.push(name);
        }
    }

    /// Get all tool definitions in registration order
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| tool.definition())
            .collect()
    }

    /// Check whether a tool is registered
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute a tool call
    pub async fn execute(&self, tool_call: &ToolCall) -> ToolResult {
        let Some(tool) = self.tools.get(&tool_call.name) else {
            return ToolResult::failure(
                &tool_call.name,
                format!("Unknown tool: {}", tool_call.name),
            );
        };

        match tool.execute(tool_call).await {
            Ok(output) => ToolResult::success(&tool_call.name, output),
            Err(e) => {
                tracing::warn!(tool = %tool_call.name, error = %e, "Tool failed");
                ToolResult::failure(&tool_call.name, e.to_string())
            }
        }
    }
}
