//! Google Search tool
//!
//! Backed by a Gemini call with search grounding, so the agent receives a
//! condensed, sourced answer rather than raw result pages.

use async_trait::async_trait;

use crate::core::{Result, ToolCall, ToolDefinition, WayfinderError};
use crate::llm::GeminiClient;
use crate::tools::Tool;

pub const GOOGLE_SEARCH: &str = "google_search";

/// Web search capability
pub struct GoogleSearchTool {
    client: GeminiClient,
    model: String,
}

impl GoogleSearchTool {
    /// Create a search tool using the given client and model
    pub fn new(client: GeminiClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// Definition shared by every search backend
    pub fn tool_definition() -> ToolDefinition {
        ToolDefinition::function(
            GOOGLE_SEARCH,
            "Search the web for current route, schedule, fare and traffic information",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "What to search for, e.g. 'bus from Jurong East to Marina Bay Sands'"
                    }
                },
                "required": ["query"]
            }),
        )
    }
}

#[async_trait]
impl Tool for GoogleSearchTool {
    fn definition(&self) -> ToolDefinition {
        Self::tool_definition()
    }

    async fn execute(&self, call: &ToolCall) -> Result<String> {
        let query = call
            .get_string("query")
            .filter(|q| !q.trim().is_empty())
            .ok_or_else(|| WayfinderError::invalid_input("google_search requires a 'query'"))?;

        tracing::info!(tool = GOOGLE_SEARCH, query = %query, "Searching");
        self.client.search_grounded(&self.model, &query).await
    }
}
