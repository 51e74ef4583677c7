//! Tool loop state
//!
//! Tracks one leaf agent's rounds of model calls and the observations fed
//! back from its tools.

use crate::core::ToolResult;

/// State of a leaf agent's tool loop
#[derive(Debug, Clone)]
pub struct ToolLoopState {
    /// Current round (0-indexed)
    pub round: usize,
    /// Maximum allowed rounds
    pub max_rounds: usize,
    /// Observations collected from tool executions
    pub observations: Vec<Observation>,
    /// Final answer once the model replies without tool calls
    pub final_answer: Option<String>,
    /// Child agent the model asked to hand over to
    pub transfer_to: Option<String>,
}

impl ToolLoopState {
    /// Create a new loop state with the given round budget
    pub fn new(max_rounds: usize) -> Self {
        Self {
            round: 0,
            max_rounds,
            observations: Vec::new(),
            final_answer: None,
            transfer_to: None,
        }
    }

    /// Check if another model call should be made
    pub fn should_continue(&self) -> bool {
        self.round < self.max_rounds && self.final_answer.is_none() && self.transfer_to.is_none()
    }

    /// Whether the round budget ran out without an answer
    pub fn exhausted(&self) -> bool {
        self.final_answer.is_none() && self.transfer_to.is_none() && self.round >= self.max_rounds
    }

    /// Format observations for the next request
    pub fn format_observations(&self) -> String {
        if self.observations.is_empty() {
            return String::new();
        }

        let mut output = String::from("Tool results so far:\n");
        for (i, obs) in self.observations.iter().enumerate() {
            let status = if obs.success { "ok" } else { "FAILED" };
            output.push_str(&format!(
                "\n[{}] {} ({}): {}\n",
                i + 1,
                obs.tool_name,
                status,
                obs.output
            ));
        }
        if self.observations.iter().any(|o| !o.success) {
            output.push_str(
                "\nSome tools failed. Answer as well as you can from what you know and say which details could not be checked.\n",
            );
        }
        output
    }

    /// Record a tool result
    pub fn observe(&mut self, observation: Observation) {
        self.observations.push(observation);
    }

    /// Increment the round counter
    pub fn next_round(&mut self) {
        self.round += 1;
    }
}

/// What a tool returned, as shown to the model
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub tool_name: String,
    pub success: bool,
    pub output: String,
}

impl Observation {
    /// Create a failed observation
    pub fn error(tool_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            success: false,
            output: error.into(),
        }
    }
}

impl From<ToolResult> for Observation {
    fn from(result: ToolResult) -> Self {
        Self {
            tool_name: result.tool_name,
            success: result.success,
            output: result.output,
        }
    }
}
