//! LLM-backed step agent
//!
//! One stage of a conversation: a fixed instruction, a model, optional tools
//! and optional child agents it may hand over to.

use std::sync::Arc;

use futures::StreamExt;

use crate::agent::conversation::Conversation;
use crate::agent::event::{AgentEvent, EventStream};
use crate::agent::loop_state::ToolLoopState;
use crate::agent::Agent;
use crate::core::config::AgentConfig;
use crate::core::{Config, Message, Result, ToolDefinition, ToolResult, WayfinderError};
use crate::llm::{GenerateOptions, LLMProvider};
use crate::tools::{Tool, ToolRegistry};

/// Function the model calls to hand the conversation to a child agent
pub const TRANSFER_TOOL: &str = "transfer_to_agent";

/// A leaf step agent driven by a language model
pub struct LlmAgent {
    /// Unique name, also used as message author
    name: String,
    /// What this agent is for (shown to parents choosing a transfer target)
    description: String,
    /// The stage's policy, sent as the system instruction
    instruction: String,
    /// Model to use
    model: String,
    /// LLM client
    llm: Arc<dyn LLMProvider>,
    /// Capabilities this agent may invoke
    tools: ToolRegistry,
    /// Agents this one may transfer to
    sub_agents: Vec<Arc<dyn Agent>>,
    /// Maximum model calls with tools per turn
    max_rounds: usize,
    /// Number of history messages sent to the model
    context_window: usize,
    temperature: Option<f32>,
    /// Cap on generated tokens per model call
    max_output_tokens: Option<u32>,
    /// Stream partial text when no tools are declared
    streaming: bool,
}

/// Builder for creating LlmAgents
pub struct LlmAgentBuilder {
    name: String,
    description: Option<String>,
    instruction: Option<String>,
    model: Option<String>,
    llm: Option<Arc<dyn LLMProvider>>,
    tools: ToolRegistry,
    sub_agents: Vec<Arc<dyn Agent>>,
    max_rounds: usize,
    context_window: usize,
    temperature: Option<f32>,
    max_output_tokens: Option<u32>,
    streaming: bool,
}

impl LlmAgentBuilder {
    /// Create a new builder with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            instruction: None,
            model: None,
            llm: None,
            tools: ToolRegistry::new(),
            sub_agents: Vec::new(),
            max_rounds: 5,
            context_window: 40,
            temperature: None,
            max_output_tokens: None,
            streaming: false,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the instruction (system prompt)
    pub fn instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = Some(instruction.into());
        self
    }

    /// Set the model to use
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the LLM client
    pub fn llm(mut self, llm: Arc<dyn LLMProvider>) -> Self {
        self.llm = Some(llm);
        self
    }

    /// Attach a capability
    pub fn tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.register(tool);
        self
    }

    /// Add a child agent this one may transfer to
    pub fn sub_agent(mut self, agent: Arc<dyn Agent>) -> Self {
        self.sub_agents.push(agent);
        self
    }

    /// Set maximum tool rounds
    pub fn max_rounds(mut self, max: usize) -> Self {
        self.max_rounds = max;
        self
    }

    pub fn context_window(mut self, window: usize) -> Self {
        self.context_window = window;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_output_tokens(mut self, max: u32) -> Self {
        self.max_output_tokens = Some(max);
        self
    }

    pub fn streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    /// Apply the agent section of the configuration
    pub fn with_agent_config(mut self, config: &AgentConfig) -> Self {
        self.max_output_tokens = config.max_output_tokens;
        self.max_rounds(config.max_tool_rounds)
            .context_window(config.context_window)
            .temperature(config.temperature)
            .streaming(config.streaming)
    }

    /// Build the LlmAgent
    pub fn build(self) -> Result<LlmAgent> {
        let llm = self.llm.ok_or_else(|| {
            WayfinderError::config(format!("agent '{}' has no language model client", self.name))
        })?;

        if self.max_rounds == 0 {
            return Err(WayfinderError::InvalidWorkflow(format!(
                "agent '{}' needs at least one model round",
                self.name
            )));
        }

        for (i, child) in self.sub_agents.iter().enumerate() {
            if self.sub_agents[..i].iter().any(|c| c.name() == child.name()) {
                return Err(WayfinderError::InvalidWorkflow(format!(
                    "agent '{}' has two sub-agents named '{}'",
                    self.name,
                    child.name()
                )));
            }
        }

        Ok(LlmAgent {
            description: self.description.unwrap_or_default(),
            instruction: self.instruction.unwrap_or_else(|| {
                format!(
                    "You are a helpful agent named '{}'. Answer the user's latest request.",
                    self.name
                )
            }),
            model: self.model.unwrap_or_else(|| Config::default().gemini.model),
            name: self.name,
            llm,
            tools: self.tools,
            sub_agents: self.sub_agents,
            max_rounds: self.max_rounds,
            context_window: self.context_window,
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
            streaming: self.streaming,
        })
    }
}

impl LlmAgent {
    /// Create a builder
    pub fn builder(name: impl Into<String>) -> LlmAgentBuilder {
        LlmAgentBuilder::new(name)
    }

    fn find_sub_agent(&self, name: &str) -> Option<&Arc<dyn Agent>> {
        self.sub_agents.iter().find(|a| a.name() == name)
    }

    fn options(&self) -> GenerateOptions {
        GenerateOptions {
            temperature: self.temperature,
            max_tokens: self.max_output_tokens,
        }
    }

    /// Tool definitions sent to the model, including the transfer function
    fn tool_definitions(&self) -> Vec<ToolDefinition> {
        let mut definitions = self.tools.definitions();
        if !self.sub_agents.is_empty() {
            definitions.push(self.transfer_definition());
        }
        definitions
    }

    fn transfer_definition(&self) -> ToolDefinition {
        let names: Vec<&str> = self.sub_agents.iter().map(|a| a.name()).collect();
        let described: Vec<String> = self
            .sub_agents
            .iter()
            .map(|a| format!("{}: {}", a.name(), a.description()))
            .collect();

        ToolDefinition::function(
            TRANSFER_TOOL,
            format!(
                "Hand the conversation over to another agent. Available agents: {}",
                described.join("; ")
            ),
            serde_json::json!({
                "type": "object",
                "properties": {
                    "agent_name": {
                        "type": "string",
                        "enum": names,
                        "description": "Name of the agent to transfer to"
                    }
                },
                "required": ["agent_name"]
            }),
        )
    }

    /// Messages for the next model call
    fn request(&self, conversation: &Conversation, state: &ToolLoopState) -> Vec<Message> {
        let mut messages =
            conversation.request_for(&self.name, &self.instruction, self.context_window);
        let observations = state.format_observations();
        if !observations.is_empty() {
            messages.push(Message::user(observations));
        }
        messages
    }
}

impl Agent for LlmAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn sub_agents(&self) -> &[Arc<dyn Agent>] {
        &self.sub_agents
    }

    fn run<'a>(&'a self, conversation: &'a mut Conversation) -> EventStream<'a> {
        Box::pin(async_stream::stream! {
            tracing::info!(agent = %self.name, history = conversation.len(), "Agent started");

            let tool_defs = self.tool_definitions();
            let mut state = ToolLoopState::new(self.max_rounds);

            if tool_defs.is_empty() && self.streaming {
                let messages = self.request(conversation, &state);
                let mut chunks = match self
                    .llm
                    .chat_stream(&self.model, &messages, Some(self.options()))
                    .await
                {
                    Ok(chunks) => chunks,
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                };

                let mut text = String::new();
                while let Some(chunk) = chunks.next().await {
                    match chunk {
                        Ok(chunk) if !chunk.content.is_empty() => {
                            text.push_str(&chunk.content);
                            yield Ok(AgentEvent::partial(&self.name, chunk.content));
                        }
                        Ok(_) => {}
                        Err(e) => {
                            yield Err(e);
                            return;
                        }
                    }
                }
                state.final_answer = Some(text);
            } else {
                while state.should_continue() {
                    let messages = self.request(conversation, &state);
                    let response = match self
                        .llm
                        .chat_with_tools(&self.model, &messages, &tool_defs, Some(self.options()))
                        .await
                    {
                        Ok(response) => response,
                        Err(e) => {
                            yield Err(e);
                            return;
                        }
                    };

                    if response.tool_calls.is_empty() {
                        state.final_answer = Some(response.content);
                        break;
                    }

                    if !response.content.trim().is_empty() {
                        yield Ok(AgentEvent::partial(&self.name, response.content.clone()));
                    }

                    for call in response.tool_calls {
                        tracing::debug!(agent = %self.name, tool = %call.name, "Tool requested");
                        yield Ok(AgentEvent::tool_call(&self.name, call.clone()));

                        if call.name == TRANSFER_TOOL {
                            let target = call
                                .get_string("agent_name")
                                .filter(|n| self.find_sub_agent(n).is_some());
                            match target {
                                Some(target) => {
                                    state.transfer_to = Some(target);
                                    break;
                                }
                                None => {
                                    let known: Vec<&str> =
                                        self.sub_agents.iter().map(|a| a.name()).collect();
                                    let result = ToolResult::failure(
                                        TRANSFER_TOOL,
                                        format!("No such agent. Available: {}", known.join(", ")),
                                    );
                                    yield Ok(AgentEvent::tool_result(&self.name, result.clone()));
                                    state.observe(result.into());
                                    continue;
                                }
                            }
                        }

                        let result = self.tools.execute(&call).await;
                        yield Ok(AgentEvent::tool_result(&self.name, result.clone()));
                        state.observe(result.into());
                    }

                    state.next_round();
                }
            }

            if let Some(target) = state.transfer_to.take() {
                if let Some(child) = self.find_sub_agent(&target) {
                    tracing::info!(agent = %self.name, to = %target, "Transferring control");
                    yield Ok(AgentEvent::transfer(&self.name, target.as_str()));

                    let mut child_events = child.run(&mut *conversation);
                    while let Some(event) = child_events.next().await {
                        yield event;
                    }
                    return;
                }
            }

            if state.exhausted() {
                tracing::info!(agent = %self.name, rounds = state.round, "Tool budget used, synthesizing");
                let mut messages = self.request(conversation, &state);
                messages.push(Message::user(
                    "No more tool calls are available for this turn. Give your final answer now using the results above.",
                ));
                match self.llm.chat(&self.model, &messages, Some(self.options())).await {
                    Ok(response) => state.final_answer = Some(response.content),
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                }
            }

            let answer = state.final_answer.unwrap_or_default();
            if answer.trim().is_empty() {
                tracing::warn!(agent = %self.name, "Model returned no text, no final response");
                return;
            }

            conversation.add_agent(&self.name, &answer);
            tracing::info!(agent = %self.name, chars = answer.len(), "Agent finished");
            yield Ok(AgentEvent::final_response(&self.name, answer));
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LLMResponse, StreamChunk, StreamResponse};
    use async_trait::async_trait;

    /// Provider that always answers with the same text
    struct Fixed(&'static str);

    #[async_trait]
    impl LLMProvider for Fixed {
        async fn chat(
            &self,
            _model: &str,
            _messages: &[Message],
            _options: Option<GenerateOptions>,
        ) -> Result<LLMResponse> {
            Ok(LLMResponse::text(self.0))
        }

        async fn chat_with_tools(
            &self,
            model: &str,
            messages: &[Message],
            _tools: &[ToolDefinition],
            options: Option<GenerateOptions>,
        ) -> Result<LLMResponse> {
            self.chat(model, messages, options).await
        }

        async fn chat_stream(
            &self,
            _model: &str,
            _messages: &[Message],
            _options: Option<GenerateOptions>,
        ) -> Result<StreamResponse> {
            let chunks: Vec<Result<StreamChunk>> = self
                .0
                .split_inclusive(' ')
                .map(|w| Ok(StreamChunk::content(w)))
                .collect();
            Ok(Box::pin(futures::stream::iter(chunks)))
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn collect(agent: &LlmAgent, conversation: &mut Conversation) -> Vec<AgentEvent> {
        tokio_test::block_on(async {
            let mut events = agent.run(conversation);
            let mut out = Vec::new();
            while let Some(event) = events.next().await {
                out.push(event.unwrap());
            }
            out
        })
    }

    #[test]
    fn test_builder_requires_llm() {
        let err = LlmAgent::builder("location_input_agent").build().err().unwrap();
        assert!(matches!(err, WayfinderError::Config(_)));
    }

    #[test]
    fn test_builder_rejects_zero_rounds() {
        let err = LlmAgent::builder("a")
            .llm(Arc::new(Fixed("x")))
            .max_rounds(0)
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, WayfinderError::InvalidWorkflow(_)));
    }

    #[test]
    fn test_transfer_definition_lists_children() {
        let child: Arc<dyn Agent> = Arc::new(
            LlmAgent::builder("transport_workflow_agent")
                .description("Asks for locations then researches routes")
                .llm(Arc::new(Fixed("x")))
                .build()
                .unwrap(),
        );
        let root = LlmAgent::builder("root_agent")
            .llm(Arc::new(Fixed("x")))
            .sub_agent(child)
            .build()
            .unwrap();

        let defs = root.tool_definitions();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name(), TRANSFER_TOOL);
        assert_eq!(
            defs[0].function.parameters["properties"]["agent_name"]["enum"][0],
            "transport_workflow_agent"
        );
    }

    #[test]
    fn test_agent_config_sets_generation_options() {
        let config = AgentConfig {
            temperature: 0.2,
            max_output_tokens: Some(512),
            ..AgentConfig::default()
        };
        let agent = LlmAgent::builder("route_research_agent")
            .llm(Arc::new(Fixed("x")))
            .with_agent_config(&config)
            .build()
            .unwrap();

        let options = agent.options();
        assert_eq!(options.temperature, Some(0.2));
        assert_eq!(options.max_tokens, Some(512));
    }

    #[test]
    fn test_streaming_emits_partials_then_final() {
        let agent = LlmAgent::builder("location_input_agent")
            .llm(Arc::new(Fixed("Where are you starting from?")))
            .streaming(true)
            .build()
            .unwrap();

        let mut conversation = Conversation::new();
        conversation.add_user("Hi");
        let events = collect(&agent, &mut conversation);

        let last = events.last().unwrap();
        assert!(last.is_final_response());
        assert_eq!(last.text(), Some("Where are you starting from?"));
        assert!(events.len() > 2);
        assert!(events[..events.len() - 1].iter().all(|e| !e.is_final_response()));
        assert_eq!(conversation.len(), 2);
    }

    #[test]
    fn test_blank_reply_emits_no_final() {
        let agent = LlmAgent::builder("route_research_agent")
            .llm(Arc::new(Fixed("   ")))
            .build()
            .unwrap();

        let mut conversation = Conversation::new();
        conversation.add_user("Plan a trip");
        let events = collect(&agent, &mut conversation);

        assert!(events.iter().all(|e| !e.is_final_response()));
        assert_eq!(conversation.len(), 1);
    }
}
