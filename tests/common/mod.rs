//! Shared test fixtures: a scripted language model and a fake search tool

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use wayfinder::core::{Message, Result, Role, ToolCall, ToolDefinition, WayfinderError};
use wayfinder::llm::{GenerateOptions, LLMProvider, LLMResponse, StreamChunk, StreamResponse};
use wayfinder::planner::REPORT_SECTIONS;
use wayfinder::tools::{GoogleSearchTool, Tool};

pub const ROOT_MARKER: &str = "friendly route planning assistant";
pub const LOCATION_MARKER: &str = "You are the location input agent";
pub const RESEARCH_MARKER: &str = "You are the route research agent";

/// One scripted model turn
#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    /// Optional preamble text plus tool calls
    Calls(String, Vec<ToolCall>),
    /// Backend failure
    Fail(String),
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Reply::Text(text.into())
    }

    pub fn search(query: &str) -> Self {
        Reply::Calls(
            String::new(),
            vec![ToolCall::new(
                "google_search",
                serde_json::json!({ "query": query }),
            )],
        )
    }

    pub fn transfer(preamble: &str, agent_name: &str) -> Self {
        Reply::Calls(
            preamble.to_string(),
            vec![ToolCall::new(
                "transfer_to_agent",
                serde_json::json!({ "agent_name": agent_name }),
            )],
        )
    }
}

/// A request the provider received
#[derive(Debug, Clone)]
pub struct Recorded {
    pub marker: String,
    pub messages: Vec<Message>,
    pub tool_names: Vec<String>,
    pub streamed: bool,
}

impl Recorded {
    /// Conversation part of the request (everything after the instruction)
    pub fn history(&self) -> &[Message] {
        &self.messages[1..]
    }
}

/// Answers each agent from its own queue, chosen by a substring of the
/// agent's instruction
#[derive(Default)]
pub struct ScriptedProvider {
    scripts: Mutex<Vec<(String, VecDeque<Reply>)>>,
    requests: Mutex<Vec<Recorded>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, marker: &str, replies: Vec<Reply>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .push((marker.to_string(), replies.into()));
        self
    }

    /// Append more replies for an agent
    pub fn push(&self, marker: &str, reply: Reply) {
        let mut scripts = self.scripts.lock().unwrap();
        match scripts.iter_mut().find(|(m, _)| m == marker) {
            Some((_, queue)) => queue.push_back(reply),
            None => scripts.push((marker.to_string(), VecDeque::from(vec![reply]))),
        }
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    /// Markers of the requests received, in order
    pub fn call_order(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.marker).collect()
    }

    fn next_reply(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
        streamed: bool,
    ) -> Result<Reply> {
        let instruction = messages
            .first()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.clone())
            .unwrap_or_default();

        let mut scripts = self.scripts.lock().unwrap();
        let (marker, queue) = scripts
            .iter_mut()
            .find(|(marker, _)| instruction.contains(marker.as_str()))
            .ok_or_else(|| WayfinderError::Other(format!("no script for: {}", instruction)))?;

        self.requests.lock().unwrap().push(Recorded {
            marker: marker.clone(),
            messages: messages.to_vec(),
            tool_names: tools.iter().map(|t| t.name().to_string()).collect(),
            streamed,
        });

        queue
            .pop_front()
            .ok_or_else(|| WayfinderError::Other(format!("script for '{}' exhausted", marker)))
    }
}

fn into_response(reply: Reply) -> Result<LLMResponse> {
    match reply {
        Reply::Text(text) => Ok(LLMResponse::text(text)),
        Reply::Calls(content, calls) => Ok(LLMResponse {
            content,
            tool_calls: calls,
            ..Default::default()
        }),
        Reply::Fail(msg) => Err(WayfinderError::capability(msg)),
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    async fn chat(
        &self,
        _model: &str,
        messages: &[Message],
        _options: Option<GenerateOptions>,
    ) -> Result<LLMResponse> {
        into_response(self.next_reply(messages, &[], false)?)
    }

    async fn chat_with_tools(
        &self,
        _model: &str,
        messages: &[Message],
        tools: &[ToolDefinition],
        _options: Option<GenerateOptions>,
    ) -> Result<LLMResponse> {
        into_response(self.next_reply(messages, tools, false)?)
    }

    async fn chat_stream(
        &self,
        _model: &str,
        messages: &[Message],
        _options: Option<GenerateOptions>,
    ) -> Result<StreamResponse> {
        let text = into_response(self.next_reply(messages, &[], true)?)?.content;
        let mut chunks: Vec<Result<StreamChunk>> = text
            .split_inclusive(' ')
            .map(|piece| Ok(StreamChunk::content(piece)))
            .collect();
        chunks.push(Ok(StreamChunk::done()));
        Ok(Box::pin(futures::stream::iter(chunks)))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Search tool with a canned answer, or a canned failure
pub struct FakeSearch {
    pub answer: std::result::Result<String, String>,
    pub queries: Mutex<Vec<String>>,
}

impl FakeSearch {
    pub fn ok(answer: &str) -> Self {
        Self {
            answer: Ok(answer.to_string()),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: &str) -> Self {
        Self {
            answer: Err(error.to_string()),
            queries: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Tool for FakeSearch {
    fn definition(&self) -> ToolDefinition {
        GoogleSearchTool::tool_definition()
    }

    async fn execute(&self, call: &ToolCall) -> Result<String> {
        self.queries
            .lock()
            .unwrap()
            .push(call.get_string("query").unwrap_or_default());
        self.answer
            .clone()
            .map_err(WayfinderError::capability)
    }
}

/// A report with every section heading
pub fn full_report() -> String {
    REPORT_SECTIONS
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{}. **{}** - details for {}\n", i + 1, s, s))
        .collect()
}

/// Config with the workflow as the entry agent
pub fn workflow_config() -> wayfinder::Config {
    let mut config = wayfinder::Config::default();
    config.agent.delegate_via_root = false;
    config.agent.response_mode = wayfinder::core::ResponseMode::Last;
    config
}

pub fn shared<T>(value: T) -> Arc<T> {
    Arc::new(value)
}
