//! Gemini client implementation
//!
//! Async HTTP client for the Generative Language API with function calling,
//! SSE streaming and Google Search grounding.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::core::{Config, Message, Result, Role, ToolCall, ToolDefinition, WayfinderError};
use crate::llm::traits::{
    GenerateOptions, LLMProvider, LLMResponse, StreamChunk, StreamResponse, TokenUsage,
};

/// Gemini API client
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

/// generateContent request body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

/// A content block (one turn)
#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

/// One part of a content block
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_call: Option<GeminiFunctionCall>,
}

/// Function call requested by the model
#[derive(Debug, Serialize, Deserialize)]
struct GeminiFunctionCall {
    name: String,
    #[serde(default)]
    args: serde_json::Value,
}

/// Generation options in Gemini's naming
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

/// generateContent response (also one SSE frame when streaming)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

/// Error envelope returned on non-2xx responses
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
}

impl GeminiClient {
    /// Create a client from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.gemini.base_url.clone(),
            config.gemini.api_key.clone(),
            Duration::from_secs(config.gemini.timeout_secs),
        )
    }

    /// Create a client with an explicit base URL and key
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WayfinderError::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            api_key,
        })
    }

    /// Whether requests can be authenticated
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            WayfinderError::capability("no Gemini API key configured (set GOOGLE_API_KEY)")
        })
    }

    /// Build `{base}/models/{model}:{method}`
    fn endpoint(&self, model: &str, method: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            WayfinderError::config(format!("Invalid Gemini URL '{}': {}", self.base_url, e))
        })?;

        let model = model.trim_start_matches("models/");
        url.path_segments_mut()
            .map_err(|_| {
                WayfinderError::config(format!("Gemini URL cannot be a base: {}", self.base_url))
            })?
            .pop_if_empty()
            .push("models")
            .push(&format!("{}:{}", model, method));

        Ok(url)
    }

    /// Convert messages into Gemini contents; system messages become the
    /// system instruction
    fn build_request(
        messages: &[Message],
        tools: Vec<serde_json::Value>,
        options: Option<GenerateOptions>,
    ) -> GenerateRequest {
        let mut system_parts = Vec::new();
        let mut contents = Vec::new();

        for msg in messages {
            let role = match msg.role {
                Role::System => {
                    system_parts.push(GeminiPart::text(&msg.content));
                    continue;
                }
                Role::User => "user",
                Role::Agent => "model",
            };
            contents.push(GeminiContent {
                role: Some(role.to_string()),
                parts: vec![GeminiPart::text(&msg.content)],
            });
        }

        let system_instruction = if system_parts.is_empty() {
            None
        } else {
            Some(GeminiContent {
                role: None,
                parts: system_parts,
            })
        };

        let generation_config = options.map(|opts| GenerationConfig {
            temperature: opts.temperature,
            max_output_tokens: opts.max_tokens,
        });

        GenerateRequest {
            system_instruction,
            contents,
            tools,
            generation_config,
        }
    }

    /// Function declarations block for tool definitions
    fn function_declarations(tools: &[ToolDefinition]) -> Vec<serde_json::Value> {
        if tools.is_empty() {
            return Vec::new();
        }

        let declarations: Vec<serde_json::Value> = tools
            .iter()
            .map(|t| {
                serde_json::json!({
                    "name": t.function.name,
                    "description": t.function.description,
                    "parameters": t.function.parameters,
                })
            })
            .collect();

        vec![serde_json::json!({ "functionDeclarations": declarations })]
    }

    /// Convert a Gemini response to LLMResponse
    fn to_llm_response(response: GenerateResponse, model: &str) -> LLMResponse {
        let mut content = String::new();
        let mut tool_calls = Vec::new();

        let parts = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts)
            .unwrap_or_default();

        for part in parts {
            if let Some(text) = part.text {
                content.push_str(&text);
            }
            if let Some(call) = part.function_call {
                tool_calls.push(ToolCall::new(call.name, call.args));
            }
        }

        let usage = response.usage_metadata.map(|u| TokenUsage {
            prompt_tokens: u.prompt_token_count,
            completion_tokens: u.candidates_token_count,
            total_tokens: u.total_token_count,
        });

        LLMResponse {
            content,
            tool_calls,
            usage,
            model: response.model_version.unwrap_or_else(|| model.to_string()),
        }
    }

    /// POST a request and check the status
    async fn send(&self, url: Url, request: &GenerateRequest) -> Result<reqwest::Response> {
        let api_key = self.api_key()?;

        tracing::debug!(
            url = %url.path(),
            body = %serde_json::to_string(request)?,
            "Gemini request"
        );

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorResponse>(&error_text)
                .map(|e| e.error.message)
                .unwrap_or(error_text);

            return Err(WayfinderError::capability(format!(
                "Gemini API error ({}): {}",
                status, message
            )));
        }

        Ok(response)
    }

    /// Connection, timeout and body-read failures mean the backend is
    /// unavailable; anything else stays an HTTP error
    fn transport_error(&self, e: reqwest::Error) -> WayfinderError {
        if e.is_connect() || e.is_timeout() || e.is_body() {
            WayfinderError::capability(format!("cannot reach Gemini at {}: {}", self.base_url, e))
        } else {
            WayfinderError::from(e)
        }
    }

    /// Run one non-streaming generateContent call
    async fn generate(&self, model: &str, request: GenerateRequest) -> Result<LLMResponse> {
        let url = self.endpoint(model, "generateContent")?;
        let response = self.send(url, &request).await?;

        let response_text = response
            .text()
            .await
            .map_err(|e| self.transport_error(e))?;
        tracing::debug!(body = %response_text, "Gemini response");

        let parsed: GenerateResponse = serde_json::from_str(&response_text)?;
        Ok(Self::to_llm_response(parsed, model))
    }

    /// Answer a query with Google Search grounding enabled
    pub async fn search_grounded(&self, model: &str, query: &str) -> Result<String> {
        let request = Self::build_request(
            &[Message::user(query)],
            vec![serde_json::json!({ "google_search": {} })],
            None,
        );

        let response = self.generate(model, request).await?;
        if response.content.trim().is_empty() {
            return Err(WayfinderError::capability(format!(
                "search returned nothing for '{}'",
                query
            )));
        }

        Ok(response.content)
    }
}

impl GeminiPart {
    fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            function_call: None,
        }
    }
}

/// Extract the text of one `data:` SSE line
fn parse_sse_line(line: &str) -> Option<String> {
    let payload = line.strip_prefix("data:")?.trim();
    if payload.is_empty() {
        return None;
    }

    match serde_json::from_str::<GenerateResponse>(payload) {
        Ok(frame) => {
            let text = GeminiClient::to_llm_response(frame, "").content;
            (!text.is_empty()).then_some(text)
        }
        Err(e) => {
            tracing::debug!(error = %e, line = %payload, "Skipping unparseable SSE frame");
            None
        }
    }
}

#[async_trait]
impl LLMProvider for GeminiClient {
    async fn chat(
        &self,
        model: &str,
        messages: &[Message],
        options: Option<GenerateOptions>,
    ) -> Result<LLMResponse> {
        let request = Self::build_request(messages, Vec::new(), options);
        self.generate(model, request).await
    }

    async fn chat_with_tools(
        &self,
        model: &str,
        messages: &[Message],
        tools: &[ToolDefinition],
        options: Option<GenerateOptions>,
    ) -> Result<LLMResponse> {
        let request = Self::build_request(messages, Self::function_declarations(tools), options);
        self.generate(model, request).await
    }

    async fn chat_stream(
        &self,
        model: &str,
        messages: &[Message],
        options: Option<GenerateOptions>,
    ) -> Result<StreamResponse> {
        let request = Self::build_request(messages, Vec::new(), options);

        let mut url = self.endpoint(model, "streamGenerateContent")?;
        url.query_pairs_mut().append_pair("alt", "sse");

        let response = self.send(url, &request).await?;
        let mut bytes = response.bytes_stream();

        let stream = async_stream::stream! {
            let mut buffer: Vec<u8> = Vec::new();

            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        yield Err(WayfinderError::capability(format!("Stream error: {}", e)));
                        return;
                    }
                };
                buffer.extend_from_slice(&chunk);

                // Process complete lines; partial UTF-8 stays buffered
                while let Some(newline_pos) = buffer.iter().position(|b| *b == b'\n') {
                    let line: Vec<u8> = buffer.drain(..=newline_pos).collect();
                    let line = String::from_utf8_lossy(&line);
                    if let Some(text) = parse_sse_line(line.trim()) {
                        yield Ok(StreamChunk::content(text));
                    }
                }
            }

            let rest = String::from_utf8_lossy(&buffer);
            if let Some(text) = parse_sse_line(rest.trim()) {
                yield Ok(StreamChunk::content(text));
            }

            yield Ok(StreamChunk::done());
        };

        Ok(Box::pin(stream))
    }

    fn name(&self) -> &str {
        "gemini"
    }
}
