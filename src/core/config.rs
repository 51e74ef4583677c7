//! Configuration management for Wayfinder
//!
//! Supports a `.env` file, environment variables, a config file, and CLI
//! overrides. Every setting is optional: a missing key or file never stops
//! the planner from starting.
//!
//! Config file location: ~/.config/wayfinder/config.toml

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use crate::core::error::{Result, WayfinderError};

/// Main configuration for Wayfinder
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Gemini API configuration
    #[serde(default)]
    pub gemini: GeminiConfig,
    /// Web server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Session identity used by the front end
    #[serde(default)]
    pub session: SessionConfig,
    /// Agent behavior configuration
    #[serde(default)]
    pub agent: AgentConfig,
}

/// Gemini API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// API key; read from the environment and never written to disk
    #[serde(skip_serializing, default)]
    pub api_key: Option<String>,
    /// Base URL of the Generative Language API
    pub base_url: String,
    /// Model used by every agent
    /// Default: gemini-2.5-flash
    pub model: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Web server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Open the chat page in a browser once listening
    pub open_browser: bool,
}

/// Fixed session identity for the single interactive session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub app_name: String,
    pub user_id: String,
    pub session_id: String,
}

/// Which final responses of a run are shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseMode {
    /// Only the last final response (the last step's output wins)
    #[default]
    Last,
    /// Every step's final response, in order
    EachStep,
}

impl FromStr for ResponseMode {
    type Err = WayfinderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "last" => Ok(ResponseMode::Last),
            "each_step" | "each-step" | "all" => Ok(ResponseMode::EachStep),
            other => Err(WayfinderError::config(format!(
                "Unknown response mode '{}'. Use 'last' or 'each_step'",
                other
            ))),
        }
    }
}

/// Agent behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Number of recent messages sent to the model
    /// Default: 40
    pub context_window: usize,
    /// Maximum model/tool round trips per step
    /// Default: 5
    pub max_tool_rounds: usize,
    /// Sampling temperature
    pub temperature: f32,
    /// Cap on tokens generated per model call; unset leaves it to the model
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    /// Stream partial text for steps without tools
    pub streaming: bool,
    /// Enter through the greeting root agent instead of the workflow
    pub delegate_via_root: bool,
    /// Which final responses are displayed
    pub response_mode: ResponseMode,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: env::var("GOOGLE_API_KEY")
                .or_else(|_| env::var("GEMINI_API_KEY"))
                .ok()
                .filter(|k| !k.trim().is_empty()),
            base_url: env::var("WAYFINDER_GEMINI_URL").unwrap_or_else(|_| {
                "https://generativelanguage.googleapis.com/v1beta".to_string()
            }),
            model: env::var("WAYFINDER_MODEL").unwrap_or_else(|_| "gemini-2.5-flash".to_string()),
            timeout_secs: 120,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: env::var("WAYFINDER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("WAYFINDER_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8501),
            open_browser: false,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            app_name: "transport_planner".to_string(),
            user_id: "web_user".to_string(),
            session_id: "default_session".to_string(),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            context_window: 40,
            max_tool_rounds: 5,
            temperature: 0.4,
            max_output_tokens: None,
            streaming: true,
            delegate_via_root: true,
            response_mode: env::var("WAYFINDER_RESPONSE_MODE")
                .ok()
                .and_then(|m| m.parse().ok())
                .unwrap_or_default(),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("wayfinder")
    }

    /// Get the config file path
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from `.env`, file, environment, and defaults
    /// Priority: CLI args > config file > env vars > defaults
    pub fn load() -> Self {
        // A missing .env is fine
        let _ = dotenvy::dotenv();

        let path = Self::config_file();
        let mut config = if path.exists() {
            match Self::load_from_file() {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Ignoring config file, using defaults");
                    Self::default()
                }
            }
        } else {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            Self::default()
        };

        // The key never lives in the file
        if config.gemini.api_key.is_none() {
            config.gemini.api_key = GeminiConfig::default().api_key;
        }

        config
    }

    /// Load configuration from file only
    pub fn load_from_file() -> Result<Self> {
        let config_path = Self::config_file();

        if !config_path.exists() {
            return Err(WayfinderError::config("Config file not found"));
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|e| WayfinderError::config(format!("Failed to read config: {}", e)))?;

        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| WayfinderError::config(format!("Failed to parse config: {}", e)))
    }

    /// Whether a Gemini API key is available
    pub fn has_api_key(&self) -> bool {
        self.gemini.api_key.is_some()
    }

    /// Address the web server binds to
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// URL of the chat page
    pub fn server_url(&self) -> String {
        format!("http://{}/", self.server_addr())
    }
}
