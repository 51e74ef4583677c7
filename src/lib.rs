//! Wayfinder - Multi-Agent Transport Planner
//!
//! A chat-style route planner: a greeting agent hands over to a two-step
//! workflow that first confirms where the user starts and where they are
//! going, then researches bus, MRT, taxi, cycling and walking options with
//! web search.
//!
//! # Architecture
//!
//! - **Core**: Shared types, configuration, and error handling
//! - **LLM**: Language model client abstraction with a Gemini implementation
//! - **Tools**: Capabilities agents can call (web search)
//! - **Agent**: Step agents, sequential workflows and the runner
//! - **Session**: In-memory conversation storage
//! - **Planner**: The transport-planning agent tree and trip form
//! - **Web**: Chat page and JSON API
//! - **CLI**: Terminal REPL
//!
//! # Usage
//!
//! ```rust,no_run
//! use wayfinder::{planner, ChatFrontEnd, Config};
//!
//! #[tokio::main]
//! async fn main() -> wayfinder::Result<()> {
//!     let config = Config::load();
//!     let agent = planner::gemini_planner(&config)?;
//!     let mut front_end = ChatFrontEnd::from_config(&config, agent);
//!
//!     for reply in front_end.submit_text("Plan a trip from Jurong to Marina Bay.").await? {
//!         println!("{}", reply.content);
//!     }
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod core;
pub mod llm;
pub mod planner;
pub mod session;
pub mod tools;
pub mod web;

// Re-export commonly used items
pub use agent::{Agent, AgentEvent, Runner};
pub use cli::Repl;
pub use core::{Config, Result, WayfinderError};
pub use session::SessionStore;
pub use web::ChatFrontEnd;
