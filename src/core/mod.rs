//! Core module - shared infrastructure for Wayfinder
//!
//! Foundational types, configuration, and error handling used throughout the
//! crate.

pub mod config;
pub mod error;
pub mod types;

pub use config::{Config, ResponseMode};
pub use error::{Result, WayfinderError};
pub use types::*;
