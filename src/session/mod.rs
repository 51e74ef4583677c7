//! Session module - in-memory conversation storage
//!
//! Sessions live for the lifetime of the process; nothing is persisted.

pub mod store;

pub use store::SessionStore;
