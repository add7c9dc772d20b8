//! Shared domain types for Retrato.
//!
//! Conversation turns, provider request/response shapes, the portrait record
//! extracted at the end of an interview, configuration, and error types.
//!
//! Zero infrastructure dependencies -- only serde, serde_json, and thiserror.

pub mod config;
pub mod error;
pub mod interview;
pub mod llm;
