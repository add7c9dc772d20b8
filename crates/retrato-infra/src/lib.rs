//! Infrastructure layer for Retrato.
//!
//! Contains implementations of the ports defined in `retrato-core`: the
//! OpenAI-compatible and Gemini providers, the Supabase conversation sink,
//! plus the config-file loader and environment secret lookup.

pub mod config;
pub mod llm;
pub mod persistence;
pub mod prompt;
pub mod secret;
