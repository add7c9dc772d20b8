//! LLM provider abstractions for Retrato.
//!
//! - `LlmProvider`: RPITIT trait for concrete provider implementations
//! - `BoxLlmProvider`: Object-safe wrapper for dynamic dispatch
//! - `normalize`: canonical history -> provider role vocabulary
//! - `retry`: rate-limit retry with pluggable backoff
//! - `fallback`: primary/secondary routing with one-way primary disable

pub mod box_provider;
pub mod fallback;
pub mod normalize;
pub mod provider;
pub mod retry;
