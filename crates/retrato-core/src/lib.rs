//! Orchestration logic and port trait definitions for Retrato.
//!
//! This crate defines the "ports" (provider, session store, conversation sink)
//! that the infrastructure layer implements, plus the pure orchestration:
//! history normalization, rate-limit retry, provider fallback, and portrait
//! extraction. It depends only on `retrato-types` -- never on
//! `retrato-infra` or any HTTP client.

pub mod interview;
pub mod llm;
pub mod repository;

#[cfg(test)]
pub(crate) mod test_support;
