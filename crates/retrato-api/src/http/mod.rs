//! HTTP layer for Retrato.
//!
//! Axum-based JSON API under `/api/`, a `/health` endpoint, and the static
//! chat page served from disk.

pub mod error;
pub mod handlers;
pub mod router;
