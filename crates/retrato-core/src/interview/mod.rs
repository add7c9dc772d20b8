//! Interview orchestration: session history, portrait extraction, and the
//! service that ties them to the provider coordinator.

pub mod extractor;
pub mod service;
pub mod session;
