//! Repository trait definitions (ports).
//!
//! These traits define the persistence interface that the infrastructure
//! layer (retrato-infra) implements. The core crate never depends on any
//! specific storage technology.

pub mod conversation;
pub mod mirror;

pub use conversation::{ConversationSink, DisabledSink};
pub use mirror::SinkMirror;
