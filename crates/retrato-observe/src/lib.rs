//! Observability setup for Retrato: structured logging plus optional
//! OpenTelemetry span export.

pub mod tracing_setup;
