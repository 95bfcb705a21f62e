//! Observability for mnemo: structured logging and optional OpenTelemetry
//! span export, configured from the `[logging]` table.

pub mod tracing_setup;
