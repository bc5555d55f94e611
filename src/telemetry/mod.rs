//! Telemetry
//!
//! Diagnostic logging for LibLynx operations.

pub mod logging;

pub use logging::{
    InMemoryLogger, LogContext, LogEntry, LogLevel, Logger, NoOpLogger, TracingLogger,
};
