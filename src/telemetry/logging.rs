//! Logging
//!
//! Structured diagnostic events for LibLynx operations. The client writes to
//! an injected [`Logger`]; what happens to the events is up to the
//! implementation and never affects the outcome of a call.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    Info,
    /// Warn level.
    Warn,
    /// Error level.
    Error,
}

impl LogLevel {
    /// Lower-case name used in rendered diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "TRACE"),
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

/// Context attached to a log event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogContext {
    /// Operation name (`api_request`, `resolve_entrypoint`, `authorize`, ...).
    pub operation: Option<String>,
    /// HTTP method.
    pub method: Option<String>,
    /// Entry point name or URL as given by the caller.
    pub entrypoint: Option<String>,
    /// Resolved URL.
    pub url: Option<String>,
    /// HTTP status code.
    pub status: Option<u16>,
    /// Client ID.
    pub client_id: Option<String>,
    /// Additional context.
    pub extra: BTreeMap<String, String>,
}

impl LogContext {
    /// Create new log context.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn entrypoint(mut self, entrypoint: impl Into<String>) -> Self {
        self.entrypoint = Some(entrypoint.into());
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Add extra context.
    pub fn extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Logger interface.
pub trait Logger: Send + Sync {
    /// Log at trace level.
    fn trace(&self, message: &str, context: &LogContext);

    /// Log at debug level.
    fn debug(&self, message: &str, context: &LogContext);

    /// Log at info level.
    fn info(&self, message: &str, context: &LogContext);

    /// Log at warn level.
    fn warn(&self, message: &str, context: &LogContext);

    /// Log at error level.
    fn error(&self, message: &str, context: &LogContext);

    /// Check if a log level is enabled.
    fn is_enabled(&self, level: LogLevel) -> bool;
}

/// No-op logger implementation.
pub struct NoOpLogger;

impl Logger for NoOpLogger {
    fn trace(&self, _message: &str, _context: &LogContext) {}
    fn debug(&self, _message: &str, _context: &LogContext) {}
    fn info(&self, _message: &str, _context: &LogContext) {}
    fn warn(&self, _message: &str, _context: &LogContext) {}
    fn error(&self, _message: &str, _context: &LogContext) {}
    fn is_enabled(&self, _level: LogLevel) -> bool {
        false
    }
}

/// Forwards events to `tracing` under the `liblynx_connect` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl TracingLogger {
    pub fn new() -> Self {
        Self
    }
}

macro_rules! forward {
    ($macro:ident, $message:expr, $ctx:expr) => {
        tracing::$macro!(
            target: "liblynx_connect",
            operation = $ctx.operation.as_deref(),
            method = $ctx.method.as_deref(),
            entrypoint = $ctx.entrypoint.as_deref(),
            url = $ctx.url.as_deref(),
            status = $ctx.status,
            client_id = $ctx.client_id.as_deref(),
            extra = ?$ctx.extra,
            "{}",
            $message
        )
    };
}

impl Logger for TracingLogger {
    fn trace(&self, message: &str, context: &LogContext) {
        forward!(trace, message, context);
    }

    fn debug(&self, message: &str, context: &LogContext) {
        forward!(debug, message, context);
    }

    fn info(&self, message: &str, context: &LogContext) {
        forward!(info, message, context);
    }

    fn warn(&self, message: &str, context: &LogContext) {
        forward!(warn, message, context);
    }

    fn error(&self, message: &str, context: &LogContext) {
        forward!(error, message, context);
    }

    fn is_enabled(&self, level: LogLevel) -> bool {
        match level {
            LogLevel::Trace => tracing::enabled!(target: "liblynx_connect", tracing::Level::TRACE),
            LogLevel::Debug => tracing::enabled!(target: "liblynx_connect", tracing::Level::DEBUG),
            LogLevel::Info => tracing::enabled!(target: "liblynx_connect", tracing::Level::INFO),
            LogLevel::Warn => tracing::enabled!(target: "liblynx_connect", tracing::Level::WARN),
            LogLevel::Error => tracing::enabled!(target: "liblynx_connect", tracing::Level::ERROR),
        }
    }
}

/// Log entry for in-memory storage.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub context: LogContext,
    pub timestamp: u64,
}

/// In-memory diagnostic logger.
///
/// Keeps every event so an integrator can dump what happened during a
/// request, either to a console or to an HTML page.
pub struct InMemoryLogger {
    entries: Mutex<Vec<LogEntry>>,
    min_level: LogLevel,
}

impl InMemoryLogger {
    /// Create new in-memory logger.
    pub fn new() -> Self {
        Self::with_level(LogLevel::Trace)
    }

    /// Create in-memory logger with minimum level.
    pub fn with_level(min_level: LogLevel) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            min_level,
        }
    }

    /// Get all log entries.
    pub fn get_entries(&self) -> Vec<LogEntry> {
        self.lock().clone()
    }

    /// Get entries by level.
    pub fn get_entries_by_level(&self, level: LogLevel) -> Vec<LogEntry> {
        self.lock()
            .iter()
            .filter(|e| e.level == level)
            .cloned()
            .collect()
    }

    /// Number of entries at a level.
    pub fn count(&self, level: LogLevel) -> usize {
        self.lock().iter().filter(|e| e.level == level).count()
    }

    /// True if any entry message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lock().iter().any(|e| e.message.contains(needle))
    }

    /// Clear all entries.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Render as `level: message` lines.
    pub fn render_console(&self) -> String {
        self.lock()
            .iter()
            .map(|e| format!("{}: {}\n", e.level.as_str(), e.message))
            .collect()
    }

    /// Render as an HTML table.
    pub fn render_html(&self) -> String {
        let mut html = String::from(
            "<div class=\"liblynx-diagnostic-log\"><table class=\"table\"><thead><tr><th>Level</th><th>Message</th></tr></thead><tbody>\n",
        );
        for entry in self.lock().iter() {
            let level = entry.level.as_str();
            html.push_str(&format!(
                "<tr class=\"level-{level}\"><td>{level}</td><td>{}</td></tr>\n",
                escape_html(&entry.message)
            ));
        }
        html.push_str("</tbody></table></div>\n");
        html
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<LogEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn log(&self, level: LogLevel, message: &str, context: &LogContext) {
        if level >= self.min_level {
            let now = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis() as u64;

            self.lock().push(LogEntry {
                level,
                message: message.to_string(),
                context: context.clone(),
                timestamp: now,
            });
        }
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

impl Default for InMemoryLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger for InMemoryLogger {
    fn trace(&self, message: &str, context: &LogContext) {
        self.log(LogLevel::Trace, message, context);
    }

    fn debug(&self, message: &str, context: &LogContext) {
        self.log(LogLevel::Debug, message, context);
    }

    fn info(&self, message: &str, context: &LogContext) {
        self.log(LogLevel::Info, message, context);
    }

    fn warn(&self, message: &str, context: &LogContext) {
        self.log(LogLevel::Warn, message, context);
    }

    fn error(&self, message: &str, context: &LogContext) {
        self.log(LogLevel::Error, message, context);
    }

    fn is_enabled(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }
}
