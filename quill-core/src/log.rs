//! Logging sink abstraction
//!
//! Components take a sink handle instead of reaching for a global logger.
//! `TracingSink` is the production implementation and forwards to `tracing`.

use std::sync::Arc;

/// Sink for host application log output
pub trait LogSink: Send + Sync {
    fn info(&self, message: &str);
    fn error(&self, message: &str);
    fn script_error(&self, script: &str, message: &str, line: Option<usize>);
}

/// Forwards log output to the `tracing` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn info(&self, message: &str) {
        tracing::info!("{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!("{}", message);
    }

    fn script_error(&self, script: &str, message: &str, line: Option<usize>) {
        match line {
            Some(line) => tracing::error!(script, line, "{}", message),
            None => tracing::error!(script, "{}", message),
        }
    }
}

/// Default sink handle
pub fn tracing_sink() -> Arc<dyn LogSink> {
    Arc::new(TracingSink)
}
