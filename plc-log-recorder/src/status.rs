//! Status reporting
//!
//! The recorder reports skipped variables, dropped events and I/O failures
//! through a [`StatusReporter`]. [`LogReporter`] forwards to the `log` facade;
//! [`MemoryReporter`] keeps messages for callers that want to inspect them.

use parking_lot::Mutex;
use std::sync::Arc;

/// Severity of a reported message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Status,
    Warning,
    Error,
}

/// Outbound status/warning/error channel
pub trait StatusReporter: Send + Sync {
    fn report(&self, severity: Severity, message: &str);

    fn status(&self, message: &str) {
        self.report(Severity::Status, message);
    }

    fn warning(&self, message: &str) {
        self.report(Severity::Warning, message);
    }

    fn error(&self, message: &str) {
        self.report(Severity::Error, message);
    }
}

impl<T: StatusReporter + ?Sized> StatusReporter for Arc<T> {
    fn report(&self, severity: Severity, message: &str) {
        (**self).report(severity, message);
    }
}

/// Reporter that writes to the `log` facade
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl StatusReporter for LogReporter {
    fn report(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Status => log::info!("{}", message),
            Severity::Warning => log::warn!("{}", message),
            Severity::Error => log::error!("{}", message),
        }
    }
}

/// Reporter that keeps every message in memory
#[derive(Debug, Default)]
pub struct MemoryReporter {
    messages: Mutex<Vec<(Severity, String)>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages of one severity
    pub fn with_severity(&self, severity: Severity) -> Vec<String> {
        self.messages
            .lock()
            .iter()
            .filter(|(s, _)| *s == severity)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

impl StatusReporter for MemoryReporter {
    fn report(&self, severity: Severity, message: &str) {
        self.messages.lock().push((severity, message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_reporter_collects() {
        let reporter = Arc::new(MemoryReporter::new());
        reporter.status("connected");
        reporter.warning("skipped MAIN.wsText");
        reporter.error("disk full");

        assert_eq!(reporter.with_severity(Severity::Status), vec!["connected"]);
        assert_eq!(reporter.with_severity(Severity::Warning), vec!["skipped MAIN.wsText"]);
        assert_eq!(reporter.with_severity(Severity::Error), vec!["disk full"]);
    }
}
