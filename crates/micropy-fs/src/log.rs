//! Per-service logger handle
//!
//! Services (the stub manager, the repository index, project modules)
//! receive a [`ServiceLog`] at construction instead of reaching for a
//! process-wide logger. Each handle owns a `tracing` span named after the
//! service, so output from nested services is attributed correctly.

use std::fmt::Display;

use tracing::Span;

/// A named logging handle backed by a `tracing` span.
#[derive(Debug, Clone)]
pub struct ServiceLog {
    name: String,
    span: Span,
}

impl ServiceLog {
    /// Create a root service logger.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let span = tracing::info_span!("service", name = %name);
        Self { name, span }
    }

    /// Derive a logger for a sub-service, nested under this one.
    pub fn child(&self, name: impl AsRef<str>) -> Self {
        let name = format!("{}.{}", self.name, name.as_ref());
        let span = tracing::info_span!(parent: &self.span, "service", name = %name);
        Self { name, span }
    }

    /// Dotted service name, e.g. `micropy.stubs`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn debug(&self, message: impl Display) {
        let _entered = self.span.enter();
        tracing::debug!(service = %self.name, "{message}");
    }

    pub fn info(&self, message: impl Display) {
        let _entered = self.span.enter();
        tracing::info!(service = %self.name, "{message}");
    }

    pub fn warn(&self, message: impl Display) {
        let _entered = self.span.enter();
        tracing::warn!(service = %self.name, "{message}");
    }

    pub fn error(&self, message: impl Display) {
        let _entered = self.span.enter();
        tracing::error!(service = %self.name, "{message}");
    }

    /// Info-level event tagged as a completed step.
    pub fn success(&self, message: impl Display) {
        let _entered = self.span.enter();
        tracing::info!(service = %self.name, outcome = "success", "{message}");
    }
}

impl Default for ServiceLog {
    fn default() -> Self {
        Self::new("micropy")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_names_are_dotted() {
        let root = ServiceLog::new("micropy");
        let child = root.child("stubs").child("repository");
        assert_eq!(child.name(), "micropy.stubs.repository");
    }

    #[test]
    fn test_logging_without_subscriber_is_noop() {
        let log = ServiceLog::default();
        log.debug("debug");
        log.info("info");
        log.warn("warn");
        log.error("error");
        log.success("done");
    }
}
