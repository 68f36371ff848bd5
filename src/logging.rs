//! Diagnostic logging sink.
//!
//! Interceptor failures that are superseded by a later failure in the same
//! hook are never surfaced to the caller. They are handed to the `Logger`
//! stored under `keys::LOGGER`, or to `tracing` when no logger is configured.

use crate::attributes::{Attributes, keys};
use crate::error::OrchestratorError;

/// Sink for errors the orchestrator observes but does not return.
pub trait Logger: Send + Sync {
    fn error(&self, message: &str, error: &OrchestratorError);
}

/// `Logger` backed by `tracing`.
#[derive(Clone, Debug, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn error(&self, message: &str, error: &OrchestratorError) {
        tracing::error!(target: "smithy_orchestrator::interceptor", err=%error, "{message}");
    }
}

const SUPERSEDED: &str = "interceptor error superseded by a later failure";

pub(crate) fn log_superseded_error(attributes: &Attributes, error: &OrchestratorError) {
    match attributes.get(&keys::LOGGER) {
        Some(logger) => logger.error(SUPERSEDED, error),
        None => {
            tracing::warn!(target: "smithy_orchestrator::interceptor", err=%error, "{SUPERSEDED}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interceptor::Hook;
    use std::sync::{Arc, Mutex};
    use tracing_test::traced_test;

    #[derive(Default)]
    struct CapturingLogger {
        messages: Mutex<Vec<String>>,
    }

    impl Logger for CapturingLogger {
        fn error(&self, message: &str, error: &OrchestratorError) {
            self.messages
                .lock()
                .unwrap()
                .push(format!("{message}: {error}"));
        }
    }

    #[test]
    fn test_configured_logger_receives_error() {
        let logger = Arc::new(CapturingLogger::default());
        let attributes =
            Attributes::new().with(&keys::LOGGER, logger.clone() as Arc<dyn Logger>);

        log_superseded_error(
            &attributes,
            &OrchestratorError::interceptor(Hook::ReadBeforeExecution, "first"),
        );

        let messages = logger.messages.lock().unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].ends_with("`read_before_execution`: first"));
    }

    #[traced_test]
    #[test]
    fn test_falls_back_to_tracing_without_logger() {
        log_superseded_error(
            &Attributes::new(),
            &OrchestratorError::interceptor(Hook::ReadAfterAttempt, "dropped"),
        );
        assert!(logs_contain("superseded by a later failure"));
        assert!(logs_contain("dropped"));
    }
}
