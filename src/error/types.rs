//! Core error types for the orchestrator.

use std::sync::Arc;

use thiserror::Error;

use crate::interceptor::Hook;

/// Boxed error returned by interceptor hooks and user-supplied collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Shared error source. `OrchestratorError` is `Clone`, so sources are reference counted.
pub type SharedError = Arc<dyn std::error::Error + Send + Sync>;

/// Errors surfaced by an orchestrated operation.
///
/// Errors raised inside an attempt are stored in the call context rather than
/// returned immediately; callers only ever see the last one written.
#[derive(Debug, Clone, Error)]
pub enum OrchestratorError {
    /// An interceptor hook failed.
    #[error("interceptor failed in `{hook}`: {source}")]
    Interceptor {
        hook: Hook,
        #[source]
        source: SharedError,
    },

    /// The input could not be serialized into a request.
    #[error("serialization error: {0}")]
    Serialization(#[source] SharedError),

    /// The orchestrator or its collaborators are misconfigured. Never retried by
    /// the stock error classification.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An identity could not be resolved for the selected auth scheme.
    #[error("identity resolution error: {0}")]
    Identity(#[source] SharedError),

    /// The endpoint could not be applied to the request.
    #[error("endpoint error: {0}")]
    Endpoint(#[source] SharedError),

    /// The request could not be signed.
    #[error("signing error: {0}")]
    Signing(#[source] SharedError),

    /// The request could not be transmitted or no response was received.
    #[error("transport error: {0}")]
    Transport(#[source] SharedError),

    /// A modeled or unknown service error produced while deserializing a response.
    #[error("service error (status {status:?}): {source}")]
    Response {
        status: Option<u16>,
        #[source]
        source: SharedError,
    },

    /// The retry strategy declined to issue another attempt.
    #[error("retry not permitted: {0}")]
    RetryExhausted(String),

    /// The output was read before the pipeline recorded a result.
    #[error("output is not available yet")]
    OutputUnavailable,

    /// Broken orchestrator invariant.
    #[error("internal error: {0}")]
    Internal(String),
}

fn shared(err: impl Into<BoxError>) -> SharedError {
    Arc::from(err.into())
}

impl OrchestratorError {
    pub fn interceptor(hook: Hook, err: impl Into<BoxError>) -> Self {
        Self::Interceptor {
            hook,
            source: shared(err),
        }
    }

    pub fn serialization(err: impl Into<BoxError>) -> Self {
        Self::Serialization(shared(err))
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn identity(err: impl Into<BoxError>) -> Self {
        Self::Identity(shared(err))
    }

    pub fn endpoint(err: impl Into<BoxError>) -> Self {
        Self::Endpoint(shared(err))
    }

    pub fn signing(err: impl Into<BoxError>) -> Self {
        Self::Signing(shared(err))
    }

    pub fn transport(err: impl Into<BoxError>) -> Self {
        Self::Transport(shared(err))
    }

    /// A service error, optionally tagged with the HTTP status that produced it.
    pub fn response(status: Option<u16>, err: impl Into<BoxError>) -> Self {
        Self::Response {
            status,
            source: shared(err),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// HTTP status attached to a service error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Response { status, .. } => *status,
            _ => None,
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// The hook that raised this error, for interceptor failures.
    pub fn hook(&self) -> Option<Hook> {
        match self {
            Self::Interceptor { hook, .. } => Some(*hook),
            _ => None,
        }
    }

    /// Downcast the wrapped source error, if there is one.
    pub fn downcast_source<E>(&self) -> Option<&E>
    where
        E: std::error::Error + 'static,
    {
        let source = match self {
            Self::Interceptor { source, .. } | Self::Response { source, .. } => source,
            Self::Serialization(source)
            | Self::Identity(source)
            | Self::Endpoint(source)
            | Self::Signing(source)
            | Self::Transport(source) => source,
            Self::Configuration(_)
            | Self::RetryExhausted(_)
            | Self::OutputUnavailable
            | Self::Internal(_) => return None,
        };
        source.downcast_ref::<E>()
    }

    /// Short, stable name of the error class. Used as a metric attribute.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Interceptor { .. } => "interceptor",
            Self::Serialization(_) => "serialization",
            Self::Configuration(_) => "configuration",
            Self::Identity(_) => "identity",
            Self::Endpoint(_) => "endpoint",
            Self::Signing(_) => "signing",
            Self::Transport(_) => "transport",
            Self::Response { .. } => "response",
            Self::RetryExhausted(_) => "retry_exhausted",
            Self::OutputUnavailable => "output_unavailable",
            Self::Internal(_) => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Throttled;

    impl std::fmt::Display for Throttled {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("throttled")
        }
    }

    impl std::error::Error for Throttled {}

    #[test]
    fn test_response_error_carries_status() {
        let err = OrchestratorError::response(Some(429), Throttled);
        assert_eq!(err.status_code(), Some(429));
        assert_eq!(err.kind(), "response");
        assert!(err.downcast_source::<Throttled>().is_some());
    }

    #[test]
    fn test_interceptor_error_names_hook() {
        let err = OrchestratorError::interceptor(Hook::ReadBeforeTransmit, "boom");
        assert_eq!(err.hook(), Some(Hook::ReadBeforeTransmit));
        assert_eq!(
            err.to_string(),
            "interceptor failed in `read_before_transmit`: boom"
        );
    }

    #[test]
    fn test_clone_shares_source() {
        let err = OrchestratorError::transport("connection reset");
        let cloned = err.clone();
        assert_eq!(err.to_string(), cloned.to_string());
        assert!(cloned.downcast_source::<Throttled>().is_none());
    }

    #[test]
    fn test_configuration_has_no_source() {
        let err = OrchestratorError::configuration("no auth scheme resolver configured");
        assert!(err.is_configuration());
        assert!(err.downcast_source::<Throttled>().is_none());
        assert_eq!(err.status_code(), None);
    }
}
