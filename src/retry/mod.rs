//! Retry
//!
//! The orchestrator drives the retry loop but never decides on its own
//! whether to retry. It classifies a failed attempt with a
//! `RetryErrorInfoProvider` and asks the `RetryStrategy` to refresh the
//! attempt's `RetryToken`; a refused refresh ends the loop.
//!
//! - `standard.rs`: stock strategy with exponential backoff and a
//!   per-partition retry quota

pub mod standard;

pub use standard::{RetryStrategyOptions, StandardRetryStrategy};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::OrchestratorError;

/// Retry state of one call, scoped to a retry partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryToken {
    partition_id: String,
    retry_count: u32,
    quota_cost: u32,
}

impl RetryToken {
    pub fn new(partition_id: impl Into<String>) -> Self {
        Self {
            partition_id: partition_id.into(),
            retry_count: 0,
            quota_cost: 0,
        }
    }

    pub fn partition_id(&self) -> &str {
        &self.partition_id
    }

    /// Retries granted so far. The first attempt is not a retry.
    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Quota withdrawn by the most recent retry.
    pub fn quota_cost(&self) -> u32 {
        self.quota_cost
    }

    /// Record a granted retry that withdrew `cost` from the partition quota.
    pub fn record_retry(&mut self, cost: u32) {
        self.retry_count += 1;
        self.quota_cost = cost;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryErrorType {
    /// Connection-level failure; the request may not have reached the service.
    Transient,
    /// The service asked the client to slow down.
    Throttling,
    ServerError,
    ClientError,
}

/// Retry classification of a failed attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryErrorInfo {
    pub error_type: RetryErrorType,
    /// Delay the service asked for, e.g. from a `Retry-After` header.
    pub retry_after_hint: Option<Duration>,
    pub is_timeout: bool,
}

impl RetryErrorInfo {
    pub fn new(error_type: RetryErrorType) -> Self {
        Self {
            error_type,
            retry_after_hint: None,
            is_timeout: false,
        }
    }

    pub fn with_retry_after(mut self, hint: Duration) -> Self {
        self.retry_after_hint = Some(hint);
        self
    }

    pub fn with_timeout(mut self, is_timeout: bool) -> Self {
        self.is_timeout = is_timeout;
        self
    }
}

/// Classifies an attempt error. `None` means the error is not retryable.
pub type RetryErrorInfoProvider =
    Arc<dyn Fn(&OrchestratorError) -> Option<RetryErrorInfo> + Send + Sync>;

/// Stock classification.
///
/// Transport failures are transient (timeouts flagged), 429 is throttling,
/// and 500/502/503/504 are server errors. Everything else, including
/// configuration and interceptor errors, is not retried.
pub fn default_retry_error_info(error: &OrchestratorError) -> Option<RetryErrorInfo> {
    match error {
        OrchestratorError::Transport(_) => {
            let is_timeout = error
                .downcast_source::<reqwest::Error>()
                .is_some_and(reqwest::Error::is_timeout);
            Some(RetryErrorInfo::new(RetryErrorType::Transient).with_timeout(is_timeout))
        }
        OrchestratorError::Response {
            status: Some(status),
            ..
        } => match *status {
            429 => Some(RetryErrorInfo::new(RetryErrorType::Throttling)),
            500 | 502 | 503 | 504 => Some(RetryErrorInfo::new(RetryErrorType::ServerError)),
            _ => None,
        },
        _ => None,
    }
}

/// Decides whether, and when, a failed attempt is retried.
///
/// Implementations are shared by every concurrent call of an orchestrator
/// and must keep per-partition accounting consistent under concurrency.
#[async_trait]
pub trait RetryStrategy: Send + Sync {
    async fn acquire_initial_retry_token(
        &self,
        token_scope: &str,
    ) -> Result<RetryToken, OrchestratorError>;

    /// Grant another attempt, waiting out any backoff before returning.
    /// An error refuses the retry.
    async fn refresh_retry_token_for_retry(
        &self,
        token: &mut RetryToken,
        error_info: &RetryErrorInfo,
    ) -> Result<(), OrchestratorError>;

    async fn record_success(&self, token: &RetryToken);
}
