//! Standard retry strategy.
//!
//! Exponential backoff with jitter, capped by a maximum number of attempts
//! and by a per-partition retry quota. Each retry withdraws from the quota of
//! its partition; successful calls pay it back.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio::sync::Mutex;
use tokio::time::sleep;

use super::{RetryErrorInfo, RetryErrorType, RetryStrategy, RetryToken};
use crate::error::OrchestratorError;

/// Standard retry strategy configuration
#[derive(Debug, Clone)]
pub struct RetryStrategyOptions {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,
    /// Backoff before the first retry
    pub initial_backoff: Duration,
    /// Upper bound of any single backoff, retry-after hints included
    pub max_backoff: Duration,
    pub backoff_multiplier: f64,
    pub use_jitter: bool,
    /// Maximum jitter as a fraction of the backoff (0.0 to 1.0)
    pub jitter_factor: f64,
    /// Quota every partition starts with
    pub initial_retry_tokens: u32,
    pub retry_cost: u32,
    pub timeout_retry_cost: u32,
    /// Paid back by a call that succeeded without retrying
    pub no_retry_increment: u32,
}

impl Default for RetryStrategyOptions {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(1000),
            max_backoff: Duration::from_secs(20),
            backoff_multiplier: 2.0,
            use_jitter: true,
            jitter_factor: 0.1,
            initial_retry_tokens: 500,
            retry_cost: 5,
            timeout_retry_cost: 10,
            no_retry_increment: 1,
        }
    }
}

impl RetryStrategyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub const fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    pub const fn with_max_backoff(mut self, backoff: Duration) -> Self {
        self.max_backoff = backoff;
        self
    }

    pub const fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    pub const fn with_jitter(mut self, use_jitter: bool) -> Self {
        self.use_jitter = use_jitter;
        self
    }

    pub const fn with_jitter_factor(mut self, factor: f64) -> Self {
        self.jitter_factor = factor.clamp(0.0, 1.0);
        self
    }

    pub const fn with_initial_retry_tokens(mut self, tokens: u32) -> Self {
        self.initial_retry_tokens = tokens;
        self
    }

    pub const fn with_retry_cost(mut self, cost: u32) -> Self {
        self.retry_cost = cost;
        self
    }

    pub const fn with_timeout_retry_cost(mut self, cost: u32) -> Self {
        self.timeout_retry_cost = cost;
        self
    }

    /// Backoff before retry number `retry` (0-based), without a hint.
    pub fn calculate_backoff(&self, retry: u32) -> Duration {
        let base = self.initial_backoff.as_millis() as f64
            * self.backoff_multiplier.powi(retry as i32);
        let backoff = Duration::from_millis(base as u64).min(self.max_backoff);

        if self.use_jitter {
            self.add_jitter(backoff)
        } else {
            backoff
        }
    }

    fn add_jitter(&self, backoff: Duration) -> Duration {
        let range = backoff.as_millis() as f64 * self.jitter_factor;
        if range <= 0.0 {
            return backoff;
        }
        let jitter = rand::thread_rng().gen_range(-range..=range);
        let jittered = (backoff.as_millis() as f64 + jitter).max(0.0);
        Duration::from_millis(jittered as u64).min(self.max_backoff)
    }
}

/// The stock `RetryStrategy`.
///
/// One instance is shared by every call of an orchestrator; the quota of a
/// partition is shared by every call made with that partition id.
#[derive(Debug, Default)]
pub struct StandardRetryStrategy {
    options: RetryStrategyOptions,
    quotas: Mutex<HashMap<String, u32>>,
}

impl StandardRetryStrategy {
    pub fn new(options: RetryStrategyOptions) -> Self {
        Self {
            options,
            quotas: Mutex::new(HashMap::new()),
        }
    }

    pub fn options(&self) -> &RetryStrategyOptions {
        &self.options
    }

    /// Quota currently left in `partition_id`.
    pub async fn available_quota(&self, partition_id: &str) -> u32 {
        self.quotas
            .lock()
            .await
            .get(partition_id)
            .copied()
            .unwrap_or(self.options.initial_retry_tokens)
    }
}

#[async_trait]
impl RetryStrategy for StandardRetryStrategy {
    async fn acquire_initial_retry_token(
        &self,
        token_scope: &str,
    ) -> Result<RetryToken, OrchestratorError> {
        self.quotas
            .lock()
            .await
            .entry(token_scope.to_string())
            .or_insert(self.options.initial_retry_tokens);
        Ok(RetryToken::new(token_scope))
    }

    async fn refresh_retry_token_for_retry(
        &self,
        token: &mut RetryToken,
        error_info: &RetryErrorInfo,
    ) -> Result<(), OrchestratorError> {
        if error_info.error_type == RetryErrorType::ClientError {
            return Err(OrchestratorError::RetryExhausted(
                "client errors are not retried".to_string(),
            ));
        }
        let attempts = token.retry_count() + 1;
        if attempts >= self.options.max_attempts {
            return Err(OrchestratorError::RetryExhausted(format!(
                "maximum attempts ({}) reached",
                self.options.max_attempts
            )));
        }

        let cost = if error_info.is_timeout {
            self.options.timeout_retry_cost
        } else {
            self.options.retry_cost
        };
        {
            let mut quotas = self.quotas.lock().await;
            let available = quotas
                .entry(token.partition_id().to_string())
                .or_insert(self.options.initial_retry_tokens);
            if *available < cost {
                tracing::debug!(target: "smithy_orchestrator::retry", partition=%token.partition_id(), available=*available, cost, "retry quota exhausted");
                return Err(OrchestratorError::RetryExhausted(format!(
                    "retry quota exhausted for partition `{}`",
                    token.partition_id()
                )));
            }
            *available -= cost;
        }

        let backoff = match error_info.retry_after_hint {
            Some(hint) => hint.min(self.options.max_backoff),
            None => self.options.calculate_backoff(token.retry_count()),
        };
        token.record_retry(cost);
        tracing::debug!(target: "smithy_orchestrator::retry", partition=%token.partition_id(), retry=token.retry_count(), backoff_ms=backoff.as_millis() as u64, "retry granted");
        if !backoff.is_zero() {
            sleep(backoff).await;
        }
        Ok(())
    }

    async fn record_success(&self, token: &RetryToken) {
        let refund = if token.retry_count() == 0 {
            self.options.no_retry_increment
        } else {
            token.quota_cost()
        };
        let mut quotas = self.quotas.lock().await;
        let available = quotas
            .entry(token.partition_id().to_string())
            .or_insert(self.options.initial_retry_tokens);
        *available = available
            .saturating_add(refund)
            .min(self.options.initial_retry_tokens);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio_test::{assert_err, assert_ok};

    fn no_backoff() -> RetryStrategyOptions {
        RetryStrategyOptions::new()
            .with_initial_backoff(Duration::ZERO)
            .with_jitter(false)
    }

    fn transient() -> RetryErrorInfo {
        RetryErrorInfo::new(RetryErrorType::Transient)
    }

    #[test]
    fn test_backoff_grows_and_is_capped() {
        let options = RetryStrategyOptions::new()
            .with_initial_backoff(Duration::from_millis(100))
            .with_max_backoff(Duration::from_millis(350))
            .with_jitter(false);
        assert_eq!(options.calculate_backoff(0), Duration::from_millis(100));
        assert_eq!(options.calculate_backoff(1), Duration::from_millis(200));
        assert_eq!(options.calculate_backoff(2), Duration::from_millis(350));
    }

    #[test]
    fn test_jitter_stays_in_range() {
        let options = RetryStrategyOptions::new()
            .with_initial_backoff(Duration::from_millis(1000))
            .with_jitter_factor(0.1);
        for _ in 0..50 {
            let backoff = options.calculate_backoff(0);
            assert!(backoff >= Duration::from_millis(900));
            assert!(backoff <= Duration::from_millis(1100));
        }
    }

    #[tokio::test]
    async fn test_max_attempts_is_enforced() {
        let strategy = StandardRetryStrategy::new(no_backoff().with_max_attempts(3));
        let mut token = assert_ok!(strategy.acquire_initial_retry_token("p1").await);

        assert_ok!(strategy.refresh_retry_token_for_retry(&mut token, &transient()).await);
        assert_ok!(strategy.refresh_retry_token_for_retry(&mut token, &transient()).await);
        let err = assert_err!(strategy.refresh_retry_token_for_retry(&mut token, &transient()).await);
        assert!(matches!(err, OrchestratorError::RetryExhausted(_)));
        assert_eq!(token.retry_count(), 2);
    }

    #[tokio::test]
    async fn test_quota_is_charged_and_refunded() {
        let strategy = StandardRetryStrategy::new(no_backoff().with_max_attempts(5));
        let mut token = assert_ok!(strategy.acquire_initial_retry_token("p1").await);

        assert_ok!(strategy.refresh_retry_token_for_retry(&mut token, &transient()).await);
        assert_eq!(strategy.available_quota("p1").await, 495);

        let timeout = transient().with_timeout(true);
        assert_ok!(strategy.refresh_retry_token_for_retry(&mut token, &timeout).await);
        assert_eq!(strategy.available_quota("p1").await, 485);

        strategy.record_success(&token).await;
        assert_eq!(strategy.available_quota("p1").await, 495);
        // Other partitions are untouched.
        assert_eq!(strategy.available_quota("p2").await, 500);
    }

    #[tokio::test]
    async fn test_quota_exhaustion_refuses_retry() {
        let strategy = StandardRetryStrategy::new(
            no_backoff()
                .with_max_attempts(10)
                .with_initial_retry_tokens(12),
        );
        let mut token = assert_ok!(strategy.acquire_initial_retry_token("p1").await);
        assert_ok!(strategy.refresh_retry_token_for_retry(&mut token, &transient()).await);
        assert_ok!(strategy.refresh_retry_token_for_retry(&mut token, &transient()).await);
        let err = assert_err!(strategy.refresh_retry_token_for_retry(&mut token, &transient()).await);
        assert!(err.to_string().contains("quota exhausted"));
        assert_eq!(strategy.available_quota("p1").await, 2);
    }

    #[tokio::test]
    async fn test_success_without_retry_refunds_increment_up_to_capacity() {
        let strategy = StandardRetryStrategy::new(no_backoff());
        let token = assert_ok!(strategy.acquire_initial_retry_token("p1").await);
        strategy.record_success(&token).await;
        assert_eq!(strategy.available_quota("p1").await, 500);
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let strategy = StandardRetryStrategy::new(no_backoff());
        let mut token = assert_ok!(strategy.acquire_initial_retry_token("p1").await);
        let info = RetryErrorInfo::new(RetryErrorType::ClientError);
        assert_err!(strategy.refresh_retry_token_for_retry(&mut token, &info).await);
        assert_eq!(strategy.available_quota("p1").await, 500);
    }

    #[tokio::test]
    async fn test_retry_after_hint_is_capped() {
        let strategy = StandardRetryStrategy::new(
            no_backoff().with_max_backoff(Duration::from_millis(5)),
        );
        let mut token = assert_ok!(strategy.acquire_initial_retry_token("p1").await);
        let info = RetryErrorInfo::new(RetryErrorType::Throttling)
            .with_retry_after(Duration::from_secs(3600));
        let started = std::time::Instant::now();
        assert_ok!(strategy.refresh_retry_token_for_retry(&mut token, &info).await);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_refreshes_keep_quota_consistent() {
        let strategy = Arc::new(StandardRetryStrategy::new(no_backoff()));
        let mut handles = Vec::new();
        for _ in 0..40 {
            let strategy = Arc::clone(&strategy);
            handles.push(tokio::spawn(async move {
                let mut token = strategy.acquire_initial_retry_token("shared").await?;
                strategy
                    .refresh_retry_token_for_retry(&mut token, &transient())
                    .await
            }));
        }
        for handle in handles {
            assert_ok!(handle.await.unwrap());
        }
        assert_eq!(strategy.available_quota("shared").await, 500 - 40 * 5);
    }
}
