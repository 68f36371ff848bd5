#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use smithy_orchestrator::prelude::*;

/// Transport that replays scripted outcomes and records every request it saw.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    outcomes: Arc<Mutex<VecDeque<Result<HttpResponse, OrchestratorError>>>>,
    requests: Arc<Mutex<Vec<HttpRequest>>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, status: StatusCode, body: &str) -> Self {
        self.push(Ok(HttpResponse::new(status, body.to_string())))
    }

    pub fn fail(self, error: OrchestratorError) -> Self {
        self.push(Err(error))
    }

    fn push(self, outcome: Result<HttpResponse, OrchestratorError>) -> Self {
        self.outcomes.lock().unwrap().push_back(outcome);
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExecuteRequest for ScriptedTransport {
    async fn execute(
        &self,
        request: HttpRequest,
        _: &Attributes,
    ) -> Result<HttpResponse, OrchestratorError> {
        self.requests.lock().unwrap().push(request);
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(OrchestratorError::transport("no scripted response left")))
    }
}

/// Logger that keeps every message it receives.
#[derive(Default)]
pub struct RecordingLogger {
    pub entries: Mutex<Vec<String>>,
}

impl Logger for RecordingLogger {
    fn error(&self, _message: &str, error: &OrchestratorError) {
        self.entries.lock().unwrap().push(error.to_string());
    }
}

/// Retry strategy that records the partition each call acquires its token from.
pub struct RecordingStrategy {
    inner: StandardRetryStrategy,
    scopes: Mutex<Vec<String>>,
}

impl RecordingStrategy {
    pub fn new(inner: StandardRetryStrategy) -> Self {
        Self {
            inner,
            scopes: Mutex::new(Vec::new()),
        }
    }

    pub fn scopes(&self) -> Vec<String> {
        self.scopes.lock().unwrap().clone()
    }
}

#[async_trait]
impl RetryStrategy for RecordingStrategy {
    async fn acquire_initial_retry_token(
        &self,
        token_scope: &str,
    ) -> Result<RetryToken, OrchestratorError> {
        self.scopes.lock().unwrap().push(token_scope.to_string());
        self.inner.acquire_initial_retry_token(token_scope).await
    }

    async fn refresh_retry_token_for_retry(
        &self,
        token: &mut RetryToken,
        error_info: &RetryErrorInfo,
    ) -> Result<(), OrchestratorError> {
        self.inner
            .refresh_retry_token_for_retry(token, error_info)
            .await
    }

    async fn record_success(&self, token: &RetryToken) {
        self.inner.record_success(token).await
    }
}

/// Serializer that writes `/items/{id}` against `items.example.com`.
pub fn item_serializer() -> impl RequestSerializer<u32> {
    SerializeFn::new(
        |id: &u32, request: &mut HttpRequest, _: &Attributes| -> Result<(), OrchestratorError> {
            request.host = "items.example.com".to_string();
            request.path = format!("/items/{id}");
            Ok(())
        },
    )
}

/// Deserializer that returns the body text, or a response error for non-2xx.
pub fn text_deserializer() -> impl ResponseDeserializer<String> {
    DeserializeFn::new(
        |response: &HttpResponse, _: &Attributes| -> Result<String, OrchestratorError> {
            if response.is_success() {
                Ok(response.text())
            } else {
                Err(OrchestratorError::response(
                    Some(response.status.as_u16()),
                    response.text(),
                ))
            }
        },
    )
}

/// Retry strategy without backoff delays.
pub fn fast_retries(max_attempts: u32) -> StandardRetryStrategy {
    StandardRetryStrategy::new(
        RetryStrategyOptions::new()
            .with_max_attempts(max_attempts)
            .with_initial_backoff(Duration::ZERO)
            .with_max_backoff(Duration::ZERO)
            .with_jitter(false),
    )
}

pub fn builder(transport: ScriptedTransport) -> OrchestratorBuilder<u32, String> {
    Orchestrator::builder()
        .with_serializer(item_serializer())
        .with_deserializer(text_deserializer())
        .with_transport(transport)
}
