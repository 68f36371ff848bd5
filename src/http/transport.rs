//! HTTP transport abstraction.
//!
//! The orchestrator never talks to the network directly. It hands the final,
//! signed request to an `ExecuteRequest` implementation and receives a fully
//! buffered response. `ReqwestTransport` is the stock implementation; tests
//! and custom stacks can plug in a closure through `ExecuteRequestFn`.

use std::future::Future;

use async_trait::async_trait;

use crate::attributes::{Attributes, keys};
use crate::error::OrchestratorError;
use crate::http::{HttpRequest, HttpResponse};

/// Performs the actual network call for an attempt.
///
/// Timeouts and connection management belong to the implementation.
#[async_trait]
pub trait ExecuteRequest: Send + Sync {
    async fn execute(
        &self,
        request: HttpRequest,
        attributes: &Attributes,
    ) -> Result<HttpResponse, OrchestratorError>;
}

/// Closure-backed `ExecuteRequest`.
pub struct ExecuteRequestFn<F>(F);

impl<F> ExecuteRequestFn<F> {
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F, Fut> ExecuteRequest for ExecuteRequestFn<F>
where
    F: Fn(HttpRequest, &Attributes) -> Fut + Send + Sync,
    Fut: Future<Output = Result<HttpResponse, OrchestratorError>> + Send,
{
    async fn execute(
        &self,
        request: HttpRequest,
        attributes: &Attributes,
    ) -> Result<HttpResponse, OrchestratorError> {
        (self.0)(request, attributes).await
    }
}

/// `reqwest`-backed transport. Honours the socket-timeout attribute.
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ExecuteRequest for ReqwestTransport {
    async fn execute(
        &self,
        request: HttpRequest,
        attributes: &Attributes,
    ) -> Result<HttpResponse, OrchestratorError> {
        let url = request.url()?;
        tracing::debug!(target: "smithy_orchestrator::http", method=%request.method, url=%url, "sending request");

        let mut builder = self
            .client
            .request(request.method.clone(), url)
            .headers(request.headers)
            .body(request.body);
        if let Some(timeout) = attributes.get(&keys::SOCKET_TIMEOUT) {
            builder = builder.timeout(*timeout);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;
        tracing::debug!(target: "smithy_orchestrator::http", status=%status.as_u16(), bytes=body.len(), "response received");

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
