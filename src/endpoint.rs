//! Endpoint application.
//!
//! `ApplyEndpoint` rewrites scheme, host, port and path of a serialized
//! request. The stock `ResolvedEndpointApplier` asks an `EndpointResolver` for
//! an `Endpoint` and merges it into the request.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Url;

use crate::attributes::Attributes;
use crate::auth::SelectedAuthScheme;
use crate::error::OrchestratorError;
use crate::http::{HeaderMap, HeaderName, HeaderValue, HttpRequest};

#[async_trait]
pub trait ApplyEndpoint: Send + Sync {
    async fn apply(
        &self,
        request: HttpRequest,
        selected_auth_scheme: Option<&SelectedAuthScheme>,
        attributes: &Attributes,
    ) -> Result<HttpRequest, OrchestratorError>;
}

/// Leaves the request untouched. Used when no endpoint applier is configured.
#[derive(Clone, Debug, Default)]
pub struct PassthroughEndpoint;

#[async_trait]
impl ApplyEndpoint for PassthroughEndpoint {
    async fn apply(
        &self,
        request: HttpRequest,
        _: Option<&SelectedAuthScheme>,
        _: &Attributes,
    ) -> Result<HttpRequest, OrchestratorError> {
        Ok(request)
    }
}

/// Closure-backed `ApplyEndpoint`.
pub struct ApplyEndpointFn<F>(F);

impl<F> ApplyEndpointFn<F>
where
    F: Fn(HttpRequest, Option<&SelectedAuthScheme>, &Attributes) -> Result<HttpRequest, OrchestratorError>
        + Send
        + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F> ApplyEndpoint for ApplyEndpointFn<F>
where
    F: Fn(HttpRequest, Option<&SelectedAuthScheme>, &Attributes) -> Result<HttpRequest, OrchestratorError>
        + Send
        + Sync,
{
    async fn apply(
        &self,
        request: HttpRequest,
        selected_auth_scheme: Option<&SelectedAuthScheme>,
        attributes: &Attributes,
    ) -> Result<HttpRequest, OrchestratorError> {
        (self.0)(request, selected_auth_scheme, attributes)
    }
}

/// A resolved service endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    url: Url,
    headers: HeaderMap,
}

impl Endpoint {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            headers: HeaderMap::new(),
        }
    }

    pub fn parse(url: &str) -> Result<Self, OrchestratorError> {
        let url = Url::parse(url).map_err(OrchestratorError::endpoint)?;
        if url.host_str().is_none() {
            return Err(OrchestratorError::endpoint(format!(
                "endpoint `{url}` has no host"
            )));
        }
        Ok(Self::new(url))
    }

    /// Header added to every request sent to this endpoint.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, OrchestratorError> {
        let name = HeaderName::from_bytes(name.as_bytes())?;
        let value = HeaderValue::from_str(value)?;
        self.headers.insert(name, value);
        Ok(self)
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

#[async_trait]
pub trait EndpointResolver: Send + Sync {
    async fn resolve_endpoint(&self, attributes: &Attributes) -> Result<Endpoint, OrchestratorError>;
}

/// Resolves every call to the same endpoint.
#[derive(Debug, Clone)]
pub struct StaticEndpointResolver {
    endpoint: Endpoint,
}

impl StaticEndpointResolver {
    pub fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }

    pub fn parse(url: &str) -> Result<Self, OrchestratorError> {
        Endpoint::parse(url).map(Self::new)
    }
}

#[async_trait]
impl EndpointResolver for StaticEndpointResolver {
    async fn resolve_endpoint(&self, _: &Attributes) -> Result<Endpoint, OrchestratorError> {
        Ok(self.endpoint.clone())
    }
}

/// Resolves an endpoint and merges it into the request: scheme, host and
/// port are replaced, the endpoint path is prefixed to the request path, and
/// endpoint headers are inserted.
#[derive(Clone)]
pub struct ResolvedEndpointApplier {
    resolver: Arc<dyn EndpointResolver>,
}

impl ResolvedEndpointApplier {
    pub fn new(resolver: impl EndpointResolver + 'static) -> Self {
        Self {
            resolver: Arc::new(resolver),
        }
    }
}

impl std::fmt::Debug for ResolvedEndpointApplier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedEndpointApplier").finish_non_exhaustive()
    }
}

fn join_paths(prefix: &str, path: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{prefix}/{path}")
}

#[async_trait]
impl ApplyEndpoint for ResolvedEndpointApplier {
    async fn apply(
        &self,
        mut request: HttpRequest,
        _: Option<&SelectedAuthScheme>,
        attributes: &Attributes,
    ) -> Result<HttpRequest, OrchestratorError> {
        let endpoint = self.resolver.resolve_endpoint(attributes).await?;
        let url = endpoint.url();
        let host = url
            .host_str()
            .ok_or_else(|| OrchestratorError::endpoint(format!("endpoint `{url}` has no host")))?;

        request.scheme = url.scheme().to_string();
        request.host = host.to_string();
        request.port = url.port();
        request.path = join_paths(url.path(), &request.path);
        for (name, value) in endpoint.headers() {
            request.headers.insert(name.clone(), value.clone());
        }
        tracing::debug!(target: "smithy_orchestrator::endpoint", host=%request.host, path=%request.path, "endpoint applied");
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_requires_host() {
        assert!(Endpoint::parse("https://svc.example.com").is_ok());
        assert!(Endpoint::parse("not a url").is_err());
        assert!(Endpoint::parse("unix:/var/run/sock").is_err());
    }

    #[test]
    fn test_join_paths() {
        assert_eq!(join_paths("/", "/items/42"), "/items/42");
        assert_eq!(join_paths("/v1/", "items"), "/v1/items");
        assert_eq!(join_paths("/v1", "/"), "/v1/");
    }

    #[tokio::test]
    async fn test_resolved_endpoint_is_merged_into_request() {
        let endpoint = Endpoint::parse("http://svc.example.com:8080/prod")
            .unwrap()
            .with_header("x-region", "eu-west-1")
            .unwrap();
        let applier = ResolvedEndpointApplier::new(StaticEndpointResolver::new(endpoint));

        let request = HttpRequest::get("/items/42").with_query("view", "full");
        let applied = applier
            .apply(request, None, &Attributes::new())
            .await
            .unwrap();

        assert_eq!(applied.scheme, "http");
        assert_eq!(applied.host, "svc.example.com");
        assert_eq!(applied.port, Some(8080));
        assert_eq!(applied.path, "/prod/items/42");
        assert_eq!(applied.header("x-region"), Some("eu-west-1"));
        assert_eq!(
            applied.url().unwrap().as_str(),
            "http://svc.example.com:8080/prod/items/42?view=full"
        );
    }

    #[tokio::test]
    async fn test_passthrough_and_closure() {
        let request = HttpRequest::get("/a").with_host("h");
        let same = PassthroughEndpoint
            .apply(request.clone(), None, &Attributes::new())
            .await
            .unwrap();
        assert_eq!(same, request);

        let applier = ApplyEndpointFn::new(|request, _, _| Ok(request.with_host("closure.example.com")));
        let applied = applier
            .apply(request, None, &Attributes::new())
            .await
            .unwrap();
        assert_eq!(applied.host, "closure.example.com");
    }
}
