//! HTTP request under construction.

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, Url};

use crate::error::OrchestratorError;

/// An HTTP request as it moves through the pipeline.
///
/// Serializers populate it from the input, the endpoint applier fills in
/// scheme/host/port, and the signer adds headers. The host may be empty until
/// an endpoint has been applied. Cloning is cheap: the body is a shared `Bytes`.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub scheme: String,
    pub host: String,
    pub port: Option<u16>,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Default for HttpRequest {
    fn default() -> Self {
        Self {
            method: Method::GET,
            scheme: "https".to_string(),
            host: String::new(),
            port: None,
            path: "/".to_string(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }
}

impl HttpRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Insert a header, replacing any previous value with the same name.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, OrchestratorError> {
        self.set_header(name, value)?;
        Ok(self)
    }

    pub fn set_header(&mut self, name: &str, value: &str) -> Result<(), OrchestratorError> {
        let name = HeaderName::from_bytes(name.as_bytes())?;
        let value = HeaderValue::from_str(value)?;
        self.headers.insert(name, value);
        Ok(())
    }

    /// Header value as text, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Absolute URL of the request. Fails if no host has been set yet.
    pub fn url(&self) -> Result<Url, OrchestratorError> {
        if self.host.is_empty() {
            return Err(OrchestratorError::endpoint(format!(
                "request for `{}` has no host",
                self.path
            )));
        }
        let authority = match self.port {
            Some(port) => format!("{}:{}", self.host, port),
            None => self.host.clone(),
        };
        let path = if self.path.starts_with('/') {
            self.path.clone()
        } else {
            format!("/{}", self.path)
        };
        let mut url = Url::parse(&format!("{}://{}{}", self.scheme, authority, path))
            .map_err(OrchestratorError::endpoint)?;
        if !self.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in &self.query {
                pairs.append_pair(name, value);
            }
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_requires_host() {
        let req = HttpRequest::get("/items/42");
        assert!(matches!(req.url(), Err(OrchestratorError::Endpoint(_))));
    }

    #[test]
    fn test_url_includes_port_and_query() {
        let req = HttpRequest::get("items/42")
            .with_host("svc.example.com")
            .with_port(8443)
            .with_query("expand", "all tags");
        let url = req.url().unwrap();
        assert_eq!(
            url.as_str(),
            "https://svc.example.com:8443/items/42?expand=all+tags"
        );
    }

    #[test]
    fn test_clone_is_independent() {
        let original = HttpRequest::post("/items")
            .with_header("content-type", "application/json")
            .unwrap();
        let mut copy = original.clone();
        copy.set_header("x-signature", "abc").unwrap();
        assert_eq!(original.header("x-signature"), None);
        assert_eq!(copy.header("content-type"), Some("application/json"));
        assert_ne!(original, copy);
    }

    #[test]
    fn test_invalid_header_is_rejected() {
        let err = HttpRequest::get("/").with_header("bad header", "v").unwrap_err();
        assert!(matches!(err, OrchestratorError::Serialization(_)));
    }
}
