//! HTTP Messages and Transport
//!
//! This module contains the wire-level types the orchestrator moves around:
//! - `HttpRequest`: the request built by serializers and rewritten by hooks
//! - `HttpResponse`: the response handed to the deserializer
//! - `ExecuteRequest`: the transport seam, with a `reqwest`-backed default

pub mod request;
pub mod response;
pub mod transport;

pub use request::HttpRequest;
pub use response::HttpResponse;
pub use transport::{ExecuteRequest, ExecuteRequestFn, ReqwestTransport};

pub use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
pub use reqwest::{Method, StatusCode};
