//! smithy-orchestrator
//!
//! Client-side request orchestration for generated RPC/HTTP clients.
//!
//! An [`Orchestrator`](orchestrator::Orchestrator) drives one operation call
//! through serialization, a retry loop of attempts (auth scheme selection,
//! endpoint resolution, signing, transmission, deserialization) and
//! completion. Interceptors observe or rewrite the call at 19 fixed hooks,
//! and every pluggable step is a trait with a closure adapter.
//!
//! ```rust,ignore
//! use smithy_orchestrator::prelude::*;
//!
//! let orchestrator = Orchestrator::<GetItem, Item>::builder()
//!     .with_serializer(JsonBodySerializer)
//!     .with_deserializer(JsonDeserializer::new())
//!     .with_endpoint_applier(ResolvedEndpointApplier::new(
//!         StaticEndpointResolver::parse("https://items.example.com")?,
//!     ))
//!     .with_partition_id("items")
//!     .with_retry_strategy(StandardRetryStrategy::default())
//!     .with_interceptor(LoggingInterceptor)
//!     .build()?;
//!
//! let item = orchestrator.execute(GetItem { id: 42 }).await?;
//! ```
#![deny(unsafe_code)]

pub mod attributes;
pub mod auth;
pub mod context;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod interceptor;
pub mod logging;
pub mod orchestrator;
pub mod retry;
pub mod serialization;
pub mod signing;
pub mod telemetry;

pub use error::OrchestratorError;

/// Commonly used types.
pub mod prelude {
    pub use crate::attributes::{AttributeKey, Attributes, keys};
    pub use crate::auth::{
        AuthOption, AuthScheme, AuthSchemeResolver, AuthSchemes, BearerAuthScheme, BearerToken,
        ConfiguredAuthSchemeSelector, Identity, IdentityResolver, IdentityResolvers,
        SelectAuthScheme, SelectAuthSchemeFn, SelectedAuthScheme, StaticAuthSchemeResolver,
        StaticIdentityResolver,
    };
    pub use crate::context::*;
    pub use crate::endpoint::{
        ApplyEndpoint, ApplyEndpointFn, Endpoint, EndpointResolver, PassthroughEndpoint,
        ResolvedEndpointApplier, StaticEndpointResolver,
    };
    pub use crate::error::{BoxError, OrchestratorError};
    pub use crate::http::{
        ExecuteRequest, ExecuteRequestFn, HttpRequest, HttpResponse, Method, ReqwestTransport,
        StatusCode,
    };
    pub use crate::interceptor::{
        AnyInterceptor, Hook, HookInterceptor, Interceptor, Interceptors, LoggingInterceptor,
    };
    pub use crate::logging::{Logger, TracingLogger};
    pub use crate::orchestrator::{Orchestrator, OrchestratorBuilder};
    pub use crate::retry::{
        RetryErrorInfo, RetryErrorType, RetryStrategy, RetryStrategyOptions, RetryToken,
        StandardRetryStrategy, default_retry_error_info,
    };
    pub use crate::serialization::{
        DeserializeFn, JsonBodySerializer, JsonDeserializer, RequestSerializer,
        ResponseDeserializer, SerializeFn,
    };
    pub use crate::signing::{ApplySigner, ApplySignerFn, SchemeSigner};
    pub use crate::telemetry::{
        InMemoryExporter, Telemetry, TelemetryConfig, TelemetryExporter, TracingExporter,
    };
}
