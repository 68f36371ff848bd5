//! Orchestrator builder.

use std::sync::Arc;

use super::Orchestrator;
use crate::attributes::{AttributeKey, Attributes, keys};
use crate::auth::{
    AuthSchemeResolver, ConfiguredAuthSchemeSelector, SelectAuthScheme, StaticAuthSchemeResolver,
};
use crate::endpoint::{ApplyEndpoint, PassthroughEndpoint};
use crate::error::OrchestratorError;
use crate::http::{ExecuteRequest, ReqwestTransport};
use crate::interceptor::{AnyInterceptor, Interceptor, Interceptors};
use crate::retry::{RetryErrorInfo, RetryErrorInfoProvider, RetryStrategy, default_retry_error_info};
use crate::serialization::{RequestSerializer, ResponseDeserializer};
use crate::signing::{ApplySigner, SchemeSigner};
use crate::telemetry::Telemetry;

/// Builder for [`Orchestrator`].
///
/// Only the deserializer is required. Everything else has a default:
///
/// - no serializers (the request stays the default `GET /`)
/// - no retry strategy, so every call makes exactly one attempt
/// - stock retry classification (`default_retry_error_info`)
/// - `ConfiguredAuthSchemeSelector`, with a no-auth resolver when the
///   attributes carry none
/// - `PassthroughEndpoint`, `SchemeSigner` and `ReqwestTransport`
/// - disabled telemetry
pub struct OrchestratorBuilder<I, O> {
    serializers: Vec<Arc<dyn RequestSerializer<I>>>,
    deserializer: Option<Arc<dyn ResponseDeserializer<O>>>,
    retry_strategy: Option<Arc<dyn RetryStrategy>>,
    retry_error_info_provider: Option<RetryErrorInfoProvider>,
    select_auth_scheme: Option<Arc<dyn SelectAuthScheme>>,
    apply_endpoint: Option<Arc<dyn ApplyEndpoint>>,
    apply_signer: Option<Arc<dyn ApplySigner>>,
    execute_request: Option<Arc<dyn ExecuteRequest>>,
    interceptors: Interceptors<I, O>,
    telemetry: Telemetry,
    attributes: Attributes,
}

impl<I, O> Default for OrchestratorBuilder<I, O>
where
    I: Send + Sync + 'static,
    O: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<I, O> OrchestratorBuilder<I, O>
where
    I: Send + Sync + 'static,
    O: Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            serializers: Vec::new(),
            deserializer: None,
            retry_strategy: None,
            retry_error_info_provider: None,
            select_auth_scheme: None,
            apply_endpoint: None,
            apply_signer: None,
            execute_request: None,
            interceptors: Interceptors::new(),
            telemetry: Telemetry::disabled(),
            attributes: Attributes::new(),
        }
    }

    /// Append a serializer. Serializers run in the order they were added.
    pub fn with_serializer(mut self, serializer: impl RequestSerializer<I> + 'static) -> Self {
        self.serializers.push(Arc::new(serializer));
        self
    }

    pub fn with_deserializer(mut self, deserializer: impl ResponseDeserializer<O> + 'static) -> Self {
        self.deserializer = Some(Arc::new(deserializer));
        self
    }

    pub fn with_retry_strategy(mut self, strategy: impl RetryStrategy + 'static) -> Self {
        self.retry_strategy = Some(Arc::new(strategy));
        self
    }

    /// Share one retry strategy, and so one set of retry quotas, between
    /// several orchestrators.
    pub fn with_shared_retry_strategy(mut self, strategy: Arc<dyn RetryStrategy>) -> Self {
        self.retry_strategy = Some(strategy);
        self
    }

    /// Replace the classification that decides which errors are retryable.
    pub fn with_retry_error_info_provider<F>(mut self, provider: F) -> Self
    where
        F: Fn(&OrchestratorError) -> Option<RetryErrorInfo> + Send + Sync + 'static,
    {
        self.retry_error_info_provider = Some(Arc::new(provider));
        self
    }

    pub fn with_auth_scheme_selector(mut self, selector: impl SelectAuthScheme + 'static) -> Self {
        self.select_auth_scheme = Some(Arc::new(selector));
        self
    }

    pub fn with_endpoint_applier(mut self, applier: impl ApplyEndpoint + 'static) -> Self {
        self.apply_endpoint = Some(Arc::new(applier));
        self
    }

    pub fn with_signer(mut self, signer: impl ApplySigner + 'static) -> Self {
        self.apply_signer = Some(Arc::new(signer));
        self
    }

    pub fn with_transport(mut self, transport: impl ExecuteRequest + 'static) -> Self {
        self.execute_request = Some(Arc::new(transport));
        self
    }

    /// Append an interceptor. Interceptors run in the order they were added.
    pub fn with_interceptor(mut self, interceptor: impl Interceptor<I, O> + 'static) -> Self {
        self.interceptors.add(interceptor);
        self
    }

    pub fn with_any_interceptor(mut self, interceptor: AnyInterceptor<I, O>) -> Self {
        self.interceptors.add_any(interceptor);
        self
    }

    pub fn with_telemetry(mut self, telemetry: Telemetry) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Merge `attributes` into the base attributes of every call.
    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes.extend(&attributes);
        self
    }

    pub fn with_attribute<T: Send + Sync + 'static>(mut self, key: &AttributeKey<T>, value: T) -> Self {
        self.attributes.set(key, value);
        self
    }

    /// Scope retry quotas to `partition` instead of the request host.
    ///
    /// Required when the host is only known after endpoint resolution,
    /// because the partition is chosen before the first attempt.
    pub fn with_partition_id(self, partition: impl Into<String>) -> Self {
        self.with_attribute(&keys::PARTITION_ID, partition.into())
    }

    pub fn build(self) -> Result<Orchestrator<I, O>, OrchestratorError> {
        let deserializer = self.deserializer.ok_or_else(|| {
            OrchestratorError::configuration("orchestrator requires a response deserializer")
        })?;

        let mut attributes = self.attributes;
        if !attributes.contains(&keys::AUTH_SCHEME_RESOLVER) {
            attributes.set(
                &keys::AUTH_SCHEME_RESOLVER,
                Arc::new(StaticAuthSchemeResolver::no_auth()) as Arc<dyn AuthSchemeResolver>,
            );
        }

        Ok(Orchestrator {
            serializers: self.serializers,
            deserializer,
            retry_strategy: self.retry_strategy,
            retry_error_info_provider: self
                .retry_error_info_provider
                .unwrap_or_else(|| Arc::new(default_retry_error_info)),
            select_auth_scheme: self
                .select_auth_scheme
                .unwrap_or_else(|| Arc::new(ConfiguredAuthSchemeSelector)),
            apply_endpoint: self
                .apply_endpoint
                .unwrap_or_else(|| Arc::new(PassthroughEndpoint)),
            apply_signer: self.apply_signer.unwrap_or_else(|| Arc::new(SchemeSigner)),
            execute_request: self
                .execute_request
                .unwrap_or_else(|| Arc::new(ReqwestTransport::default())),
            interceptors: self.interceptors,
            telemetry: self.telemetry,
            attributes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpResponse;
    use crate::serialization::DeserializeFn;

    #[test]
    fn test_build_requires_deserializer() {
        let err = OrchestratorBuilder::<(), ()>::new().build().unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_build_seeds_no_auth_resolver() {
        let orchestrator = OrchestratorBuilder::<(), ()>::new()
            .with_deserializer(DeserializeFn::new(
                |_: &HttpResponse, _: &Attributes| -> Result<(), OrchestratorError> { Ok(()) },
            ))
            .with_attribute(&keys::SERVICE_NAME, "Items".to_string())
            .build()
            .unwrap();
        assert!(orchestrator.attributes().contains(&keys::AUTH_SCHEME_RESOLVER));
        assert_eq!(
            orchestrator.attributes().get(&keys::SERVICE_NAME).map(String::as_str),
            Some("Items")
        );
        assert!(orchestrator.interceptors().is_empty());
    }

    #[test]
    fn test_partition_id_is_a_base_attribute() {
        let orchestrator = OrchestratorBuilder::<(), ()>::new()
            .with_deserializer(DeserializeFn::new(
                |_: &HttpResponse, _: &Attributes| -> Result<(), OrchestratorError> { Ok(()) },
            ))
            .with_partition_id("items")
            .build()
            .unwrap();
        assert_eq!(
            orchestrator.attributes().get(&keys::PARTITION_ID).map(String::as_str),
            Some("items")
        );
    }
}
