//! Orchestrator
//!
//! Runs one operation call through a fixed sequence of interceptor hooks and
//! work steps:
//!
//! 1. `read_before_execution`, `modify_before_serialization`,
//!    `read_before_serialization`
//! 2. serialize, then `read_after_serialization`, `modify_before_retry_loop`
//! 3. retry loop: one attempt per retry token refresh, each starting from a
//!    copy of the request as it was before the first attempt
//! 4. `modify_before_completion`, `read_after_execution`
//!
//! An attempt selects the auth scheme, applies the endpoint, signs,
//! transmits and deserializes, with the matching hooks around every step.
//! Errors never escape a phase directly: they are recorded as the call
//! result, the remaining happy-path work of the phase is skipped, and the
//! completion hooks still run. The caller receives the last recorded result.

mod builder;

pub use builder::OrchestratorBuilder;

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tracing::Instrument;

use crate::attributes::{Attributes, keys};
use crate::auth::{SelectAuthScheme, SelectedAuthScheme};
use crate::context::Context;
use crate::endpoint::ApplyEndpoint;
use crate::error::OrchestratorError;
use crate::http::{ExecuteRequest, HttpRequest};
use crate::interceptor::Interceptors;
use crate::retry::{RetryErrorInfoProvider, RetryStrategy};
use crate::serialization::{RequestSerializer, ResponseDeserializer};
use crate::signing::ApplySigner;
use crate::telemetry::{SpanEvent, Telemetry, metrics};

/// Executes calls of one operation. Holds no per-call state, so a single
/// instance can serve any number of concurrent calls.
pub struct Orchestrator<I, O> {
    serializers: Vec<Arc<dyn RequestSerializer<I>>>,
    deserializer: Arc<dyn ResponseDeserializer<O>>,
    retry_strategy: Option<Arc<dyn RetryStrategy>>,
    retry_error_info_provider: RetryErrorInfoProvider,
    select_auth_scheme: Arc<dyn SelectAuthScheme>,
    apply_endpoint: Arc<dyn ApplyEndpoint>,
    apply_signer: Arc<dyn ApplySigner>,
    execute_request: Arc<dyn ExecuteRequest>,
    interceptors: Interceptors<I, O>,
    telemetry: Telemetry,
    attributes: Attributes,
}

impl<I, O> Clone for Orchestrator<I, O> {
    fn clone(&self) -> Self {
        Self {
            serializers: self.serializers.clone(),
            deserializer: Arc::clone(&self.deserializer),
            retry_strategy: self.retry_strategy.clone(),
            retry_error_info_provider: Arc::clone(&self.retry_error_info_provider),
            select_auth_scheme: Arc::clone(&self.select_auth_scheme),
            apply_endpoint: Arc::clone(&self.apply_endpoint),
            apply_signer: Arc::clone(&self.apply_signer),
            execute_request: Arc::clone(&self.execute_request),
            interceptors: self.interceptors.clone(),
            telemetry: self.telemetry.clone(),
            attributes: self.attributes.clone(),
        }
    }
}

impl<I, O> fmt::Debug for Orchestrator<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("serializers", &self.serializers.len())
            .field("retry_strategy", &self.retry_strategy.is_some())
            .field("interceptors", &self.interceptors)
            .field("telemetry", &self.telemetry)
            .field("attributes", &self.attributes)
            .finish_non_exhaustive()
    }
}

fn capture<I, O>(context: &mut Context<I, O>, result: Result<(), OrchestratorError>) {
    if let Err(err) = result {
        context.set_error(err);
    }
}

impl<I, O> Orchestrator<I, O>
where
    I: Send + Sync + 'static,
    O: Send + Sync + 'static,
{
    pub fn builder() -> OrchestratorBuilder<I, O> {
        OrchestratorBuilder::new()
    }

    /// Base attributes copied into every call.
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn interceptors(&self) -> &Interceptors<I, O> {
        &self.interceptors
    }

    /// Execute a call with the base attributes.
    pub async fn execute(&self, input: I) -> Result<O, OrchestratorError> {
        self.execute_with(input, Attributes::new()).await
    }

    /// Execute a call. `attributes` are layered over the base attributes for
    /// this call only.
    pub async fn execute_with(&self, input: I, attributes: Attributes) -> Result<O, OrchestratorError> {
        let span_name = self.telemetry.operation_span_name();
        let span = tracing::debug_span!("smithy.orchestrator.execute", operation = %span_name);
        self.run(input, attributes, span_name).instrument(span).await
    }

    /// Run the pre-transmit part of one attempt and return the signed request
    /// without sending it. Used to build presigned URLs.
    pub async fn presign_request(
        &self,
        input: I,
        attributes: Attributes,
    ) -> Result<HttpRequest, OrchestratorError> {
        let span = tracing::debug_span!("smithy.orchestrator.presign", operation = %self.telemetry.operation_span_name());
        self.presign(input, attributes).instrument(span).await
    }

    async fn presign(&self, input: I, attributes: Attributes) -> Result<HttpRequest, OrchestratorError> {
        let mut context = Context::new(input, self.call_attributes(attributes));
        self.before_retry_loop(&mut context).await?;
        self.sign(&mut context).await?;
        current_request(&context)
    }

    fn call_attributes(&self, attributes: Attributes) -> Attributes {
        let mut merged = self.attributes.clone();
        merged.extend(&attributes);
        merged
    }

    async fn run(&self, input: I, attributes: Attributes, span_name: String) -> Result<O, OrchestratorError> {
        let started = Instant::now();
        let call_span = self.telemetry.start_span(None, span_name).await;
        let mut context = Context::new(input, self.call_attributes(attributes));

        let result = self.before_retry_loop(&mut context).await;
        match result {
            Ok(()) => self.retry_loop(&mut context, &call_span).await,
            Err(err) => {
                tracing::debug!(target: "smithy_orchestrator", err=%err, "call failed before the retry loop");
                context.set_error(err);
            }
        }
        self.complete(&mut context).await;

        self.telemetry
            .record_duration(metrics::DURATION, started.elapsed())
            .await;
        let error = context.result().and_then(|r| r.as_ref().err()).map(ToString::to_string);
        self.telemetry.end_span(call_span, error).await;
        context.into_output()
    }

    async fn before_retry_loop(&self, context: &mut Context<I, O>) -> Result<(), OrchestratorError> {
        self.interceptors
            .read_before_execution(&context.before_serialization())
            .await?;
        self.interceptors
            .modify_before_serialization(&mut context.mutable_input())
            .await?;
        self.interceptors
            .read_before_serialization(&context.before_serialization())
            .await?;

        self.serialize(context).await?;

        self.interceptors
            .read_after_serialization(&context.after_serialization()?)
            .await?;
        self.interceptors
            .modify_before_retry_loop(&mut context.mutable_request()?)
            .await
    }

    async fn serialize(&self, context: &mut Context<I, O>) -> Result<(), OrchestratorError> {
        let started = Instant::now();
        let mut request = HttpRequest::default();
        for serializer in &self.serializers {
            serializer.serialize(context.input(), &mut request, context.attributes())?;
        }
        context.update_request(request);
        self.telemetry
            .record_duration(metrics::SERIALIZATION_DURATION, started.elapsed())
            .await;
        Ok(())
    }

    fn partition_id(context: &Context<I, O>) -> Result<String, OrchestratorError> {
        if let Some(partition) = context
            .attributes()
            .get(&keys::PARTITION_ID)
            .filter(|p| !p.is_empty())
        {
            return Ok(partition.clone());
        }
        match context.request() {
            Some(request) if !request.host.is_empty() => Ok(request.host.clone()),
            _ => Err(OrchestratorError::configuration(
                "retry partition id could not be determined: no partition id attribute and no request host (set one with `with_partition_id`)",
            )),
        }
    }

    async fn retry_loop(&self, context: &mut Context<I, O>, call_span: &SpanEvent) {
        let Some(strategy) = &self.retry_strategy else {
            self.attempt(context, call_span, 1).await;
            return;
        };

        let partition = match Self::partition_id(context) {
            Ok(partition) => partition,
            Err(err) => return context.set_error(err),
        };
        let mut token = match strategy.acquire_initial_retry_token(&partition).await {
            Ok(token) => token,
            Err(err) => return context.set_error(err),
        };

        let mut attempt = 1;
        loop {
            let Some(start) = context.request().cloned() else {
                return context.set_error(OrchestratorError::internal(
                    "request missing at the start of an attempt",
                ));
            };
            self.attempt(context, call_span, attempt).await;

            let error_info = match context.result() {
                Some(Ok(_)) => {
                    strategy.record_success(&token).await;
                    return;
                }
                Some(Err(err)) => (self.retry_error_info_provider)(err),
                None => return,
            };
            let Some(error_info) = error_info else {
                tracing::debug!(target: "smithy_orchestrator::retry", attempt, "error is not retryable");
                return;
            };
            if let Err(refusal) = strategy
                .refresh_retry_token_for_retry(&mut token, &error_info)
                .await
            {
                tracing::debug!(target: "smithy_orchestrator::retry", attempt, reason=%refusal, "retry refused");
                return;
            }

            context.rewind(start);
            attempt += 1;
        }
    }

    async fn attempt(&self, context: &mut Context<I, O>, call_span: &SpanEvent, attempt: u32) {
        let started = Instant::now();
        let span = self
            .telemetry
            .start_span(Some(call_span), format!("{}.attempt", call_span.name))
            .await
            .with_attribute("attempt", attempt.to_string());
        self.telemetry
            .count(metrics::ATTEMPTS, "{attempt}", &[])
            .await;
        tracing::debug!(target: "smithy_orchestrator", attempt, "attempt started");

        let result = self.sign(context).await;
        let result = match result {
            Ok(()) => self.transmit(context).await,
            Err(err) => Err(err),
        };
        capture(context, result);

        let result = match context.mutable_output_after_attempt() {
            Ok(mut view) => {
                self.interceptors
                    .modify_before_attempt_completion(&mut view)
                    .await
            }
            Err(err) => Err(err),
        };
        capture(context, result);
        let result = match context.after_attempt() {
            Ok(view) => self.interceptors.read_after_attempt(&view).await,
            Err(err) => Err(err),
        };
        capture(context, result);

        self.telemetry
            .record_duration(metrics::ATTEMPT_DURATION, started.elapsed())
            .await;
        let error = match context.result() {
            Some(Err(err)) => Some(err.clone()),
            _ => None,
        };
        match &error {
            Some(err) => {
                tracing::debug!(target: "smithy_orchestrator", attempt, err=%err, "attempt failed");
                self.telemetry
                    .count(metrics::ERRORS, "{error}", &[("error.type", err.kind())])
                    .await;
            }
            None => tracing::debug!(target: "smithy_orchestrator", attempt, "attempt succeeded"),
        }
        self.telemetry
            .end_span(span, error.map(|err| err.to_string()))
            .await;
    }

    /// Attempt steps up to and including `read_before_transmit`.
    async fn sign(&self, context: &mut Context<I, O>) -> Result<(), OrchestratorError> {
        self.interceptors
            .read_before_attempt(&context.after_serialization()?)
            .await?;

        let started = Instant::now();
        let selected = self
            .select_auth_scheme
            .select(context.attributes())
            .await?
            .ok_or_else(|| OrchestratorError::configuration("no auth scheme could be selected"))?;
        self.telemetry
            .record_duration(metrics::RESOLVE_IDENTITY_DURATION, started.elapsed())
            .await;
        context
            .attributes_mut()
            .set(&keys::SELECTED_AUTH_SCHEME, selected.clone());

        self.apply_endpoint(context, &selected).await?;

        self.interceptors
            .modify_before_signing(&mut context.mutable_request()?)
            .await?;
        self.interceptors
            .read_before_signing(&context.after_serialization()?)
            .await?;

        let started = Instant::now();
        let request = current_request(context)?;
        let signed = self
            .apply_signer
            .apply(request, Some(&selected), context.attributes_mut())
            .await?;
        context.update_request(signed);
        self.telemetry
            .record_duration(metrics::SIGNING_DURATION, started.elapsed())
            .await;

        self.interceptors
            .read_after_signing(&context.after_serialization()?)
            .await?;
        self.interceptors
            .modify_before_transmit(&mut context.mutable_request()?)
            .await?;
        self.interceptors
            .read_before_transmit(&context.after_serialization()?)
            .await
    }

    async fn apply_endpoint(
        &self,
        context: &mut Context<I, O>,
        selected: &SelectedAuthScheme,
    ) -> Result<(), OrchestratorError> {
        let started = Instant::now();
        let request = current_request(context)?;
        let request = self
            .apply_endpoint
            .apply(request, Some(selected), context.attributes())
            .await?;
        context.update_request(request);
        self.telemetry
            .record_duration(metrics::RESOLVE_ENDPOINT_DURATION, started.elapsed())
            .await;
        Ok(())
    }

    /// Attempt steps from transmission through `read_after_deserialization`.
    async fn transmit(&self, context: &mut Context<I, O>) -> Result<(), OrchestratorError> {
        let request = current_request(context)?;
        let response = self
            .execute_request
            .execute(request, context.attributes())
            .await?;
        context.update_response(response);

        self.interceptors
            .read_after_transmit(&context.before_deserialization()?)
            .await?;
        self.interceptors
            .modify_before_deserialization(&mut context.mutable_response()?)
            .await?;
        self.interceptors
            .read_before_deserialization(&context.before_deserialization()?)
            .await?;

        let started = Instant::now();
        let output = match context.response() {
            Some(response) => {
                self.deserializer
                    .deserialize(response, context.attributes())
                    .await
            }
            None => Err(OrchestratorError::internal(
                "response missing before deserialization",
            )),
        };
        self.telemetry
            .record_duration(metrics::DESERIALIZATION_DURATION, started.elapsed())
            .await;
        context.update_output(output);

        self.interceptors
            .read_after_deserialization(&context.after_deserialization()?)
            .await
    }

    async fn complete(&self, context: &mut Context<I, O>) {
        let result = match context.mutable_output_finalization() {
            Ok(mut view) => self.interceptors.modify_before_completion(&mut view).await,
            Err(err) => Err(err),
        };
        capture(context, result);
        let result = match context.finalization() {
            Ok(view) => self.interceptors.read_after_execution(&view).await,
            Err(err) => Err(err),
        };
        capture(context, result);
    }
}

fn current_request<I, O>(context: &Context<I, O>) -> Result<HttpRequest, OrchestratorError> {
    context
        .request()
        .cloned()
        .ok_or_else(|| OrchestratorError::internal("request missing during an attempt"))
}
