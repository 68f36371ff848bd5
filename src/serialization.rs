//! Request serialization and response deserialization.
//!
//! Wire protocols plug in here. The orchestrator calls the serializers once
//! per call, in registration order, against a single request, and calls the
//! deserializer once per attempt that produced a response.

use std::marker::PhantomData;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::attributes::Attributes;
use crate::error::OrchestratorError;
use crate::http::{HttpRequest, HttpResponse};

/// Populates a request from the operation input.
pub trait RequestSerializer<I>: Send + Sync {
    fn serialize(
        &self,
        input: &I,
        request: &mut HttpRequest,
        attributes: &Attributes,
    ) -> Result<(), OrchestratorError>;
}

/// Builds the operation output, or a modeled error, from a response.
#[async_trait]
pub trait ResponseDeserializer<O>: Send + Sync {
    async fn deserialize(
        &self,
        response: &HttpResponse,
        attributes: &Attributes,
    ) -> Result<O, OrchestratorError>;
}

/// Closure-backed `RequestSerializer`.
pub struct SerializeFn<F>(F);

impl<F> SerializeFn<F> {
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<I, F> RequestSerializer<I> for SerializeFn<F>
where
    F: Fn(&I, &mut HttpRequest, &Attributes) -> Result<(), OrchestratorError> + Send + Sync,
{
    fn serialize(
        &self,
        input: &I,
        request: &mut HttpRequest,
        attributes: &Attributes,
    ) -> Result<(), OrchestratorError> {
        (self.0)(input, request, attributes)
    }
}

/// Closure-backed `ResponseDeserializer`.
pub struct DeserializeFn<F>(F);

impl<F> DeserializeFn<F> {
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<O, F> ResponseDeserializer<O> for DeserializeFn<F>
where
    O: Send + 'static,
    F: Fn(&HttpResponse, &Attributes) -> Result<O, OrchestratorError> + Send + Sync,
{
    async fn deserialize(
        &self,
        response: &HttpResponse,
        attributes: &Attributes,
    ) -> Result<O, OrchestratorError> {
        (self.0)(response, attributes)
    }
}

/// Writes the input as a JSON body.
#[derive(Debug, Clone, Default)]
pub struct JsonBodySerializer;

impl<I: Serialize> RequestSerializer<I> for JsonBodySerializer {
    fn serialize(
        &self,
        input: &I,
        request: &mut HttpRequest,
        _: &Attributes,
    ) -> Result<(), OrchestratorError> {
        request.body = serde_json::to_vec(input)?.into();
        request.set_header("content-type", "application/json")?;
        Ok(())
    }
}

/// Parses 2xx JSON bodies into `O`; any other status becomes a
/// `Response` error carrying the status and the body text.
pub struct JsonDeserializer<O> {
    _marker: PhantomData<fn() -> O>,
}

impl<O> JsonDeserializer<O> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<O> Default for JsonDeserializer<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O> std::fmt::Debug for JsonDeserializer<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("JsonDeserializer")
    }
}

#[async_trait]
impl<O: DeserializeOwned + Send + 'static> ResponseDeserializer<O> for JsonDeserializer<O> {
    async fn deserialize(
        &self,
        response: &HttpResponse,
        _: &Attributes,
    ) -> Result<O, OrchestratorError> {
        if !response.is_success() {
            return Err(OrchestratorError::response(
                Some(response.status.as_u16()),
                response.text(),
            ));
        }
        serde_json::from_slice(&response.body)
            .map_err(|e| OrchestratorError::response(Some(response.status.as_u16()), e))
    }
}
