//! Phase-scoped views over a `Context`.
//!
//! Each view borrows exactly the fields that are legal at its pipeline stage,
//! so a hook cannot observe a request before serialization or a response
//! before transmission. Views are built by the `Context` view constructors.

use crate::attributes::Attributes;
use crate::error::OrchestratorError;
use crate::http::{HttpRequest, HttpResponse};

/// Input only. Used by `read_before_execution` and `read_before_serialization`.
pub struct BeforeSerialization<'a, I> {
    pub(super) input: &'a I,
    pub(super) attributes: &'a Attributes,
}

impl<I> BeforeSerialization<'_, I> {
    pub fn input(&self) -> &I {
        self.input
    }

    pub fn attributes(&self) -> &Attributes {
        self.attributes
    }
}

/// Mutable input. Used by `modify_before_serialization`.
pub struct MutableInput<'a, I> {
    pub(super) input: &'a mut I,
    pub(super) attributes: &'a mut Attributes,
}

impl<I> MutableInput<'_, I> {
    pub fn input(&self) -> &I {
        self.input
    }

    pub fn input_mut(&mut self) -> &mut I {
        self.input
    }

    pub fn update_input(&mut self, input: I) {
        *self.input = input;
    }

    pub fn attributes(&self) -> &Attributes {
        self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut Attributes {
        self.attributes
    }
}

/// Input and serialized request.
pub struct AfterSerialization<'a, I> {
    pub(super) input: &'a I,
    pub(super) request: &'a HttpRequest,
    pub(super) attributes: &'a Attributes,
}

impl<I> AfterSerialization<'_, I> {
    pub fn input(&self) -> &I {
        self.input
    }

    pub fn request(&self) -> &HttpRequest {
        self.request
    }

    pub fn attributes(&self) -> &Attributes {
        self.attributes
    }
}

/// Input and mutable request. Used by `modify_before_retry_loop`,
/// `modify_before_signing` and `modify_before_transmit`.
pub struct MutableRequest<'a, I> {
    pub(super) input: &'a I,
    pub(super) request: &'a mut HttpRequest,
    pub(super) attributes: &'a mut Attributes,
}

impl<I> MutableRequest<'_, I> {
    pub fn input(&self) -> &I {
        self.input
    }

    pub fn request(&self) -> &HttpRequest {
        self.request
    }

    pub fn request_mut(&mut self) -> &mut HttpRequest {
        self.request
    }

    pub fn update_request(&mut self, request: HttpRequest) {
        *self.request = request;
    }

    pub fn attributes(&self) -> &Attributes {
        self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut Attributes {
        self.attributes
    }
}

/// Input, request and the transmitted response.
pub struct BeforeDeserialization<'a, I> {
    pub(super) input: &'a I,
    pub(super) request: &'a HttpRequest,
    pub(super) response: &'a HttpResponse,
    pub(super) attributes: &'a Attributes,
}

impl<I> BeforeDeserialization<'_, I> {
    pub fn input(&self) -> &I {
        self.input
    }

    pub fn request(&self) -> &HttpRequest {
        self.request
    }

    pub fn response(&self) -> &HttpResponse {
        self.response
    }

    pub fn attributes(&self) -> &Attributes {
        self.attributes
    }
}

/// Mutable response. Used by `modify_before_deserialization`.
pub struct MutableResponse<'a, I> {
    pub(super) input: &'a I,
    pub(super) request: &'a HttpRequest,
    pub(super) response: &'a mut HttpResponse,
    pub(super) attributes: &'a mut Attributes,
}

impl<I> MutableResponse<'_, I> {
    pub fn input(&self) -> &I {
        self.input
    }

    pub fn request(&self) -> &HttpRequest {
        self.request
    }

    pub fn response(&self) -> &HttpResponse {
        self.response
    }

    pub fn response_mut(&mut self) -> &mut HttpResponse {
        self.response
    }

    pub fn update_response(&mut self, response: HttpResponse) {
        *self.response = response;
    }

    pub fn attributes(&self) -> &Attributes {
        self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut Attributes {
        self.attributes
    }
}

/// Everything from the deserialized attempt, including its result.
pub struct AfterDeserialization<'a, I, O> {
    pub(super) input: &'a I,
    pub(super) request: &'a HttpRequest,
    pub(super) response: &'a HttpResponse,
    pub(super) result: &'a Result<O, OrchestratorError>,
    pub(super) attributes: &'a Attributes,
}

impl<I, O> AfterDeserialization<'_, I, O> {
    pub fn input(&self) -> &I {
        self.input
    }

    pub fn request(&self) -> &HttpRequest {
        self.request
    }

    pub fn response(&self) -> &HttpResponse {
        self.response
    }

    pub fn output(&self) -> Result<&O, &OrchestratorError> {
        self.result.as_ref()
    }

    pub fn attributes(&self) -> &Attributes {
        self.attributes
    }
}

/// End of an attempt. The response is absent if the attempt failed before
/// transmission.
pub struct AfterAttempt<'a, I, O> {
    pub(super) input: &'a I,
    pub(super) request: &'a HttpRequest,
    pub(super) response: Option<&'a HttpResponse>,
    pub(super) result: &'a Result<O, OrchestratorError>,
    pub(super) attributes: &'a Attributes,
}

impl<I, O> AfterAttempt<'_, I, O> {
    pub fn input(&self) -> &I {
        self.input
    }

    pub fn request(&self) -> &HttpRequest {
        self.request
    }

    pub fn response(&self) -> Option<&HttpResponse> {
        self.response
    }

    pub fn output(&self) -> Result<&O, &OrchestratorError> {
        self.result.as_ref()
    }

    pub fn attributes(&self) -> &Attributes {
        self.attributes
    }
}

/// Attempt result that may be rewritten. Used by `modify_before_attempt_completion`.
pub struct MutableOutputAfterAttempt<'a, I, O> {
    pub(super) input: &'a I,
    pub(super) request: &'a HttpRequest,
    pub(super) response: Option<&'a HttpResponse>,
    pub(super) result: &'a mut Result<O, OrchestratorError>,
    pub(super) attributes: &'a mut Attributes,
}

impl<I, O> MutableOutputAfterAttempt<'_, I, O> {
    pub fn input(&self) -> &I {
        self.input
    }

    pub fn request(&self) -> &HttpRequest {
        self.request
    }

    pub fn response(&self) -> Option<&HttpResponse> {
        self.response
    }

    pub fn output(&self) -> Result<&O, &OrchestratorError> {
        self.result.as_ref()
    }

    /// Replace the attempt result, e.g. turn an error into a fallback output.
    pub fn update_output(&mut self, result: Result<O, OrchestratorError>) {
        *self.result = result;
    }

    pub fn attributes(&self) -> &Attributes {
        self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut Attributes {
        self.attributes
    }
}

/// End of the execution. Request and response are absent if the call failed
/// before they were produced.
pub struct Finalization<'a, I, O> {
    pub(super) input: &'a I,
    pub(super) request: Option<&'a HttpRequest>,
    pub(super) response: Option<&'a HttpResponse>,
    pub(super) result: &'a Result<O, OrchestratorError>,
    pub(super) attributes: &'a Attributes,
}

impl<I, O> Finalization<'_, I, O> {
    pub fn input(&self) -> &I {
        self.input
    }

    pub fn request(&self) -> Option<&HttpRequest> {
        self.request
    }

    pub fn response(&self) -> Option<&HttpResponse> {
        self.response
    }

    pub fn output(&self) -> Result<&O, &OrchestratorError> {
        self.result.as_ref()
    }

    pub fn attributes(&self) -> &Attributes {
        self.attributes
    }
}

/// Final result that may be rewritten. Used by `modify_before_completion`.
pub struct MutableOutputFinalization<'a, I, O> {
    pub(super) input: &'a I,
    pub(super) request: Option<&'a HttpRequest>,
    pub(super) response: Option<&'a HttpResponse>,
    pub(super) result: &'a mut Result<O, OrchestratorError>,
    pub(super) attributes: &'a mut Attributes,
}

impl<I, O> MutableOutputFinalization<'_, I, O> {
    pub fn input(&self) -> &I {
        self.input
    }

    pub fn request(&self) -> Option<&HttpRequest> {
        self.request
    }

    pub fn response(&self) -> Option<&HttpResponse> {
        self.response
    }

    pub fn output(&self) -> Result<&O, &OrchestratorError> {
        self.result.as_ref()
    }

    pub fn update_output(&mut self, result: Result<O, OrchestratorError>) {
        *self.result = result;
    }

    pub fn attributes(&self) -> &Attributes {
        self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut Attributes {
        self.attributes
    }
}
