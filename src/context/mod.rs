//! Per-call Context
//!
//! A `Context` is the mutable record of a single orchestrated call: the input,
//! the request once serialized, the response once transmitted, and the result
//! once an attempt has recorded one. It is owned by exactly one `execute` call.
//!
//! Hooks never see the `Context` itself. They receive a phase-scoped view
//! (see `views`) that only exposes the fields legal at that point. View
//! constructors fail when the context has not reached the view's phase.

pub mod views;

pub use views::*;

use crate::attributes::Attributes;
use crate::error::OrchestratorError;
use crate::http::{HttpRequest, HttpResponse};

pub struct Context<I, O> {
    input: I,
    request: Option<HttpRequest>,
    response: Option<HttpResponse>,
    result: Option<Result<O, OrchestratorError>>,
    attributes: Attributes,
}

fn missing_request() -> OrchestratorError {
    OrchestratorError::internal("request is not available before serialization")
}

fn missing_response() -> OrchestratorError {
    OrchestratorError::internal("response is not available before transmission")
}

impl<I, O> Context<I, O> {
    pub fn new(input: I, attributes: Attributes) -> Self {
        Self {
            input,
            request: None,
            response: None,
            result: None,
            attributes,
        }
    }

    pub fn input(&self) -> &I {
        &self.input
    }

    pub fn request(&self) -> Option<&HttpRequest> {
        self.request.as_ref()
    }

    pub fn response(&self) -> Option<&HttpResponse> {
        self.response.as_ref()
    }

    /// The recorded result, if any step has written one yet.
    pub fn result(&self) -> Option<&Result<O, OrchestratorError>> {
        self.result.as_ref()
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut Attributes {
        &mut self.attributes
    }

    pub fn update_input(&mut self, input: I) {
        self.input = input;
    }

    pub fn update_request(&mut self, request: HttpRequest) {
        self.request = Some(request);
    }

    pub fn update_response(&mut self, response: HttpResponse) {
        self.response = Some(response);
    }

    /// Record a result. Later writes overwrite earlier ones.
    pub fn update_output(&mut self, result: Result<O, OrchestratorError>) {
        self.result = Some(result);
    }

    pub fn set_error(&mut self, error: OrchestratorError) {
        self.result = Some(Err(error));
    }

    /// Reset the context to the state it had at the start of an attempt.
    pub(crate) fn rewind(&mut self, request: HttpRequest) {
        self.request = Some(request);
        self.response = None;
        self.result = None;
    }

    /// Borrow the recorded output, or the recorded error.
    ///
    /// Fails with `OutputUnavailable` if no result has been recorded yet.
    pub fn output(&self) -> Result<&O, OrchestratorError> {
        match &self.result {
            Some(Ok(output)) => Ok(output),
            Some(Err(err)) => Err(err.clone()),
            None => Err(OrchestratorError::OutputUnavailable),
        }
    }

    /// Consume the context, returning the output or the last recorded error.
    pub fn into_output(self) -> Result<O, OrchestratorError> {
        self.result.unwrap_or(Err(OrchestratorError::OutputUnavailable))
    }

    pub fn before_serialization(&self) -> BeforeSerialization<'_, I> {
        BeforeSerialization {
            input: &self.input,
            attributes: &self.attributes,
        }
    }

    pub fn mutable_input(&mut self) -> MutableInput<'_, I> {
        MutableInput {
            input: &mut self.input,
            attributes: &mut self.attributes,
        }
    }

    pub fn after_serialization(&self) -> Result<AfterSerialization<'_, I>, OrchestratorError> {
        Ok(AfterSerialization {
            input: &self.input,
            request: self.request.as_ref().ok_or_else(missing_request)?,
            attributes: &self.attributes,
        })
    }

    pub fn mutable_request(&mut self) -> Result<MutableRequest<'_, I>, OrchestratorError> {
        Ok(MutableRequest {
            input: &self.input,
            request: self.request.as_mut().ok_or_else(missing_request)?,
            attributes: &mut self.attributes,
        })
    }

    pub fn before_deserialization(
        &self,
    ) -> Result<BeforeDeserialization<'_, I>, OrchestratorError> {
        Ok(BeforeDeserialization {
            input: &self.input,
            request: self.request.as_ref().ok_or_else(missing_request)?,
            response: self.response.as_ref().ok_or_else(missing_response)?,
            attributes: &self.attributes,
        })
    }

    pub fn mutable_response(&mut self) -> Result<MutableResponse<'_, I>, OrchestratorError> {
        Ok(MutableResponse {
            input: &self.input,
            request: self.request.as_ref().ok_or_else(missing_request)?,
            response: self.response.as_mut().ok_or_else(missing_response)?,
            attributes: &mut self.attributes,
        })
    }

    pub fn after_deserialization(
        &self,
    ) -> Result<AfterDeserialization<'_, I, O>, OrchestratorError> {
        Ok(AfterDeserialization {
            input: &self.input,
            request: self.request.as_ref().ok_or_else(missing_request)?,
            response: self.response.as_ref().ok_or_else(missing_response)?,
            result: self
                .result
                .as_ref()
                .ok_or(OrchestratorError::OutputUnavailable)?,
            attributes: &self.attributes,
        })
    }

    pub fn after_attempt(&self) -> Result<AfterAttempt<'_, I, O>, OrchestratorError> {
        Ok(AfterAttempt {
            input: &self.input,
            request: self.request.as_ref().ok_or_else(missing_request)?,
            response: self.response.as_ref(),
            result: self
                .result
                .as_ref()
                .ok_or(OrchestratorError::OutputUnavailable)?,
            attributes: &self.attributes,
        })
    }

    pub fn mutable_output_after_attempt(
        &mut self,
    ) -> Result<MutableOutputAfterAttempt<'_, I, O>, OrchestratorError> {
        Ok(MutableOutputAfterAttempt {
            input: &self.input,
            request: self.request.as_ref().ok_or_else(missing_request)?,
            response: self.response.as_ref(),
            result: self
                .result
                .as_mut()
                .ok_or(OrchestratorError::OutputUnavailable)?,
            attributes: &mut self.attributes,
        })
    }

    pub fn finalization(&self) -> Result<Finalization<'_, I, O>, OrchestratorError> {
        Ok(Finalization {
            input: &self.input,
            request: self.request.as_ref(),
            response: self.response.as_ref(),
            result: self
                .result
                .as_ref()
                .ok_or(OrchestratorError::OutputUnavailable)?,
            attributes: &self.attributes,
        })
    }

    pub fn mutable_output_finalization(
        &mut self,
    ) -> Result<MutableOutputFinalization<'_, I, O>, OrchestratorError> {
        Ok(MutableOutputFinalization {
            input: &self.input,
            request: self.request.as_ref(),
            response: self.response.as_ref(),
            result: self
                .result
                .as_mut()
                .ok_or(OrchestratorError::OutputUnavailable)?,
            attributes: &mut self.attributes,
        })
    }
}

impl<I: std::fmt::Debug, O> std::fmt::Debug for Context<I, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("input", &self.input)
            .field("request", &self.request)
            .field("response", &self.response)
            .field(
                "result",
                &self.result.as_ref().map(|r| r.as_ref().map(|_| "<output>")),
            )
            .field("attributes", &self.attributes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    type Ctx = Context<u32, String>;

    #[test]
    fn test_fresh_context_only_exposes_input_views() {
        let mut ctx = Ctx::new(42, Attributes::new());
        assert_eq!(*ctx.before_serialization().input(), 42);
        ctx.mutable_input().update_input(43);
        assert_eq!(*ctx.input(), 43);

        assert!(ctx.after_serialization().is_err());
        assert!(ctx.mutable_request().is_err());
        assert!(ctx.before_deserialization().is_err());
        assert!(ctx.mutable_response().is_err());
        assert!(ctx.after_deserialization().is_err());
        assert!(ctx.after_attempt().is_err());
        assert!(ctx.finalization().is_err());
        assert!(matches!(
            ctx.output(),
            Err(OrchestratorError::OutputUnavailable)
        ));
    }

    #[test]
    fn test_serialized_context_exposes_request_views() {
        let mut ctx = Ctx::new(42, Attributes::new());
        ctx.update_request(HttpRequest::get("/items/42"));

        assert_eq!(ctx.after_serialization().unwrap().request().path, "/items/42");
        ctx.mutable_request()
            .unwrap()
            .request_mut()
            .set_header("x-a", "1")
            .unwrap();
        assert_eq!(ctx.request().unwrap().header("x-a"), Some("1"));

        // No response yet.
        assert!(ctx.before_deserialization().is_err());
        // No result yet.
        assert!(ctx.after_attempt().is_err());
    }

    #[test]
    fn test_transmitted_context_exposes_response_views() {
        let mut ctx = Ctx::new(42, Attributes::new());
        ctx.update_request(HttpRequest::get("/items/42"));
        ctx.update_response(HttpResponse::new(StatusCode::OK, "body"));

        assert_eq!(ctx.before_deserialization().unwrap().response().text(), "body");
        ctx.mutable_response()
            .unwrap()
            .update_response(HttpResponse::new(StatusCode::CREATED, ""));
        assert_eq!(ctx.response().unwrap().status, StatusCode::CREATED);
        assert!(ctx.after_deserialization().is_err());
    }

    #[test]
    fn test_result_views_and_finality() {
        let mut ctx = Ctx::new(42, Attributes::new());
        ctx.set_error(OrchestratorError::transport("first"));
        // Finalization does not need a request.
        assert!(ctx.finalization().unwrap().request().is_none());

        ctx.update_request(HttpRequest::get("/"));
        {
            let mut view = ctx.mutable_output_after_attempt().unwrap();
            assert!(view.output().is_err());
            assert!(view.response().is_none());
            view.update_output(Ok("fallback".to_string()));
        }
        assert_eq!(ctx.output().unwrap(), "fallback");

        ctx.mutable_output_finalization()
            .unwrap()
            .update_output(Err(OrchestratorError::transport("last")));
        let err = ctx.into_output().unwrap_err();
        assert_eq!(err.to_string(), "transport error: last");
    }

    #[test]
    fn test_rewind_clears_attempt_state() {
        let mut ctx = Ctx::new(1, Attributes::new());
        ctx.update_request(HttpRequest::get("/signed"));
        ctx.update_response(HttpResponse::new(StatusCode::OK, ""));
        ctx.update_output(Ok("done".into()));

        ctx.rewind(HttpRequest::get("/fresh"));
        assert_eq!(ctx.request().unwrap().path, "/fresh");
        assert!(ctx.response().is_none());
        assert!(ctx.result().is_none());
    }
}
