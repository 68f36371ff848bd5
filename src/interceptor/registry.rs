//! Ordered interceptor registry.
//!
//! For every hook the registry runs all interceptors in registration order
//! against the same view. A failure never short-circuits the remaining
//! interceptors: the most recent failure is kept, earlier ones are handed to
//! the logger, and the kept failure is returned once every interceptor ran.

use std::fmt;

use super::erased::AnyInterceptor;
use super::{Hook, Interceptor};
use crate::context::{
    AfterAttempt, AfterDeserialization, AfterSerialization, BeforeDeserialization,
    BeforeSerialization, Finalization, MutableInput, MutableOutputAfterAttempt,
    MutableOutputFinalization, MutableRequest, MutableResponse,
};
use crate::error::OrchestratorError;
use crate::logging::log_superseded_error;

/// Append-only, ordered collection of interceptors.
pub struct Interceptors<I, O> {
    interceptors: Vec<AnyInterceptor<I, O>>,
}

impl<I, O> Default for Interceptors<I, O> {
    fn default() -> Self {
        Self {
            interceptors: Vec::new(),
        }
    }
}

impl<I, O> Clone for Interceptors<I, O> {
    fn clone(&self) -> Self {
        Self {
            interceptors: self.interceptors.clone(),
        }
    }
}

impl<I, O> fmt::Debug for Interceptors<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.interceptors.iter().map(|i| i.name()))
            .finish()
    }
}

// Runs one hook across every interceptor with last-error-wins aggregation.
macro_rules! run_hook {
    ($self:ident, $hook:expr, $method:ident, $context:ident) => {{
        let mut last_error: Option<OrchestratorError> = None;
        for interceptor in &$self.interceptors {
            tracing::trace!(target: "smithy_orchestrator::interceptor", hook=%$hook, interceptor=interceptor.name(), "running hook");
            if let Err(err) = interceptor.inner().$method($context).await {
                let err = OrchestratorError::interceptor($hook, err);
                if let Some(previous) = last_error.replace(err) {
                    log_superseded_error($context.attributes(), &previous);
                }
            }
        }
        match last_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }};
}

impl<I, O> Interceptors<I, O>
where
    I: Send + Sync + 'static,
    O: Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, interceptor: impl Interceptor<I, O> + 'static) {
        self.interceptors.push(AnyInterceptor::new(interceptor));
    }

    pub fn add_any(&mut self, interceptor: AnyInterceptor<I, O>) {
        self.interceptors.push(interceptor);
    }

    pub fn with(mut self, interceptor: impl Interceptor<I, O> + 'static) -> Self {
        self.add(interceptor);
        self
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    /// Interceptor names in invocation order.
    pub fn names(&self) -> Vec<&'static str> {
        self.interceptors.iter().map(|i| i.name()).collect()
    }

    pub async fn read_before_execution(
        &self,
        context: &BeforeSerialization<'_, I>,
    ) -> Result<(), OrchestratorError> {
        run_hook!(self, Hook::ReadBeforeExecution, read_before_execution, context)
    }

    pub async fn modify_before_serialization(
        &self,
        context: &mut MutableInput<'_, I>,
    ) -> Result<(), OrchestratorError> {
        run_hook!(
            self,
            Hook::ModifyBeforeSerialization,
            modify_before_serialization,
            context
        )
    }

    pub async fn read_before_serialization(
        &self,
        context: &BeforeSerialization<'_, I>,
    ) -> Result<(), OrchestratorError> {
        run_hook!(
            self,
            Hook::ReadBeforeSerialization,
            read_before_serialization,
            context
        )
    }

    pub async fn read_after_serialization(
        &self,
        context: &AfterSerialization<'_, I>,
    ) -> Result<(), OrchestratorError> {
        run_hook!(
            self,
            Hook::ReadAfterSerialization,
            read_after_serialization,
            context
        )
    }

    pub async fn modify_before_retry_loop(
        &self,
        context: &mut MutableRequest<'_, I>,
    ) -> Result<(), OrchestratorError> {
        run_hook!(
            self,
            Hook::ModifyBeforeRetryLoop,
            modify_before_retry_loop,
            context
        )
    }

    pub async fn read_before_attempt(
        &self,
        context: &AfterSerialization<'_, I>,
    ) -> Result<(), OrchestratorError> {
        run_hook!(self, Hook::ReadBeforeAttempt, read_before_attempt, context)
    }

    pub async fn modify_before_signing(
        &self,
        context: &mut MutableRequest<'_, I>,
    ) -> Result<(), OrchestratorError> {
        run_hook!(self, Hook::ModifyBeforeSigning, modify_before_signing, context)
    }

    pub async fn read_before_signing(
        &self,
        context: &AfterSerialization<'_, I>,
    ) -> Result<(), OrchestratorError> {
        run_hook!(self, Hook::ReadBeforeSigning, read_before_signing, context)
    }

    pub async fn read_after_signing(
        &self,
        context: &AfterSerialization<'_, I>,
    ) -> Result<(), OrchestratorError> {
        run_hook!(self, Hook::ReadAfterSigning, read_after_signing, context)
    }

    pub async fn modify_before_transmit(
        &self,
        context: &mut MutableRequest<'_, I>,
    ) -> Result<(), OrchestratorError> {
        run_hook!(
            self,
            Hook::ModifyBeforeTransmit,
            modify_before_transmit,
            context
        )
    }

    pub async fn read_before_transmit(
        &self,
        context: &AfterSerialization<'_, I>,
    ) -> Result<(), OrchestratorError> {
        run_hook!(self, Hook::ReadBeforeTransmit, read_before_transmit, context)
    }

    pub async fn read_after_transmit(
        &self,
        context: &BeforeDeserialization<'_, I>,
    ) -> Result<(), OrchestratorError> {
        run_hook!(self, Hook::ReadAfterTransmit, read_after_transmit, context)
    }

    pub async fn modify_before_deserialization(
        &self,
        context: &mut MutableResponse<'_, I>,
    ) -> Result<(), OrchestratorError> {
        run_hook!(
            self,
            Hook::ModifyBeforeDeserialization,
            modify_before_deserialization,
            context
        )
    }

    pub async fn read_before_deserialization(
        &self,
        context: &BeforeDeserialization<'_, I>,
    ) -> Result<(), OrchestratorError> {
        run_hook!(
            self,
            Hook::ReadBeforeDeserialization,
            read_before_deserialization,
            context
        )
    }

    pub async fn read_after_deserialization(
        &self,
        context: &AfterDeserialization<'_, I, O>,
    ) -> Result<(), OrchestratorError> {
        run_hook!(
            self,
            Hook::ReadAfterDeserialization,
            read_after_deserialization,
            context
        )
    }

    pub async fn modify_before_attempt_completion(
        &self,
        context: &mut MutableOutputAfterAttempt<'_, I, O>,
    ) -> Result<(), OrchestratorError> {
        run_hook!(
            self,
            Hook::ModifyBeforeAttemptCompletion,
            modify_before_attempt_completion,
            context
        )
    }

    pub async fn read_after_attempt(
        &self,
        context: &AfterAttempt<'_, I, O>,
    ) -> Result<(), OrchestratorError> {
        run_hook!(self, Hook::ReadAfterAttempt, read_after_attempt, context)
    }

    pub async fn modify_before_completion(
        &self,
        context: &mut MutableOutputFinalization<'_, I, O>,
    ) -> Result<(), OrchestratorError> {
        run_hook!(
            self,
            Hook::ModifyBeforeCompletion,
            modify_before_completion,
            context
        )
    }

    pub async fn read_after_execution(
        &self,
        context: &Finalization<'_, I, O>,
    ) -> Result<(), OrchestratorError> {
        run_hook!(self, Hook::ReadAfterExecution, read_after_execution, context)
    }
}
