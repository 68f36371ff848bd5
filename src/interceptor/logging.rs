//! Tracing-backed interceptor.
//!
//! Emits debug events at the request lifecycle boundaries. Bodies and header
//! values are never logged.

use async_trait::async_trait;

use super::Interceptor;
use crate::context::{AfterAttempt, AfterSerialization, BeforeDeserialization, Finalization};
use crate::error::BoxError;

#[derive(Clone, Debug, Default)]
pub struct LoggingInterceptor;

#[async_trait]
impl<I, O> Interceptor<I, O> for LoggingInterceptor
where
    I: Send + Sync + 'static,
    O: Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        "logging"
    }

    async fn read_before_transmit(
        &self,
        context: &AfterSerialization<'_, I>,
    ) -> Result<(), BoxError> {
        let request = context.request();
        tracing::debug!(target: "smithy_orchestrator::http", method=%request.method, host=%request.host, path=%request.path, "sending request");
        Ok(())
    }

    async fn read_after_transmit(
        &self,
        context: &BeforeDeserialization<'_, I>,
    ) -> Result<(), BoxError> {
        let request = context.request();
        tracing::debug!(target: "smithy_orchestrator::http", host=%request.host, path=%request.path, status=%context.response().status.as_u16(), "response received");
        Ok(())
    }

    async fn read_after_attempt(&self, context: &AfterAttempt<'_, I, O>) -> Result<(), BoxError> {
        if let Err(err) = context.output() {
            tracing::debug!(target: "smithy_orchestrator::http", path=%context.request().path, err=%err, "attempt failed");
        }
        Ok(())
    }

    async fn read_after_execution(&self, context: &Finalization<'_, I, O>) -> Result<(), BoxError> {
        match context.output() {
            Ok(_) => tracing::debug!(target: "smithy_orchestrator::http", "call succeeded"),
            Err(err) => tracing::debug!(target: "smithy_orchestrator::http", err=%err, "call failed"),
        }
        Ok(())
    }
}
