//! Interceptors
//!
//! An interceptor observes or rewrites call state at fixed points of the
//! request lifecycle. There are 19 hooks; every hook defaults to a no-op so an
//! implementation overrides only what it needs.
//!
//! - `read_*` hooks receive a read-only view and may only fail.
//! - `modify_*` hooks receive a mutable view and publish changes through it.
//!
//! Hooks must not hold per-call state on the interceptor: one instance serves
//! every concurrent call made through an orchestrator.
//!
//! ```rust,ignore
//! struct UserAgent;
//!
//! #[async_trait::async_trait]
//! impl<I: Send + Sync + 'static, O: Send + Sync + 'static> Interceptor<I, O> for UserAgent {
//!     async fn modify_before_signing(&self, ctx: &mut MutableRequest<'_, I>) -> Result<(), BoxError> {
//!         ctx.request_mut().set_header("user-agent", "my-client/1.0")?;
//!         Ok(())
//!     }
//! }
//! ```

pub mod erased;
pub mod logging;
pub mod registry;

pub use erased::{AnyInterceptor, HookInterceptor};
pub use logging::LoggingInterceptor;
pub use registry::Interceptors;

use std::fmt;

use async_trait::async_trait;

use crate::context::{
    AfterAttempt, AfterDeserialization, AfterSerialization, BeforeDeserialization,
    BeforeSerialization, Finalization, MutableInput, MutableOutputAfterAttempt,
    MutableOutputFinalization, MutableRequest, MutableResponse,
};
use crate::error::BoxError;

/// Names of the interception points, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    ReadBeforeExecution,
    ModifyBeforeSerialization,
    ReadBeforeSerialization,
    ReadAfterSerialization,
    ModifyBeforeRetryLoop,
    ReadBeforeAttempt,
    ModifyBeforeSigning,
    ReadBeforeSigning,
    ReadAfterSigning,
    ModifyBeforeTransmit,
    ReadBeforeTransmit,
    ReadAfterTransmit,
    ModifyBeforeDeserialization,
    ReadBeforeDeserialization,
    ReadAfterDeserialization,
    ModifyBeforeAttemptCompletion,
    ReadAfterAttempt,
    ModifyBeforeCompletion,
    ReadAfterExecution,
}

impl Hook {
    pub const ALL: [Hook; 19] = [
        Hook::ReadBeforeExecution,
        Hook::ModifyBeforeSerialization,
        Hook::ReadBeforeSerialization,
        Hook::ReadAfterSerialization,
        Hook::ModifyBeforeRetryLoop,
        Hook::ReadBeforeAttempt,
        Hook::ModifyBeforeSigning,
        Hook::ReadBeforeSigning,
        Hook::ReadAfterSigning,
        Hook::ModifyBeforeTransmit,
        Hook::ReadBeforeTransmit,
        Hook::ReadAfterTransmit,
        Hook::ModifyBeforeDeserialization,
        Hook::ReadBeforeDeserialization,
        Hook::ReadAfterDeserialization,
        Hook::ModifyBeforeAttemptCompletion,
        Hook::ReadAfterAttempt,
        Hook::ModifyBeforeCompletion,
        Hook::ReadAfterExecution,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Hook::ReadBeforeExecution => "read_before_execution",
            Hook::ModifyBeforeSerialization => "modify_before_serialization",
            Hook::ReadBeforeSerialization => "read_before_serialization",
            Hook::ReadAfterSerialization => "read_after_serialization",
            Hook::ModifyBeforeRetryLoop => "modify_before_retry_loop",
            Hook::ReadBeforeAttempt => "read_before_attempt",
            Hook::ModifyBeforeSigning => "modify_before_signing",
            Hook::ReadBeforeSigning => "read_before_signing",
            Hook::ReadAfterSigning => "read_after_signing",
            Hook::ModifyBeforeTransmit => "modify_before_transmit",
            Hook::ReadBeforeTransmit => "read_before_transmit",
            Hook::ReadAfterTransmit => "read_after_transmit",
            Hook::ModifyBeforeDeserialization => "modify_before_deserialization",
            Hook::ReadBeforeDeserialization => "read_before_deserialization",
            Hook::ReadAfterDeserialization => "read_after_deserialization",
            Hook::ModifyBeforeAttemptCompletion => "modify_before_attempt_completion",
            Hook::ReadAfterAttempt => "read_after_attempt",
            Hook::ModifyBeforeCompletion => "modify_before_completion",
            Hook::ReadAfterExecution => "read_after_execution",
        }
    }

    /// Whether the hook receives a mutable view.
    pub const fn is_modify(&self) -> bool {
        matches!(
            self,
            Hook::ModifyBeforeSerialization
                | Hook::ModifyBeforeRetryLoop
                | Hook::ModifyBeforeSigning
                | Hook::ModifyBeforeTransmit
                | Hook::ModifyBeforeDeserialization
                | Hook::ModifyBeforeAttemptCompletion
                | Hook::ModifyBeforeCompletion
        )
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of lifecycle extension.
///
/// Hooks run in pipeline order; within a hook, interceptors run in
/// registration order. A failing hook never prevents other interceptors from
/// running the same hook.
#[async_trait]
pub trait Interceptor<I, O>: Send + Sync
where
    I: Send + Sync + 'static,
    O: Send + Sync + 'static,
{
    /// Name used in logs.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// First hook of every execution. Runs once, before anything else.
    async fn read_before_execution(
        &self,
        _context: &BeforeSerialization<'_, I>,
    ) -> Result<(), BoxError> {
        Ok(())
    }

    /// The last chance to change the input before it is serialized.
    async fn modify_before_serialization(
        &self,
        _context: &mut MutableInput<'_, I>,
    ) -> Result<(), BoxError> {
        Ok(())
    }

    async fn read_before_serialization(
        &self,
        _context: &BeforeSerialization<'_, I>,
    ) -> Result<(), BoxError> {
        Ok(())
    }

    async fn read_after_serialization(
        &self,
        _context: &AfterSerialization<'_, I>,
    ) -> Result<(), BoxError> {
        Ok(())
    }

    /// Runs once before the retry loop. Changes made here are visible to every attempt.
    async fn modify_before_retry_loop(
        &self,
        _context: &mut MutableRequest<'_, I>,
    ) -> Result<(), BoxError> {
        Ok(())
    }

    /// Start of every attempt, including retries.
    async fn read_before_attempt(
        &self,
        _context: &AfterSerialization<'_, I>,
    ) -> Result<(), BoxError> {
        Ok(())
    }

    /// Runs after the endpoint has been applied. Changes made here are undone
    /// if the attempt is retried.
    async fn modify_before_signing(
        &self,
        _context: &mut MutableRequest<'_, I>,
    ) -> Result<(), BoxError> {
        Ok(())
    }

    async fn read_before_signing(
        &self,
        _context: &AfterSerialization<'_, I>,
    ) -> Result<(), BoxError> {
        Ok(())
    }

    async fn read_after_signing(
        &self,
        _context: &AfterSerialization<'_, I>,
    ) -> Result<(), BoxError> {
        Ok(())
    }

    /// The request is already signed; changes here can invalidate the signature.
    async fn modify_before_transmit(
        &self,
        _context: &mut MutableRequest<'_, I>,
    ) -> Result<(), BoxError> {
        Ok(())
    }

    async fn read_before_transmit(
        &self,
        _context: &AfterSerialization<'_, I>,
    ) -> Result<(), BoxError> {
        Ok(())
    }

    async fn read_after_transmit(
        &self,
        _context: &BeforeDeserialization<'_, I>,
    ) -> Result<(), BoxError> {
        Ok(())
    }

    async fn modify_before_deserialization(
        &self,
        _context: &mut MutableResponse<'_, I>,
    ) -> Result<(), BoxError> {
        Ok(())
    }

    async fn read_before_deserialization(
        &self,
        _context: &BeforeDeserialization<'_, I>,
    ) -> Result<(), BoxError> {
        Ok(())
    }

    async fn read_after_deserialization(
        &self,
        _context: &AfterDeserialization<'_, I, O>,
    ) -> Result<(), BoxError> {
        Ok(())
    }

    /// Always runs at the end of an attempt, even if the attempt failed.
    /// May replace the attempt's result.
    async fn modify_before_attempt_completion(
        &self,
        _context: &mut MutableOutputAfterAttempt<'_, I, O>,
    ) -> Result<(), BoxError> {
        Ok(())
    }

    /// Always runs at the end of an attempt.
    async fn read_after_attempt(
        &self,
        _context: &AfterAttempt<'_, I, O>,
    ) -> Result<(), BoxError> {
        Ok(())
    }

    /// Always runs once the retry loop is over. May replace the final result.
    async fn modify_before_completion(
        &self,
        _context: &mut MutableOutputFinalization<'_, I, O>,
    ) -> Result<(), BoxError> {
        Ok(())
    }

    /// Last hook of every execution.
    async fn read_after_execution(
        &self,
        _context: &Finalization<'_, I, O>,
    ) -> Result<(), BoxError> {
        Ok(())
    }
}
