//! Type-erased interceptors.
//!
//! `AnyInterceptor` puts any `Interceptor` implementation behind a shared
//! trait object so the registry can hold heterogeneous interceptors in one
//! ordered list. `HookInterceptor` builds an interceptor out of individual
//! closures; hooks that are not supplied stay no-ops.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;

use super::Interceptor;
use crate::context::{
    AfterAttempt, AfterDeserialization, AfterSerialization, BeforeDeserialization,
    BeforeSerialization, Finalization, MutableInput, MutableOutputAfterAttempt,
    MutableOutputFinalization, MutableRequest, MutableResponse,
};
use crate::error::BoxError;

/// An interceptor of any concrete type.
pub struct AnyInterceptor<I, O> {
    name: &'static str,
    inner: Arc<dyn Interceptor<I, O>>,
}

impl<I, O> AnyInterceptor<I, O>
where
    I: Send + Sync + 'static,
    O: Send + Sync + 'static,
{
    pub fn new(interceptor: impl Interceptor<I, O> + 'static) -> Self {
        Self::from_arc(Arc::new(interceptor))
    }

    /// Wrap an interceptor that is shared with other orchestrators.
    pub fn from_arc(interceptor: Arc<dyn Interceptor<I, O>>) -> Self {
        Self {
            name: interceptor.name(),
            inner: interceptor,
        }
    }
}

impl<I, O> AnyInterceptor<I, O> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn inner(&self) -> &dyn Interceptor<I, O> {
        self.inner.as_ref()
    }
}

impl<I, O> Clone for AnyInterceptor<I, O> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<I, O> fmt::Debug for AnyInterceptor<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyInterceptor")
            .field("name", &self.name)
            .finish()
    }
}

// Generates `HookInterceptor` with one optional closure per hook, a builder
// method per hook, and the forwarding `Interceptor` impl.
macro_rules! hook_interceptor {
    ($( $hook:ident => $setter:ident : $($view:ident)::+ < $($param:ident),+ > $(, $mutability:tt)? );+ $(;)?) => {
        /// An interceptor assembled from individual hook closures.
        ///
        /// ```rust,ignore
        /// let interceptor = HookInterceptor::new("trace-id")
        ///     .with_modify_before_transmit(|ctx| {
        ///         ctx.request_mut().set_header("x-trace-id", "abc")?;
        ///         Ok(())
        ///     });
        /// ```
        pub struct HookInterceptor<I, O> {
            name: &'static str,
            $(
                $hook: Option<
                    Box<
                        dyn Fn(&$($mutability)? $($view)::+<'_, $($param),+>) -> Result<(), BoxError>
                            + Send
                            + Sync,
                    >,
                >,
            )+
            _marker: PhantomData<fn() -> (I, O)>,
        }

        impl<I, O> HookInterceptor<I, O> {
            pub fn new(name: &'static str) -> Self {
                Self {
                    name,
                    $( $hook: None, )+
                    _marker: PhantomData,
                }
            }

            $(
                pub fn $setter<F>(mut self, hook: F) -> Self
                where
                    F: Fn(&$($mutability)? $($view)::+<'_, $($param),+>) -> Result<(), BoxError>
                        + Send
                        + Sync
                        + 'static,
                {
                    self.$hook = Some(Box::new(hook));
                    self
                }
            )+
        }

        #[async_trait]
        impl<I, O> Interceptor<I, O> for HookInterceptor<I, O>
        where
            I: Send + Sync + 'static,
            O: Send + Sync + 'static,
        {
            fn name(&self) -> &'static str {
                self.name
            }

            $(
                async fn $hook(
                    &self,
                    context: &$($mutability)? $($view)::+<'_, $($param),+>,
                ) -> Result<(), BoxError> {
                    match &self.$hook {
                        Some(hook) => hook(context),
                        None => Ok(()),
                    }
                }
            )+
        }
    };
}

hook_interceptor! {
    read_before_execution => with_read_before_execution: BeforeSerialization<I>;
    modify_before_serialization => with_modify_before_serialization: MutableInput<I>, mut;
    read_before_serialization => with_read_before_serialization: BeforeSerialization<I>;
    read_after_serialization => with_read_after_serialization: AfterSerialization<I>;
    modify_before_retry_loop => with_modify_before_retry_loop: MutableRequest<I>, mut;
    read_before_attempt => with_read_before_attempt: AfterSerialization<I>;
    modify_before_signing => with_modify_before_signing: MutableRequest<I>, mut;
    read_before_signing => with_read_before_signing: AfterSerialization<I>;
    read_after_signing => with_read_after_signing: AfterSerialization<I>;
    modify_before_transmit => with_modify_before_transmit: MutableRequest<I>, mut;
    read_before_transmit => with_read_before_transmit: AfterSerialization<I>;
    read_after_transmit => with_read_after_transmit: BeforeDeserialization<I>;
    modify_before_deserialization => with_modify_before_deserialization: MutableResponse<I>, mut;
    read_before_deserialization => with_read_before_deserialization: BeforeDeserialization<I>;
    read_after_deserialization => with_read_after_deserialization: AfterDeserialization<I, O>;
    modify_before_attempt_completion => with_modify_before_attempt_completion: MutableOutputAfterAttempt<I, O>, mut;
    read_after_attempt => with_read_after_attempt: AfterAttempt<I, O>;
    modify_before_completion => with_modify_before_completion: MutableOutputFinalization<I, O>, mut;
    read_after_execution => with_read_after_execution: Finalization<I, O>;
}

impl<I, O> fmt::Debug for HookInterceptor<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookInterceptor")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
