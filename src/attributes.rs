//! Typed side-channel attributes.
//!
//! Collaborators share per-call state (logger, auth configuration, partition
//! id, request signature, ...) through an `Attributes` map keyed by typed
//! `AttributeKey<T>` constants. Values are reference counted so a base set of
//! attributes configured on the orchestrator is cheap to clone into every call.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// A named, typed key into `Attributes`.
pub struct AttributeKey<T> {
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> AttributeKey<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for AttributeKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for AttributeKey<T> {}

impl<T> fmt::Debug for AttributeKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AttributeKey({})", self.name)
    }
}

/// Weakly-typed attribute map with typed accessors.
#[derive(Clone, Default)]
pub struct Attributes {
    values: HashMap<&'static str, Arc<dyn Any + Send + Sync>>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value stored under `key`. Returns `None` if absent or stored with another type.
    pub fn get<T: Send + Sync + 'static>(&self, key: &AttributeKey<T>) -> Option<&T> {
        self.values.get(key.name).and_then(|v| v.downcast_ref::<T>())
    }

    pub fn set<T: Send + Sync + 'static>(&mut self, key: &AttributeKey<T>, value: T) {
        self.values.insert(key.name, Arc::new(value));
    }

    pub fn with<T: Send + Sync + 'static>(mut self, key: &AttributeKey<T>, value: T) -> Self {
        self.set(key, value);
        self
    }

    pub fn remove<T: Send + Sync + 'static>(&mut self, key: &AttributeKey<T>) -> bool {
        self.values.remove(key.name).is_some()
    }

    pub fn contains<T: Send + Sync + 'static>(&self, key: &AttributeKey<T>) -> bool {
        self.get(key).is_some()
    }

    /// Copy every entry of `other` into `self`, overwriting existing keys.
    pub fn extend(&mut self, other: &Attributes) {
        for (name, value) in &other.values {
            self.values.insert(*name, Arc::clone(value));
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl fmt::Debug for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.values.keys().collect();
        names.sort();
        f.debug_struct("Attributes").field("keys", &names).finish()
    }
}

/// Well-known attribute keys read and written by the stock collaborators.
pub mod keys {
    use std::sync::Arc;
    use std::time::Duration;

    use super::AttributeKey;
    use crate::auth::{AuthSchemeResolver, AuthSchemes, IdentityResolvers, SelectedAuthScheme};
    use crate::logging::Logger;

    /// Diagnostic sink for superseded interceptor errors.
    pub const LOGGER: AttributeKey<Arc<dyn Logger>> = AttributeKey::new("logger");
    pub const AUTH_SCHEME_RESOLVER: AttributeKey<Arc<dyn AuthSchemeResolver>> =
        AttributeKey::new("auth_scheme_resolver");
    pub const IDENTITY_RESOLVERS: AttributeKey<IdentityResolvers> =
        AttributeKey::new("identity_resolvers");
    pub const AUTH_SCHEMES: AttributeKey<AuthSchemes> = AttributeKey::new("auth_schemes");
    /// Written by the orchestrator once per attempt.
    pub const SELECTED_AUTH_SCHEME: AttributeKey<SelectedAuthScheme> =
        AttributeKey::new("selected_auth_scheme");
    /// Explicit retry partition; overrides the request host when non-empty.
    pub const PARTITION_ID: AttributeKey<String> = AttributeKey::new("partition_id");
    /// Written by the signer for downstream consumers such as event-stream signing.
    pub const REQUEST_SIGNATURE: AttributeKey<String> = AttributeKey::new("request_signature");
    pub const SOCKET_TIMEOUT: AttributeKey<Duration> = AttributeKey::new("socket_timeout");
    pub const SERVICE_NAME: AttributeKey<String> = AttributeKey::new("service_name");
    pub const OPERATION_NAME: AttributeKey<String> = AttributeKey::new("operation_name");
}
