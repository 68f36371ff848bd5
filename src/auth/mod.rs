//! Authentication
//!
//! Auth is resolved per attempt. An `AuthSchemeResolver` yields the candidate
//! `AuthOption`s for a call in priority order; the selector picks the first
//! option whose scheme is configured and whose identity can be resolved, and
//! produces a `SelectedAuthScheme` carrying the identity, the signer, and the
//! signing properties.

pub mod bearer;
pub mod select;

pub use bearer::{BearerAuthScheme, BearerSigner, BearerToken, HTTP_BEARER_AUTH_SCHEME_ID};
pub use select::{ConfiguredAuthSchemeSelector, SelectAuthScheme, SelectAuthSchemeFn};

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;

use crate::attributes::Attributes;
use crate::error::OrchestratorError;
use crate::http::HttpRequest;

/// Scheme id of the anonymous auth scheme. Signing is skipped for it.
pub const NO_AUTH_SCHEME_ID: &str = "smithy.api#noAuth";

/// Resolved credentials of any kind.
#[derive(Clone)]
pub struct Identity {
    data: Arc<dyn Any + Send + Sync>,
    expiration: Option<SystemTime>,
}

impl Identity {
    pub fn new<T: Any + Send + Sync>(data: T, expiration: Option<SystemTime>) -> Self {
        Self {
            data: Arc::new(data),
            expiration,
        }
    }

    /// The identity payload, if it has type `T`.
    pub fn data<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.data.downcast_ref()
    }

    pub fn expiration(&self) -> Option<SystemTime> {
        self.expiration
    }

    pub fn is_expired(&self, now: SystemTime) -> bool {
        self.expiration.is_some_and(|at| at <= now)
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("expiration", &self.expiration)
            .finish_non_exhaustive()
    }
}

#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve_identity(
        &self,
        identity_properties: &Attributes,
    ) -> Result<Identity, OrchestratorError>;
}

/// Resolves to a fixed identity.
#[derive(Clone, Debug)]
pub struct StaticIdentityResolver {
    identity: Identity,
}

impl StaticIdentityResolver {
    pub fn new(identity: Identity) -> Self {
        Self { identity }
    }
}

#[async_trait]
impl IdentityResolver for StaticIdentityResolver {
    async fn resolve_identity(&self, _: &Attributes) -> Result<Identity, OrchestratorError> {
        Ok(self.identity.clone())
    }
}

/// Identity resolvers keyed by the scheme id they serve.
#[derive(Clone, Default)]
pub struct IdentityResolvers {
    resolvers: HashMap<String, Arc<dyn IdentityResolver>>,
}

impl IdentityResolvers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(
        mut self,
        scheme_id: impl Into<String>,
        resolver: impl IdentityResolver + 'static,
    ) -> Self {
        self.resolvers.insert(scheme_id.into(), Arc::new(resolver));
        self
    }

    pub fn get(&self, scheme_id: &str) -> Option<Arc<dyn IdentityResolver>> {
        self.resolvers.get(scheme_id).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }
}

impl fmt::Debug for IdentityResolvers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.resolvers.keys()).finish()
    }
}

/// Output of a `Signer`.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    pub request: HttpRequest,
    /// Signature to expose to downstream consumers, such as event stream signing.
    pub signature: Option<String>,
}

impl SignedRequest {
    pub fn new(request: HttpRequest) -> Self {
        Self {
            request,
            signature: None,
        }
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }
}

/// Signs a request with a resolved identity.
#[async_trait]
pub trait Signer: Send + Sync {
    async fn sign(
        &self,
        request: HttpRequest,
        identity: &Identity,
        signing_properties: &Attributes,
    ) -> Result<SignedRequest, OrchestratorError>;
}

/// An auth scheme: a scheme id, the signer for it, and how its identity
/// resolver is looked up.
pub trait AuthScheme: Send + Sync {
    fn scheme_id(&self) -> &str;

    fn signer(&self) -> Arc<dyn Signer>;

    fn identity_resolver(&self, resolvers: &IdentityResolvers) -> Option<Arc<dyn IdentityResolver>> {
        resolvers.get(self.scheme_id())
    }

    /// Adjust the signing properties of the option chosen for this scheme.
    fn customize_signing_properties(&self, properties: Attributes, _context: &Attributes) -> Attributes {
        properties
    }
}

/// Configured auth schemes, looked up by id.
#[derive(Clone, Default)]
pub struct AuthSchemes {
    schemes: Vec<Arc<dyn AuthScheme>>,
}

impl AuthSchemes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, scheme: impl AuthScheme + 'static) -> Self {
        self.schemes.push(Arc::new(scheme));
        self
    }

    /// First scheme registered under `scheme_id`.
    pub fn get(&self, scheme_id: &str) -> Option<Arc<dyn AuthScheme>> {
        self.schemes
            .iter()
            .find(|scheme| scheme.scheme_id() == scheme_id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.schemes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemes.is_empty()
    }
}

impl fmt::Debug for AuthSchemes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.schemes.iter().map(|s| s.scheme_id().to_string()))
            .finish()
    }
}

/// A candidate auth scheme for a call, with the properties its identity
/// resolver and signer need.
#[derive(Clone, Debug)]
pub struct AuthOption {
    pub scheme_id: String,
    pub identity_properties: Attributes,
    pub signer_properties: Attributes,
}

impl AuthOption {
    pub fn new(scheme_id: impl Into<String>) -> Self {
        Self {
            scheme_id: scheme_id.into(),
            identity_properties: Attributes::new(),
            signer_properties: Attributes::new(),
        }
    }

    pub fn no_auth() -> Self {
        Self::new(NO_AUTH_SCHEME_ID)
    }

    pub fn with_identity_properties(mut self, properties: Attributes) -> Self {
        self.identity_properties = properties;
        self
    }

    pub fn with_signer_properties(mut self, properties: Attributes) -> Self {
        self.signer_properties = properties;
        self
    }
}

/// Produces the auth options for a call, most preferred first.
#[async_trait]
pub trait AuthSchemeResolver: Send + Sync {
    async fn resolve_auth_scheme(
        &self,
        attributes: &Attributes,
    ) -> Result<Vec<AuthOption>, OrchestratorError>;
}

/// Returns the same options for every call.
#[derive(Clone, Debug, Default)]
pub struct StaticAuthSchemeResolver {
    options: Vec<AuthOption>,
}

impl StaticAuthSchemeResolver {
    pub fn new(options: Vec<AuthOption>) -> Self {
        Self { options }
    }

    pub fn no_auth() -> Self {
        Self::new(vec![AuthOption::no_auth()])
    }
}

#[async_trait]
impl AuthSchemeResolver for StaticAuthSchemeResolver {
    async fn resolve_auth_scheme(&self, _: &Attributes) -> Result<Vec<AuthOption>, OrchestratorError> {
        Ok(self.options.clone())
    }
}

/// The auth scheme chosen for an attempt.
#[derive(Clone)]
pub struct SelectedAuthScheme {
    pub scheme_id: String,
    pub identity: Option<Identity>,
    pub signer: Option<Arc<dyn Signer>>,
    pub signing_properties: Attributes,
}

impl SelectedAuthScheme {
    pub fn new(
        scheme_id: impl Into<String>,
        identity: Identity,
        signer: Arc<dyn Signer>,
        signing_properties: Attributes,
    ) -> Self {
        Self {
            scheme_id: scheme_id.into(),
            identity: Some(identity),
            signer: Some(signer),
            signing_properties,
        }
    }

    pub fn no_auth() -> Self {
        Self {
            scheme_id: NO_AUTH_SCHEME_ID.to_string(),
            identity: None,
            signer: None,
            signing_properties: Attributes::new(),
        }
    }

    pub fn is_no_auth(&self) -> bool {
        self.scheme_id == NO_AUTH_SCHEME_ID
    }
}

impl fmt::Debug for SelectedAuthScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectedAuthScheme")
            .field("scheme_id", &self.scheme_id)
            .field("identity", &self.identity)
            .field("signing_properties", &self.signing_properties)
            .finish_non_exhaustive()
    }
}
