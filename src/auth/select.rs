//! Auth scheme selection.

use async_trait::async_trait;

use super::{AuthSchemes, NO_AUTH_SCHEME_ID, SelectedAuthScheme};
use crate::attributes::{Attributes, keys};
use crate::error::OrchestratorError;

/// Chooses the auth scheme for an attempt. `None` means no scheme could be
/// chosen, which fails the attempt.
#[async_trait]
pub trait SelectAuthScheme: Send + Sync {
    async fn select(
        &self,
        attributes: &Attributes,
    ) -> Result<Option<SelectedAuthScheme>, OrchestratorError>;
}

/// `SelectAuthScheme` backed by a closure.
pub struct SelectAuthSchemeFn<F>(F);

impl<F> SelectAuthSchemeFn<F>
where
    F: Fn(&Attributes) -> Result<Option<SelectedAuthScheme>, OrchestratorError> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F> SelectAuthScheme for SelectAuthSchemeFn<F>
where
    F: Fn(&Attributes) -> Result<Option<SelectedAuthScheme>, OrchestratorError> + Send + Sync,
{
    async fn select(
        &self,
        attributes: &Attributes,
    ) -> Result<Option<SelectedAuthScheme>, OrchestratorError> {
        (self.0)(attributes)
    }
}

/// Selects from the resolver, schemes and identity resolvers stored in the
/// call attributes.
///
/// The first option whose scheme is configured and whose identity resolves
/// wins. No-auth options are always available and need no identity.
#[derive(Clone, Debug, Default)]
pub struct ConfiguredAuthSchemeSelector;

#[async_trait]
impl SelectAuthScheme for ConfiguredAuthSchemeSelector {
    async fn select(
        &self,
        attributes: &Attributes,
    ) -> Result<Option<SelectedAuthScheme>, OrchestratorError> {
        let resolver = attributes
            .get(&keys::AUTH_SCHEME_RESOLVER)
            .ok_or_else(|| OrchestratorError::configuration("no auth scheme resolver configured"))?;
        let options = resolver.resolve_auth_scheme(attributes).await?;

        let empty = AuthSchemes::new();
        let schemes = attributes.get(&keys::AUTH_SCHEMES).unwrap_or(&empty);
        let identity_resolvers = attributes.get(&keys::IDENTITY_RESOLVERS);

        for option in options {
            if option.scheme_id == NO_AUTH_SCHEME_ID {
                tracing::debug!(target: "smithy_orchestrator::auth", "selected no-auth scheme");
                return Ok(Some(SelectedAuthScheme::no_auth()));
            }
            let Some(scheme) = schemes.get(&option.scheme_id) else {
                tracing::trace!(target: "smithy_orchestrator::auth", scheme_id=%option.scheme_id, "auth scheme not configured, skipping");
                continue;
            };
            let identity_resolvers = identity_resolvers.ok_or_else(|| {
                OrchestratorError::configuration("no identity resolvers configured")
            })?;
            let Some(identity_resolver) = scheme.identity_resolver(identity_resolvers) else {
                tracing::trace!(target: "smithy_orchestrator::auth", scheme_id=%option.scheme_id, "no identity resolver for scheme, skipping");
                continue;
            };

            let identity = identity_resolver
                .resolve_identity(&option.identity_properties)
                .await?;
            let signing_properties =
                scheme.customize_signing_properties(option.signer_properties, attributes);
            tracing::debug!(target: "smithy_orchestrator::auth", scheme_id=%option.scheme_id, "selected auth scheme");
            return Ok(Some(SelectedAuthScheme::new(
                option.scheme_id,
                identity,
                scheme.signer(),
                signing_properties,
            )));
        }

        Err(OrchestratorError::configuration(
            "no auth scheme could be resolved",
        ))
    }
}
