//! Request signing.

use async_trait::async_trait;

use crate::attributes::{Attributes, keys};
use crate::auth::SelectedAuthScheme;
use crate::error::OrchestratorError;
use crate::http::HttpRequest;

/// Signs the request of an attempt.
///
/// Implementations must leave the request untouched when the selected scheme
/// is the no-auth scheme, and should record the produced signature under
/// `keys::REQUEST_SIGNATURE`.
#[async_trait]
pub trait ApplySigner: Send + Sync {
    async fn apply(
        &self,
        request: HttpRequest,
        selected_auth_scheme: Option<&SelectedAuthScheme>,
        attributes: &mut Attributes,
    ) -> Result<HttpRequest, OrchestratorError>;
}

/// Closure-backed `ApplySigner`.
pub struct ApplySignerFn<F>(F);

impl<F> ApplySignerFn<F>
where
    F: Fn(HttpRequest, Option<&SelectedAuthScheme>, &mut Attributes) -> Result<HttpRequest, OrchestratorError>
        + Send
        + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F> ApplySigner for ApplySignerFn<F>
where
    F: Fn(HttpRequest, Option<&SelectedAuthScheme>, &mut Attributes) -> Result<HttpRequest, OrchestratorError>
        + Send
        + Sync,
{
    async fn apply(
        &self,
        request: HttpRequest,
        selected_auth_scheme: Option<&SelectedAuthScheme>,
        attributes: &mut Attributes,
    ) -> Result<HttpRequest, OrchestratorError> {
        (self.0)(request, selected_auth_scheme, attributes)
    }
}

/// Delegates to the signer of the selected auth scheme.
#[derive(Clone, Debug, Default)]
pub struct SchemeSigner;

#[async_trait]
impl ApplySigner for SchemeSigner {
    async fn apply(
        &self,
        request: HttpRequest,
        selected_auth_scheme: Option<&SelectedAuthScheme>,
        attributes: &mut Attributes,
    ) -> Result<HttpRequest, OrchestratorError> {
        let Some(selected) = selected_auth_scheme else {
            return Err(OrchestratorError::signing("no auth scheme selected"));
        };
        if selected.is_no_auth() {
            return Ok(request);
        }
        let (Some(identity), Some(signer)) = (&selected.identity, &selected.signer) else {
            return Err(OrchestratorError::signing(format!(
                "auth scheme `{}` has no identity or signer",
                selected.scheme_id
            )));
        };

        let signed = signer
            .sign(request, identity, &selected.signing_properties)
            .await?;
        if let Some(signature) = signed.signature {
            attributes.set(&keys::REQUEST_SIGNATURE, signature);
        }
        tracing::debug!(target: "smithy_orchestrator::auth", scheme_id=%selected.scheme_id, "request signed");
        Ok(signed.request)
    }
}
