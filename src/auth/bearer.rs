//! HTTP bearer auth (`smithy.api#httpBearerAuth`).

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use super::{AuthScheme, Identity, SignedRequest, Signer};
use crate::attributes::Attributes;
use crate::error::OrchestratorError;
use crate::http::HttpRequest;

pub const HTTP_BEARER_AUTH_SCHEME_ID: &str = "smithy.api#httpBearerAuth";

/// A bearer token identity. The token is only readable through
/// [`ExposeSecret`], and `Debug` output is redacted.
#[derive(Clone, Debug)]
pub struct BearerToken(SecretString);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    pub fn secret(&self) -> &SecretString {
        &self.0
    }
}

/// Sets `Authorization: Bearer <token>`.
#[derive(Clone, Debug, Default)]
pub struct BearerSigner;

#[async_trait]
impl Signer for BearerSigner {
    async fn sign(
        &self,
        mut request: HttpRequest,
        identity: &Identity,
        _: &Attributes,
    ) -> Result<SignedRequest, OrchestratorError> {
        let token = identity.data::<BearerToken>().ok_or_else(|| {
            OrchestratorError::signing("bearer auth requires a BearerToken identity")
        })?;
        let value = format!("Bearer {}", token.secret().expose_secret());
        request
            .set_header("authorization", &value)
            .map_err(|_| OrchestratorError::signing("bearer token is not a valid header value"))?;
        Ok(SignedRequest::new(request))
    }
}

#[derive(Clone, Debug, Default)]
pub struct BearerAuthScheme;

impl AuthScheme for BearerAuthScheme {
    fn scheme_id(&self) -> &str {
        HTTP_BEARER_AUTH_SCHEME_ID
    }

    fn signer(&self) -> Arc<dyn Signer> {
        Arc::new(BearerSigner)
    }
}
