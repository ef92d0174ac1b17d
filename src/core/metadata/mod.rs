use std::ops::Deref;

use serde::{Deserialize, Serialize};
use tracing::debug;

use self::parameters::{
    AuthorizationEndpoint, AuthorizationServer, CredentialEndpoint, CredentialIssuer,
    DeferredCredentialEndpoint, Issuer, TokenEndpoint,
};
use super::{
    object::{ParsingErrorContext, UntypedObject},
    util::{expect_success, get, AsyncHttpClient},
};
use crate::error::{Error, Result};

pub mod parameters;

const CREDENTIAL_ISSUER_WELL_KNOWN: &str = ".well-known/openid-credential-issuer";
const OPENID_CONFIGURATION_WELL_KNOWN: &str = ".well-known/openid-configuration";

fn well_known(base: &str, suffix: &str) -> String {
    format!("{}/{suffix}", base.trim_end_matches('/'))
}

async fn fetch_document<H: AsyncHttpClient + ?Sized>(
    http_client: &H,
    url: &str,
    what: &'static str,
) -> Result<UntypedObject> {
    debug!("fetching {what} from {url}");
    let body = expect_success(get(http_client, url).await?, what)?;
    serde_json::from_slice(&body).map_err(|e| Error::deserialization(what, e))
}

/// Metadata of an OpenID for Verifiable Credential Issuance credential issuer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "UntypedObject", into = "UntypedObject")]
pub struct CredentialIssuerMetadata(UntypedObject, CredentialIssuer, CredentialEndpoint);

impl CredentialIssuerMetadata {
    /// Discover the metadata published under `<issuer>/.well-known/openid-credential-issuer`.
    pub async fn fetch<H: AsyncHttpClient + ?Sized>(http_client: &H, issuer: &str) -> Result<Self> {
        let object = fetch_document(
            http_client,
            &well_known(issuer, CREDENTIAL_ISSUER_WELL_KNOWN),
            "credential issuer metadata",
        )
        .await?;
        object
            .try_into()
            .map_err(|e| Error::deserialization("credential issuer metadata", e))
    }

    pub fn credential_issuer(&self) -> &str {
        &self.1 .0
    }

    pub fn credential_endpoint(&self) -> &str {
        &self.2 .0
    }

    pub fn deferred_credential_endpoint(&self) -> Option<String> {
        self.0
            .get::<DeferredCredentialEndpoint>()
            .and_then(|r| r.ok())
            .map(|e| e.0)
    }

    /// The authorisation server to discover, defaulting to the issuer itself.
    pub fn authorization_server(&self) -> String {
        self.0
            .get::<AuthorizationServer>()
            .and_then(|r| r.ok())
            .map_or_else(|| self.1 .0.clone(), |s| s.0)
    }
}

impl From<CredentialIssuerMetadata> for UntypedObject {
    fn from(value: CredentialIssuerMetadata) -> Self {
        let mut inner = value.0;
        inner.insert(value.1);
        inner.insert(value.2);
        inner
    }
}

impl TryFrom<UntypedObject> for CredentialIssuerMetadata {
    type Error = Error;

    fn try_from(value: UntypedObject) -> Result<Self> {
        let credential_issuer = value.get().parsing_error()?;
        let credential_endpoint = value.get().parsing_error()?;
        Ok(Self(value, credential_issuer, credential_endpoint))
    }
}

impl Deref for CredentialIssuerMetadata {
    type Target = UntypedObject;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// OpenID Provider metadata of an authorisation server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "UntypedObject", into = "UntypedObject")]
pub struct AuthorisationServerMetadata(UntypedObject, Issuer, AuthorizationEndpoint, TokenEndpoint);

impl AuthorisationServerMetadata {
    /// Discover the metadata published under `<server>/.well-known/openid-configuration`.
    pub async fn fetch<H: AsyncHttpClient + ?Sized>(http_client: &H, server: &str) -> Result<Self> {
        let object = fetch_document(
            http_client,
            &well_known(server, OPENID_CONFIGURATION_WELL_KNOWN),
            "authorisation server metadata",
        )
        .await?;
        object
            .try_into()
            .map_err(|e| Error::deserialization("authorisation server metadata", e))
    }

    pub fn issuer(&self) -> &str {
        &self.1 .0
    }

    pub fn authorization_endpoint(&self) -> &str {
        &self.2 .0
    }

    pub fn token_endpoint(&self) -> &str {
        &self.3 .0
    }
}

impl From<AuthorisationServerMetadata> for UntypedObject {
    fn from(value: AuthorisationServerMetadata) -> Self {
        let mut inner = value.0;
        inner.insert(value.1);
        inner.insert(value.2);
        inner.insert(value.3);
        inner
    }
}

impl TryFrom<UntypedObject> for AuthorisationServerMetadata {
    type Error = Error;

    fn try_from(value: UntypedObject) -> Result<Self> {
        let issuer = value.get().parsing_error()?;
        let authorization_endpoint = value.get().parsing_error()?;
        let token_endpoint = value.get().parsing_error()?;
        Ok(Self(value, issuer, authorization_endpoint, token_endpoint))
    }
}

impl Deref for AuthorisationServerMetadata {
    type Target = UntypedObject;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
