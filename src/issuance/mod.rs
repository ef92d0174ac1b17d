//! Credential issuance: token acquisition and deferred credentials.

use tracing::debug;

use crate::{
    core::{
        metadata::{AuthorisationServerMetadata, CredentialIssuerMetadata},
        util::AsyncHttpClient,
    },
    error::Result,
};

pub mod authorization_code;
pub mod deferred;
pub mod pkce;
pub mod pre_authorized;
pub mod proof;

/// Discover the issuer's metadata and that of its authorisation server.
pub async fn discover_token_endpoint<H: AsyncHttpClient + ?Sized>(
    http_client: &H,
    credential_issuer: &str,
) -> Result<(CredentialIssuerMetadata, AuthorisationServerMetadata)> {
    let issuer = CredentialIssuerMetadata::fetch(http_client, credential_issuer).await?;
    let server =
        AuthorisationServerMetadata::fetch(http_client, &issuer.authorization_server()).await?;
    debug!(
        "{} uses token endpoint {}",
        issuer.credential_issuer(),
        server.token_endpoint()
    );
    Ok((issuer, server))
}
