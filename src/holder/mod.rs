//! Assembly and submission of Verifiable Presentations.

use base64::prelude::*;
use serde_json::Value as Json;
use tracing::{debug, warn};

use self::verifiable_presentation_builder::{
    VerifiablePresentation, VerifiablePresentationBuilder, VerifiablePresentationBuilderOptions,
};
use crate::{
    config::EngineConfig,
    core::{
        authorization_request::AuthorizationRequest,
        credential_format::ClaimFormatDesignation,
        jws,
        presentation_submission::PresentationSubmission,
        response::{
            parameters::{State, VpToken},
            AuthorizationResponse, PostRedirection,
        },
        util::{expect_redirect, expect_success, post_form, AsyncHttpClient},
    },
    error::{Error, Result},
    signing::{sign, DocumentType},
    store::{CredentialSource, SecretStore},
};

pub mod verifiable_presentation_builder;

/// Builds presentations from the holder's stored credentials.
#[derive(Debug)]
pub struct PresentationAssembler<'a, S: ?Sized, C: ?Sized> {
    secrets: &'a S,
    credentials: &'a C,
    config: &'a EngineConfig,
}

impl<'a, S, C> PresentationAssembler<'a, S, C>
where
    S: SecretStore + ?Sized,
    C: CredentialSource + ?Sized,
{
    pub fn new(secrets: &'a S, credentials: &'a C, config: &'a EngineConfig) -> Self {
        Self {
            secrets,
            credentials,
            config,
        }
    }

    /// Build and sign a `jwt_vp` presenting `credential_ids`, in order.
    ///
    /// The holder is the `sub` of the first credential's JWT form; every credential is embedded
    /// in `format`.
    pub async fn assemble(
        &self,
        credential_ids: &[String],
        nonce: &str,
        audience: &str,
        format: &ClaimFormatDesignation,
    ) -> Result<String> {
        let holder = self.holder_did(credential_ids).await?;
        let credentials = self.fetch_all(credential_ids, format).await?;
        let presentation = VerifiablePresentation::new(holder.clone(), credentials);

        let claims = VerifiablePresentationBuilder::from_options(VerifiablePresentationBuilderOptions {
            issuer: holder.clone(),
            subject: holder.clone(),
            audience: audience.to_owned(),
            nonce: nonce.to_owned(),
            expiration_secs: self.config.vp_expiration_secs,
            presentation,
        })?;

        debug!(
            "presenting {} credential(s) as {holder} to {audience}",
            credential_ids.len()
        );
        sign(self.secrets, &Json::Object(claims), &holder, DocumentType::Vp).await
    }

    /// Build an unsigned DOME-profile presentation from `vc_json` credentials, base64url encoded.
    pub async fn assemble_dome(&self, credential_ids: &[String]) -> Result<String> {
        if credential_ids.is_empty() {
            return Err(Error::EmptyCredentialList);
        }
        let credentials = self
            .fetch_all(credential_ids, &ClaimFormatDesignation::VcJson)
            .await?;
        let presentation =
            VerifiablePresentation::new(self.config.dome_holder_did.clone(), credentials);

        let bytes = serde_json::to_vec(&presentation).map_err(Error::parse)?;
        Ok(BASE64_URL_SAFE_NO_PAD.encode(bytes))
    }

    async fn holder_did(&self, credential_ids: &[String]) -> Result<String> {
        let first = credential_ids.first().ok_or(Error::EmptyCredentialList)?;
        let jwt = self
            .credentials
            .credential(first, &ClaimFormatDesignation::JwtVc)
            .await
            .map_err(Error::Storage)?;

        match jws::decode_unverified(&jwt) {
            Ok(claims) => match claims.get("sub").and_then(Json::as_str) {
                Some(sub) => Ok(sub.to_owned()),
                None => {
                    warn!("credential {first} has no subject");
                    Err(Error::EmptyCredentialList)
                }
            },
            Err(e) => {
                warn!("credential {first} is not a readable JWT: {e}");
                Err(Error::EmptyCredentialList)
            }
        }
    }

    async fn fetch_all(
        &self,
        credential_ids: &[String],
        format: &ClaimFormatDesignation,
    ) -> Result<Vec<Json>> {
        let mut credentials = Vec::with_capacity(credential_ids.len());
        for id in credential_ids {
            let credential = self
                .credentials
                .credential(id, format)
                .await
                .map_err(Error::Storage)?;
            credentials.push(embed(credential, format)?);
        }
        Ok(credentials)
    }
}

/// JWT credentials are embedded as strings, JSON credentials as objects.
fn embed(credential: String, format: &ClaimFormatDesignation) -> Result<Json> {
    if format.is_jwt() {
        return Ok(Json::String(credential));
    }
    serde_json::from_str(&credential)
        .map_err(|e| Error::Parse(format!("stored {format} credential is not JSON: {e}")))
}

/// Post a `vp_token` answering `request` in `direct_post` mode.
///
/// The presentation submission nests one entry per `descriptor_ids`, in the order the
/// credentials appear in the presentation. Returns where the verifier redirects the holder, if
/// anywhere.
pub async fn submit_authorization_response<H: AsyncHttpClient + ?Sized>(
    http_client: &H,
    request: &AuthorizationRequest,
    vp_token: String,
    definition_id: String,
    descriptor_ids: &[String],
) -> Result<Option<String>> {
    let response = AuthorizationResponse {
        vp_token: VpToken(vp_token),
        presentation_submission: PresentationSubmission::nested_chain(definition_id, descriptor_ids),
        state: request.state.clone().map(State),
    };

    let http_response = post_form(
        http_client,
        &request.redirect_uri,
        response.into_x_www_form_urlencoded()?,
        None,
    )
    .await?;

    let status = http_response.status();
    if status.is_redirection() {
        return expect_redirect(&http_response, "authorization response").map(Some);
    }

    let body = expect_success(http_response, "authorization response")?;
    debug!("authorization response accepted (status: {status})");
    match serde_json::from_slice::<PostRedirection>(&body) {
        Ok(PostRedirection { redirect_uri }) => Ok(Some(redirect_uri.to_string())),
        Err(e) => {
            warn!("authorization response body carries no redirect_uri: {e}");
            Ok(None)
        }
    }
}
