//! Token acquisition with an authorization code, as run against EBSI authorisation servers.
//!
//! The wallet sends an Authorization Request with a PKCE challenge. The server answers with a
//! redirect carrying a Request Object (by value or by reference) that asks either for an
//! `id_token` or for a `vp_token`. Posting that token back yields the authorization code, which
//! is then exchanged for an access token.

use std::collections::HashMap;

use serde_json::{json, Map, Value as Json};
use tracing::{debug, info, warn};
use url::Url;

use super::{
    discover_token_endpoint,
    pkce::{Pkce, CODE_CHALLENGE_METHOD},
};
use crate::{
    config::EngineConfig,
    core::{
        authorization_request::{parameters::ResponseType, RequestIndirection, RequestObject},
        credential_format::ClaimFormatDesignation,
        credential_offer::{CredentialOffer, Grant},
        jws::ES256,
        metadata::AuthorisationServerMetadata,
        presentation_submission::PresentationSubmission,
        token::{TokenRequest, TokenResponse},
        util::{
            expect_redirect, expect_success, form_urlencode, get, post_form, query_params,
            unix_now, AsyncHttpClient,
        },
    },
    error::{Error, Result},
    holder::PresentationAssembler,
    signing::{sign, DocumentType},
    store::{CredentialSource, SecretStore},
};

const OPENID_CREDENTIAL: &str = "openid_credential";

/// Drives the authorization code flow for a wallet DID.
pub struct AuthorizationCodeFlow<'a, H: ?Sized, S: ?Sized, C: ?Sized> {
    http_client: &'a H,
    config: &'a EngineConfig,
    secrets: &'a S,
    credentials: &'a C,
}

impl<'a, H, S, C> AuthorizationCodeFlow<'a, H, S, C>
where
    H: AsyncHttpClient + ?Sized,
    S: SecretStore + ?Sized,
    C: CredentialSource + ?Sized,
{
    pub fn new(
        http_client: &'a H,
        config: &'a EngineConfig,
        secrets: &'a S,
        credentials: &'a C,
    ) -> Self {
        Self {
            http_client,
            config,
            secrets,
            credentials,
        }
    }

    /// Discover the authorisation server of the offer's issuer and run the whole flow.
    pub async fn acquire_for_offer(&self, did: &str, offer: &CredentialOffer) -> Result<TokenResponse> {
        let (_, server) = discover_token_endpoint(self.http_client, &offer.credential_issuer).await?;
        self.acquire(did, offer, &server).await
    }

    pub async fn acquire(
        &self,
        did: &str,
        offer: &CredentialOffer,
        server: &AuthorisationServerMetadata,
    ) -> Result<TokenResponse> {
        let pkce = Pkce::generate();
        let query = self.authorization_request(did, offer, &pkce)?;
        let url = authorization_url(server.authorization_endpoint(), &query)?;

        let response = get(self.http_client, url.as_str()).await?;
        let location = expect_redirect(&response, "authorization request")?;
        let jwt = RequestIndirection::from_query_params(&redirect_params(&location)?)?
            .resolve(self.http_client)
            .await?;
        let request = RequestObject::from_jwt(&jwt)?;

        let params = match request.response_type() {
            ResponseType::IdToken => {
                debug!("authorisation server requested an id_token");
                self.id_token_exchange(did, &request, server.issuer()).await?
            }
            ResponseType::VpToken => {
                debug!("authorisation server requested a vp_token");
                self.vp_token_exchange(&request, server.issuer()).await?
            }
            other => {
                return Err(Error::Parse(format!(
                    "unsupported response_type '{other}' in request object"
                )))
            }
        };

        self.exchange_code(did, server.token_endpoint(), &params, &pkce)
            .await
    }

    /// Urlencoded Authorization Request for `offer`.
    pub fn authorization_request(
        &self,
        did: &str,
        offer: &CredentialOffer,
        pkce: &Pkce,
    ) -> Result<String> {
        let authorization_details: Vec<Json> = offer
            .credentials
            .iter()
            .map(|credential| {
                json!({
                    "type": OPENID_CREDENTIAL,
                    "format": credential.format,
                    "types": credential.types,
                    "locations": [offer.credential_issuer],
                })
            })
            .collect();
        let client_metadata = json!({
            "authorization_endpoint": self.config.redirect_uri,
            "response_types_supported": ["vp_token", "id_token"],
            "vp_formats_supported": {
                "jwt_vp": {"alg": [ES256]},
                "jwt_vc": {"alg": [ES256]},
            },
        });

        let authorization_details = serde_json::to_string(&authorization_details).map_err(Error::parse)?;
        let client_metadata = serde_json::to_string(&client_metadata).map_err(Error::parse)?;

        let mut pairs = vec![
            ("response_type", "code"),
            ("scope", "openid"),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("client_id", did),
            ("authorization_details", authorization_details.as_str()),
            ("state", self.config.global_state.as_str()),
            ("code_challenge", pkce.challenge()),
            ("code_challenge_method", CODE_CHALLENGE_METHOD),
            ("client_metadata", client_metadata.as_str()),
        ];
        if let Grant::AuthorizationCode(grant) = &offer.grant {
            if let Some(issuer_state) = &grant.issuer_state {
                pairs.push(("issuer_state", issuer_state.as_str()));
            }
        }
        form_urlencode(&pairs)
    }

    /// Answer an `id_token` Request Object, returning the query of the server's redirect.
    pub async fn id_token_exchange(
        &self,
        did: &str,
        request: &RequestObject,
        audience: &str,
    ) -> Result<HashMap<String, String>> {
        let claims = Json::Object(id_token_document(
            did,
            audience,
            &request.nonce().0,
            self.config.id_token_expiration_secs,
        ));
        let id_token = sign(self.secrets, &claims, did, DocumentType::IdToken).await?;

        let mut pairs = vec![("id_token", id_token)];
        if let Some(state) = request.state() {
            pairs.push(("state", state.0.clone()));
        }
        self.post_back(request, form_urlencode(&pairs)?, "id_token response")
            .await
    }

    /// Answer a `vp_token` Request Object, returning the query of the server's redirect.
    ///
    /// One credential is selected per input descriptor, matching every type the descriptor
    /// requires. Nothing is signed or sent unless every descriptor is satisfied. The presentation
    /// is signed by the subject of the first selected credential.
    pub async fn vp_token_exchange(
        &self,
        request: &RequestObject,
        audience: &str,
    ) -> Result<HashMap<String, String>> {
        let definition = request
            .resolve_presentation_definition(self.http_client)
            .await?;

        let mut descriptor_ids = Vec::new();
        let mut credential_ids = Vec::new();
        for descriptor in definition.input_descriptors() {
            let Some(credential_id) = self.select_credential(&descriptor.required_types()).await?
            else {
                warn!("no credential satisfies input descriptor {}", descriptor.id());
                return Err(Error::UnsatisfiedDescriptor(descriptor.id().to_owned()));
            };
            descriptor_ids.push(descriptor.id().to_owned());
            credential_ids.push(credential_id);
        }

        let assembler = PresentationAssembler::new(self.secrets, self.credentials, self.config);
        let vp_token = assembler
            .assemble(
                &credential_ids,
                &request.nonce().0,
                audience,
                &ClaimFormatDesignation::JwtVc,
            )
            .await?;
        debug!(
            "answering {} input descriptor(s) of {}",
            descriptor_ids.len(),
            definition.id()
        );

        let submission = PresentationSubmission::per_descriptor(definition.id().clone(), &descriptor_ids);
        let submission = serde_json::to_string(&submission).map_err(Error::parse)?;

        let mut pairs = vec![("vp_token", vp_token), ("presentation_submission", submission)];
        if let Some(state) = request.state() {
            pairs.push(("state", state.0.clone()));
        }
        self.post_back(request, form_urlencode(&pairs)?, "vp_token response")
            .await
    }

    /// Exchange the authorization code in `params` for an access token.
    ///
    /// `params` must carry the configured global `state`; nothing is sent otherwise.
    pub async fn exchange_code(
        &self,
        did: &str,
        token_endpoint: &str,
        params: &HashMap<String, String>,
        pkce: &Pkce,
    ) -> Result<TokenResponse> {
        let received = params.get("state").map(String::as_str).unwrap_or_default();
        if received != self.config.global_state {
            return Err(Error::StateMismatch {
                expected: self.config.global_state.clone(),
                received: received.to_owned(),
            });
        }
        let code = params
            .get("code")
            .ok_or_else(|| Error::MissingRequestParameter("code".into()))?;

        let request = TokenRequest::AuthorizationCode {
            client_id: did.to_owned(),
            code: code.clone(),
            code_verifier: pkce.verifier().to_owned(),
        };
        let response = post_form(
            self.http_client,
            token_endpoint,
            request.to_x_www_form_urlencoded()?,
            None,
        )
        .await?;
        let token = TokenResponse::from_slice(&expect_success(response, "token")?)?;

        info!("access token obtained with authorization code");
        Ok(token)
    }

    /// First credential whose types include every type in `required_types`.
    async fn select_credential(&self, required_types: &[String]) -> Result<Option<String>> {
        let Some((first, rest)) = required_types.split_first() else {
            return Ok(None);
        };
        let mut candidates = self
            .credentials
            .credential_ids_by_type(first)
            .await
            .map_err(Error::Storage)?;
        for credential_type in rest {
            let matching = self
                .credentials
                .credential_ids_by_type(credential_type)
                .await
                .map_err(Error::Storage)?;
            candidates.retain(|id| matching.contains(id));
        }
        Ok(candidates.into_iter().next())
    }

    async fn post_back(
        &self,
        request: &RequestObject,
        body: String,
        what: &str,
    ) -> Result<HashMap<String, String>> {
        let response = post_form(self.http_client, request.return_uri(), body, None).await?;
        redirect_params(&expect_redirect(&response, what)?)
    }
}

/// `endpoint` with the urlencoded `query` appended to any query it already has.
fn authorization_url(endpoint: &str, query: &str) -> Result<Url> {
    let mut url = Url::parse(endpoint).map_err(Error::parse)?;
    url.query_pairs_mut()
        .extend_pairs(url::form_urlencoded::parse(query.as_bytes()));
    Ok(url)
}

/// Query of a redirect, failing on an OAuth error redirect.
fn redirect_params(location: &str) -> Result<HashMap<String, String>> {
    let params = query_params(location)?;
    if let Some(error) = params.get("error") {
        let description = params
            .get("error_description")
            .map(String::as_str)
            .unwrap_or_default();
        return Err(Error::Communication(format!(
            "authorisation server returned '{error}': {description}"
        )));
    }
    Ok(params)
}

/// Claims of the self-issued `id_token` answering a Request Object.
pub fn id_token_document(
    did: &str,
    audience: &str,
    nonce: &str,
    expiration_secs: u64,
) -> Map<String, Json> {
    let now = unix_now();
    let mut claims = Map::new();
    claims.insert("iss".into(), did.into());
    claims.insert("sub".into(), did.into());
    claims.insert("aud".into(), audience.into());
    claims.insert("iat".into(), now.into());
    claims.insert("exp".into(), (now + expiration_secs).into());
    claims.insert("nonce".into(), nonce.into());
    claims
}
