//! Verification of signed Authorization Requests issued by `did:key` verifiers.

use std::sync::LazyLock;

use p256::ecdsa::VerifyingKey;
use regex::Regex;
use serde_json::Value as Json;
use tracing::debug;

use super::{
    parameters::{AuthRequest, Issuer, Subject},
    AuthorizationRequest,
};
use crate::core::{
    did::public_key_from_did_key,
    jws,
    object::{ParsingErrorContext, UntypedObject},
};
use crate::error::{Error, Result};

static CLIENT_ID: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"(?:^|[?&])client_id=([^&]+)").unwrap()
});

/// Verify a signed Authorization Request and return it unchanged.
///
/// The request must carry `iss`, `sub` and an `auth_request` claim whose `client_id` equals
/// both, and be signed by the key of the `did:key` in the JOSE `kid` header.
pub fn verify_request(jwt: &str) -> Result<String> {
    let header = jws::decode_header(jwt)?;
    let claims: UntypedObject = jws::decode_unverified(jwt)?.into();

    let Issuer(iss) = claims.get().parsing_error()?;
    let Subject(sub) = claims.get().parsing_error()?;
    let AuthRequest(auth_request) = claims.get().parsing_error()?;

    let client_id = extract_client_id(&auth_request)?;
    if client_id != iss || iss != sub {
        return Err(Error::ClientMismatch(format!(
            "client_id '{client_id}', iss '{iss}' and sub '{sub}' must be identical"
        )));
    }

    let Some(Json::String(kid)) = header.get("kid") else {
        return Err(Error::Parse("'kid' was missing from jwt headers".into()));
    };
    let (did, _fragment) = kid.split_once('#').unwrap_or((kid, ""));
    let verifying_key = VerifyingKey::from(public_key_from_did_key(did)?);

    if !jws::verify_es256(jwt, &verifying_key)? {
        return Err(Error::InvalidSignature);
    }

    debug!("authorization request from {client_id} verified");
    Ok(jwt.to_owned())
}

/// Parse the query-string shaped `auth_request` claim of a signed request.
pub fn authorization_request_from_jwt(jwt: &str) -> Result<AuthorizationRequest> {
    let claims: UntypedObject = jws::decode_unverified(jwt)?.into();
    let AuthRequest(auth_request) = claims.get().parsing_error()?;
    let query = auth_request
        .split_once('?')
        .map_or(auth_request.as_str(), |(_, query)| query);
    AuthorizationRequest::from_query_params(query)
}

fn extract_client_id(auth_request: &str) -> Result<String> {
    let encoded = CLIENT_ID
        .captures(auth_request)
        .and_then(|captures| captures.get(1))
        .ok_or_else(|| Error::Parse("'client_id' is missing from 'auth_request'".into()))?
        .as_str();

    url::form_urlencoded::parse(format!("client_id={encoded}").as_bytes())
        .next()
        .map(|(_, value)| value.into_owned())
        .ok_or_else(|| Error::Parse("'client_id' could not be decoded".into()))
}
