//! Compact JWS serialization (`header.payload.signature`) over P-256.

use base64::prelude::*;
use p256::ecdsa::{
    signature::{Signer, Verifier},
    Signature, SigningKey, VerifyingKey,
};
use serde_json::{Map, Value as Json};

use crate::error::{Error, Result};

pub const ES256: &str = "ES256";

/// Split a compact JWS into its three base64url segments.
pub fn split_jws(jwt: &str) -> Result<(&str, &str, &str)> {
    let mut parts = jwt.trim().split('.');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(header), Some(payload), Some(signature), None)
            if !header.is_empty() && !payload.is_empty() =>
        {
            Ok((header, payload, signature))
        }
        _ => Err(Error::Format(
            "expected three '.' separated segments".into(),
        )),
    }
}

fn decode_segment(segment: &str, name: &str) -> Result<Map<String, Json>> {
    let bytes = BASE64_URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| Error::Parse(format!("jwt {name} was not valid base64url: {e}")))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| Error::Parse(format!("jwt {name} was not a valid json object: {e}")))
}

pub fn decode_header(jwt: &str) -> Result<Map<String, Json>> {
    let (header, _, _) = split_jws(jwt)?;
    decode_segment(header, "header")
}

/// Decode the claims of a JWT without verifying its signature.
pub fn decode_unverified(jwt: &str) -> Result<Map<String, Json>> {
    let (_, payload, _) = split_jws(jwt)?;
    decode_segment(payload, "payload")
}

/// Sign `claims` with ES256 under the given `header`.
///
/// `alg` is always set to `ES256`, overriding any value in `header`.
pub fn sign_es256(
    mut header: Map<String, Json>,
    claims: &Map<String, Json>,
    key: &SigningKey,
) -> Result<String> {
    header.insert("alg".into(), ES256.into());

    let header = BASE64_URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header).map_err(Error::parse)?);
    let payload = BASE64_URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims).map_err(Error::parse)?);
    let signing_input = format!("{header}.{payload}");

    let signature: Signature = key.sign(signing_input.as_bytes());
    let signature = BASE64_URL_SAFE_NO_PAD.encode(signature.to_bytes());

    Ok(format!("{signing_input}.{signature}"))
}

/// Check an ES256 signature. A structurally invalid signature verifies as `false`.
pub fn verify_es256(jwt: &str, key: &VerifyingKey) -> Result<bool> {
    let (header, payload, signature) = split_jws(jwt)?;
    let signature = BASE64_URL_SAFE_NO_PAD
        .decode(signature)
        .map_err(|e| Error::Parse(format!("jwt signature was not valid base64url: {e}")))?;
    let Ok(signature) = Signature::from_slice(&signature) else {
        return Ok(false);
    };

    Ok(key
        .verify(format!("{header}.{payload}").as_bytes(), &signature)
        .is_ok())
}
