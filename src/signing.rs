//! JWS signing of caller-supplied JSON documents with keys from the [SecretStore].

use std::{fmt, str::FromStr};

use p256::{ecdsa::SigningKey, SecretKey};
use serde_json::{Map, Value as Json};
use tracing::debug;

use crate::{
    core::{did::verification_method_id, jws},
    error::{Error, Result},
    store::SecretStore,
};

/// `typ` of proof-of-possession JWTs sent to a credential endpoint.
pub const PROOF_TYP: &str = "openid4vci-proof+jwt";
pub const JWT_TYP: &str = "JWT";

/// JWK members needed to rebuild the private key.
const PRIVATE_JWK_MEMBERS: [&str; 5] = ["kty", "crv", "x", "y", "d"];

/// The kind of document being signed, deciding the JOSE `typ` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentType {
    Proof,
    Vp,
    IdToken,
    Unknown,
}

impl DocumentType {
    pub fn typ(self) -> &'static str {
        match self {
            DocumentType::Proof => PROOF_TYP,
            DocumentType::Vp | DocumentType::IdToken | DocumentType::Unknown => JWT_TYP,
        }
    }
}

impl FromStr for DocumentType {
    type Err = std::convert::Infallible;

    /// Unrecognised tags are [DocumentType::Unknown] and get a plain `JWT` header.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "proof" => DocumentType::Proof,
            "vp" | "vp_jwt" => DocumentType::Vp,
            "jwt" | "id_token" | "idtoken" => DocumentType::IdToken,
            _ => DocumentType::Unknown,
        })
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            DocumentType::Proof => "proof",
            DocumentType::Vp => "vp",
            DocumentType::IdToken => "jwt",
            DocumentType::Unknown => "unknown",
        };
        tag.fmt(f)
    }
}

/// Rebuild a signing key from a private JWK, ignoring members other than the key material.
fn signing_key_from_jwk(jwk: &str) -> Result<(SigningKey, String)> {
    let jwk: Map<String, Json> =
        serde_json::from_str(jwk).map_err(|e| Error::Parse(format!("invalid private JWK: {e}")))?;

    let alg = jwk
        .get("alg")
        .and_then(Json::as_str)
        .unwrap_or(jws::ES256)
        .to_owned();
    if alg != jws::ES256 {
        return Err(Error::Parse(format!("unsupported signing algorithm '{alg}'")));
    }

    let filtered: Map<String, Json> = jwk
        .into_iter()
        .filter(|(member, _)| PRIVATE_JWK_MEMBERS.contains(&member.as_str()))
        .collect();
    let filtered = serde_json::to_string(&filtered).map_err(Error::parse)?;
    let key = SecretKey::from_jwk_str(&filtered)
        .map_err(|e| Error::Parse(format!("invalid private JWK: {e}")))?;

    Ok((SigningKey::from(key), alg))
}

/// Sign `document` as `did`, returning a compact JWS.
///
/// The top level members of `document` become the claims; `kid` is the DID's verification
/// method.
pub async fn sign<S: SecretStore + ?Sized>(
    store: &S,
    document: &Json,
    did: &str,
    document_type: DocumentType,
) -> Result<String> {
    let Json::Object(claims) = document else {
        return Err(Error::Parse("signable document must be a JSON object".into()));
    };

    let jwk = store.get(did).await.map_err(Error::Storage)?;
    let (key, alg) = signing_key_from_jwk(&jwk)?;

    let mut header = Map::new();
    header.insert("alg".into(), alg.into());
    header.insert("typ".into(), document_type.typ().into());
    header.insert("kid".into(), verification_method_id(did).into());

    debug!("signing {document_type} document for {did}");
    jws::sign_es256(header, claims, &key)
}
