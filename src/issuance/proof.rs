use serde_json::{json, Value as Json};

use crate::core::util::unix_now;

/// Claims of a proof-of-possession JWT for a credential request.
///
/// Sign it with [DocumentType::Proof](crate::signing::DocumentType::Proof) under `did`.
pub fn proof_document(did: &str, credential_issuer: &str, c_nonce: Option<&str>) -> Json {
    let mut document = json!({
        "iss": did,
        "aud": credential_issuer,
        "iat": unix_now(),
    });
    if let (Some(nonce), Json::Object(claims)) = (c_nonce, &mut document) {
        claims.insert("nonce".into(), nonce.into());
    }
    document
}
