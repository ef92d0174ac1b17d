//! Compact offline encoding of a signed presentation.
//!
//! The claims of a VP JWT are re-encoded as CBOR, signed as a `COSE_Sign1` with an ephemeral
//! P-256 key, zlib-compressed and finally Base45 encoded, giving an alphanumeric string that
//! fits a QR code. Only the first embedded credential survives the compaction.

use std::io::Write;

use coset::{iana, CborSerializable, CoseSign1Builder, HeaderBuilder};
use flate2::{write::ZlibEncoder, Compression};
use p256::{
    ecdsa::{signature::Signer, Signature, SigningKey},
    elliptic_curve::sec1::ToEncodedPoint,
};
use serde_json::Value as Json;
use tracing::{debug, warn};

use crate::{
    core::jws,
    error::{Error, Result},
};

/// Encode the VP JWT `vp_jwt` into a Base45 string.
pub fn encode_presentation(vp_jwt: &str) -> Result<String> {
    let mut claims = jws::decode_unverified(vp_jwt)?;
    keep_first_credential(&mut claims);

    let mut cbor = Vec::new();
    ciborium::into_writer(&claims, &mut cbor)
        .map_err(|e| Error::Parse(format!("unable to encode presentation as CBOR: {e}")))?;

    let cose = sign_cose(cbor)?;
    let compressed = compress_deflate_zlib(&cose)
        .map_err(|e| Error::Parse(format!("unable to compress presentation: {e}")))?;

    debug!(
        "compacted presentation to {} bytes before base45",
        compressed.len()
    );
    Ok(base45::encode(compressed))
}

fn keep_first_credential(claims: &mut serde_json::Map<String, Json>) {
    let Some(credentials) = claims
        .get_mut("vp")
        .and_then(|vp| vp.get_mut("verifiableCredential"))
        .and_then(Json::as_array_mut)
    else {
        return;
    };

    if credentials.len() > 1 {
        warn!(
            "compact encoding drops {} of {} credentials",
            credentials.len() - 1,
            credentials.len()
        );
        credentials.truncate(1);
    }
}

/// `COSE_Sign1` over `payload`, with the uncompressed ephemeral public key as `kid`.
fn sign_cose(payload: Vec<u8>) -> Result<Vec<u8>> {
    let key = SigningKey::random(&mut rand::rngs::OsRng);
    let public_key = key
        .verifying_key()
        .to_encoded_point(false)
        .as_bytes()
        .to_vec();

    let protected = HeaderBuilder::new()
        .algorithm(iana::Algorithm::ES256)
        .build();
    let unprotected = HeaderBuilder::new().key_id(public_key).build();
    let cose_sign1 = CoseSign1Builder::new()
        .protected(protected)
        .unprotected(unprotected)
        .payload(payload)
        .create_signature(&[], |data| {
            let signature: Signature = key.sign(data);
            signature.to_bytes().to_vec()
        })
        .build();

    cose_sign1
        .to_vec()
        .map_err(|e| Error::Parse(format!("unable to encode COSE_Sign1: {e}")))
}

fn compress_deflate_zlib(payload: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut e = ZlibEncoder::new(Vec::new(), Compression::best());
    e.write_all(payload)?;
    e.finish()
}
