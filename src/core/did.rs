//! `did:key` encoding.
//!
//! A `did:key` is `did:key:` followed by the multibase (base58-btc, `z` prefix) encoding of a
//! multicodec varint followed by the key material.
//!
//! See <https://w3c-ccg.github.io/did-method-key>

use std::collections::BTreeMap;

use multibase::Base;
use p256::{elliptic_curve::sec1::ToEncodedPoint, PublicKey};

use crate::error::{Error, Result};

pub const DID_KEY_PREFIX: &str = "did:key:";

/// Multicodec for a compressed P-256 public key.
pub const P256_PUB_CODEC: u64 = 0x1200;

/// Multicodec for the JCS canonicalized public JWK.
pub const JWK_JCS_PUB_CODEC: u64 = 0xeb51;

/// Unsigned LEB128 encoding of a multicodec code.
pub fn encode_varint(mut value: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(3);
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return out;
        }
        out.push(byte | 0x80);
    }
}

/// Decode an unsigned LEB128 varint, returning the value and the number of bytes consumed.
pub fn decode_varint(bytes: &[u8]) -> Result<(u64, usize)> {
    let mut value: u64 = 0;
    for (i, byte) in bytes.iter().enumerate().take(9) {
        value |= u64::from(byte & 0x7f) << (7 * i);
        if byte & 0x80 == 0 {
            // A zero final group means the value fits in fewer bytes.
            if *byte == 0 && i > 0 {
                return Err(Error::Parse("non-canonical multicodec varint".into()));
            }
            return Ok((value, i + 1));
        }
    }
    Err(Error::Parse("unterminated multicodec varint".into()))
}

/// `did:key:z…` for an arbitrary multicodec and payload.
pub fn encode_did_key(codec: u64, payload: &[u8]) -> String {
    let mut multi_bytes = encode_varint(codec);
    multi_bytes.extend_from_slice(payload);
    format!("{DID_KEY_PREFIX}{}", multibase::encode(Base::Base58Btc, multi_bytes))
}

/// Split a `did:key` into its multicodec and payload.
pub fn decode_did_key(did: &str) -> Result<(u64, Vec<u8>)> {
    let (did, _fragment) = did.split_once('#').unwrap_or((did, ""));
    let multikey = did
        .strip_prefix(DID_KEY_PREFIX)
        .ok_or_else(|| Error::Parse(format!("'{did}' is not a did:key")))?;

    let (base, bytes) = multibase::decode(multikey).map_err(Error::parse)?;
    if base != Base::Base58Btc {
        return Err(Error::Parse(format!(
            "did:key must be base58-btc encoded, found {base:?}"
        )));
    }

    let (codec, read) = decode_varint(&bytes)?;
    Ok((codec, bytes[read..].to_vec()))
}

/// Standard `did:key` over the compressed SEC1 point.
pub fn did_key_from_public_key(public_key: &PublicKey) -> String {
    encode_did_key(
        P256_PUB_CODEC,
        public_key.to_encoded_point(true).as_bytes(),
    )
}

/// `did:key` over the JCS serialization of the public JWK's required members.
pub fn did_key_jwk_jcs_pub(public_key: &PublicKey) -> Result<String> {
    Ok(encode_did_key(JWK_JCS_PUB_CODEC, &jcs_public_jwk(public_key)?))
}

/// The JCS form of `{crv, kty, x, y}`: members sorted, no whitespace.
pub(crate) fn jcs_public_jwk(public_key: &PublicKey) -> Result<Vec<u8>> {
    let jwk: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(&public_key.to_jwk_string()).map_err(Error::parse)?;

    let required: BTreeMap<&str, &serde_json::Value> = ["crv", "kty", "x", "y"]
        .into_iter()
        .map(|member| {
            jwk.get(member)
                .map(|value| (member, value))
                .ok_or_else(|| Error::Parse(format!("public JWK has no '{member}' member")))
        })
        .collect::<Result<_>>()?;

    serde_json::to_vec(&required).map_err(Error::parse)
}

/// Resolve the P-256 public key encoded in a `did:key`.
pub fn public_key_from_did_key(did: &str) -> Result<PublicKey> {
    match decode_did_key(did)? {
        (P256_PUB_CODEC, raw) => PublicKey::from_sec1_bytes(&raw).map_err(Error::parse),
        (JWK_JCS_PUB_CODEC, jcs) => {
            let jwk = std::str::from_utf8(&jcs).map_err(Error::parse)?;
            PublicKey::from_jwk_str(jwk).map_err(Error::parse)
        }
        (codec, _) => Err(Error::Parse(format!(
            "unsupported did:key multicodec 0x{codec:x}"
        ))),
    }
}

/// Key id of the single verification method of a DID: `did#<method specific id>`.
///
/// DIDs not shaped like `did:<method>:<id>` are returned unchanged.
pub fn verification_method_id(did: &str) -> String {
    let mut parts = did.splitn(3, ':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("did"), Some(method), Some(id)) if !method.is_empty() && !id.is_empty() => {
            format!("{did}#{id}")
        }
        _ => did.to_owned(),
    }
}
