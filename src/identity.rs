//! Generation of `did:key` identities backed by P-256 keys.
//!
//! The private half of every generated key is handed to the [SecretStore] under its DID and is
//! not retained by the engine.

use p256::SecretKey;
use rand::RngCore;
use tracing::{debug, info};

use crate::{
    core::did::{did_key_from_public_key, did_key_jwk_jcs_pub},
    error::{Error, Result},
    store::SecretStore,
};

fn generate_key() -> Result<SecretKey> {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| Error::KeyGeneration(e.to_string()))?;
    SecretKey::from_slice(&bytes).map_err(|e| Error::KeyGeneration(e.to_string()))
}

async fn store_key<S: SecretStore + ?Sized>(store: &S, did: &str, key: &SecretKey) -> Result<()> {
    store
        .put(did, key.to_jwk_string().to_string())
        .await
        .map_err(Error::Storage)
}

/// Generate a key pair and return its `did:key` over the compressed public key (`0x1200`).
pub async fn generate_did_key<S: SecretStore + ?Sized>(store: &S) -> Result<String> {
    let key = generate_key()?;
    let did = did_key_from_public_key(&key.public_key());
    store_key(store, &did, &key).await?;

    info!("generated {did}");
    Ok(did)
}

/// Generate a key pair and return its `did:key` over the canonical public JWK (`0xeb51`).
pub async fn generate_did_key_jwk_jcs_pub<S: SecretStore + ?Sized>(store: &S) -> Result<String> {
    let key = generate_key()?;
    let did = did_key_jwk_jcs_pub(&key.public_key())?;
    store_key(store, &did, &key).await?;

    info!("generated {did}");
    Ok(did)
}

/// Remove the private key of `did` from the secret store.
pub async fn delete_did_key<S: SecretStore + ?Sized>(store: &S, did: &str) -> Result<()> {
    store.delete(did).await.map_err(Error::Storage)?;
    debug!("deleted key of {did}");
    Ok(())
}
