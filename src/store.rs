//! Storage collaborators of the engine.
//!
//! Keys, credentials and pending transactions live outside the engine. These traits describe
//! what the engine needs from them; the in-memory implementations exist for tests and demos.

use std::{collections::BTreeMap, fmt::Debug, sync::Arc};

use anyhow::{bail, Result};
use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::core::credential_format::ClaimFormatDesignation;

/// Secret storage ("vault") holding private keys as JWK strings, keyed by DID.
#[async_trait]
pub trait SecretStore: Debug + Send + Sync {
    /// Get the private JWK stored under `did`.
    async fn get(&self, did: &str) -> Result<String>;

    async fn put(&self, did: &str, private_jwk: String) -> Result<()>;

    async fn delete(&self, did: &str) -> Result<()>;
}

/// Credential and transaction storage ("broker").
///
/// Entities are opaque JSON strings; the engine serializes and deserializes them itself.
#[async_trait]
pub trait Broker: Debug + Send + Sync {
    async fn get_entity(&self, id: &str) -> Result<Option<String>>;

    /// Create or replace the entity stored under `id`.
    async fn upsert_entity(&self, id: &str, entity: String) -> Result<()>;

    async fn delete_entity(&self, id: &str) -> Result<()>;
}

/// Access to the holder's stored credentials.
#[async_trait]
pub trait CredentialSource: Debug + Send + Sync {
    /// Fetch credential `id` in `format`, e.g. a compact JWT for `jwt_vc` or a JSON document for
    /// `vc_json`.
    async fn credential(&self, id: &str, format: &ClaimFormatDesignation) -> Result<String>;

    /// Ids of the credentials whose `type` contains `credential_type`.
    async fn credential_ids_by_type(&self, credential_type: &str) -> Result<Vec<String>>;
}

/// A local in-memory store. Not for production use!
///
/// # Warning
/// This in-memory store should only be used for test purposes, it will not work for a distributed
/// deployment.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    store: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryStore {
    pub async fn len(&self) -> usize {
        self.store.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.lock().await.is_empty()
    }
}

#[async_trait]
impl SecretStore for MemoryStore {
    async fn get(&self, did: &str) -> Result<String> {
        if let Some(jwk) = self.store.lock().await.get(did) {
            return Ok(jwk.clone());
        }

        bail!("no key stored for {did}")
    }

    async fn put(&self, did: &str, private_jwk: String) -> Result<()> {
        self.store.lock().await.insert(did.to_owned(), private_jwk);

        Ok(())
    }

    async fn delete(&self, did: &str) -> Result<()> {
        if self.store.lock().await.remove(did).is_some() {
            return Ok(());
        }

        bail!("no key stored for {did}")
    }
}

#[async_trait]
impl Broker for MemoryStore {
    async fn get_entity(&self, id: &str) -> Result<Option<String>> {
        Ok(self.store.lock().await.get(id).cloned())
    }

    async fn upsert_entity(&self, id: &str, entity: String) -> Result<()> {
        self.store.lock().await.insert(id.to_owned(), entity);

        Ok(())
    }

    async fn delete_entity(&self, id: &str) -> Result<()> {
        self.store.lock().await.remove(id);

        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
struct StoredCredential {
    types: Vec<String>,
    /// Encodings keyed by format designation.
    encodings: BTreeMap<String, String>,
}

/// In-memory credentials, keyed by credential id.
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentials {
    credentials: Arc<Mutex<BTreeMap<String, StoredCredential>>>,
}

impl MemoryCredentials {
    /// Store one encoding of credential `id`, replacing its types.
    pub async fn insert(
        &self,
        id: &str,
        types: &[&str],
        format: ClaimFormatDesignation,
        credential: String,
    ) {
        let mut credentials = self.credentials.lock().await;
        let stored = credentials.entry(id.to_owned()).or_default();
        stored.types = types.iter().map(|t| (*t).to_owned()).collect();
        stored.encodings.insert(format.into(), credential);
    }
}

#[async_trait]
impl CredentialSource for MemoryCredentials {
    async fn credential(&self, id: &str, format: &ClaimFormatDesignation) -> Result<String> {
        let credentials = self.credentials.lock().await;
        if let Some(credential) = credentials
            .get(id)
            .and_then(|stored| stored.encodings.get(format.as_str()))
        {
            return Ok(credential.clone());
        }

        bail!("credential {id} is not available as {format}")
    }

    async fn credential_ids_by_type(&self, credential_type: &str) -> Result<Vec<String>> {
        Ok(self
            .credentials
            .lock()
            .await
            .iter()
            .filter(|(_, stored)| stored.types.iter().any(|t| t == credential_type))
            .map(|(id, _)| id.clone())
            .collect())
    }
}
