use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Response of a credential or deferred credential endpoint.
///
/// At most one of the credential, a fresh `acceptance_token` or a `transaction_id` drives what
/// happens next.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acceptance_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub c_nonce: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub c_nonce_expires_in: Option<u64>,
}

impl CredentialResponse {
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(|e| Error::deserialization("credential response", e))
    }

    /// Whether the issuer deferred issuance instead of returning a credential.
    pub fn is_deferred(&self) -> bool {
        self.credential.is_none()
            && (self.acceptance_token.is_some() || self.transaction_id.is_some())
    }
}

/// Bookkeeping for a deferred issuance, stored alongside the pending credential.
///
/// `access_token` is the bearer of the next deferred request and is replaced whenever the issuer
/// rotates its acceptance token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionState {
    pub transaction_id: String,
    pub access_token: String,
    pub deferred_endpoint: String,
}

impl TransactionState {
    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| Error::deserialization("transaction state", e))
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string(self).map_err(Error::parse)
    }
}
