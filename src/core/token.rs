use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use super::{
    credential_offer::{AUTHORIZATION_CODE_GRANT_TYPE, PRE_AUTHORIZED_CODE_GRANT_TYPE},
    util::form_urlencode,
};
use crate::error::{Error, Result};

/// Successful response of a token endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub c_nonce: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub c_nonce_expires_in: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization_details: Option<Json>,
}

fn default_token_type() -> String {
    "Bearer".into()
}

impl TokenResponse {
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(|e| Error::deserialization("token response", e))
    }
}

/// Form body of a token request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenRequest {
    PreAuthorizedCode {
        pre_authorized_code: String,
        user_pin: Option<String>,
        tx_code: Option<String>,
    },
    AuthorizationCode {
        client_id: String,
        code: String,
        code_verifier: String,
    },
}

impl TokenRequest {
    pub fn to_x_www_form_urlencoded(&self) -> Result<String> {
        match self {
            TokenRequest::PreAuthorizedCode {
                pre_authorized_code,
                user_pin,
                tx_code,
            } => {
                let mut pairs = vec![
                    ("grant_type", PRE_AUTHORIZED_CODE_GRANT_TYPE),
                    ("pre-authorized_code", pre_authorized_code.as_str()),
                ];
                if let Some(pin) = user_pin {
                    pairs.push(("user_pin", pin.as_str()));
                }
                if let Some(code) = tx_code {
                    pairs.push(("tx_code", code.as_str()));
                }
                form_urlencode(&pairs)
            }
            TokenRequest::AuthorizationCode {
                client_id,
                code,
                code_verifier,
            } => form_urlencode(&[
                ("grant_type", AUTHORIZATION_CODE_GRANT_TYPE),
                ("client_id", client_id.as_str()),
                ("code", code.as_str()),
                ("code_verifier", code_verifier.as_str()),
            ]),
        }
    }
}
