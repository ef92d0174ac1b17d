use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    credential_format::{ClaimFormatDesignation, CredentialType},
    util::{expect_success, get, query_params, AsyncHttpClient},
};
use crate::error::{Error, Result};

pub const PRE_AUTHORIZED_CODE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:pre-authorized_code";
pub const AUTHORIZATION_CODE_GRANT_TYPE: &str = "authorization_code";

/// A credential offer, as received from a credential issuer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCredentialOffer", into = "RawCredentialOffer")]
pub struct CredentialOffer {
    pub credential_issuer: String,
    pub credentials: Vec<OfferedCredential>,
    pub grant: Grant,
}

/// One credential of an offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferedCredential {
    pub format: ClaimFormatDesignation,
    #[serde(default)]
    pub types: Vec<CredentialType>,
}

/// The single grant of an offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grant {
    PreAuthorized(PreAuthorizedCodeGrant),
    AuthorizationCode(AuthorizationCodeGrant),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantKind {
    PreAuthorized,
    AuthorizationCode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreAuthorizedCodeGrant {
    #[serde(rename = "pre-authorized_code")]
    pub pre_authorized_code: String,
    #[serde(default)]
    pub user_pin_required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_code: Option<TxCode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationCodeGrant {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer_state: Option<String>,
}

/// Describes the transaction code the user has to enter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxCode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_mode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// What the user has to supply before a pre-authorized code can be redeemed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PinRequirement {
    None,
    Pin,
    TxCode(TxCode),
}

impl Grant {
    pub fn kind(&self) -> GrantKind {
        match self {
            Grant::PreAuthorized(_) => GrantKind::PreAuthorized,
            Grant::AuthorizationCode(_) => GrantKind::AuthorizationCode,
        }
    }
}

impl PreAuthorizedCodeGrant {
    /// A transaction code descriptor takes precedence over the legacy PIN flag.
    pub fn pin_requirement(&self) -> PinRequirement {
        match (&self.tx_code, self.user_pin_required) {
            (Some(tx_code), _) => PinRequirement::TxCode(tx_code.clone()),
            (None, true) => PinRequirement::Pin,
            (None, false) => PinRequirement::None,
        }
    }
}

impl CredentialOffer {
    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| Error::Parse(format!("invalid credential offer: {e}")))
    }

    /// Resolve an offer URI carrying either `credential_offer` or `credential_offer_uri`.
    pub async fn resolve<H: AsyncHttpClient + ?Sized>(http_client: &H, offer_uri: &str) -> Result<Self> {
        match CredentialOfferIndirection::from_query_params(&query_params(offer_uri)?)? {
            CredentialOfferIndirection::ByValue(offer) => Self::from_json_str(&offer),
            CredentialOfferIndirection::ByReference(uri) => {
                debug!("dereferencing credential offer at {uri}");
                let body = expect_success(get(http_client, &uri).await?, "credential offer")?;
                serde_json::from_slice(&body).map_err(|e| Error::deserialization("credential offer", e))
            }
        }
    }

    pub fn grant_kind(&self) -> GrantKind {
        self.grant.kind()
    }

    /// Every credential type offered, in offer order.
    pub fn credential_types(&self) -> Vec<CredentialType> {
        self.credentials
            .iter()
            .flat_map(|c| c.types.iter().cloned())
            .collect()
    }
}

/// A credential offer, passed by value or by reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialOfferIndirection {
    ByValue(String),
    ByReference(String),
}

impl CredentialOfferIndirection {
    pub fn from_query_params(params: &HashMap<String, String>) -> Result<Self> {
        if let Some(uri) = params.get("credential_offer_uri") {
            return Ok(Self::ByReference(uri.clone()));
        }
        if let Some(offer) = params.get("credential_offer") {
            return Ok(Self::ByValue(offer.clone()));
        }
        Err(Error::MissingRequestParameter(
            "expected 'credential_offer' or 'credential_offer_uri'".into(),
        ))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawGrants {
    #[serde(
        rename = "urn:ietf:params:oauth:grant-type:pre-authorized_code",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pre_authorized_code: Option<PreAuthorizedCodeGrant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    authorization_code: Option<AuthorizationCodeGrant>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawCredentialOffer {
    credential_issuer: String,
    #[serde(default)]
    credentials: Vec<OfferedCredential>,
    #[serde(default)]
    grants: RawGrants,
}

impl TryFrom<RawCredentialOffer> for CredentialOffer {
    type Error = Error;

    fn try_from(raw: RawCredentialOffer) -> Result<Self> {
        let grant = match (raw.grants.pre_authorized_code, raw.grants.authorization_code) {
            (Some(pre_authorized), None) => Grant::PreAuthorized(pre_authorized),
            (None, Some(authorization_code)) => Grant::AuthorizationCode(authorization_code),
            (Some(_), Some(_)) => {
                return Err(Error::Parse(
                    "credential offer carries both a pre-authorized and an authorization code grant"
                        .into(),
                ))
            }
            (None, None) => return Err(Error::Parse("credential offer carries no grant".into())),
        };

        Ok(Self {
            credential_issuer: raw.credential_issuer,
            credentials: raw.credentials,
            grant,
        })
    }
}

impl From<CredentialOffer> for RawCredentialOffer {
    fn from(offer: CredentialOffer) -> Self {
        let grants = match offer.grant {
            Grant::PreAuthorized(grant) => RawGrants {
                pre_authorized_code: Some(grant),
                authorization_code: None,
            },
            Grant::AuthorizationCode(grant) => RawGrants {
                pre_authorized_code: None,
                authorization_code: Some(grant),
            },
        };
        Self {
            credential_issuer: offer.credential_issuer,
            credentials: offer.credentials,
            grants,
        }
    }
}
