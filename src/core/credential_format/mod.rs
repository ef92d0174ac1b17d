use core::fmt;
use std::{collections::HashMap, str::FromStr};

use serde::{Deserialize, Serialize};

const FORMAT_JWT: &str = "jwt";
const FORMAT_JWT_VC: &str = "jwt_vc";
const FORMAT_JWT_VP: &str = "jwt_vp";
const FORMAT_JWT_VC_JSON: &str = "jwt_vc_json";
const FORMAT_JWT_VP_JSON: &str = "jwt_vp_json";
const FORMAT_VC_JSON: &str = "vc_json";
const FORMAT_LDP_VC: &str = "ldp_vc";

/// A Json object of claim formats, e.g. `{"jwt_vp": {"alg": ["ES256"]}}`.
pub type ClaimFormatMap = HashMap<ClaimFormatDesignation, serde_json::Value>;

/// The credential type that may be requested in a presentation request,
/// e.g. `VerifiableAttestation`.
pub type CredentialType = String;

/// Registered claim format designations.
///
/// `vc_json` is the unsigned JSON form a credential is stored in, used by the DOME profile.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum ClaimFormatDesignation {
    Jwt,
    JwtVc,
    JwtVp,
    JwtVcJson,
    JwtVpJson,
    VcJson,
    LdpVc,
    Other(String),
}

impl ClaimFormatDesignation {
    pub fn as_str(&self) -> &str {
        match self {
            ClaimFormatDesignation::Jwt => FORMAT_JWT,
            ClaimFormatDesignation::JwtVc => FORMAT_JWT_VC,
            ClaimFormatDesignation::JwtVp => FORMAT_JWT_VP,
            ClaimFormatDesignation::JwtVcJson => FORMAT_JWT_VC_JSON,
            ClaimFormatDesignation::JwtVpJson => FORMAT_JWT_VP_JSON,
            ClaimFormatDesignation::VcJson => FORMAT_VC_JSON,
            ClaimFormatDesignation::LdpVc => FORMAT_LDP_VC,
            ClaimFormatDesignation::Other(s) => s,
        }
    }

    /// Whether credentials of this format travel as a compact JWT.
    pub fn is_jwt(&self) -> bool {
        matches!(
            self,
            ClaimFormatDesignation::Jwt
                | ClaimFormatDesignation::JwtVc
                | ClaimFormatDesignation::JwtVp
                | ClaimFormatDesignation::JwtVcJson
                | ClaimFormatDesignation::JwtVpJson
        )
    }
}

impl From<String> for ClaimFormatDesignation {
    fn from(s: String) -> Self {
        match s.as_str() {
            FORMAT_JWT => ClaimFormatDesignation::Jwt,
            FORMAT_JWT_VC => ClaimFormatDesignation::JwtVc,
            FORMAT_JWT_VP => ClaimFormatDesignation::JwtVp,
            FORMAT_JWT_VC_JSON => ClaimFormatDesignation::JwtVcJson,
            FORMAT_JWT_VP_JSON => ClaimFormatDesignation::JwtVpJson,
            FORMAT_VC_JSON => ClaimFormatDesignation::VcJson,
            FORMAT_LDP_VC => ClaimFormatDesignation::LdpVc,
            _ => ClaimFormatDesignation::Other(s),
        }
    }
}

impl From<&str> for ClaimFormatDesignation {
    fn from(s: &str) -> Self {
        s.to_owned().into()
    }
}

impl From<ClaimFormatDesignation> for String {
    fn from(format: ClaimFormatDesignation) -> Self {
        match format {
            ClaimFormatDesignation::Other(s) => s,
            known => known.as_str().to_owned(),
        }
    }
}

impl FromStr for ClaimFormatDesignation {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.into())
    }
}

impl fmt::Display for ClaimFormatDesignation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_str().fmt(f)
    }
}
