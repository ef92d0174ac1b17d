use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};

use crate::{
    core::util::unix_now,
    error::{Error, Result},
};

pub const CREDENTIALS_V1_CONTEXT: &str = "https://www.w3.org/2018/credentials/v1";
pub const VERIFIABLE_PRESENTATION_TYPE: &str = "VerifiablePresentation";

/// A W3C Verifiable Presentation in its JSON form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifiablePresentation {
    pub id: String,
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    #[serde(rename = "type")]
    pub types: Vec<String>,
    pub holder: String,
    /// Compact JWTs as strings, JSON credentials as objects.
    #[serde(rename = "verifiableCredential")]
    pub verifiable_credential: Vec<Json>,
}

impl VerifiablePresentation {
    /// A presentation with a fresh `urn:uuid:` id.
    pub fn new(holder: impl Into<String>, verifiable_credential: Vec<Json>) -> Self {
        Self {
            id: format!("urn:uuid:{}", uuid::Uuid::new_v4()),
            context: vec![CREDENTIALS_V1_CONTEXT.into()],
            types: vec![VERIFIABLE_PRESENTATION_TYPE.into()],
            holder: holder.into(),
            verifiable_credential,
        }
    }
}

#[derive(Debug, Clone)]
pub struct VerifiablePresentationBuilderOptions {
    pub issuer: String,
    pub subject: String,
    pub audience: String,
    pub nonce: String,
    /// Expiration is in seconds from `now`.
    /// e.g. 600 for 10 minutes.
    pub expiration_secs: u64,
    pub presentation: VerifiablePresentation,
}

/// Builds the JWT claim set wrapping a [VerifiablePresentation].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerifiablePresentationBuilder(Map<String, Json>);

impl VerifiablePresentationBuilder {
    /// Returns an empty verifiable presentation builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the claim set described by `options`.
    ///
    /// `nbf` and `iat` are the current time, `exp` is `expiration_secs` later and `jti` is the
    /// presentation id.
    pub fn from_options(options: VerifiablePresentationBuilderOptions) -> Result<Map<String, Json>> {
        let now = unix_now();
        let jti = options.presentation.id.clone();

        Ok(Self::new()
            .add_issuer(options.issuer)
            .add_subject(options.subject)
            .add_audience(options.audience)
            .set_not_before(now)
            .set_issuance_date(now)
            .set_expiration_date(now + options.expiration_secs)
            .set_jti(jti)
            .set_presentation(options.presentation)?
            .set_nonce(options.nonce)
            .build())
    }

    /// The issuer is the holder of the presented credentials.
    pub fn add_issuer(mut self, issuer: String) -> Self {
        self.0.insert("iss".into(), issuer.into());
        self
    }

    pub fn add_subject(mut self, subject: String) -> Self {
        self.0.insert("sub".into(), subject.into());
        self
    }

    /// The audience is the verifier the presentation is addressed to.
    pub fn add_audience(mut self, audience: String) -> Self {
        self.0.insert("aud".into(), audience.into());
        self
    }

    pub fn set_not_before(mut self, not_before: u64) -> Self {
        self.0.insert("nbf".into(), not_before.into());
        self
    }

    pub fn set_issuance_date(mut self, issuance_date: u64) -> Self {
        self.0.insert("iat".into(), issuance_date.into());
        self
    }

    pub fn set_expiration_date(mut self, expiration_date: u64) -> Self {
        self.0.insert("exp".into(), expiration_date.into());
        self
    }

    pub fn set_jti(mut self, jti: String) -> Self {
        self.0.insert("jti".into(), jti.into());
        self
    }

    pub fn set_presentation(mut self, presentation: VerifiablePresentation) -> Result<Self> {
        let vp = serde_json::to_value(presentation).map_err(Error::parse)?;
        self.0.insert("vp".into(), vp);
        Ok(self)
    }

    pub fn set_nonce(mut self, nonce: String) -> Self {
        self.0.insert("nonce".into(), nonce.into());
        self
    }

    pub fn build(self) -> Map<String, Json> {
        self.0
    }
}
