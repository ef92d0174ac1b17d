use std::fmt;

use anyhow::Error;
use serde_json::Value as Json;

use crate::core::{
    object::{string_parameter, TypedParameter},
    presentation_definition::PresentationDefinition as PresentationDefinitionParsed,
};

const CODE: &str = "code";
const ID_TOKEN: &str = "id_token";
const VP_TOKEN: &str = "vp_token";
const VP_TOKEN_ID_TOKEN: &str = "vp_token id_token";

string_parameter!(Nonce, "nonce");
string_parameter!(
    /// OAuth `state`, echoed back by the authorization server.
    State,
    "state"
);
string_parameter!(
    /// `redirect_uri` field in the Authorization Request.
    ///
    /// Kept as a string: wallets announce custom schemes such as `openid://`.
    RedirectUri,
    "redirect_uri"
);
string_parameter!(ResponseUri, "response_uri");
string_parameter!(PresentationDefinitionUri, "presentation_definition_uri");
string_parameter!(Issuer, "iss");
string_parameter!(Subject, "sub");
string_parameter!(
    /// Query-string shaped Authorization Request embedded in a signed request JWT.
    AuthRequest,
    "auth_request"
);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseType {
    Code,
    IdToken,
    VpToken,
    VpTokenIdToken,
    Unsupported(String),
}

impl TypedParameter for ResponseType {
    const KEY: &'static str = "response_type";
}

impl From<String> for ResponseType {
    fn from(s: String) -> Self {
        match s.as_str() {
            CODE => ResponseType::Code,
            ID_TOKEN => ResponseType::IdToken,
            VP_TOKEN => ResponseType::VpToken,
            VP_TOKEN_ID_TOKEN => ResponseType::VpTokenIdToken,
            _ => ResponseType::Unsupported(s),
        }
    }
}

impl From<ResponseType> for String {
    fn from(rt: ResponseType) -> Self {
        match rt {
            ResponseType::Code => CODE.into(),
            ResponseType::IdToken => ID_TOKEN.into(),
            ResponseType::VpToken => VP_TOKEN.into(),
            ResponseType::VpTokenIdToken => VP_TOKEN_ID_TOKEN.into(),
            ResponseType::Unsupported(s) => s,
        }
    }
}

impl TryFrom<Json> for ResponseType {
    type Error = Error;

    fn try_from(value: Json) -> Result<Self, Self::Error> {
        let s: String = serde_json::from_value(value)?;
        Ok(s.into())
    }
}

impl From<ResponseType> for Json {
    fn from(value: ResponseType) -> Self {
        Json::String(value.into())
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        String::from(self.clone()).fmt(f)
    }
}

/// `presentation_definition` passed by value.
///
/// The raw JSON is kept alongside the parsed definition so it can be forwarded unchanged.
#[derive(Debug, Clone)]
pub struct PresentationDefinition {
    raw: Json,
    parsed: PresentationDefinitionParsed,
}

impl PresentationDefinition {
    pub fn into_parsed(self) -> PresentationDefinitionParsed {
        self.parsed
    }

    pub fn parsed(&self) -> &PresentationDefinitionParsed {
        &self.parsed
    }
}

impl TypedParameter for PresentationDefinition {
    const KEY: &'static str = "presentation_definition";
}

impl TryFrom<Json> for PresentationDefinition {
    type Error = Error;

    fn try_from(value: Json) -> Result<Self, Self::Error> {
        // Some authorization servers send the definition as an encoded JSON string.
        let raw = match value {
            Json::String(s) => serde_json::from_str(&s)?,
            other => other,
        };
        let parsed = serde_json::from_value(raw.clone())?;
        Ok(Self { raw, parsed })
    }
}

impl From<PresentationDefinition> for Json {
    fn from(value: PresentationDefinition) -> Self {
        value.raw
    }
}
