use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use self::parameters::{
    Nonce, PresentationDefinition, PresentationDefinitionUri, RedirectUri, ResponseType,
    ResponseUri, State,
};
use super::{
    jws,
    object::{ParsingErrorContext, UntypedObject},
    presentation_definition::PresentationDefinition as PresentationDefinitionParsed,
    util::{expect_success, get, AsyncHttpClient},
};
use crate::error::{Error, Result};

pub mod parameters;
pub mod verification;

/// An Authorization Request, as carried in a `openid://?…` query string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationRequest {
    #[serde(default)]
    pub scope: Option<String>,
    pub response_type: String,
    #[serde(default)]
    pub response_mode: Option<String>,
    pub client_id: String,
    pub redirect_uri: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub nonce: Option<String>,
}

impl AuthorizationRequest {
    /// Parse from urlencoded query parameters.
    /// ```
    /// # use oid4vc_wallet::core::authorization_request::AuthorizationRequest;
    /// let query = "scope=openid&response_type=vp_token&client_id=did%3Akey%3Az1&redirect_uri=https%3A%2F%2Fv.example%2Fcb&nonce=n1";
    ///
    /// let authorization_request = AuthorizationRequest::from_query_params(query).unwrap();
    ///
    /// assert_eq!(authorization_request.client_id, "did:key:z1");
    /// assert_eq!(authorization_request.redirect_uri, "https://v.example/cb");
    /// assert_eq!(authorization_request.state, None);
    /// ```
    pub fn from_query_params(query_params: &str) -> Result<Self> {
        serde_urlencoded::from_str(query_params)
            .map_err(|e| Error::Parse(format!("unable to parse Authorization Request: {e}")))
    }

    /// Parse from a [Url] such as `openid://?response_type=…`.
    pub fn from_url(url: &Url) -> Result<Self> {
        let query = url
            .query()
            .ok_or_else(|| Error::Parse("missing query params in Authorization Request uri".into()))?;
        Self::from_query_params(query)
    }

    /// Encode as a [Url], using `authorization_endpoint` as a base.
    pub fn to_url(&self, mut authorization_endpoint: Url) -> Result<Url> {
        let query = serde_urlencoded::to_string(self).map_err(Error::parse)?;
        authorization_endpoint.set_query(Some(&query));
        Ok(authorization_endpoint)
    }
}

/// A Request Object, passed by value or by reference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum RequestIndirection {
    #[serde(rename = "request")]
    ByValue(String),
    #[serde(rename = "request_uri")]
    ByReference(String),
}

impl RequestIndirection {
    /// Pick the request object out of redirect query parameters.
    ///
    /// `request_uri` takes precedence over `request`.
    pub fn from_query_params(params: &HashMap<String, String>) -> Result<Self> {
        if let Some(uri) = params.get("request_uri") {
            return Ok(Self::ByReference(uri.clone()));
        }
        if let Some(jwt) = params.get("request") {
            return Ok(Self::ByValue(jwt.clone()));
        }
        Err(Error::MissingRequestParameter(
            "no known request parameter (expected 'request' or 'request_uri')".into(),
        ))
    }

    /// Return the request object JWT, dereferencing `request_uri` if needed.
    pub async fn resolve<H: AsyncHttpClient + ?Sized>(self, http_client: &H) -> Result<String> {
        match self {
            RequestIndirection::ByValue(jwt) => Ok(jwt),
            RequestIndirection::ByReference(url) => {
                debug!("dereferencing request object at {url}");
                let body = expect_success(get(http_client, &url).await?, "request object")?;
                String::from_utf8(body)
                    .map(|jwt| jwt.trim().to_owned())
                    .map_err(|e| Error::Parse(format!("request object is not UTF-8: {e}")))
            }
        }
    }
}

/// A presentation definition, passed by value or by reference.
#[derive(Debug, Clone)]
pub enum PresentationDefinitionIndirection {
    ByValue(PresentationDefinition),
    ByReference(String),
}

/// The decoded claims of a Request Object JWT.
#[derive(Debug, Clone)]
pub struct RequestObject {
    claims: UntypedObject,
    response_type: ResponseType,
    nonce: Nonce,
    state: Option<State>,
    return_uri: String,
}

impl RequestObject {
    /// Decode a Request Object JWT without verifying it.
    ///
    /// Authorization servers answer on `redirect_uri`; some verifiers use `response_uri`,
    /// which takes precedence.
    pub fn from_jwt(jwt: &str) -> Result<Self> {
        let claims: UntypedObject = jws::decode_unverified(jwt)?.into();

        let response_type = claims.get().parsing_error()?;
        let nonce = claims.get().parsing_error()?;
        let state = claims.get::<State>().transpose().map_err(Error::parse)?;
        let return_uri = match (claims.get::<ResponseUri>(), claims.get::<RedirectUri>()) {
            (Some(uri), _) => uri.parsing_error()?.0,
            (None, Some(uri)) => uri.parsing_error()?.0,
            (None, None) => {
                return Err(Error::MissingRequestParameter(
                    "request object has neither 'response_uri' nor 'redirect_uri'".into(),
                ))
            }
        };

        Ok(Self {
            claims,
            response_type,
            nonce,
            state,
            return_uri,
        })
    }

    pub fn response_type(&self) -> &ResponseType {
        &self.response_type
    }

    pub fn nonce(&self) -> &Nonce {
        &self.nonce
    }

    pub fn state(&self) -> Option<&State> {
        self.state.as_ref()
    }

    /// Uri to submit the response at.
    pub fn return_uri(&self) -> &str {
        &self.return_uri
    }

    pub fn presentation_definition_indirection(&self) -> Result<PresentationDefinitionIndirection> {
        match (
            self.claims.get::<PresentationDefinition>(),
            self.claims.get::<PresentationDefinitionUri>(),
        ) {
            (Some(by_value), _) => Ok(PresentationDefinitionIndirection::ByValue(
                by_value.parsing_error()?,
            )),
            (None, Some(by_reference)) => Ok(PresentationDefinitionIndirection::ByReference(
                by_reference.parsing_error()?.0,
            )),
            (None, None) => Err(Error::MissingRequestParameter(
                "one of 'presentation_definition' and 'presentation_definition_uri' is required"
                    .into(),
            )),
        }
    }

    pub async fn resolve_presentation_definition<H: AsyncHttpClient + ?Sized>(
        &self,
        http_client: &H,
    ) -> Result<PresentationDefinitionParsed> {
        match self.presentation_definition_indirection()? {
            PresentationDefinitionIndirection::ByValue(by_value) => Ok(by_value.into_parsed()),
            PresentationDefinitionIndirection::ByReference(by_reference) => {
                debug!("fetching presentation definition from {by_reference}");
                let body = expect_success(
                    get(http_client, &by_reference).await?,
                    "presentation definition",
                )?;
                serde_json::from_slice(&body)
                    .map_err(|e| Error::deserialization("presentation definition", e))
            }
        }
    }
}
