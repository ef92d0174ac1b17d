use std::{
    collections::HashMap,
    time::{SystemTime, UNIX_EPOCH},
};

use anyhow::Context;
use async_trait::async_trait;
use http::{
    header::{AUTHORIZATION, CONTENT_TYPE, LOCATION},
    Request, Response,
};
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};

/// Generic HTTP client.
///
/// A trait is used here so to facilitate native HTTP/TLS when compiled for mobile applications.
///
/// Implementations must NOT follow redirects: several exchanges read the `Location` header of
/// a 3xx response.
#[async_trait]
pub trait AsyncHttpClient {
    async fn execute(&self, request: Request<Vec<u8>>) -> anyhow::Result<Response<Vec<u8>>>;
}

pub(crate) fn base_request() -> http::request::Builder {
    Request::builder()
}

#[derive(Debug)]
pub struct ReqwestClient(reqwest::Client);

impl AsRef<reqwest::Client> for ReqwestClient {
    fn as_ref(&self) -> &reqwest::Client {
        &self.0
    }
}

impl ReqwestClient {
    pub fn new() -> anyhow::Result<Self> {
        reqwest::Client::builder()
            .use_rustls_tls()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .context("unable to build http_client")
            .map(Self)
    }
}

#[async_trait]
impl AsyncHttpClient for ReqwestClient {
    async fn execute(&self, request: Request<Vec<u8>>) -> anyhow::Result<Response<Vec<u8>>> {
        let response = self
            .0
            .execute(request.try_into().context("unable to convert request")?)
            .await
            .context("http request failed")?;

        let mut builder = Response::builder()
            .status(response.status())
            .version(response.version());

        builder
            .headers_mut()
            .context("unable to set headers")?
            .extend(response.headers().clone());

        builder
            .body(
                response
                    .bytes()
                    .await
                    .context("failed to extract response body")?
                    .to_vec(),
            )
            .context("unable to construct response")
    }
}

/// Seconds since the unix epoch. A clock set before 1970 reads as 0.
pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Encode `application/x-www-form-urlencoded` pairs, percent-encoding keys and values as UTF-8.
pub fn form_urlencode<T: Serialize + ?Sized>(pairs: &T) -> Result<String> {
    serde_urlencoded::to_string(pairs).map_err(Error::parse)
}

pub(crate) async fn get<H: AsyncHttpClient + ?Sized>(
    http_client: &H,
    url: &str,
) -> Result<Response<Vec<u8>>> {
    let request = base_request()
        .method("GET")
        .uri(url)
        .body(vec![])
        .map_err(Error::communication)?;

    http_client
        .execute(request)
        .await
        .map_err(|e| Error::Communication(format!("GET {url} failed: {e:#}")))
}

pub(crate) async fn post_form<H: AsyncHttpClient + ?Sized>(
    http_client: &H,
    url: &str,
    body: String,
    bearer: Option<&str>,
) -> Result<Response<Vec<u8>>> {
    let mut builder = base_request()
        .method("POST")
        .uri(url)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(token) = bearer {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = builder
        .body(body.into_bytes())
        .map_err(Error::communication)?;

    http_client
        .execute(request)
        .await
        .map_err(|e| Error::Communication(format!("POST {url} failed: {e:#}")))
}

pub(crate) async fn post_json<H: AsyncHttpClient + ?Sized>(
    http_client: &H,
    url: &str,
    body: &serde_json::Value,
    bearer: &str,
) -> Result<Response<Vec<u8>>> {
    let request = base_request()
        .method("POST")
        .uri(url)
        .header(CONTENT_TYPE, "application/json")
        .header(AUTHORIZATION, format!("Bearer {bearer}"))
        .body(serde_json::to_vec(body).map_err(Error::parse)?)
        .map_err(Error::communication)?;

    http_client
        .execute(request)
        .await
        .map_err(|e| Error::Communication(format!("POST {url} failed: {e:#}")))
}

/// Return the body of a 2xx response, or a communication error for any other status.
pub(crate) fn expect_success(response: Response<Vec<u8>>, what: &str) -> Result<Vec<u8>> {
    let status = response.status();
    if !status.is_success() {
        let body = String::from_utf8_lossy(response.body());
        return Err(Error::Communication(format!(
            "{what} request was unsuccessful (status: {status}): {body}"
        )));
    }
    Ok(response.into_body())
}

/// Return the `Location` header of a 3xx response.
///
/// 4xx/5xx statuses are communication errors, as is a 2xx where a redirect was expected.
pub(crate) fn expect_redirect(response: &Response<Vec<u8>>, what: &str) -> Result<String> {
    let status = response.status();
    if !status.is_redirection() {
        let body = String::from_utf8_lossy(response.body());
        return Err(Error::Communication(format!(
            "{what} did not redirect (status: {status}): {body}"
        )));
    }

    let location = response
        .headers()
        .get(LOCATION)
        .ok_or_else(|| Error::Communication(format!("{what} redirect has no Location header")))?
        .to_str()
        .map_err(Error::communication)?;
    debug!("{what} redirected to {location}");
    Ok(location.to_owned())
}

/// Extract every query parameter of a redirect location.
///
/// Custom schemes such as `openid://?code=…` are accepted.
pub fn query_params(location: &str) -> Result<HashMap<String, String>> {
    let url = Url::parse(location).map_err(Error::parse)?;
    Ok(url.query_pairs().into_owned().collect())
}
