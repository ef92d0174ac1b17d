#![allow(dead_code)]

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
};

use anyhow::{bail, Result};
use async_trait::async_trait;
use base64::prelude::*;
use http::{header::LOCATION, Method, Request, Response};
use oid4vc_wallet::{
    core::util::AsyncHttpClient,
    pin::{PinMailbox, PinRequest, PinRequestSender},
};
use serde_json::Value as Json;

pub const ISSUER: &str = "https://issuer.example";
pub const AUTH_SERVER: &str = "https://as.example";
pub const TOKEN_ENDPOINT: &str = "https://as.example/token";
pub const AUTHORIZATION_ENDPOINT: &str = "https://as.example/authorize";
pub const DEFERRED_ENDPOINT: &str = "https://issuer.example/credential_deferred";

/// A request seen by [MockHttpClient].
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub uri: String,
    pub authorization: Option<String>,
    pub body: String,
}

impl Recorded {
    pub fn form(&self) -> HashMap<String, String> {
        serde_urlencoded::from_str(&self.body).unwrap()
    }

    pub fn json(&self) -> Json {
        serde_json::from_str(&self.body).unwrap()
    }
}

struct Route {
    method: Method,
    prefix: String,
    responses: VecDeque<Response<Vec<u8>>>,
}

/// Scripted HTTP client: each route answers requests whose uri starts with its prefix, popping
/// one queued response per request. Every request is recorded.
#[derive(Clone, Default)]
pub struct MockHttpClient {
    routes: Arc<Mutex<Vec<Route>>>,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl MockHttpClient {
    pub fn on(&self, method: Method, prefix: &str, response: Response<Vec<u8>>) -> &Self {
        let mut routes = self.routes.lock().unwrap();
        match routes
            .iter_mut()
            .find(|r| r.method == method && r.prefix == prefix)
        {
            Some(route) => route.responses.push_back(response),
            None => routes.push(Route {
                method,
                prefix: prefix.to_owned(),
                responses: VecDeque::from([response]),
            }),
        }
        self
    }

    pub fn on_get_json(&self, url: &str, body: Json) -> &Self {
        self.on(Method::GET, url, json_response(200, &body))
    }

    pub fn on_post_json(&self, url: &str, status: u16, body: Json) -> &Self {
        self.on(Method::POST, url, json_response(status, &body))
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, prefix: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.uri.starts_with(prefix))
            .collect()
    }
}

#[async_trait]
impl AsyncHttpClient for MockHttpClient {
    async fn execute(&self, request: Request<Vec<u8>>) -> Result<Response<Vec<u8>>> {
        let recorded = Recorded {
            method: request.method().clone(),
            uri: request.uri().to_string(),
            authorization: request
                .headers()
                .get(http::header::AUTHORIZATION)
                .map(|v| v.to_str().unwrap().to_owned()),
            body: String::from_utf8(request.body().clone()).unwrap(),
        };
        self.requests.lock().unwrap().push(recorded.clone());

        let mut routes = self.routes.lock().unwrap();
        let Some(route) = routes
            .iter_mut()
            .filter(|r| r.method == recorded.method && recorded.uri.starts_with(&r.prefix))
            .max_by_key(|r| r.prefix.len())
        else {
            bail!("no route for {} {}", recorded.method, recorded.uri)
        };
        match route.responses.pop_front() {
            Some(response) => Ok(response),
            None => bail!("route {} {} exhausted", recorded.method, route.prefix),
        }
    }
}

pub fn json_response(status: u16, body: &Json) -> Response<Vec<u8>> {
    Response::builder()
        .status(status)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(serde_json::to_vec(body).unwrap())
        .unwrap()
}

pub fn text_response(body: &str) -> Response<Vec<u8>> {
    Response::builder()
        .status(200)
        .body(body.as_bytes().to_vec())
        .unwrap()
}

pub fn redirect(location: &str) -> Response<Vec<u8>> {
    Response::builder()
        .status(302)
        .header(LOCATION, location)
        .body(vec![])
        .unwrap()
}

/// Unsigned JWT carrying `claims`.
pub fn unsigned_jwt(claims: &Json) -> String {
    format!(
        "{}.{}.",
        BASE64_URL_SAFE_NO_PAD.encode(br#"{"alg":"none"}"#),
        BASE64_URL_SAFE_NO_PAD.encode(claims.to_string())
    )
}

/// Bearer token of a caller with `sub` and `sid`.
pub fn caller_token(user: &str, session: &str) -> String {
    format!(
        "Bearer {}",
        unsigned_jwt(&serde_json::json!({"sub": user, "sid": session}))
    )
}

/// Issuer and authorisation server metadata served from the well-known endpoints.
pub fn serve_metadata(http: &MockHttpClient) {
    http.on_get_json(
        &format!("{ISSUER}/.well-known/openid-credential-issuer"),
        serde_json::json!({
            "credential_issuer": ISSUER,
            "credential_endpoint": format!("{ISSUER}/credential"),
            "deferred_credential_endpoint": DEFERRED_ENDPOINT,
            "authorization_server": AUTH_SERVER,
        }),
    );
    http.on_get_json(
        &format!("{AUTH_SERVER}/.well-known/openid-configuration"),
        serde_json::json!({
            "issuer": AUTH_SERVER,
            "authorization_endpoint": AUTHORIZATION_ENDPOINT,
            "token_endpoint": TOKEN_ENDPOINT,
        }),
    );
}

/// Answers every PIN prompt with `pin` straight away, recording the prompts.
#[derive(Clone)]
pub struct AnsweringSender {
    pub mailbox: PinMailbox,
    pub user_id: String,
    pub pin: Option<String>,
    pub sent: Arc<Mutex<Vec<(String, PinRequest)>>>,
}

impl AnsweringSender {
    pub fn new(mailbox: PinMailbox, user_id: &str, pin: Option<&str>) -> Self {
        Self {
            mailbox,
            user_id: user_id.to_owned(),
            pin: pin.map(str::to_owned),
            sent: Arc::default(),
        }
    }
}

#[async_trait]
impl PinRequestSender for AnsweringSender {
    async fn send_request(&self, session_id: &str, request: PinRequest) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((session_id.to_owned(), request));
        if let Some(pin) = &self.pin {
            self.mailbox.deliver(&self.user_id, pin.clone());
        }
        Ok(())
    }
}
