use std::time::Duration;

use http::Method;
use oid4vc_wallet::{
    config::EngineConfig,
    core::{
        credential_offer::{
            AuthorizationCodeGrant, CredentialOffer, Grant, PreAuthorizedCodeGrant, TxCode,
        },
        token::TokenResponse,
    },
    issuance::pre_authorized::PreAuthorizedTokenFlow,
    pin::{PinChannel, PinMailbox},
    Error,
};
use serde_json::json;

mod common;

use common::*;

fn grant(user_pin_required: bool, tx_code: Option<TxCode>) -> PreAuthorizedCodeGrant {
    PreAuthorizedCodeGrant {
        pre_authorized_code: "pac-1".into(),
        user_pin_required,
        tx_code,
    }
}

fn token_body() -> serde_json::Value {
    json!({
        "access_token": "at-1",
        "token_type": "Bearer",
        "expires_in": 86400,
        "c_nonce": "cn-1",
        "c_nonce_expires_in": 86400
    })
}

#[tokio::test]
async fn offer_without_pin() {
    let http = MockHttpClient::default();
    serve_metadata(&http);
    http.on_post_json(TOKEN_ENDPOINT, 200, token_body());

    let offer = CredentialOffer::from_json_str(
        &json!({
            "credential_issuer": ISSUER,
            "credentials": [{"format": "jwt_vc", "types": ["VerifiableCredential", "VerifiableAttestation"]}],
            "grants": {
                "urn:ietf:params:oauth:grant-type:pre-authorized_code": {
                    "pre-authorized_code": "pac-1",
                    "user_pin_required": false
                }
            }
        })
        .to_string(),
    )
    .unwrap();

    let mailbox = PinMailbox::default();
    let sender = AnsweringSender::new(mailbox.clone(), "user-1", None);
    let pins = PinChannel::new(mailbox, sender.clone());
    let config = EngineConfig::default();
    let flow = PreAuthorizedTokenFlow::new(&http, &config, &pins);

    // A caller token is not needed when no PIN is asked for.
    let token = flow.acquire_for_offer("", &offer).await.unwrap();

    assert_eq!(
        token,
        TokenResponse {
            access_token: "at-1".into(),
            token_type: "Bearer".into(),
            expires_in: Some(86400),
            c_nonce: Some("cn-1".into()),
            c_nonce_expires_in: Some(86400),
            id_token: None,
            authorization_details: None,
        }
    );
    assert!(sender.sent.lock().unwrap().is_empty());

    let token_requests = http.requests_to(TOKEN_ENDPOINT);
    assert_eq!(token_requests.len(), 1);
    let form = token_requests[0].form();
    assert_eq!(
        form["grant_type"],
        "urn:ietf:params:oauth:grant-type:pre-authorized_code"
    );
    assert_eq!(form["pre-authorized_code"], "pac-1");
    assert!(!form.contains_key("user_pin"));
    assert!(!form.contains_key("tx_code"));
}

#[tokio::test]
async fn pin_is_prompted_and_sent() {
    let http = MockHttpClient::default();
    http.on_post_json(TOKEN_ENDPOINT, 200, token_body());

    let mailbox = PinMailbox::default();
    let sender = AnsweringSender::new(mailbox.clone(), "user-1", Some("1234"));
    let pins = PinChannel::new(mailbox.clone(), sender.clone());
    let config = EngineConfig::default();
    let flow = PreAuthorizedTokenFlow::new(&http, &config, &pins);

    let token = flow
        .acquire(
            &caller_token("user-1", "session-1"),
            TOKEN_ENDPOINT,
            &grant(true, None),
        )
        .await
        .unwrap();
    assert_eq!(token.access_token, "at-1");

    let sent = sender.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "session-1");
    assert!(sent[0].1.pin);

    let form = http.requests_to(TOKEN_ENDPOINT)[0].form();
    assert_eq!(form["user_pin"], "1234");
    assert!(!mailbox.is_pending("user-1"));
}

#[tokio::test]
async fn tx_code_is_prompted_with_its_descriptor() {
    let http = MockHttpClient::default();
    http.on_post_json(TOKEN_ENDPOINT, 200, token_body());

    let mailbox = PinMailbox::default();
    let sender = AnsweringSender::new(mailbox.clone(), "user-1", Some("493536"));
    let pins = PinChannel::new(mailbox, sender.clone());
    let config = EngineConfig::default();
    let flow = PreAuthorizedTokenFlow::new(&http, &config, &pins);

    let tx_code = TxCode {
        length: Some(6),
        input_mode: Some("numeric".into()),
        description: None,
    };
    flow.acquire(
        &caller_token("user-1", "session-1"),
        TOKEN_ENDPOINT,
        &grant(true, Some(tx_code.clone())),
    )
    .await
    .unwrap();

    let sent = sender.sent.lock().unwrap().clone();
    assert!(!sent[0].1.pin);
    assert_eq!(sent[0].1.tx_code, Some(tx_code));

    let form = http.requests_to(TOKEN_ENDPOINT)[0].form();
    assert_eq!(form["tx_code"], "493536");
    assert!(!form.contains_key("user_pin"));
}

#[tokio::test]
async fn rejected_pin() {
    let http = MockHttpClient::default();
    http.on_post_json(TOKEN_ENDPOINT, 400, json!({"error": "invalid_grant"}));

    let mailbox = PinMailbox::default();
    let pins = PinChannel::new(
        mailbox.clone(),
        AnsweringSender::new(mailbox, "user-1", Some("0000")),
    );
    let config = EngineConfig::default();
    let flow = PreAuthorizedTokenFlow::new(&http, &config, &pins);

    let result = flow
        .acquire(
            &caller_token("user-1", "session-1"),
            TOKEN_ENDPOINT,
            &grant(true, None),
        )
        .await;
    assert!(matches!(result, Err(Error::InvalidPin)));
}

#[tokio::test]
async fn unreadable_token_response() {
    let http = MockHttpClient::default();
    http.on(Method::POST, TOKEN_ENDPOINT, text_response("not json"));

    let mailbox = PinMailbox::default();
    let pins = PinChannel::new(mailbox.clone(), AnsweringSender::new(mailbox, "user-1", None));
    let config = EngineConfig::default();
    let flow = PreAuthorizedTokenFlow::new(&http, &config, &pins);

    let result = flow.acquire("", TOKEN_ENDPOINT, &grant(false, None)).await;
    assert!(matches!(result, Err(Error::Parse(_))));
}

#[tokio::test(start_paused = true)]
async fn pin_timeout_sends_no_token_request() {
    let http = MockHttpClient::default();
    http.on_post_json(TOKEN_ENDPOINT, 200, token_body());

    let mailbox = PinMailbox::default();
    let sender = AnsweringSender::new(mailbox.clone(), "user-1", None);
    let pins = PinChannel::new(mailbox.clone(), sender.clone());
    let config = EngineConfig::default();
    let flow = PreAuthorizedTokenFlow::new(&http, &config, &pins);

    let result = flow
        .acquire(
            &caller_token("user-1", "session-1"),
            TOKEN_ENDPOINT,
            &grant(true, None),
        )
        .await;

    assert!(matches!(result, Err(Error::Timeout(d)) if d == Duration::from_secs(120)));
    assert_eq!(sender.sent.lock().unwrap().len(), 1);
    assert!(http.requests().is_empty());
    assert!(!mailbox.is_pending("user-1"));
}

#[tokio::test]
async fn authorization_code_offer_is_refused() {
    let http = MockHttpClient::default();
    let offer = CredentialOffer {
        credential_issuer: ISSUER.into(),
        credentials: vec![],
        grant: Grant::AuthorizationCode(AuthorizationCodeGrant { issuer_state: None }),
    };

    let mailbox = PinMailbox::default();
    let pins = PinChannel::new(mailbox.clone(), AnsweringSender::new(mailbox, "user-1", None));
    let config = EngineConfig::default();
    let flow = PreAuthorizedTokenFlow::new(&http, &config, &pins);

    assert!(matches!(
        flow.acquire_for_offer("", &offer).await,
        Err(Error::Parse(_))
    ));
    assert!(http.requests().is_empty());
}
