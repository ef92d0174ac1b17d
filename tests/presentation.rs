use http::Method;
use oid4vc_wallet::{
    compact::encode_presentation,
    config::EngineConfig,
    core::{
        authorization_request::{
            verification::{authorization_request_from_jwt, verify_request},
            AuthorizationRequest,
        },
        credential_format::ClaimFormatDesignation,
        credential_offer::{CredentialOffer, Grant, GrantKind, PinRequirement},
        jws,
    },
    holder::{submit_authorization_response, PresentationAssembler},
    identity::generate_did_key,
    signing::{sign, DocumentType},
    store::{MemoryCredentials, MemoryStore},
};
use serde_json::{json, Value as Json};

mod common;

use common::*;

const VERIFIER_CALLBACK: &str = "https://verifier.example/callback";

async fn signed_request(secrets: &MemoryStore, verifier_did: &str) -> String {
    let client_id: String =
        url::form_urlencoded::byte_serialize(verifier_did.as_bytes()).collect();
    let callback: String =
        url::form_urlencoded::byte_serialize(VERIFIER_CALLBACK.as_bytes()).collect();
    let auth_request = format!(
        "openid://?response_type=vp_token&response_mode=direct_post&client_id={client_id}\
         &redirect_uri={callback}&nonce=nonce-1&state=state-1"
    );
    sign(
        secrets,
        &json!({"iss": verifier_did, "sub": verifier_did, "auth_request": auth_request}),
        verifier_did,
        DocumentType::Unknown,
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn verified_request_is_answered() {
    let verifier_secrets = MemoryStore::default();
    let verifier_did = generate_did_key(&verifier_secrets).await.unwrap();
    let jwt = signed_request(&verifier_secrets, &verifier_did).await;

    let jwt = verify_request(&jwt).unwrap();
    let request = authorization_request_from_jwt(&jwt).unwrap();
    assert_eq!(request.client_id, verifier_did);
    assert_eq!(request.redirect_uri, VERIFIER_CALLBACK);
    assert_eq!(request.nonce.as_deref(), Some("nonce-1"));

    let secrets = MemoryStore::default();
    let holder = generate_did_key(&secrets).await.unwrap();
    let credentials = MemoryCredentials::default();
    for id in ["vc-1", "vc-2"] {
        let vc = sign(
            &secrets,
            &json!({"sub": holder, "jti": id, "vc": {"type": ["VerifiableCredential"]}}),
            &holder,
            DocumentType::Unknown,
        )
        .await
        .unwrap();
        credentials
            .insert(id, &["VerifiableCredential"], ClaimFormatDesignation::JwtVc, vc)
            .await;
    }
    let config = EngineConfig::default();
    let assembler = PresentationAssembler::new(&secrets, &credentials, &config);
    let ids = vec!["vc-1".to_owned(), "vc-2".to_owned()];
    let vp_token = assembler
        .assemble(
            &ids,
            request.nonce.as_deref().unwrap(),
            &request.client_id,
            &ClaimFormatDesignation::JwtVc,
        )
        .await
        .unwrap();

    let http = MockHttpClient::default();
    http.on(
        Method::POST,
        VERIFIER_CALLBACK,
        redirect("https://verifier.example/done?session=1"),
    );

    let location = submit_authorization_response(
        &http,
        &request,
        vp_token.clone(),
        "definition-1".into(),
        &["descriptor-a".to_owned(), "descriptor-b".to_owned()],
    )
    .await
    .unwrap();
    assert_eq!(
        location.as_deref(),
        Some("https://verifier.example/done?session=1")
    );

    let form = http.requests_to(VERIFIER_CALLBACK)[0].form();
    assert_eq!(form["vp_token"], vp_token);
    assert_eq!(form["state"], "state-1");

    let submission: Json = serde_json::from_str(&form["presentation_submission"]).unwrap();
    assert_eq!(submission["definition_id"], "definition-1");
    let outer = &submission["descriptor_map"][0];
    assert_eq!(outer["id"], "descriptor-a");
    assert_eq!(outer["format"], "jwt_vp");
    assert_eq!(outer["path"], "$");
    assert_eq!(
        outer["path_nested"],
        json!({
            "id": "descriptor-a",
            "format": "jwt_vc",
            "path": "$.vp.verifiableCredential[0]",
            "path_nested": {
                "id": "descriptor-b",
                "format": "jwt_vc",
                "path": "$.vp.verifiableCredential[1]"
            }
        })
    );

    let claims = jws::decode_unverified(&vp_token).unwrap();
    assert_eq!(claims["aud"], verifier_did.as_str());
    assert_eq!(claims["iss"], holder.as_str());

    let compact = encode_presentation(&vp_token).unwrap();
    assert!(!compact.is_empty());
}

fn direct_post_request() -> AuthorizationRequest {
    AuthorizationRequest {
        scope: None,
        response_type: "vp_token".into(),
        response_mode: Some("direct_post".into()),
        client_id: "did:key:zVerifier".into(),
        redirect_uri: VERIFIER_CALLBACK.into(),
        state: None,
        nonce: Some("n".into()),
    }
}

async fn submit(http: &MockHttpClient) -> Option<String> {
    submit_authorization_response(
        http,
        &direct_post_request(),
        "a.b.c".into(),
        "definition-1".into(),
        &["descriptor-a".to_owned()],
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn direct_post_without_redirect() {
    let http = MockHttpClient::default();
    http.on_post_json(VERIFIER_CALLBACK, 200, json!({}));

    assert_eq!(submit(&http).await, None);
    assert!(!http.requests()[0].form().contains_key("state"));
}

#[tokio::test]
async fn direct_post_redirect_in_body() {
    let http = MockHttpClient::default();
    http.on_post_json(
        VERIFIER_CALLBACK,
        200,
        json!({"redirect_uri": "https://verifier.example/done?session=2"}),
    );

    assert_eq!(
        submit(&http).await.as_deref(),
        Some("https://verifier.example/done?session=2")
    );
}

#[tokio::test]
async fn unreadable_direct_post_body_is_accepted() {
    let http = MockHttpClient::default();
    http.on(Method::POST, VERIFIER_CALLBACK, text_response("accepted"));

    assert_eq!(submit(&http).await, None);
    assert_eq!(http.requests_to(VERIFIER_CALLBACK).len(), 1);
}

#[tokio::test]
async fn credential_offer_by_reference() {
    let http = MockHttpClient::default();
    http.on_get_json(
        "https://issuer.example/offers/1",
        json!({
            "credential_issuer": ISSUER,
            "credentials": [{"format": "jwt_vc", "types": ["VerifiableCredential", "CTWalletSamePreAuthorised"]}],
            "grants": {
                "urn:ietf:params:oauth:grant-type:pre-authorized_code": {
                    "pre-authorized_code": "pac-1",
                    "user_pin_required": true
                }
            }
        }),
    );

    let offer = CredentialOffer::resolve(
        &http,
        "openid-credential-offer://?credential_offer_uri=https%3A%2F%2Fissuer.example%2Foffers%2F1",
    )
    .await
    .unwrap();

    assert_eq!(offer.credential_issuer, ISSUER);
    assert_eq!(offer.grant_kind(), GrantKind::PreAuthorized);
    assert_eq!(
        offer.credential_types(),
        vec!["VerifiableCredential", "CTWalletSamePreAuthorised"]
    );
    let Grant::PreAuthorized(grant) = &offer.grant else {
        panic!("expected a pre-authorized grant");
    };
    assert_eq!(grant.pin_requirement(), PinRequirement::Pin);
}
