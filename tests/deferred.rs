use oid4vc_wallet::{
    config::EngineConfig,
    core::credential::TransactionState,
    issuance::deferred::{poll, DeferredOutcome},
    store::{Broker, MemoryStore},
    Error,
};
use serde_json::json;

mod common;

use common::*;

const ENTITY: &str = "pending-vc-1";

async fn pending(broker: &MemoryStore) -> TransactionState {
    let state = TransactionState {
        transaction_id: "tx-1".into(),
        access_token: "T0".into(),
        deferred_endpoint: DEFERRED_ENDPOINT.into(),
    };
    broker
        .upsert_entity(ENTITY, state.to_json_string().unwrap())
        .await
        .unwrap();
    state
}

async fn stored(broker: &MemoryStore) -> Option<TransactionState> {
    broker
        .get_entity(ENTITY)
        .await
        .unwrap()
        .map(|s| TransactionState::from_json_str(&s).unwrap())
}

#[tokio::test(start_paused = true)]
async fn rotated_acceptance_token_is_followed_until_issued() {
    let http = MockHttpClient::default();
    http.on_post_json(DEFERRED_ENDPOINT, 200, json!({"acceptance_token": "T1"}))
        .on_post_json(
            DEFERRED_ENDPOINT,
            200,
            json!({"acceptance_token": "T1", "format": "jwt_vc", "credential": "a.b.c"}),
        );
    let broker = MemoryStore::default();
    let state = pending(&broker).await;

    let outcome = poll(&http, &broker, &EngineConfig::default(), ENTITY, state)
        .await
        .unwrap();

    let DeferredOutcome::Issued(response) = outcome else {
        panic!("expected an issued credential, got {outcome:?}");
    };
    assert_eq!(response.credential.as_deref(), Some("a.b.c"));
    assert!(stored(&broker).await.is_none());

    let requests = http.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].authorization.as_deref(), Some("Bearer T0"));
    assert_eq!(requests[1].authorization.as_deref(), Some("Bearer T1"));
    assert_eq!(requests[0].json(), json!({"transaction_id": "tx-1"}));
}

#[tokio::test(start_paused = true)]
async fn not_yet_available_keeps_the_transaction() {
    let http = MockHttpClient::default();
    http.on_post_json(DEFERRED_ENDPOINT, 200, json!({"transaction_id": "tx-2"}));
    let broker = MemoryStore::default();
    let state = pending(&broker).await;

    let outcome = poll(&http, &broker, &EngineConfig::default(), ENTITY, state)
        .await
        .unwrap();

    let expected = TransactionState {
        transaction_id: "tx-2".into(),
        access_token: "T0".into(),
        deferred_endpoint: DEFERRED_ENDPOINT.into(),
    };
    assert_eq!(outcome, DeferredOutcome::NotYetAvailable(expected.clone()));
    assert_eq!(stored(&broker).await, Some(expected));
}

#[tokio::test(start_paused = true)]
async fn endless_rotation_is_bounded() {
    let http = MockHttpClient::default();
    for i in 1..=3 {
        http.on_post_json(
            DEFERRED_ENDPOINT,
            200,
            json!({"acceptance_token": format!("T{i}")}),
        );
    }
    let broker = MemoryStore::default();
    let state = pending(&broker).await;
    let config = EngineConfig {
        max_deferred_attempts: 3,
        ..EngineConfig::default()
    };

    let outcome = poll(&http, &broker, &config, ENTITY, state).await.unwrap();

    let DeferredOutcome::NotYetAvailable(state) = outcome else {
        panic!("expected a pending transaction, got {outcome:?}");
    };
    assert_eq!(state.access_token, "T3");
    assert_eq!(stored(&broker).await.unwrap().access_token, "T3");
    assert_eq!(http.requests().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn deferred_endpoint_failure() {
    let http = MockHttpClient::default();
    http.on_post_json(DEFERRED_ENDPOINT, 500, json!({"error": "server_error"}));
    let broker = MemoryStore::default();
    let state = pending(&broker).await;

    let result = poll(&http, &broker, &EngineConfig::default(), ENTITY, state).await;

    assert!(matches!(result, Err(Error::Communication(_))));
    assert!(stored(&broker).await.is_some());
}
