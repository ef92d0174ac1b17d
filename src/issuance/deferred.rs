//! Polling of deferred credentials.
//!
//! Issuers that cannot issue right away answer a credential request with an acceptance token
//! or a transaction id. The wallet then polls the deferred endpoint. Some issuers rotate the
//! acceptance token on every poll, in which case the fresh token is persisted and the poll is
//! repeated, up to [EngineConfig::max_deferred_attempts] times.

use serde_json::json;
use tracing::{debug, info, warn};

use crate::{
    config::EngineConfig,
    core::{
        credential::{CredentialResponse, TransactionState},
        util::{expect_success, post_json, AsyncHttpClient},
    },
    error::{Error, Result},
    store::Broker,
};

/// Result of polling a deferred credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeferredOutcome {
    /// The credential was issued and the pending transaction removed.
    Issued(CredentialResponse),
    /// Nothing to collect yet. Poll again later with the returned, persisted state.
    NotYetAvailable(TransactionState),
}

/// Poll the deferred endpoint for the transaction stored under `entity_id`.
///
/// Waits [EngineConfig::deferred_initial_delay] before the first request only.
pub async fn poll<H, B>(
    http_client: &H,
    broker: &B,
    config: &EngineConfig,
    entity_id: &str,
    mut state: TransactionState,
) -> Result<DeferredOutcome>
where
    H: AsyncHttpClient + ?Sized,
    B: Broker + ?Sized,
{
    tokio::time::sleep(config.deferred_initial_delay()).await;

    let mut attempts = 0;
    loop {
        attempts += 1;
        let body = json!({ "transaction_id": state.transaction_id });
        let response = post_json(
            http_client,
            &state.deferred_endpoint,
            &body,
            &state.access_token,
        )
        .await?;
        let response =
            CredentialResponse::from_slice(&expect_success(response, "deferred credential")?)?;

        let rotated = response
            .acceptance_token
            .as_ref()
            .filter(|token| **token != state.access_token)
            .cloned();
        if let Some(token) = rotated {
            debug!("issuer rotated the acceptance token of {entity_id}");
            state.access_token = token;
            persist(broker, entity_id, &state).await?;

            if attempts >= config.max_deferred_attempts {
                warn!("giving up on {entity_id} after {attempts} deferred attempts");
                return Ok(DeferredOutcome::NotYetAvailable(state));
            }
            continue;
        }

        if response.credential.is_some() {
            broker
                .delete_entity(entity_id)
                .await
                .map_err(Error::Storage)?;
            info!("deferred credential {entity_id} issued");
            return Ok(DeferredOutcome::Issued(response));
        }

        if let Some(transaction_id) = response
            .transaction_id
            .filter(|id| *id != state.transaction_id)
        {
            debug!("issuer rotated the transaction id of {entity_id}");
            state.transaction_id = transaction_id;
            persist(broker, entity_id, &state).await?;
        }
        debug!("deferred credential {entity_id} not yet available");
        return Ok(DeferredOutcome::NotYetAvailable(state));
    }
}

async fn persist<B: Broker + ?Sized>(
    broker: &B,
    entity_id: &str,
    state: &TransactionState,
) -> Result<()> {
    broker
        .upsert_entity(entity_id, state.to_json_string()?)
        .await
        .map_err(Error::Storage)
}
