//! Out-of-band PIN and transaction code exchange.
//!
//! The engine asks the user for a PIN through a [PinRequestSender] (typically the user's
//! WebSocket session) and waits for the answer in a per-user, single-slot [PinMailbox] that the
//! transport feeds with [PinMailbox::deliver].

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::{
    core::{
        authorization_request::parameters::Subject,
        credential_offer::TxCode,
        jws,
        object::{ParsingErrorContext, UntypedObject},
    },
    error::{Error, Result},
};

/// Identity of the caller driving a flow, taken from its bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext {
    pub user_id: String,
    pub session_id: String,
}

impl CallerContext {
    /// Read `sub` and `sid` from the caller's authorization token.
    ///
    /// The token is authenticated upstream and is not verified here. Without a `sid` the user id
    /// doubles as session id.
    pub fn from_authorization_token(token: &str) -> Result<Self> {
        let token = token.strip_prefix("Bearer ").unwrap_or(token);
        let claims: UntypedObject = jws::decode_unverified(token)?.into();
        let Subject(user_id) = claims.get().parsing_error()?;
        let session_id = claims
            .0
            .get("sid")
            .and_then(|sid| sid.as_str())
            .map_or_else(|| user_id.clone(), str::to_owned);

        Ok(Self {
            user_id,
            session_id,
        })
    }
}

/// Message asking the user for a PIN or transaction code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinRequest {
    pub pin: bool,
    pub tx_code: Option<TxCode>,
}

/// Delivers [PinRequest]s to a user's session.
#[async_trait]
pub trait PinRequestSender: Send + Sync {
    async fn send_request(&self, session_id: &str, request: PinRequest) -> anyhow::Result<()>;
}

type Slots = Arc<Mutex<HashMap<String, oneshot::Sender<String>>>>;

/// Per-user single-slot mailbox for PIN answers.
#[derive(Debug, Clone, Default)]
pub struct PinMailbox {
    slots: Slots,
}

impl PinMailbox {
    /// Register the only pending wait for `user_id`.
    pub fn subscribe(&self, user_id: &str) -> Result<PinWait> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|_| Error::Communication("PIN mailbox lock poisoned".into()))?;

        if slots.get(user_id).is_some_and(|pending| !pending.is_closed()) {
            return Err(Error::Communication(format!(
                "a PIN wait is already pending for user {user_id}"
            )));
        }

        let (sender, receiver) = oneshot::channel();
        slots.insert(user_id.to_owned(), sender);

        Ok(PinWait {
            user_id: user_id.to_owned(),
            receiver,
            slots: self.slots.clone(),
        })
    }

    /// Hand a value to the pending wait of `user_id`. Returns whether anyone was waiting.
    pub fn deliver(&self, user_id: &str, value: String) -> bool {
        let Ok(mut slots) = self.slots.lock() else {
            return false;
        };
        match slots.remove(user_id) {
            Some(sender) => sender.send(value).is_ok(),
            None => {
                debug!("no pending PIN wait for user {user_id}");
                false
            }
        }
    }

    pub fn is_pending(&self, user_id: &str) -> bool {
        self.slots
            .lock()
            .map(|slots| slots.get(user_id).is_some_and(|s| !s.is_closed()))
            .unwrap_or(false)
    }
}

/// A registered wait. Dropping it releases the user's slot.
#[derive(Debug)]
pub struct PinWait {
    user_id: String,
    receiver: oneshot::Receiver<String>,
    slots: Slots,
}

impl PinWait {
    /// Wait for exactly one value.
    pub async fn recv(mut self, timeout: Duration) -> Result<String> {
        match tokio::time::timeout(timeout, &mut self.receiver).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(_)) => Err(Error::Communication(format!(
                "PIN channel of user {} closed",
                self.user_id
            ))),
            Err(_) => {
                warn!("no PIN received from user {} within {timeout:?}", self.user_id);
                Err(Error::Timeout(timeout))
            }
        }
    }
}

impl Drop for PinWait {
    fn drop(&mut self) {
        self.receiver.close();
        if let Ok(mut slots) = self.slots.lock() {
            if slots.get(&self.user_id).is_some_and(|s| s.is_closed()) {
                slots.remove(&self.user_id);
            }
        }
    }
}

/// A [PinMailbox] paired with the sender that prompts the user.
pub struct PinChannel<S> {
    mailbox: PinMailbox,
    sender: S,
}

impl<S: PinRequestSender> PinChannel<S> {
    pub fn new(mailbox: PinMailbox, sender: S) -> Self {
        Self { mailbox, sender }
    }

    pub fn mailbox(&self) -> &PinMailbox {
        &self.mailbox
    }

    /// Prompt the caller and wait up to `timeout` for the answer.
    ///
    /// The wait is registered before the prompt goes out, so an immediate answer is not lost.
    pub async fn request(
        &self,
        caller: &CallerContext,
        request: PinRequest,
        timeout: Duration,
    ) -> Result<String> {
        let wait = self.mailbox.subscribe(&caller.user_id)?;
        self.sender
            .send_request(&caller.session_id, request)
            .await
            .map_err(|e| Error::Communication(format!("unable to send PIN request: {e:#}")))?;

        debug!("waiting for PIN of user {}", caller.user_id);
        wait.recv(timeout).await
    }
}

#[cfg(test)]
mod test {
    use base64::prelude::*;

    use super::*;

    #[derive(Default)]
    struct RecordingSender {
        sent: Mutex<Vec<(String, PinRequest)>>,
    }

    #[async_trait]
    impl PinRequestSender for RecordingSender {
        async fn send_request(&self, session_id: &str, request: PinRequest) -> anyhow::Result<()> {
            self.sent
                .lock()
                .unwrap()
                .push((session_id.to_owned(), request));
            Ok(())
        }
    }

    fn caller() -> CallerContext {
        CallerContext {
            user_id: "user-1".into(),
            session_id: "session-1".into(),
        }
    }

    #[test]
    fn caller_from_token() {
        let token = format!(
            "Bearer {}.{}.sig",
            BASE64_URL_SAFE_NO_PAD.encode(br#"{"alg":"none"}"#),
            BASE64_URL_SAFE_NO_PAD.encode(br#"{"sub":"user-1","sid":"session-1"}"#)
        );
        assert_eq!(CallerContext::from_authorization_token(&token).unwrap(), caller());

        let without_sid = format!(
            "{}.{}.sig",
            BASE64_URL_SAFE_NO_PAD.encode(br#"{"alg":"none"}"#),
            BASE64_URL_SAFE_NO_PAD.encode(br#"{"sub":"user-2"}"#)
        );
        let caller = CallerContext::from_authorization_token(&without_sid).unwrap();
        assert_eq!(caller.session_id, "user-2");
    }

    #[tokio::test]
    async fn delivered_value_is_received() {
        let mailbox = PinMailbox::default();
        let wait = mailbox.subscribe("user-1").unwrap();
        assert!(mailbox.deliver("user-1", "1234".into()));

        assert_eq!(wait.recv(Duration::from_secs(1)).await.unwrap(), "1234");
        assert!(!mailbox.is_pending("user-1"));
    }

    #[tokio::test]
    async fn one_pending_wait_per_user() {
        let mailbox = PinMailbox::default();
        let first = mailbox.subscribe("user-1").unwrap();
        assert!(mailbox.subscribe("user-1").is_err());
        assert!(mailbox.subscribe("user-2").is_ok());

        drop(first);
        assert!(mailbox.subscribe("user-1").is_ok());
    }

    #[tokio::test]
    async fn timeout_releases_the_slot() {
        tokio::time::pause();
        let channel = PinChannel::new(PinMailbox::default(), RecordingSender::default());

        let result = channel
            .request(
                &caller(),
                PinRequest {
                    pin: true,
                    tx_code: None,
                },
                Duration::from_secs(120),
            )
            .await;

        assert!(matches!(result, Err(Error::Timeout(d)) if d == Duration::from_secs(120)));
        assert!(!channel.mailbox().is_pending("user-1"));
        let sent = channel.sender.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "session-1");
    }
}
