use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Engine configuration.
///
/// Every field has a default so a partial JSON document is enough, e.g.
/// `{"global_state": "abc"}`.
#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct EngineConfig {
    /// Fixed local redirect URI announced in authorization requests.
    pub redirect_uri: String,
    /// CSRF `state` sent with, and expected back from, EBSI authorization requests.
    pub global_state: String,
    pub vp_expiration_secs: u64,
    pub id_token_expiration_secs: u64,
    pub pin_timeout_secs: u64,
    /// Delay before the first deferred credential attempt.
    pub deferred_initial_delay_secs: u64,
    /// Upper bound on acceptance token rotations in a single deferred poll.
    pub max_deferred_attempts: u32,
    /// Holder placeholder used by DOME-profile presentations.
    pub dome_holder_did: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            redirect_uri: "openid://".into(),
            global_state: uuid::Uuid::new_v4().to_string(),
            vp_expiration_secs: 600,
            id_token_expiration_secs: 600,
            pin_timeout_secs: 120,
            deferred_initial_delay_secs: 10,
            max_deferred_attempts: 10,
            dome_holder_did: "did:my:wallet".into(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).map_err(|e| Error::deserialization("engine configuration", e))
    }

    pub fn pin_timeout(&self) -> Duration {
        Duration::from_secs(self.pin_timeout_secs)
    }

    pub fn deferred_initial_delay(&self) -> Duration {
        Duration::from_secs(self.deferred_initial_delay_secs)
    }
}
