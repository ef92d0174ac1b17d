use serde::{Deserialize, Serialize};
use url::Url;

use self::parameters::{State, VpToken};
use super::{presentation_submission::PresentationSubmission, util::form_urlencode};
use crate::error::{Error, Result};

pub mod parameters;

/// An unencoded Authorization Response for the `direct_post` response mode.
#[derive(Debug, Clone)]
pub struct AuthorizationResponse {
    pub vp_token: VpToken,
    pub presentation_submission: PresentationSubmission,
    pub state: Option<State>,
}

impl AuthorizationResponse {
    /// Encode the response as `application/x-www-form-urlencoded`.
    ///
    /// The presentation submission is JSON-encoded into its form value.
    pub fn into_x_www_form_urlencoded(self) -> Result<String> {
        let submission =
            serde_json::to_string(&self.presentation_submission).map_err(Error::parse)?;

        let mut pairs = vec![
            ("vp_token", self.vp_token.0),
            ("presentation_submission", submission),
        ];
        if let Some(State(state)) = self.state {
            pairs.push(("state", state));
        }
        form_urlencode(&pairs)
    }
}

/// JSON body some verifiers answer a `direct_post` with, instead of a 3xx.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostRedirection {
    pub redirect_uri: Url,
}
