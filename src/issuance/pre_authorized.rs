//! Token acquisition with a pre-authorized code.

use tracing::{debug, info};

use super::discover_token_endpoint;
use crate::{
    config::EngineConfig,
    core::{
        credential_offer::{CredentialOffer, Grant, PinRequirement, PreAuthorizedCodeGrant},
        token::{TokenRequest, TokenResponse},
        util::{post_form, AsyncHttpClient},
    },
    error::{Error, Result},
    pin::{CallerContext, PinChannel, PinRequest, PinRequestSender},
};

/// Redeems pre-authorized codes, prompting the user for a PIN or transaction code when the
/// offer asks for one.
pub struct PreAuthorizedTokenFlow<'a, H: ?Sized, S> {
    http_client: &'a H,
    config: &'a EngineConfig,
    pins: &'a PinChannel<S>,
}

impl<'a, H, S> PreAuthorizedTokenFlow<'a, H, S>
where
    H: AsyncHttpClient + ?Sized,
    S: PinRequestSender,
{
    pub fn new(http_client: &'a H, config: &'a EngineConfig, pins: &'a PinChannel<S>) -> Self {
        Self {
            http_client,
            config,
            pins,
        }
    }

    /// Discover the token endpoint of the offer's issuer and redeem its pre-authorized code.
    pub async fn acquire_for_offer(
        &self,
        authorization_token: &str,
        offer: &CredentialOffer,
    ) -> Result<TokenResponse> {
        let Grant::PreAuthorized(grant) = &offer.grant else {
            return Err(Error::Parse(
                "credential offer has no pre-authorized code grant".into(),
            ));
        };
        let (_, server) =
            discover_token_endpoint(self.http_client, &offer.credential_issuer).await?;
        self.acquire(authorization_token, server.token_endpoint(), grant)
            .await
    }

    /// Redeem `grant` at `token_endpoint`.
    ///
    /// `authorization_token` identifies the caller whose session receives the PIN prompt; it is
    /// only read when the grant requires a PIN or transaction code.
    pub async fn acquire(
        &self,
        authorization_token: &str,
        token_endpoint: &str,
        grant: &PreAuthorizedCodeGrant,
    ) -> Result<TokenResponse> {
        let (user_pin, tx_code) = match grant.pin_requirement() {
            PinRequirement::None => {
                debug!("pre-authorized code needs no PIN");
                (None, None)
            }
            PinRequirement::Pin => {
                debug!("pre-authorized code needs a PIN");
                let pin = self
                    .prompt(authorization_token, PinRequest { pin: true, tx_code: None })
                    .await?;
                (Some(pin), None)
            }
            PinRequirement::TxCode(tx_code) => {
                debug!("pre-authorized code needs a transaction code");
                let code = self
                    .prompt(
                        authorization_token,
                        PinRequest {
                            pin: false,
                            tx_code: Some(tx_code),
                        },
                    )
                    .await?;
                (None, Some(code))
            }
        };

        let request = TokenRequest::PreAuthorizedCode {
            pre_authorized_code: grant.pre_authorized_code.clone(),
            user_pin,
            tx_code,
        };
        let response = post_form(
            self.http_client,
            token_endpoint,
            request.to_x_www_form_urlencoded()?,
            None,
        )
        .await?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            debug!("token endpoint rejected the pre-authorized code (status: {status})");
            return Err(Error::InvalidPin);
        }
        if !status.is_success() {
            return Err(Error::Communication(format!(
                "unexpected token endpoint status: {status}"
            )));
        }

        let token = serde_json::from_slice::<TokenResponse>(response.body())
            .map_err(|e| Error::Parse(format!("invalid token response: {e}")))?;
        info!("access token obtained with pre-authorized code");
        Ok(token)
    }

    async fn prompt(&self, authorization_token: &str, request: PinRequest) -> Result<String> {
        let caller = CallerContext::from_authorization_token(authorization_token)?;
        self.pins
            .request(&caller, request, self.config.pin_timeout())
            .await
    }
}
