//! This library provides the wallet side of [OID4VCI] and [OID4VP] as a protocol engine.
//!
//! [OID4VCI]: <https://openid.net/specs/openid-4-verifiable-credential-issuance-1_0.html>
//! [OID4VP]: <https://openid.net/specs/openid-4-verifiable-presentations-1_0.html>
//!
//! The engine owns no user interface and no persistent storage. Keys are kept in a
//! [`SecretStore`], pending deferred credentials in a [`Broker`], issued credentials are read
//! through a [`CredentialSource`], and PIN prompts are relayed to the user through a
//! [`PinRequestSender`]. All HTTP traffic goes through an [`AsyncHttpClient`].
//!
//! [`SecretStore`]: crate::store::SecretStore
//! [`Broker`]: crate::store::Broker
//! [`CredentialSource`]: crate::store::CredentialSource
//! [`PinRequestSender`]: crate::pin::PinRequestSender
//! [`AsyncHttpClient`]: crate::core::util::AsyncHttpClient
//!
//! # Issuance
//!
//! ## Pre-authorized code
//!
//! ```ignore
//! use oid4vc_wallet::core::credential_offer::CredentialOffer;
//! use oid4vc_wallet::issuance::pre_authorized::PreAuthorizedTokenFlow;
//! use oid4vc_wallet::pin::{PinChannel, PinMailbox};
//!
//! let offer = CredentialOffer::resolve(&http_client, &offer_uri).await?;
//!
//! // The user's PIN arrives out of band and is handed to the mailbox.
//! let pins = PinChannel::new(PinMailbox::default(), my_pin_sender);
//! let flow = PreAuthorizedTokenFlow::new(&http_client, &config, &pins);
//! let token = flow.acquire_for_offer(&bearer_token, &offer).await?;
//! ```
//!
//! ## Authorization code (EBSI)
//!
//! The authorization server may answer the authorization request with an `id_token` or a
//! `vp_token` request of its own. Both are handled by [`AuthorizationCodeFlow`], which then
//! redeems the returned code with a PKCE verifier.
//!
//! ```ignore
//! use oid4vc_wallet::issuance::authorization_code::AuthorizationCodeFlow;
//!
//! let flow = AuthorizationCodeFlow::new(&http_client, &config, &secrets, &credentials);
//! let token = flow.acquire_for_offer(&did, &offer).await?;
//! ```
//!
//! [`AuthorizationCodeFlow`]: crate::issuance::authorization_code::AuthorizationCodeFlow
//!
//! ## Deferred credentials
//!
//! See [`issuance::deferred::poll`].
//!
//! # Presentation
//!
//! Incoming request objects are checked with [`verify_request`], then answered with a
//! presentation assembled by [`PresentationAssembler`]. A signed presentation can be shrunk to
//! a QR-code friendly string with [`compact::encode_presentation`].
//!
//! [`verify_request`]: crate::core::authorization_request::verification::verify_request
//! [`PresentationAssembler`]: crate::holder::PresentationAssembler

pub mod compact;
pub mod config;
pub mod core;
pub mod error;
pub mod holder;
pub mod identity;
pub mod issuance;
pub mod pin;
pub mod signing;
pub mod store;

pub use error::{Error, Result};
pub use serde_json_path::JsonPath;
