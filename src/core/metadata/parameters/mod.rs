//! Typed entries of issuer and authorisation server metadata documents.

use crate::core::object::string_parameter;

string_parameter!(CredentialIssuer, "credential_issuer");

string_parameter!(CredentialEndpoint, "credential_endpoint");

string_parameter!(DeferredCredentialEndpoint, "deferred_credential_endpoint");

string_parameter!(
    /// Authorisation server of a credential issuer. Issuers without one act as their own.
    AuthorizationServer,
    "authorization_server"
);

string_parameter!(Issuer, "issuer");

string_parameter!(AuthorizationEndpoint, "authorization_endpoint");

string_parameter!(TokenEndpoint, "token_endpoint");
