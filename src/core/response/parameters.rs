pub use crate::core::authorization_request::parameters::State;
use crate::core::object::string_parameter;

string_parameter!(
    /// `vp_token` holding a single compact (JWT) or base64url encoded presentation.
    VpToken,
    "vp_token"
);

string_parameter!(IdToken, "id_token");

string_parameter!(Code, "code");
