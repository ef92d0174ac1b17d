pub mod authorization_request;
pub mod credential;
pub mod credential_format;
pub mod credential_offer;
pub mod did;
pub mod input_descriptor;
pub mod jws;
pub mod metadata;
pub mod object;
pub mod presentation_definition;
pub mod presentation_submission;
pub mod response;
pub mod token;
pub mod util;
