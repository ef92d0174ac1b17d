use std::time::Duration;

/// Errors surfaced by the wallet engine.
///
/// Every failure is propagated to the immediate caller. The only negative outcome that is not
/// an error is a deferred credential that is not yet available, see
/// [DeferredOutcome](crate::issuance::deferred::DeferredOutcome).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A JWT could not be split into its compact serialization parts.
    #[error("malformed JWT: {0}")]
    Format(String),

    /// A JWT, JSON document, key or claim set could not be parsed or encoded.
    #[error("parse error: {0}")]
    Parse(String),

    /// A response body did not match the expected schema.
    #[error("failed to deserialize {what}: {reason}")]
    Deserialization { what: &'static str, reason: String },

    /// Unsuccessful status code or transport level failure.
    #[error("communication error: {0}")]
    Communication(String),

    /// The issuer rejected the submitted PIN or transaction code.
    #[error("the submitted PIN or transaction code was rejected")]
    InvalidPin,

    /// No PIN or transaction code was received in time.
    #[error("no PIN or transaction code received within {0:?}")]
    Timeout(Duration),

    #[error("state mismatch: expected '{expected}', received '{received}'")]
    StateMismatch { expected: String, received: String },

    /// `client_id`, `iss` and `sub` of an Authorization Request do not agree.
    #[error("issuer/subject mismatch: {0}")]
    ClientMismatch(String),

    #[error("empty or unreadable credential list")]
    EmptyCredentialList,

    /// No stored credential has every type an input descriptor requires.
    #[error("no credential satisfies input descriptor '{0}'")]
    UnsatisfiedDescriptor(String),

    #[error("missing request parameter: {0}")]
    MissingRequestParameter(String),

    #[error("invalid signature")]
    InvalidSignature,

    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    /// Failure reported by an external storage collaborator, passed through unchanged.
    #[error("storage error: {0}")]
    Storage(#[source] anyhow::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub(crate) fn parse(e: impl ToString) -> Self {
        Self::Parse(e.to_string())
    }

    pub(crate) fn communication(e: impl ToString) -> Self {
        Self::Communication(e.to_string())
    }

    pub(crate) fn deserialization(what: &'static str, e: impl ToString) -> Self {
        Self::Deserialization {
            what,
            reason: e.to_string(),
        }
    }

    /// Whether the error indicates a protocol violation by a peer.
    pub fn is_consistency(&self) -> bool {
        matches!(
            self,
            Error::StateMismatch { .. }
                | Error::ClientMismatch(_)
                | Error::EmptyCredentialList
                | Error::MissingRequestParameter(_)
        )
    }
}
