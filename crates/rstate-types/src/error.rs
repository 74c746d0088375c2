use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid URN '{urn}': {reason}")]
    InvalidUrn { urn: String, reason: String },

    #[error("unrecognized signature '{0}' in property map")]
    UnknownSignature(String),
}
