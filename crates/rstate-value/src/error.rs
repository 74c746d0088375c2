use rstate_asset::AssetError;
use rstate_types::TypeError;
use thiserror::Error;

/// Errors produced while decoding values from their weak-map form.
#[derive(Debug, Error)]
pub enum ValueError {
    #[error("asset error: {0}")]
    Asset(#[from] AssetError),

    #[error("type error: {0}")]
    Type(#[from] TypeError),

    #[error("malformed {what}: {reason}")]
    Malformed { what: &'static str, reason: String },
}

impl ValueError {
    pub(crate) fn malformed(what: &'static str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            what,
            reason: reason.into(),
        }
    }
}

pub type ValueResult<T> = Result<T, ValueError>;
