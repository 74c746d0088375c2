use thiserror::Error;

/// Errors produced while parsing a property path.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("invalid property path '{path}': {reason} at '{fragment}'")]
    Syntax {
        path: String,
        fragment: String,
        reason: &'static str,
    },

    #[error("invalid property path '{path}': invalid array index '{index}'")]
    InvalidIndex { path: String, index: String },
}

pub type PathResult<T> = Result<T, PathError>;
