use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("{kind} cannot be empty when constructing a {what}")]
    EmptySource {
        kind: &'static str,
        what: &'static str,
    },

    #[error("'{0}' is neither a recognized archive type nor a directory")]
    NotArchiveOrDirectory(PathBuf),

    #[error("asset path '{0}' is a directory; try using an archive")]
    PathIsDirectory(PathBuf),

    #[error("failed to read '{path}': {source}")]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to expand archive member '{name}': {source}")]
    Member {
        name: String,
        #[source]
        source: Box<AssetError>,
    },

    #[error("invalid URI '{uri}': {reason}")]
    InvalidUri { uri: String, reason: String },

    #[error("unrecognized or unsupported URI scheme: {0}")]
    UnsupportedScheme(String),

    #[error("file at URL '{0}' is not a recognized archive format")]
    NotArchiveUri(String),

    #[error("{0} has no contents to read")]
    NoContents(&'static str),

    #[error("duplicate archive member '{0}'")]
    DuplicateMember(String),

    #[error("corrupt {format} archive: {reason}")]
    CorruptArchive { format: &'static str, reason: String },

    #[error("incorrect blob size for {name}: expected {expected}, got {actual}")]
    SizeMismatch {
        name: String,
        expected: u64,
        actual: u64,
    },

    #[error("archive member name too long for a tar header: {0}")]
    NameTooLong(String),

    #[error("archive member '{name}' is too large for a tar header ({size} bytes)")]
    MemberTooLarge { name: String, size: u64 },

    #[error("malformed {what}: {reason}")]
    Malformed { what: &'static str, reason: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl AssetError {
    pub(crate) fn file(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::File {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn member(name: impl Into<String>, source: AssetError) -> Self {
        Self::Member {
            name: name.into(),
            source: Box::new(source),
        }
    }

    pub(crate) fn malformed(what: &'static str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            what,
            reason: reason.into(),
        }
    }
}

pub type AssetResult<T> = Result<T, AssetError>;
