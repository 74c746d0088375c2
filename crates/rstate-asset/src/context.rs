use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use url::Url;

use crate::blob::Blob;
use crate::config::ArchiveConfig;
use crate::error::{AssetError, AssetResult};

/// Source of bytes for URI-backed assets and archives.
///
/// The built-in [`FileFetcher`] serves `file://` URIs. Network schemes
/// belong to the embedding application, which plugs its own fetcher into a
/// [`ContentContext`].
pub trait UriFetcher: Send + Sync {
    /// Open the content behind `url` as a sized stream.
    fn fetch(&self, url: &Url) -> AssetResult<Blob>;
}

/// Fetcher that understands local `file://` URIs only.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileFetcher;

impl UriFetcher for FileFetcher {
    fn fetch(&self, url: &Url) -> AssetResult<Blob> {
        match url.scheme() {
            "file" => open_file_url(url),
            other => Err(AssetError::UnsupportedScheme(other.to_string())),
        }
    }
}

/// Open a `file://` URL. The host must be empty or `localhost`, and user
/// info, query, and fragment are rejected.
pub fn open_file_url(url: &Url) -> AssetResult<Blob> {
    let invalid = |reason: String| AssetError::InvalidUri {
        uri: url.to_string(),
        reason,
    };
    if !url.username().is_empty() || url.password().is_some() {
        return Err(invalid("file:// URIs cannot have a user".into()));
    }
    if url.query().is_some() {
        return Err(invalid("file:// URIs cannot have a query string".into()));
    }
    if url.fragment().is_some() {
        return Err(invalid("file:// URIs cannot have a fragment".into()));
    }
    match url.host_str() {
        None | Some("") | Some("localhost") => {}
        Some(host) => {
            return Err(invalid(format!(
                "file:// host '{host}' not supported (only localhost)"
            )))
        }
    }
    let path = url
        .to_file_path()
        .map_err(|_| invalid("not a local file path".into()))?;
    let file = File::open(&path).map_err(|e| AssetError::file(&path, e))?;
    Blob::from_file(file).map_err(|e| AssetError::file(&path, e))
}

/// Parse a URI string, attaching it to any error.
pub fn parse_uri(uri: &str) -> AssetResult<Url> {
    Url::parse(uri).map_err(|e| AssetError::InvalidUri {
        uri: uri.to_string(),
        reason: e.to_string(),
    })
}

/// Everything needed to dereference asset and archive sources: the working
/// directory for relative paths, the archive configuration, and the URI
/// fetcher.
#[derive(Clone)]
pub struct ContentContext {
    wd: PathBuf,
    config: ArchiveConfig,
    fetcher: Arc<dyn UriFetcher>,
}

impl ContentContext {
    /// A context rooted at `wd` with default configuration and the file fetcher.
    pub fn new(wd: impl Into<PathBuf>) -> Self {
        Self {
            wd: wd.into(),
            config: ArchiveConfig::default(),
            fetcher: Arc::new(FileFetcher),
        }
    }

    /// A context rooted at the process working directory.
    pub fn current_dir() -> AssetResult<Self> {
        Ok(Self::new(std::env::current_dir()?))
    }

    /// Replace the archive configuration.
    pub fn with_config(mut self, config: ArchiveConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the URI fetcher.
    pub fn with_fetcher(mut self, fetcher: Arc<dyn UriFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// The working directory relative paths resolve against.
    pub fn wd(&self) -> &Path {
        &self.wd
    }

    pub fn config(&self) -> &ArchiveConfig {
        &self.config
    }

    /// Resolve a possibly-relative path against the working directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.wd.join(path)
        }
    }

    /// Fetch the content behind a URL.
    pub fn fetch(&self, url: &Url) -> AssetResult<Blob> {
        self.fetcher.fetch(url)
    }
}

impl fmt::Debug for ContentContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentContext")
            .field("wd", &self.wd)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
