use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use rstate_types::{ContentHasher, Signature, EMPTY_DIGEST};
use serde_json::{Map, Value as JsonValue};
use tracing::debug;

use crate::blob::Blob;
use crate::context::{parse_uri, ContentContext};
use crate::error::{AssetError, AssetResult};

pub const ASSET_HASH_KEY: &str = "hash";
pub const ASSET_TEXT_KEY: &str = "text";
pub const ASSET_PATH_KEY: &str = "path";
pub const ASSET_URI_KEY: &str = "uri";

/// Where an asset's bytes come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AssetSource {
    /// Inline text.
    Text(String),
    /// A file on the host filesystem, relative to the working directory unless absolute.
    Path(PathBuf),
    /// A URI handed to the context's fetcher.
    Uri(String),
}

/// A single content-addressed blob of bytes.
///
/// The SHA-256 hash is computed at most once and cached for the life of the
/// value. Later changes to a backing file are not observed by an asset whose
/// hash is already known.
#[derive(Clone, Debug)]
pub struct Asset {
    source: Option<AssetSource>,
    hash: OnceLock<String>,
}

impl Asset {
    /// An inline text asset. Hashing text cannot fail, so the hash is set eagerly.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let hash = ContentHasher::digest_hex(text.as_bytes());
        Self {
            source: Some(AssetSource::Text(text)),
            hash: OnceLock::from(hash),
        }
    }

    /// A file asset resolved against the process working directory.
    pub fn from_path(path: impl Into<PathBuf>) -> AssetResult<Self> {
        Self::from_path_with(path, &ContentContext::current_dir()?)
    }

    /// A file asset resolved against `ctx`. The file is hashed immediately.
    pub fn from_path_with(path: impl Into<PathBuf>, ctx: &ContentContext) -> AssetResult<Self> {
        let path = path.into();
        if path.as_os_str().is_empty() {
            return Err(AssetError::EmptySource {
                kind: "path",
                what: "path asset",
            });
        }
        Self::hashed(AssetSource::Path(path), ctx)
    }

    /// A URI asset fetched with the default file fetcher.
    pub fn from_uri(uri: impl Into<String>) -> AssetResult<Self> {
        Self::from_uri_with(uri, &ContentContext::current_dir()?)
    }

    /// A URI asset fetched through `ctx`. The content is hashed immediately.
    pub fn from_uri_with(uri: impl Into<String>, ctx: &ContentContext) -> AssetResult<Self> {
        let uri = uri.into();
        if uri.is_empty() {
            return Err(AssetError::EmptySource {
                kind: "uri",
                what: "URI asset",
            });
        }
        Self::hashed(AssetSource::Uri(uri), ctx)
    }

    /// An asset whose contents are not available, known only by its hash.
    pub fn placeholder(hash: impl Into<String>) -> Self {
        Self {
            source: None,
            hash: OnceLock::from(hash.into()),
        }
    }

    fn hashed(source: AssetSource, ctx: &ContentContext) -> AssetResult<Self> {
        let asset = Self {
            source: Some(source),
            hash: OnceLock::new(),
        };
        asset.ensure_hash_with(ctx)?;
        Ok(asset)
    }

    pub fn source(&self) -> Option<&AssetSource> {
        self.source.as_ref()
    }

    pub fn text(&self) -> Option<&str> {
        match &self.source {
            Some(AssetSource::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.source {
            Some(AssetSource::Path(path)) => Some(path),
            _ => None,
        }
    }

    pub fn uri(&self) -> Option<&str> {
        match &self.source {
            Some(AssetSource::Uri(uri)) => Some(uri),
            _ => None,
        }
    }

    pub fn is_text(&self) -> bool {
        self.text().is_some()
    }

    pub fn is_path(&self) -> bool {
        self.path().is_some()
    }

    pub fn is_uri(&self) -> bool {
        self.uri().is_some()
    }

    /// Returns `false` for placeholders.
    pub fn has_contents(&self) -> bool {
        self.source.is_some()
    }

    /// The cached hash, if one has been computed or deserialized.
    pub fn hash(&self) -> Option<&str> {
        self.hash.get().map(String::as_str)
    }

    /// Open the asset's bytes, resolving paths against the process working directory.
    pub fn read(&self) -> AssetResult<Blob> {
        self.read_with(&ContentContext::current_dir()?)
    }

    /// Open the asset's bytes through `ctx`.
    pub fn read_with(&self, ctx: &ContentContext) -> AssetResult<Blob> {
        match &self.source {
            Some(AssetSource::Text(text)) => Ok(Blob::from_bytes(text.clone().into_bytes())),
            Some(AssetSource::Path(path)) => read_path(&ctx.resolve(path)),
            Some(AssetSource::Uri(uri)) => ctx.fetch(&parse_uri(uri)?),
            None => Err(AssetError::NoContents("asset")),
        }
    }

    /// Compute the hash if it is not cached yet and return it.
    pub fn ensure_hash(&self) -> AssetResult<&str> {
        if let Some(hash) = self.hash.get() {
            return Ok(hash);
        }
        self.ensure_hash_with(&ContentContext::current_dir()?)
    }

    /// [`ensure_hash`](Self::ensure_hash) resolving content through `ctx`.
    pub fn ensure_hash_with(&self, ctx: &ContentContext) -> AssetResult<&str> {
        if let Some(hash) = self.hash.get() {
            return Ok(hash);
        }
        let mut blob = self.read_with(ctx)?;
        let digest = ContentHasher::digest_reader(&mut blob)?;
        debug!(source = ?self.source, digest = %digest, "hashed asset");
        Ok(self.hash.get_or_init(|| digest))
    }

    /// Content equality: two assets are equal when their hashes match,
    /// whatever their sources. An asset that cannot be hashed equals nothing.
    pub fn equals(&self, other: &Asset) -> bool {
        match (self.ensure_hash(), other.ensure_hash()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }

    /// Encode as a signature-tagged weak map.
    pub fn serialize(&self) -> Map<String, JsonValue> {
        let mut map = Signature::Asset.new_map();
        if let Some(hash) = self.hash() {
            map.insert(ASSET_HASH_KEY.into(), JsonValue::String(hash.to_string()));
        }
        match &self.source {
            Some(AssetSource::Text(text)) if !text.is_empty() => {
                map.insert(ASSET_TEXT_KEY.into(), JsonValue::String(text.clone()));
            }
            Some(AssetSource::Path(path)) => {
                map.insert(
                    ASSET_PATH_KEY.into(),
                    JsonValue::String(path.to_string_lossy().into_owned()),
                );
            }
            Some(AssetSource::Uri(uri)) => {
                map.insert(ASSET_URI_KEY.into(), JsonValue::String(uri.clone()));
            }
            _ => {}
        }
        map
    }

    /// Decode a weak map. Returns `Ok(None)` when the map is not tagged as an asset.
    ///
    /// A map with no text, path, or URI is an empty text asset unless it
    /// carries the hash of some other content, in which case it is a
    /// placeholder.
    pub fn deserialize(map: &Map<String, JsonValue>) -> AssetResult<Option<Self>> {
        if !Signature::Asset.tags(map) {
            return Ok(None);
        }
        let hash = string_field(map, ASSET_HASH_KEY)?;
        let text = string_field(map, ASSET_TEXT_KEY)?;
        let path = string_field(map, ASSET_PATH_KEY)?;
        let uri = string_field(map, ASSET_URI_KEY)?;

        let source = if !text.is_empty() {
            Some(AssetSource::Text(text.to_string()))
        } else if !path.is_empty() {
            Some(AssetSource::Path(PathBuf::from(path)))
        } else if !uri.is_empty() {
            Some(AssetSource::Uri(uri.to_string()))
        } else if hash.is_empty() || hash == EMPTY_DIGEST {
            Some(AssetSource::Text(String::new()))
        } else {
            None
        };

        let hash = if hash.is_empty() {
            OnceLock::new()
        } else {
            OnceLock::from(hash.to_string())
        };
        Ok(Some(Self { source, hash }))
    }
}

impl PartialEq for Asset {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.hash() == other.hash()
    }
}

fn read_path(path: &Path) -> AssetResult<Blob> {
    let meta = fs::metadata(path).map_err(|e| AssetError::file(path, e))?;
    if meta.is_dir() {
        return Err(AssetError::PathIsDirectory(path.to_path_buf()));
    }
    let file = File::open(path).map_err(|e| AssetError::file(path, e))?;
    Blob::from_file(file).map_err(|e| AssetError::file(path, e))
}

fn string_field<'a>(map: &'a Map<String, JsonValue>, key: &str) -> AssetResult<&'a str> {
    match map.get(key) {
        None | Some(JsonValue::Null) => Ok(""),
        Some(JsonValue::String(s)) => Ok(s),
        Some(other) => Err(AssetError::malformed(
            "asset",
            format!("'{key}' must be a string, found {other}"),
        )),
    }
}
