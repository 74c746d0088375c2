use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use rstate_types::{ContentHasher, Signature};
use serde_json::{Map, Value as JsonValue};
use tracing::debug;

use crate::asset::Asset;
use crate::blob::Blob;
use crate::context::{parse_uri, ContentContext};
use crate::error::{AssetError, AssetResult};
use crate::format::ArchiveFormat;
use crate::reader::{open_file, open_stream, ArchiveReader, AssetsReader, DirectoryReader};
use crate::writer::write_members;

pub const ARCHIVE_HASH_KEY: &str = "hash";
pub const ARCHIVE_ASSETS_KEY: &str = "assets";
pub const ARCHIVE_PATH_KEY: &str = "path";
pub const ARCHIVE_URI_KEY: &str = "uri";

/// Hash of an archive with no members: two empty tar blocks.
pub const EMPTY_ARCHIVE_DIGEST: &str =
    "5f70bf18a086007016e948b04aed3b82103a36bea41755b6cddfaf10ace3c6ef";

/// One named entry of an assets archive.
#[derive(Clone, Debug, PartialEq)]
pub enum ArchiveMember {
    Asset(Asset),
    Archive(Archive),
}

impl From<Asset> for ArchiveMember {
    fn from(asset: Asset) -> Self {
        Self::Asset(asset)
    }
}

impl From<Archive> for ArchiveMember {
    fn from(archive: Archive) -> Self {
        Self::Archive(archive)
    }
}

/// Where an archive's members come from.
#[derive(Clone, Debug, PartialEq)]
pub enum ArchiveSource {
    /// Named assets and nested archives.
    Assets(BTreeMap<String, ArchiveMember>),
    /// An archive file or a directory on the host filesystem.
    Path(PathBuf),
    /// An archive file behind a URI.
    Uri(String),
}

/// A content-addressed bundle of named blobs.
///
/// Like [`Asset`], the hash is computed at most once and then cached.
#[derive(Clone, Debug)]
pub struct Archive {
    source: Option<ArchiveSource>,
    hash: OnceLock<String>,
}

impl Archive {
    /// An archive of named members, hashed against the process working directory.
    pub fn from_assets(assets: BTreeMap<String, ArchiveMember>) -> AssetResult<Self> {
        Self::from_assets_with(assets, &ContentContext::current_dir()?)
    }

    pub fn from_assets_with(
        assets: BTreeMap<String, ArchiveMember>,
        ctx: &ContentContext,
    ) -> AssetResult<Self> {
        Self::hashed(ArchiveSource::Assets(assets), ctx)
    }

    /// An archive file or directory, hashed against the process working directory.
    pub fn from_path(path: impl Into<PathBuf>) -> AssetResult<Self> {
        Self::from_path_with(path, &ContentContext::current_dir()?)
    }

    pub fn from_path_with(path: impl Into<PathBuf>, ctx: &ContentContext) -> AssetResult<Self> {
        let path = path.into();
        if path.as_os_str().is_empty() {
            return Err(AssetError::EmptySource {
                kind: "path",
                what: "path archive",
            });
        }
        Self::hashed(ArchiveSource::Path(path), ctx)
    }

    /// An archive file behind a URI, fetched with the default file fetcher.
    pub fn from_uri(uri: impl Into<String>) -> AssetResult<Self> {
        Self::from_uri_with(uri, &ContentContext::current_dir()?)
    }

    pub fn from_uri_with(uri: impl Into<String>, ctx: &ContentContext) -> AssetResult<Self> {
        let uri = uri.into();
        if uri.is_empty() {
            return Err(AssetError::EmptySource {
                kind: "uri",
                what: "URI archive",
            });
        }
        Self::hashed(ArchiveSource::Uri(uri), ctx)
    }

    /// An archive whose contents are not available, known only by its hash.
    pub fn placeholder(hash: impl Into<String>) -> Self {
        Self {
            source: None,
            hash: OnceLock::from(hash.into()),
        }
    }

    fn hashed(source: ArchiveSource, ctx: &ContentContext) -> AssetResult<Self> {
        let archive = Self {
            source: Some(source),
            hash: OnceLock::new(),
        };
        archive.ensure_hash_with(ctx)?;
        Ok(archive)
    }

    pub fn source(&self) -> Option<&ArchiveSource> {
        self.source.as_ref()
    }

    pub fn assets(&self) -> Option<&BTreeMap<String, ArchiveMember>> {
        match &self.source {
            Some(ArchiveSource::Assets(assets)) => Some(assets),
            _ => None,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.source {
            Some(ArchiveSource::Path(path)) => Some(path),
            _ => None,
        }
    }

    pub fn uri(&self) -> Option<&str> {
        match &self.source {
            Some(ArchiveSource::Uri(uri)) => Some(uri),
            _ => None,
        }
    }

    pub fn is_assets(&self) -> bool {
        self.assets().is_some()
    }

    pub fn is_path(&self) -> bool {
        self.path().is_some()
    }

    pub fn is_uri(&self) -> bool {
        self.uri().is_some()
    }

    pub fn has_contents(&self) -> bool {
        self.source.is_some()
    }

    pub fn hash(&self) -> Option<&str> {
        self.hash.get().map(String::as_str)
    }

    /// Open a member reader, resolving paths against the process working directory.
    pub fn open(&self) -> AssetResult<Box<dyn ArchiveReader>> {
        self.open_with(&ContentContext::current_dir()?)
    }

    /// Open a member reader through `ctx`.
    ///
    /// A path without a recognized archive suffix must be a directory. A URI
    /// must name an archive file.
    pub fn open_with(&self, ctx: &ContentContext) -> AssetResult<Box<dyn ArchiveReader>> {
        match &self.source {
            Some(ArchiveSource::Assets(assets)) => Ok(Box::new(AssetsReader::new(assets, ctx))),
            Some(ArchiveSource::Path(path)) => {
                let path = ctx.resolve(path);
                if let Some(format) = ArchiveFormat::detect_path(&path) {
                    return open_file(&path, format);
                }
                let meta = fs::metadata(&path).map_err(|e| AssetError::file(&path, e))?;
                if !meta.is_dir() {
                    return Err(AssetError::NotArchiveOrDirectory(path));
                }
                Ok(Box::new(DirectoryReader::open(&path, ctx.config())?))
            }
            Some(ArchiveSource::Uri(uri)) => {
                let url = parse_uri(uri)?;
                let format = ArchiveFormat::detect(url.path())
                    .ok_or_else(|| AssetError::NotArchiveUri(uri.clone()))?;
                open_stream(ctx.fetch(&url)?, format)
            }
            None => Err(AssetError::NoContents("archive")),
        }
    }

    /// The raw archive stream when the source already is an archive file of
    /// a recognized format. Directories and assets archives yield `None`.
    pub fn read_source_archive(
        &self,
        ctx: &ContentContext,
    ) -> AssetResult<Option<(ArchiveFormat, Blob)>> {
        match &self.source {
            Some(ArchiveSource::Path(path)) => {
                let path = ctx.resolve(path);
                match ArchiveFormat::detect_path(&path) {
                    Some(format) => {
                        let file = File::open(&path).map_err(|e| AssetError::file(&path, e))?;
                        let blob = Blob::from_file(file).map_err(|e| AssetError::file(&path, e))?;
                        Ok(Some((format, blob)))
                    }
                    None => Ok(None),
                }
            }
            Some(ArchiveSource::Uri(uri)) => {
                let Ok(url) = parse_uri(uri) else {
                    return Ok(None);
                };
                match ArchiveFormat::detect(url.path()) {
                    Some(format) => Ok(Some((format, ctx.fetch(&url)?))),
                    None => Ok(None),
                }
            }
            _ => Ok(None),
        }
    }

    /// Write the archive as a single stream in `format`, resolving paths
    /// against the process working directory.
    pub fn write_archive<W: Write>(&self, format: ArchiveFormat, out: W) -> AssetResult<()> {
        self.write_archive_with(format, out, &ContentContext::current_dir()?)
    }

    /// Write the archive as a single stream in `format`.
    ///
    /// A source file already in `format` is copied byte for byte. Anything
    /// else is flattened member by member.
    pub fn write_archive_with<W: Write>(
        &self,
        format: ArchiveFormat,
        mut out: W,
        ctx: &ContentContext,
    ) -> AssetResult<()> {
        if let Some((source_format, mut blob)) = self.read_source_archive(ctx)? {
            if source_format == format {
                io::copy(&mut blob, &mut out)?;
                return Ok(());
            }
        }
        let mut reader = self.open_with(ctx)?;
        write_members(reader.as_mut(), format, out, ctx.config())?;
        Ok(())
    }

    /// The whole archive in memory.
    pub fn bytes(&self, format: ArchiveFormat) -> AssetResult<Vec<u8>> {
        self.bytes_with(format, &ContentContext::current_dir()?)
    }

    pub fn bytes_with(&self, format: ArchiveFormat, ctx: &ContentContext) -> AssetResult<Vec<u8>> {
        let mut data = Vec::new();
        self.write_archive_with(format, &mut data, ctx)?;
        Ok(data)
    }

    pub fn ensure_hash(&self) -> AssetResult<&str> {
        if let Some(hash) = self.hash.get() {
            return Ok(hash);
        }
        self.ensure_hash_with(&ContentContext::current_dir()?)
    }

    /// Compute and cache the hash if it is not known yet.
    ///
    /// An archive file is hashed as its raw bytes. Everything else is hashed
    /// as the uncompressed tar stream of its flattened members.
    pub fn ensure_hash_with(&self, ctx: &ContentContext) -> AssetResult<&str> {
        if let Some(hash) = self.hash.get() {
            return Ok(hash);
        }
        let mut hasher = ContentHasher::new();
        if let Some((format, mut blob)) = self.read_source_archive(ctx)? {
            io::copy(&mut blob, &mut hasher)?;
            debug!(%format, bytes = hasher.bytes_written(), "hashed source archive");
        } else {
            let mut reader = self.open_with(ctx)?;
            let members = write_members(reader.as_mut(), ArchiveFormat::Tar, &mut hasher, ctx.config())?;
            debug!(members, bytes = hasher.bytes_written(), "hashed flattened archive");
        }
        let digest = hasher.finish_hex();
        Ok(self.hash.get_or_init(|| digest))
    }

    /// Content equality by hash. An archive that cannot be hashed equals nothing.
    pub fn equals(&self, other: &Archive) -> bool {
        match (self.ensure_hash(), other.ensure_hash()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }

    /// Encode as a signature-tagged weak map. Members are encoded recursively.
    pub fn serialize(&self) -> Map<String, JsonValue> {
        let mut map = Signature::Archive.new_map();
        if let Some(hash) = self.hash() {
            map.insert(ARCHIVE_HASH_KEY.into(), JsonValue::String(hash.to_string()));
        }
        match &self.source {
            Some(ArchiveSource::Assets(assets)) => {
                let members = assets
                    .iter()
                    .map(|(name, member)| {
                        let encoded = match member {
                            ArchiveMember::Asset(asset) => asset.serialize(),
                            ArchiveMember::Archive(archive) => archive.serialize(),
                        };
                        (name.clone(), JsonValue::Object(encoded))
                    })
                    .collect();
                map.insert(ARCHIVE_ASSETS_KEY.into(), JsonValue::Object(members));
            }
            Some(ArchiveSource::Path(path)) => {
                map.insert(
                    ARCHIVE_PATH_KEY.into(),
                    JsonValue::String(path.to_string_lossy().into_owned()),
                );
            }
            Some(ArchiveSource::Uri(uri)) => {
                map.insert(ARCHIVE_URI_KEY.into(), JsonValue::String(uri.clone()));
            }
            None => {}
        }
        map
    }

    /// Decode a weak map. Returns `Ok(None)` when the map is not tagged as an archive.
    ///
    /// A non-empty path takes precedence over a non-empty URI, which takes
    /// precedence over an assets map. With none of them the result is an
    /// empty assets archive, or a placeholder when the map carries the hash
    /// of a non-empty archive.
    pub fn deserialize(map: &Map<String, JsonValue>) -> AssetResult<Option<Self>> {
        if !Signature::Archive.tags(map) {
            return Ok(None);
        }
        let hash = string_field(map, ARCHIVE_HASH_KEY)?;
        let path = string_field(map, ARCHIVE_PATH_KEY)?;
        let uri = string_field(map, ARCHIVE_URI_KEY)?;

        let source = if !path.is_empty() {
            Some(ArchiveSource::Path(PathBuf::from(path)))
        } else if !uri.is_empty() {
            Some(ArchiveSource::Uri(uri.to_string()))
        } else {
            match map.get(ARCHIVE_ASSETS_KEY) {
                Some(JsonValue::Object(members)) => {
                    Some(ArchiveSource::Assets(deserialize_members(members)?))
                }
                None | Some(JsonValue::Null) => {
                    if hash.is_empty() || hash == EMPTY_ARCHIVE_DIGEST {
                        Some(ArchiveSource::Assets(BTreeMap::new()))
                    } else {
                        None
                    }
                }
                Some(other) => {
                    return Err(AssetError::malformed(
                        "archive",
                        format!("'assets' must be a map, found {other}"),
                    ))
                }
            }
        };

        let hash = if hash.is_empty() {
            OnceLock::new()
        } else {
            OnceLock::from(hash.to_string())
        };
        Ok(Some(Self { source, hash }))
    }
}

impl PartialEq for Archive {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.hash() == other.hash()
    }
}

fn deserialize_members(
    members: &Map<String, JsonValue>,
) -> AssetResult<BTreeMap<String, ArchiveMember>> {
    let mut assets = BTreeMap::new();
    for (name, value) in members {
        let not_member = || {
            AssetError::malformed(
                "archive",
                format!("archive member '{name}' is not an asset or archive"),
            )
        };
        let JsonValue::Object(obj) = value else {
            return Err(not_member());
        };
        let member = if let Some(asset) = Asset::deserialize(obj)? {
            ArchiveMember::Asset(asset)
        } else if let Some(archive) = Archive::deserialize(obj)? {
            ArchiveMember::Archive(archive)
        } else {
            return Err(not_member());
        };
        assets.insert(name.clone(), member);
    }
    Ok(assets)
}

fn string_field<'a>(map: &'a Map<String, JsonValue>, key: &str) -> AssetResult<&'a str> {
    match map.get(key) {
        None | Some(JsonValue::Null) => Ok(""),
        Some(JsonValue::String(s)) => Ok(s),
        Some(other) => Err(AssetError::malformed(
            "archive",
            format!("'{key}' must be a string, found {other}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    use rstate_types::EMPTY_DIGEST;

    use crate::reader::collect_members;

    const FOO_TEXT_ARCHIVE: &str =
        "27ab4a14a617df10cff3e1cf4e30cf510302afe56bf4cc91f84041c9f7b62fd8";
    const FOO_EMPTY_ARCHIVE: &str =
        "d2587a875f82cdf3d3e6cfe9f8c6e6032be5dde8c344466e664e628da15757b0";

    fn ctx(dir: &Path) -> ContentContext {
        ContentContext::new(dir)
    }

    fn members(entries: Vec<(&str, ArchiveMember)>) -> BTreeMap<String, ArchiveMember> {
        entries
            .into_iter()
            .map(|(name, member)| (name.to_string(), member))
            .collect()
    }

    fn tar_file(path: &Path, entries: &[(&str, &[u8])]) {
        let mut builder = tar::Builder::new(File::create(path).unwrap());
        for (name, data) in entries {
            let mut header = tar::Header::new_ustar();
            header.set_size(data.len() as u64);
            header.set_mode(0o600);
            builder.append_data(&mut header, name, *data).unwrap();
        }
        builder.finish().unwrap();
    }

    fn zip_names(data: Vec<u8>) -> Vec<String> {
        let mut archive = zip::ZipArchive::new(Cursor::new(data)).unwrap();
        (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect()
    }

    #[test]
    fn assets_archive_matches_recorded_digest() {
        let arch = Archive::from_assets(members(vec![(
            "foo",
            Asset::from_text("a test asset").into(),
        )]))
        .unwrap();
        assert_eq!(arch.hash(), Some(FOO_TEXT_ARCHIVE));

        let back = Archive::deserialize(&arch.serialize()).unwrap().unwrap();
        let assets = back.assets().unwrap();
        assert_eq!(assets.len(), 1);
        match &assets["foo"] {
            ArchiveMember::Asset(asset) => assert_eq!(asset.text(), Some("a test asset")),
            other => panic!("expected asset member, got {:?}", other),
        }
        assert_eq!(back.hash(), Some(FOO_TEXT_ARCHIVE));
    }

    #[cfg(unix)]
    #[test]
    fn dev_null_members_match_recorded_digest() {
        let by_path = Archive::from_assets(members(vec![(
            "foo",
            Asset::from_path("/dev/null").unwrap().into(),
        )]))
        .unwrap();
        assert_eq!(by_path.hash(), Some(FOO_EMPTY_ARCHIVE));

        let by_uri = Archive::from_assets(members(vec![(
            "foo",
            Asset::from_uri("file:///dev/null").unwrap().into(),
        )]))
        .unwrap();
        assert_eq!(by_uri.hash(), Some(FOO_EMPTY_ARCHIVE));

        let back = Archive::deserialize(&by_uri.serialize()).unwrap().unwrap();
        match &back.assets().unwrap()["foo"] {
            ArchiveMember::Asset(asset) => assert_eq!(asset.uri(), Some("file:///dev/null")),
            other => panic!("expected asset member, got {:?}", other),
        }
    }

    #[test]
    fn empty_assets_archive() {
        let arch = Archive::from_assets(BTreeMap::new()).unwrap();
        assert_eq!(arch.hash(), Some(EMPTY_ARCHIVE_DIGEST));
    }

    #[test]
    fn empty_tar_file_hashes_raw_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.tar");
        File::create(&path).unwrap();

        let arch = Archive::from_path_with(&path, &ctx(dir.path())).unwrap();
        assert_eq!(arch.hash(), Some(EMPTY_DIGEST));
        let back = Archive::deserialize(&arch.serialize()).unwrap().unwrap();
        assert_eq!(back.path(), Some(path.as_path()));
        assert_eq!(back.hash(), Some(EMPTY_DIGEST));

        let uri = format!("file://{}", path.display());
        let by_uri = Archive::from_uri_with(uri.as_str(), &ctx(dir.path())).unwrap();
        assert_eq!(by_uri.hash(), Some(EMPTY_DIGEST));
        assert!(arch.equals(&by_uri));
        let back = Archive::deserialize(&by_uri.serialize()).unwrap().unwrap();
        assert_eq!(back.uri(), Some(uri.as_str()));
    }

    #[test]
    fn truncated_archive_keeps_cached_hash() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("filled.tar");
        tar_file(&path, &[("file", b"")]);
        let uri = format!("file://{}", path.display());

        let by_path = Archive::from_path_with(&path, &ctx(dir.path())).unwrap();
        let by_uri = Archive::from_uri_with(uri.as_str(), &ctx(dir.path())).unwrap();
        let cached = by_path.hash().map(str::to_string);

        File::create(&path).unwrap();
        let truncated_path = Archive::from_path_with(&path, &ctx(dir.path())).unwrap();
        let truncated_uri = Archive::from_uri_with(uri.as_str(), &ctx(dir.path())).unwrap();
        assert!(!by_path.equals(&truncated_path));
        assert!(!by_uri.equals(&truncated_uri));
        assert_eq!(by_path.hash().map(str::to_string), cached);
    }

    #[test]
    fn plain_file_is_not_an_archive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes");
        fs::write(&path, "foo\n").unwrap();
        match Archive::from_path_with(&path, &ctx(dir.path())) {
            Err(AssetError::NotArchiveOrDirectory(p)) => assert_eq!(p, path),
            other => panic!("expected NotArchiveOrDirectory, got {:?}", other),
        }
    }

    #[test]
    fn uri_without_archive_suffix_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.txt");
        fs::write(&path, "foo").unwrap();
        let uri = format!("file://{}", path.display());
        assert!(matches!(
            Archive::from_uri_with(uri, &ctx(dir.path())),
            Err(AssetError::NotArchiveUri(_))
        ));
    }

    #[test]
    fn directory_archive_reads_sorted_members() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("site");
        fs::create_dir_all(root.join("sub_dir")).unwrap();
        fs::write(root.join("Lorem_ipsum.txt"), "lorem").unwrap();
        fs::write(root.join("sub_dir/But_I_must"), "but").unwrap();
        fs::write(root.join("sub_dir/On_the_other_hand.md"), "other").unwrap();

        let arch = Archive::from_path_with("site", &ctx(dir.path())).unwrap();
        let mut reader = arch.open_with(&ctx(dir.path())).unwrap();
        let members = collect_members(reader.as_mut()).unwrap();
        assert_eq!(
            members,
            vec![
                ("Lorem_ipsum.txt".to_string(), b"lorem".to_vec()),
                ("sub_dir/But_I_must".to_string(), b"but".to_vec()),
                ("sub_dir/On_the_other_hand.md".to_string(), b"other".to_vec()),
            ]
        );

        // Re-packing as tar and reading it back gives the same hash.
        let tar_path = dir.path().join("site.tar");
        fs::write(&tar_path, arch.bytes_with(ArchiveFormat::Tar, &ctx(dir.path())).unwrap())
            .unwrap();
        let from_tar = Archive::from_path_with(&tar_path, &ctx(dir.path())).unwrap();
        assert!(from_tar.equals(&arch));
        let mut reader = from_tar.open_with(&ctx(dir.path())).unwrap();
        assert_eq!(collect_members(reader.as_mut()).unwrap(), members);
    }

    #[test]
    fn conversions_between_formats_preserve_members() {
        let dir = tempfile::tempdir().unwrap();
        let arch = Archive::from_assets_with(
            members(vec![
                ("a.txt", Asset::from_text("alpha").into()),
                ("b/c.txt", Asset::from_text("gamma").into()),
            ]),
            &ctx(dir.path()),
        )
        .unwrap();

        for format in [ArchiveFormat::TarGzip, ArchiveFormat::Zip, ArchiveFormat::Jar] {
            let file = dir.path().join(format!("out{}", format.extension()));
            fs::write(&file, arch.bytes_with(format, &ctx(dir.path())).unwrap()).unwrap();
            let reopened = Archive::from_path_with(&file, &ctx(dir.path())).unwrap();
            let mut reader = reopened.open_with(&ctx(dir.path())).unwrap();
            assert_eq!(
                collect_members(reader.as_mut()).unwrap(),
                vec![
                    ("a.txt".to_string(), b"alpha".to_vec()),
                    ("b/c.txt".to_string(), b"gamma".to_vec()),
                ],
                "format {format}"
            );
        }
    }

    #[test]
    fn same_format_output_copies_source_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orig.tar");
        tar_file(&path, &[("x", b"data")]);
        let arch = Archive::from_path_with(&path, &ctx(dir.path())).unwrap();
        let out = arch.bytes_with(ArchiveFormat::Tar, &ctx(dir.path())).unwrap();
        assert_eq!(out, fs::read(&path).unwrap());
    }

    #[test]
    fn nested_archive_flattens_under_its_key() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path();
        fs::create_dir_all(base.join("foo/bar")).unwrap();
        fs::write(base.join("foo/a.txt"), "a").unwrap();
        fs::write(base.join("foo/bar/b.txt"), "b").unwrap();
        fs::write(base.join("c.txt"), "c").unwrap();

        let inner = Archive::from_path_with(base.join("./foo"), &ctx(base)).unwrap();
        let arch = Archive::from_assets_with(
            members(vec![
                ("./foo", inner.into()),
                ("fake.txt", Asset::from_text("hello world").into()),
            ]),
            &ctx(base),
        )
        .unwrap();

        let data = arch.bytes_with(ArchiveFormat::Zip, &ctx(base)).unwrap();
        assert_eq!(
            zip_names(data),
            vec!["foo/a.txt", "foo/bar/b.txt", "fake.txt"]
        );
    }

    #[test]
    fn file_reached_through_two_keys_is_packed_once() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path();
        fs::create_dir_all(base.join("foo/bar")).unwrap();
        fs::write(base.join("foo/bar/b.txt"), "b").unwrap();

        let outer = Archive::from_path_with(base.join("./foo"), &ctx(base)).unwrap();
        let inner = Archive::from_path_with(base.join("./foo/bar"), &ctx(base)).unwrap();
        let arch = Archive::from_assets_with(
            members(vec![("./foo", outer.into()), ("./foo/bar", inner.into())]),
            &ctx(base),
        )
        .unwrap();

        let data = arch.bytes_with(ArchiveFormat::Zip, &ctx(base)).unwrap();
        assert_eq!(zip_names(data), vec!["foo/bar/b.txt"]);
    }

    #[test]
    fn member_errors_name_the_member() {
        let dir = tempfile::tempdir().unwrap();
        let broken = Asset::placeholder("00");
        let result = Archive::from_assets_with(
            members(vec![("ghost", broken.into())]),
            &ctx(dir.path()),
        );
        match result {
            Err(AssetError::Member { name, source }) => {
                assert_eq!(name, "ghost");
                assert!(matches!(*source, AssetError::NoContents("asset")));
            }
            other => panic!("expected Member error, got {:?}", other),
        }
    }

    #[test]
    fn hash_depends_on_member_names_and_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let build = |name: &str, text: &str| {
            Archive::from_assets_with(
                members(vec![(name, Asset::from_text(text).into())]),
                &ctx(dir.path()),
            )
            .unwrap()
        };
        let base = build("a", "x");
        assert!(base.equals(&build("a", "x")));
        assert!(!base.equals(&build("b", "x")));
        assert!(!base.equals(&build("a", "y")));
    }

    #[test]
    fn deserialize_precedence_and_defaults() {
        let mut map = Signature::Archive.new_map();
        map.insert("path".into(), "dir".into());
        map.insert("uri".into(), "file:///x.tar".into());
        assert_eq!(
            Archive::deserialize(&map).unwrap().unwrap().path(),
            Some(Path::new("dir"))
        );

        map.insert("path".into(), "".into());
        assert_eq!(
            Archive::deserialize(&map).unwrap().unwrap().uri(),
            Some("file:///x.tar")
        );

        let empty = Archive::deserialize(&Signature::Archive.new_map())
            .unwrap()
            .unwrap();
        assert_eq!(empty.assets().map(BTreeMap::len), Some(0));
    }

    #[test]
    fn hash_only_archive_is_placeholder() {
        let mut map = Signature::Archive.new_map();
        map.insert("hash".into(), FOO_TEXT_ARCHIVE.into());
        let arch = Archive::deserialize(&map).unwrap().unwrap();
        assert!(!arch.has_contents());
        assert!(matches!(arch.open(), Err(AssetError::NoContents("archive"))));

        let mut empty = Signature::Archive.new_map();
        empty.insert("hash".into(), EMPTY_ARCHIVE_DIGEST.into());
        assert!(Archive::deserialize(&empty).unwrap().unwrap().is_assets());
    }

    #[test]
    fn malformed_archive_maps() {
        let mut bad_hash = Signature::Archive.new_map();
        bad_hash.insert("hash".into(), JsonValue::from(1));
        assert!(Archive::deserialize(&bad_hash).is_err());

        let mut bad_member = Signature::Archive.new_map();
        let mut assets = Map::new();
        assets.insert("plain".into(), JsonValue::from("text"));
        bad_member.insert("assets".into(), JsonValue::Object(assets));
        match Archive::deserialize(&bad_member) {
            Err(AssetError::Malformed { reason, .. }) => assert!(reason.contains("'plain'")),
            other => panic!("expected Malformed, got {:?}", other),
        }
    }

    #[test]
    fn nested_serialization_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let inner = Archive::from_assets_with(
            members(vec![("x", Asset::from_text("x").into())]),
            &ctx(dir.path()),
        )
        .unwrap();
        let outer = Archive::from_assets_with(
            members(vec![
                ("inner", inner.into()),
                ("y", Asset::from_text("y").into()),
            ]),
            &ctx(dir.path()),
        )
        .unwrap();
        let back = Archive::deserialize(&outer.serialize()).unwrap().unwrap();
        assert_eq!(back, outer);
    }
}
