//! Sequential member readers for every archive source.
//!
//! Each reader yields `(name, blob)` pairs with forward-slash member names.
//! Directory archives are walked in sorted order, container formats are read
//! in container order, and duplicate member names inside a container are
//! rejected.

use std::collections::{BTreeMap, HashSet};
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{self, BufReader, Cursor, Read, Seek};
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;
use tracing::debug;
use walkdir::WalkDir;

use crate::archive::ArchiveMember;
use crate::blob::{capacity_hint, Blob};
use crate::config::ArchiveConfig;
use crate::context::ContentContext;
use crate::error::{AssetError, AssetResult};
use crate::format::ArchiveFormat;
use crate::names::{clean_path, join_member, relative_member_name};

/// A stream of named blobs making up an archive.
///
/// A blob returned by [`next_member`](Self::next_member) should be consumed
/// before the following call. A reader instance is not meant to be shared.
pub trait ArchiveReader: Send {
    /// The next member, or `None` once the archive is exhausted.
    fn next_member(&mut self) -> AssetResult<Option<(String, Blob)>>;
}

/// Drain a reader into memory, in member order.
pub fn collect_members(reader: &mut dyn ArchiveReader) -> AssetResult<Vec<(String, Vec<u8>)>> {
    let mut members = Vec::new();
    while let Some((name, blob)) = reader.next_member()? {
        members.push((name, blob.into_vec()?));
    }
    Ok(members)
}

/// Reader over an in-memory map of assets and nested archives.
///
/// Keys are visited in sorted order. Nested archives are flattened with
/// their members re-prefixed by the key they are stored under.
pub(crate) struct AssetsReader {
    entries: std::vec::IntoIter<(String, ArchiveMember)>,
    current: Option<(String, Box<dyn ArchiveReader>)>,
    ctx: ContentContext,
}

impl AssetsReader {
    pub(crate) fn new(assets: &BTreeMap<String, ArchiveMember>, ctx: &ContentContext) -> Self {
        let entries: Vec<_> = assets
            .iter()
            .map(|(name, member)| (name.clone(), member.clone()))
            .collect();
        Self {
            entries: entries.into_iter(),
            current: None,
            ctx: ctx.clone(),
        }
    }
}

impl ArchiveReader for AssetsReader {
    fn next_member(&mut self) -> AssetResult<Option<(String, Blob)>> {
        loop {
            if let Some((root, sub)) = self.current.as_mut() {
                match sub.next_member()? {
                    Some((name, blob)) => return Ok(Some((join_member(root, &name), blob))),
                    None => self.current = None,
                }
            }

            let Some((name, member)) = self.entries.next() else {
                return Ok(None);
            };
            match member {
                ArchiveMember::Asset(asset) => {
                    let blob = asset
                        .read_with(&self.ctx)
                        .map_err(|e| AssetError::member(&name, e))?;
                    return Ok(Some((name, blob)));
                }
                ArchiveMember::Archive(archive) => {
                    let sub = archive
                        .open_with(&self.ctx)
                        .map_err(|e| AssetError::member(&name, e))?;
                    self.current = Some((name, sub));
                }
            }
        }
    }
}

/// Reader over a directory tree on the host filesystem.
pub(crate) struct DirectoryReader {
    root: PathBuf,
    paths: std::vec::IntoIter<PathBuf>,
}

impl DirectoryReader {
    /// Walk `root` up front; files are opened lazily as members are requested.
    ///
    /// Directories themselves are not members. The bookkeeping directory is
    /// pruned below the root, and symlinks that resolve to directories are
    /// skipped rather than followed.
    pub(crate) fn open(root: &Path, config: &ArchiveConfig) -> AssetResult<Self> {
        let bookkeeping = OsStr::new(&config.bookkeeping_dir);
        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                let keep = entry.depth() == 0 || entry.file_name() != bookkeeping;
                if !keep {
                    debug!(path = %entry.path().display(), "skipping bookkeeping entry");
                }
                keep
            });

        let mut paths = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|e| walk_error(root, e))?;
            let file_type = entry.file_type();
            if file_type.is_dir() {
                continue;
            }
            if file_type.is_symlink() {
                let target =
                    fs::metadata(entry.path()).map_err(|e| AssetError::file(entry.path(), e))?;
                if target.is_dir() {
                    debug!(path = %entry.path().display(), "skipping symlink to directory");
                    continue;
                }
            }
            paths.push(entry.into_path());
        }

        debug!(root = %root.display(), files = paths.len(), "expanded directory archive");
        Ok(Self {
            root: root.to_path_buf(),
            paths: paths.into_iter(),
        })
    }
}

impl ArchiveReader for DirectoryReader {
    fn next_member(&mut self) -> AssetResult<Option<(String, Blob)>> {
        let Some(path) = self.paths.next() else {
            return Ok(None);
        };
        let name = relative_member_name(&self.root, &path).ok_or_else(|| {
            AssetError::malformed(
                "directory archive",
                format!("'{}' is outside '{}'", path.display(), self.root.display()),
            )
        })?;
        let file = File::open(&path).map_err(|e| AssetError::file(&path, e))?;
        let blob = Blob::from_file(file).map_err(|e| AssetError::file(&path, e))?;
        Ok(Some((name, blob)))
    }
}

fn walk_error(root: &Path, err: walkdir::Error) -> AssetError {
    let path = err
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.to_path_buf());
    AssetError::file(path, io::Error::from(err))
}

/// Reader over a tar stream, optionally gzip-compressed.
///
/// Tar entries borrow the underlying stream, so members are buffered when
/// the reader is opened.
pub(crate) struct TarReader {
    members: std::vec::IntoIter<(String, Vec<u8>)>,
}

impl TarReader {
    pub(crate) fn new<R: Read>(source: R) -> AssetResult<Self> {
        Self::collect(source, "tar")
    }

    pub(crate) fn gzip<R: Read>(source: R) -> AssetResult<Self> {
        Self::collect(MultiGzDecoder::new(source), "tar.gz")
    }

    fn collect<R: Read>(source: R, format: &'static str) -> AssetResult<Self> {
        let corrupt = move |e: io::Error| AssetError::CorruptArchive {
            format,
            reason: e.to_string(),
        };

        let mut archive = tar::Archive::new(source);
        let mut seen = HashSet::new();
        let mut members = Vec::new();
        for entry in archive.entries().map_err(corrupt)? {
            let mut entry = entry.map_err(corrupt)?;
            let kind = entry.header().entry_type();
            if kind.is_dir() || kind.is_pax_global_extensions() {
                continue;
            }
            let raw = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
            if !(kind.is_file() || kind.is_contiguous()) {
                return Err(AssetError::CorruptArchive {
                    format,
                    reason: format!("unsupported entry type {:?} for '{raw}'", kind),
                });
            }

            let name = clean_path(&raw);
            if !seen.insert(name.clone()) {
                return Err(AssetError::DuplicateMember(name));
            }
            let declared = entry.size();
            let mut data = Vec::with_capacity(capacity_hint(declared));
            entry.read_to_end(&mut data).map_err(corrupt)?;
            if data.len() as u64 != declared {
                return Err(truncated(format, &name, declared, data.len()));
            }
            members.push((name, data));
        }

        Ok(Self {
            members: members.into_iter(),
        })
    }
}

impl ArchiveReader for TarReader {
    fn next_member(&mut self) -> AssetResult<Option<(String, Blob)>> {
        Ok(self
            .members
            .next()
            .map(|(name, data)| (name, Blob::from_bytes(data))))
    }
}

/// Reader over a ZIP (or JAR) container. Members are inflated one at a time.
pub(crate) struct ZipReader<R: Read + Seek> {
    archive: zip::ZipArchive<R>,
    index: usize,
    seen: HashSet<String>,
}

impl<R: Read + Seek> ZipReader<R> {
    pub(crate) fn new(source: R) -> AssetResult<Self> {
        let archive = zip::ZipArchive::new(source).map_err(zip_corrupt)?;
        Ok(Self {
            archive,
            index: 0,
            seen: HashSet::new(),
        })
    }
}

impl<R: Read + Seek + Send> ArchiveReader for ZipReader<R> {
    fn next_member(&mut self) -> AssetResult<Option<(String, Blob)>> {
        while self.index < self.archive.len() {
            let index = self.index;
            self.index += 1;

            let mut file = self.archive.by_index(index).map_err(zip_corrupt)?;
            if file.is_dir() {
                continue;
            }
            let name = clean_path(file.name());
            if !self.seen.insert(name.clone()) {
                return Err(AssetError::DuplicateMember(name));
            }
            let declared = file.size();
            let mut data = Vec::with_capacity(capacity_hint(declared));
            file.read_to_end(&mut data)
                .map_err(|e| AssetError::member(&name, AssetError::Io(e)))?;
            if data.len() as u64 != declared {
                return Err(truncated("zip", &name, declared, data.len()));
            }
            return Ok(Some((name, Blob::from_bytes(data))));
        }
        Ok(None)
    }
}

fn truncated(format: &'static str, name: &str, declared: u64, actual: usize) -> AssetError {
    AssetError::CorruptArchive {
        format,
        reason: format!("member '{name}' declares {declared} bytes but holds {actual}"),
    }
}

fn zip_corrupt(err: zip::result::ZipError) -> AssetError {
    AssetError::CorruptArchive {
        format: "zip",
        reason: err.to_string(),
    }
}

/// Open an archive file on disk with the reader for its format.
pub(crate) fn open_file(path: &Path, format: ArchiveFormat) -> AssetResult<Box<dyn ArchiveReader>> {
    let file = File::open(path).map_err(|e| AssetError::file(path, e))?;
    let reader: Box<dyn ArchiveReader> = match format {
        ArchiveFormat::Tar => Box::new(TarReader::new(BufReader::new(file))?),
        ArchiveFormat::TarGzip => Box::new(TarReader::gzip(BufReader::new(file))?),
        ArchiveFormat::Zip | ArchiveFormat::Jar => Box::new(ZipReader::new(file)?),
    };
    Ok(reader)
}

/// Open a fetched archive stream. ZIP needs random access, so the stream is
/// buffered in memory first.
pub(crate) fn open_stream(source: Blob, format: ArchiveFormat) -> AssetResult<Box<dyn ArchiveReader>> {
    let reader: Box<dyn ArchiveReader> = match format {
        ArchiveFormat::Tar => Box::new(TarReader::new(source)?),
        ArchiveFormat::TarGzip => Box::new(TarReader::gzip(source)?),
        ArchiveFormat::Zip | ArchiveFormat::Jar => {
            Box::new(ZipReader::new(Cursor::new(source.into_vec()?))?)
        }
    };
    Ok(reader)
}
