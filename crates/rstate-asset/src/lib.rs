//! Content-addressed assets and archives.
//!
//! An [`Asset`] is one blob of bytes from inline text, a file, or a URI. An
//! [`Archive`] is a bundle of named blobs from a map of nested members, a
//! directory, an archive file, or a URI. Both are identified by a SHA-256
//! hash that is computed once and cached, and both encode to signature-tagged
//! weak maps.
//!
//! # Architecture
//!
//! - **Readers** stream `(name, blob)` members out of every archive source
//! - **Writers** flatten members into tar, gzipped tar, or ZIP, keeping the
//!   first occurrence of each member path
//! - **Hashing** reads archive files as raw bytes and everything else as the
//!   flattened tar stream, so digests match those recorded by earlier writers
//!
//! # Key Types
//!
//! - [`Asset`] / [`AssetSource`] — single content blobs
//! - [`Archive`] / [`ArchiveSource`] / [`ArchiveMember`] — bundles of named blobs
//! - [`ArchiveFormat`] — tar, tar.gz, zip, jar detection by suffix
//! - [`ArchiveReader`] — sequential member access
//! - [`ContentContext`] — working directory, [`ArchiveConfig`], and [`UriFetcher`]
//! - [`Blob`] — a sized byte stream

pub mod archive;
pub mod asset;
pub mod blob;
pub mod config;
pub mod context;
pub mod error;
pub mod format;
pub mod names;
pub mod reader;
pub mod writer;

pub use archive::{Archive, ArchiveMember, ArchiveSource, EMPTY_ARCHIVE_DIGEST};
pub use asset::{Asset, AssetSource};
pub use blob::Blob;
pub use config::{ArchiveConfig, DEFAULT_BOOKKEEPING_DIR};
pub use context::{ContentContext, FileFetcher, UriFetcher};
pub use error::{AssetError, AssetResult};
pub use format::ArchiveFormat;
pub use reader::{collect_members, ArchiveReader};
pub use writer::write_members;
