use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Container and compression format of an archive file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveFormat {
    /// A POSIX tar archive.
    Tar,
    /// A tar archive compressed with gzip.
    TarGzip,
    /// A multi-file ZIP archive.
    Zip,
    /// A Java JAR file (ZIP layout).
    Jar,
}

/// Recognized suffixes, longest first so compound suffixes win.
const ARCHIVE_EXTS: [(&str, ArchiveFormat); 5] = [
    (".tar.gz", ArchiveFormat::TarGzip),
    (".tar", ArchiveFormat::Tar),
    (".tgz", ArchiveFormat::TarGzip),
    (".zip", ArchiveFormat::Zip),
    (".jar", ArchiveFormat::Jar),
];

impl ArchiveFormat {
    /// Infer the format from a file name or URL path.
    ///
    /// Matching is on the whole suffix, so `my.file.tar.gz` is a gzipped tar
    /// and `notes.tar.txt` is not an archive. Returns `None` for anything
    /// that is not a recognized archive.
    pub fn detect(name: &str) -> Option<Self> {
        ARCHIVE_EXTS
            .iter()
            .find(|(ext, _)| name.ends_with(ext))
            .map(|(_, format)| *format)
    }

    /// [`detect`](Self::detect) for a filesystem path.
    pub fn detect_path(path: &Path) -> Option<Self> {
        Self::detect(&path.to_string_lossy())
    }

    /// Canonical file extension, including the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Tar => ".tar",
            Self::TarGzip => ".tar.gz",
            Self::Zip => ".zip",
            Self::Jar => ".jar",
        }
    }

    /// Returns `true` for formats read with the ZIP reader.
    pub fn is_zip_family(self) -> bool {
        matches!(self, Self::Zip | Self::Jar)
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Tar => "tar",
            Self::TarGzip => "tar.gz",
            Self::Zip => "zip",
            Self::Jar => "jar",
        };
        write!(f, "{name}")
    }
}
