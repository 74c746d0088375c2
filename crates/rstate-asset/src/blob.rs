use std::fmt;
use std::fs::File;
use std::io::{self, Read};

use bytes::{Buf, Bytes};

/// Upper bound on buffer preallocation from a declared size.
const PREALLOC_LIMIT: usize = 1 << 20;

/// Initial buffer capacity for content declared to be `size` bytes long.
///
/// Declared sizes come from container headers and callers, so they only
/// ever serve as a bounded hint.
pub(crate) fn capacity_hint(size: u64) -> usize {
    usize::try_from(size).map_or(PREALLOC_LIMIT, |n| n.min(PREALLOC_LIMIT))
}

/// A sized, readable stream of content.
///
/// Blobs are what archive readers hand out for each member. The declared
/// [`size`](Blob::size) is what writers put in member headers, so a blob
/// whose stream yields a different number of bytes is reported as an error
/// when packed.
pub struct Blob {
    reader: Box<dyn Read + Send>,
    size: u64,
}

impl Blob {
    /// A blob over in-memory bytes.
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        let size = data.len() as u64;
        Self {
            reader: Box::new(data.reader()),
            size,
        }
    }

    /// A blob over an open file, sized by its metadata.
    pub fn from_file(file: File) -> io::Result<Self> {
        let size = file.metadata()?.len();
        Ok(Self {
            reader: Box::new(file),
            size,
        })
    }

    /// A blob over an arbitrary reader with a known size.
    pub fn from_reader(reader: impl Read + Send + 'static, size: u64) -> Self {
        Self {
            reader: Box::new(reader),
            size,
        }
    }

    /// Declared size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Read the remaining content into memory.
    pub fn into_vec(mut self) -> io::Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(capacity_hint(self.size));
        self.reader.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

impl Read for Blob {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

impl fmt::Debug for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blob").field("size", &self.size).finish()
    }
}
