use std::io;

use sha2::{Digest, Sha256};

/// Hex SHA-256 digest of zero bytes of content.
pub const EMPTY_DIGEST: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// Streaming SHA-256 content hasher.
///
/// Content hashes for assets and archives are plain SHA-256 over the
/// dereferenced bytes with no domain prefix, so digests stay identical to
/// those recorded by earlier writers. The hasher implements [`io::Write`]
/// so archive writers can stream straight into it.
#[derive(Clone, Default)]
pub struct ContentHasher {
    inner: Sha256,
    written: u64,
}

impl ContentHasher {
    /// Create an empty hasher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed more bytes into the digest.
    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
        self.written += data.len() as u64;
    }

    /// Number of bytes hashed so far.
    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    /// Consume the hasher and return the lowercase hex digest.
    pub fn finish_hex(self) -> String {
        hex::encode(self.inner.finalize())
    }

    /// One-shot hex digest of a byte slice.
    pub fn digest_hex(data: &[u8]) -> String {
        let mut hasher = Self::new();
        hasher.update(data);
        hasher.finish_hex()
    }

    /// Drain a reader into a fresh hasher and return the hex digest.
    pub fn digest_reader<R: io::Read + ?Sized>(reader: &mut R) -> io::Result<String> {
        let mut hasher = Self::new();
        io::copy(reader, &mut hasher)?;
        Ok(hasher.finish_hex())
    }

    /// Verify that data hashes to the expected hex digest.
    pub fn verify(data: &[u8], expected: &str) -> bool {
        Self::digest_hex(data).eq_ignore_ascii_case(expected)
    }
}

impl io::Write for ContentHasher {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
