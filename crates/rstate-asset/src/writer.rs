//! Flattening archive readers into tar, gzipped tar, and ZIP streams.
//!
//! Tar headers are written by hand so that the produced bytes, and with
//! them the archive hashes recorded by earlier writers, stay stable.

use std::collections::HashSet;
use std::io::{self, Cursor, Read, Write};

use chrono::{Datelike, NaiveDateTime, Timelike};
use flate2::write::GzEncoder;
use flate2::Compression;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::blob::Blob;
use crate::config::ArchiveConfig;
use crate::error::{AssetError, AssetResult};
use crate::format::ArchiveFormat;
use crate::reader::ArchiveReader;

const BLOCK_SIZE: usize = 512;
const NAME_SIZE: usize = 100;
const PREFIX_SIZE: usize = 155;
/// Largest size representable in the 12-byte octal size field.
const MAX_OCTAL_SIZE: u64 = (1 << 33) - 1;

/// Pack every member of `reader` into `out` using `format`.
///
/// Members whose final name was already written are dropped, so the first
/// occurrence in reader order wins. Returns the number of members written.
pub fn write_members<W: Write>(
    reader: &mut dyn ArchiveReader,
    format: ArchiveFormat,
    out: W,
    config: &ArchiveConfig,
) -> AssetResult<usize> {
    match format {
        ArchiveFormat::Tar => {
            let mut sink = TarSink::new(out);
            let count = pack(reader, &mut sink)?;
            sink.finish()?;
            Ok(count)
        }
        ArchiveFormat::TarGzip => {
            let mut sink = TarSink::new(GzEncoder::new(out, Compression::default()));
            let count = pack(reader, &mut sink)?;
            sink.finish()?.finish()?;
            Ok(count)
        }
        ArchiveFormat::Zip | ArchiveFormat::Jar => {
            let mut sink = ZipSink::new(config)?;
            let count = pack(reader, &mut sink)?;
            sink.finish(out)?;
            Ok(count)
        }
    }
}

trait MemberSink {
    fn add(&mut self, name: &str, blob: &mut Blob) -> AssetResult<()>;
}

fn pack(reader: &mut dyn ArchiveReader, sink: &mut impl MemberSink) -> AssetResult<usize> {
    let mut seen = HashSet::new();
    let mut count = 0;
    while let Some((name, mut blob)) = reader.next_member()? {
        if !seen.insert(name.clone()) {
            debug!(name = %name, "dropping duplicate archive member");
            continue;
        }
        sink.add(&name, &mut blob)?;
        count += 1;
    }
    Ok(count)
}

struct TarSink<W: Write> {
    out: W,
}

impl<W: Write> TarSink<W> {
    fn new(out: W) -> Self {
        Self { out }
    }

    /// Write the two zero blocks that terminate the archive.
    fn finish(mut self) -> AssetResult<W> {
        self.out.write_all(&[0u8; 2 * BLOCK_SIZE])?;
        self.out.flush()?;
        Ok(self.out)
    }
}

impl<W: Write> MemberSink for TarSink<W> {
    fn add(&mut self, name: &str, blob: &mut Blob) -> AssetResult<()> {
        let size = blob.size();
        let header = tar_header(name, size)?;
        self.out.write_all(&header)?;

        let written = io::copy(&mut blob.by_ref().take(size), &mut self.out)?;
        if written != size {
            return Err(AssetError::SizeMismatch {
                name: name.to_string(),
                expected: size,
                actual: written,
            });
        }
        let extra = io::copy(blob, &mut io::sink())?;
        if extra > 0 {
            return Err(AssetError::SizeMismatch {
                name: name.to_string(),
                expected: size,
                actual: size + extra,
            });
        }

        let padding = (BLOCK_SIZE - (size % BLOCK_SIZE as u64) as usize) % BLOCK_SIZE;
        self.out.write_all(&[0u8; BLOCK_SIZE][..padding])?;
        Ok(())
    }
}

/// Build a USTAR header for a regular file with mode 0600, zero owner and
/// zero modification time.
fn tar_header(name: &str, size: u64) -> AssetResult<[u8; BLOCK_SIZE]> {
    if size > MAX_OCTAL_SIZE {
        return Err(AssetError::MemberTooLarge {
            name: name.to_string(),
            size,
        });
    }
    let (prefix, suffix) = split_ustar_name(name)?;

    let mut block = [0u8; BLOCK_SIZE];
    put_str(&mut block[0..100], suffix);
    put_octal(&mut block[100..108], 0o600);
    put_octal(&mut block[108..116], 0);
    put_octal(&mut block[116..124], 0);
    put_octal(&mut block[124..136], size);
    put_octal(&mut block[136..148], 0);
    block[156] = b'0';
    block[257..263].copy_from_slice(b"ustar\0");
    block[263..265].copy_from_slice(b"00");
    put_octal(&mut block[329..337], 0);
    put_octal(&mut block[337..345], 0);
    put_str(&mut block[345..500], prefix);

    // The checksum is computed with its own field read as spaces.
    let checksum: u64 = block
        .iter()
        .enumerate()
        .map(|(i, &b)| u64::from(if (148..156).contains(&i) { b' ' } else { b }))
        .sum();
    put_octal(&mut block[148..155], checksum);
    block[155] = b' ';
    Ok(block)
}

/// Split a long name at a `/` into a prefix and a name that fit the USTAR
/// fields.
fn split_ustar_name(name: &str) -> AssetResult<(&str, &str)> {
    let bytes = name.as_bytes();
    if bytes.len() <= NAME_SIZE {
        return Ok(("", name));
    }
    let mut len = bytes.len();
    if len > PREFIX_SIZE + 1 {
        len = PREFIX_SIZE + 1;
    } else if bytes[len - 1] == b'/' {
        len -= 1;
    }

    let too_long = || AssetError::NameTooLong(name.to_string());
    let split = bytes[..len]
        .iter()
        .rposition(|&b| b == b'/')
        .ok_or_else(too_long)?;
    let suffix_len = bytes.len() - split - 1;
    if split == 0 || suffix_len == 0 || suffix_len > NAME_SIZE || split > PREFIX_SIZE {
        return Err(too_long());
    }
    Ok((&name[..split], &name[split + 1..]))
}

fn put_str(field: &mut [u8], value: &str) {
    let bytes = value.as_bytes();
    field[..bytes.len()].copy_from_slice(bytes);
    if bytes.len() < field.len() {
        field[bytes.len()] = 0;
    }
}

/// Zero-padded octal, leaving the final byte as a NUL terminator.
fn put_octal(field: &mut [u8], value: u64) {
    let digits = format!("{:0width$o}", value, width = field.len() - 1);
    put_str(field, &digits);
}

/// ZIP output is assembled in memory because the container needs to seek
/// back over its local headers.
struct ZipSink {
    zip: ZipWriter<Cursor<Vec<u8>>>,
    options: SimpleFileOptions,
}

impl ZipSink {
    fn new(config: &ArchiveConfig) -> AssetResult<Self> {
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(zip_timestamp(config.zip_modified)?);
        Ok(Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
            options,
        })
    }

    fn finish<W: Write>(self, mut out: W) -> AssetResult<()> {
        let data = self.zip.finish().map_err(zip_io)?.into_inner();
        out.write_all(&data)?;
        out.flush()?;
        Ok(())
    }
}

impl MemberSink for ZipSink {
    fn add(&mut self, name: &str, blob: &mut Blob) -> AssetResult<()> {
        let size = blob.size();
        self.zip.start_file(name, self.options).map_err(zip_io)?;
        let written = io::copy(blob, &mut self.zip)?;
        if written != size {
            return Err(AssetError::SizeMismatch {
                name: name.to_string(),
                expected: size,
                actual: written,
            });
        }
        Ok(())
    }
}

fn zip_timestamp(modified: NaiveDateTime) -> AssetResult<zip::DateTime> {
    let out_of_range = || {
        AssetError::Config(format!(
            "zip modification time {modified} is outside the ZIP date range"
        ))
    };
    let year = u16::try_from(modified.year()).map_err(|_| out_of_range())?;
    zip::DateTime::from_date_and_time(
        year,
        modified.month() as u8,
        modified.day() as u8,
        modified.hour() as u8,
        modified.minute() as u8,
        modified.second() as u8,
    )
    .map_err(|_| out_of_range())
}

fn zip_io(err: zip::result::ZipError) -> AssetError {
    AssetError::Io(io::Error::other(err))
}
