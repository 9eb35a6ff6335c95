//! Minimal ZIP reader for JAR archives.
//!
//! Only what class loading needs: the end of central directory record, the central
//! directory and local headers, stored and deflated entries. ZIP64, multi-disk archives
//! and encrypted entries are rejected with [`crate::Error::NotSupported`].

use std::{borrow::Cow, io::Read};

use flate2::{read::DeflateDecoder, Crc};

use crate::{file::parser::Parser, Error, Result};

const EOCD_SIGNATURE: u32 = 0x0605_4B50;
const EOCD_SIZE: usize = 22;
const ZIP64_LOCATOR_SIGNATURE: u32 = 0x0706_4B50;
const ZIP64_LOCATOR_SIZE: usize = 20;
const CENTRAL_SIGNATURE: u32 = 0x0201_4B50;
const LOCAL_SIGNATURE: u32 = 0x0403_4B50;
const LOCAL_HEADER_SIZE: usize = 30;
const MAX_COMMENT: usize = 0xFFFF;

const FLAG_ENCRYPTED: u16 = 0x0001;

/// Compression method of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// Method 0
    Stored,
    /// Method 8
    Deflated,
    /// Any other method, kept so the entry can be listed
    Other(u16),
}

impl From<u16> for Compression {
    fn from(method: u16) -> Self {
        match method {
            0 => Compression::Stored,
            8 => Compression::Deflated,
            other => Compression::Other(other),
        }
    }
}

/// A central directory record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipEntry {
    /// Path inside the archive, `/` separated
    pub name: String,
    /// General purpose flags
    pub flags: u16,
    /// Compression method
    pub compression: Compression,
    /// CRC-32 of the uncompressed data
    pub crc32: u32,
    /// Size of the stored data
    pub compressed_size: u32,
    /// Size after decompression
    pub uncompressed_size: u32,
    /// Offset of the local file header
    pub local_header_offset: u32,
}

impl ZipEntry {
    /// Returns `true` for directory entries.
    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.name.ends_with('/')
    }
}

/// A parsed ZIP archive borrowing its bytes.
#[derive(Debug)]
pub struct Archive<'a> {
    data: &'a [u8],
    entries: Vec<ZipEntry>,
}

impl<'a> Archive<'a> {
    /// Locates the end of central directory record and reads every central directory
    /// entry.
    ///
    /// # Errors
    /// Returns [`crate::Error::Empty`] for empty input, [`crate::Error::NotSupported`]
    /// for ZIP64 or split archives, and [`crate::Error::Malformed`] or
    /// [`crate::Error::OutOfBounds`] for damaged directories.
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::Empty);
        }

        let eocd = find_eocd(data)?;
        let mut parser = Parser::new(data);
        parser.seek(eocd + 4)?;

        let disk = parser.read_le::<u16>()?;
        let cd_disk = parser.read_le::<u16>()?;
        let disk_entries = parser.read_le::<u16>()?;
        let total_entries = parser.read_le::<u16>()?;
        let cd_size = parser.read_le::<u32>()?;
        let cd_offset = parser.read_le::<u32>()?;

        if total_entries == 0xFFFF || cd_size == 0xFFFF_FFFF || cd_offset == 0xFFFF_FFFF {
            return Err(Error::NotSupported);
        }
        if eocd >= ZIP64_LOCATOR_SIZE {
            let mut locator = eocd - ZIP64_LOCATOR_SIZE;
            if crate::file::io::read_le_at::<u32>(data, &mut locator)? == ZIP64_LOCATOR_SIGNATURE {
                return Err(Error::NotSupported);
            }
        }
        if disk != 0 || cd_disk != 0 || disk_entries != total_entries {
            return Err(Error::NotSupported);
        }

        let cd_end = (cd_offset as usize)
            .checked_add(cd_size as usize)
            .ok_or(out_of_bounds_error!())?;
        if cd_end > eocd {
            return Err(malformed_error!(
                "Central directory [{}, {}) overlaps the end record at {}",
                cd_offset,
                cd_end,
                eocd
            ));
        }

        parser.seek(cd_offset as usize)?;
        let mut entries = Vec::with_capacity(usize::from(total_entries));
        for index in 0..total_entries {
            let signature = parser.read_le::<u32>()?;
            if signature != CENTRAL_SIGNATURE {
                return Err(malformed_error!(
                    "Bad central directory signature 0x{:08X} for entry {}",
                    signature,
                    index
                ));
            }

            parser.advance_by(4)?; // version made by, version needed
            let flags = parser.read_le::<u16>()?;
            let compression = Compression::from(parser.read_le::<u16>()?);
            parser.advance_by(4)?; // modification time and date
            let crc32 = parser.read_le::<u32>()?;
            let compressed_size = parser.read_le::<u32>()?;
            let uncompressed_size = parser.read_le::<u32>()?;
            let name_len = usize::from(parser.read_le::<u16>()?);
            let extra_len = usize::from(parser.read_le::<u16>()?);
            let comment_len = usize::from(parser.read_le::<u16>()?);
            parser.advance_by(8)?; // disk start, internal and external attributes
            let local_header_offset = parser.read_le::<u32>()?;
            let name = String::from_utf8_lossy(parser.read_bytes(name_len)?).into_owned();
            parser.advance_by(extra_len + comment_len)?;

            if compressed_size == 0xFFFF_FFFF
                || uncompressed_size == 0xFFFF_FFFF
                || local_header_offset == 0xFFFF_FFFF
            {
                return Err(Error::NotSupported);
            }

            entries.push(ZipEntry {
                name,
                flags,
                compression,
                crc32,
                compressed_size,
                uncompressed_size,
                local_header_offset,
            });
        }

        Ok(Archive { data, entries })
    }

    /// Central directory entries in directory order.
    #[must_use]
    pub fn entries(&self) -> &[ZipEntry] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the archive has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reads, decompresses and CRC-checks the data of `entry`.
    ///
    /// Stored entries are returned as borrowed slices of the archive.
    ///
    /// # Errors
    /// Returns [`crate::Error::NotSupported`] for encrypted entries and compression
    /// methods other than stored and deflate, and [`crate::Error::Malformed`] for bad
    /// local headers, inflate failures, size mismatches and CRC mismatches.
    pub fn read(&self, entry: &ZipEntry) -> Result<Cow<'a, [u8]>> {
        if entry.flags & FLAG_ENCRYPTED != 0 {
            return Err(Error::NotSupported);
        }

        let mut parser = Parser::new(self.data);
        parser.seek(entry.local_header_offset as usize)?;
        parser.ensure_remaining(LOCAL_HEADER_SIZE)?;
        let signature = parser.read_le::<u32>()?;
        if signature != LOCAL_SIGNATURE {
            return Err(malformed_error!(
                "Bad local header signature 0x{:08X} for {}",
                signature,
                entry.name
            ));
        }
        parser.advance_by(22)?;
        let name_len = usize::from(parser.read_le::<u16>()?);
        let extra_len = usize::from(parser.read_le::<u16>()?);
        parser.advance_by(name_len + extra_len)?;

        let compressed = parser.read_bytes(entry.compressed_size as usize)?;
        let data: Cow<'a, [u8]> = match entry.compression {
            Compression::Stored => {
                if entry.compressed_size != entry.uncompressed_size {
                    return Err(malformed_error!(
                        "Stored entry {} has differing sizes {} and {}",
                        entry.name,
                        entry.compressed_size,
                        entry.uncompressed_size
                    ));
                }
                Cow::Borrowed(compressed)
            }
            Compression::Deflated => Cow::Owned(inflate(entry, compressed)?),
            Compression::Other(_) => return Err(Error::NotSupported),
        };

        let mut crc = Crc::new();
        crc.update(&data);
        if crc.sum() != entry.crc32 {
            return Err(malformed_error!(
                "CRC mismatch for {} - expected 0x{:08X}, got 0x{:08X}",
                entry.name,
                entry.crc32,
                crc.sum()
            ));
        }

        Ok(data)
    }
}

fn inflate(entry: &ZipEntry, compressed: &[u8]) -> Result<Vec<u8>> {
    let expected = entry.uncompressed_size as usize;
    let mut decoder = DeflateDecoder::new(compressed).take(expected as u64 + 1);
    // The declared size is untrusted; `take` bounds the read, not the reservation.
    let mut data = Vec::with_capacity(expected.min(compressed.len().saturating_mul(4)));
    decoder
        .read_to_end(&mut data)
        .map_err(|e| malformed_error!("Failed to inflate {} - {}", entry.name, e))?;

    if data.len() != expected {
        return Err(malformed_error!(
            "Entry {} inflated to {} bytes, expected {}",
            entry.name,
            data.len(),
            expected
        ));
    }
    Ok(data)
}

/// Scans backwards for the end of central directory signature.
fn find_eocd(data: &[u8]) -> Result<usize> {
    if data.len() < EOCD_SIZE {
        return Err(malformed_error!(
            "Archive of {} bytes is too small for an end record",
            data.len()
        ));
    }

    let last = data.len() - EOCD_SIZE;
    let first = last.saturating_sub(MAX_COMMENT);
    let signature = EOCD_SIGNATURE.to_le_bytes();
    (first..=last)
        .rev()
        .find(|&offset| data[offset..offset + 4] == signature)
        .ok_or_else(|| malformed_error!("No end of central directory record found"))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::{write::DeflateEncoder, Compression as Level};

    use super::*;

    fn crc(data: &[u8]) -> u32 {
        let mut crc = Crc::new();
        crc.update(data);
        crc.sum()
    }

    /// Builds an archive with one entry per `(name, data, deflate)`.
    fn zip(files: &[(&str, &[u8], bool)]) -> Vec<u8> {
        let mut out = Vec::new();
        let mut central = Vec::new();

        for (name, data, deflate) in files {
            let (method, stored) = if *deflate {
                let mut encoder = DeflateEncoder::new(Vec::new(), Level::default());
                encoder.write_all(data).unwrap();
                (8u16, encoder.finish().unwrap())
            } else {
                (0u16, data.to_vec())
            };
            let offset = out.len() as u32;

            out.extend_from_slice(&LOCAL_SIGNATURE.to_le_bytes());
            out.extend_from_slice(&[20, 0, 0, 0]);
            out.extend_from_slice(&method.to_le_bytes());
            out.extend_from_slice(&[0; 4]);
            out.extend_from_slice(&crc(data).to_le_bytes());
            out.extend_from_slice(&(stored.len() as u32).to_le_bytes());
            out.extend_from_slice(&(data.len() as u32).to_le_bytes());
            out.extend_from_slice(&(name.len() as u16).to_le_bytes());
            out.extend_from_slice(&[0, 0]);
            out.extend_from_slice(name.as_bytes());
            out.extend_from_slice(&stored);

            central.extend_from_slice(&CENTRAL_SIGNATURE.to_le_bytes());
            central.extend_from_slice(&[20, 0, 20, 0, 0, 0]);
            central.extend_from_slice(&method.to_le_bytes());
            central.extend_from_slice(&[0; 4]);
            central.extend_from_slice(&crc(data).to_le_bytes());
            central.extend_from_slice(&(stored.len() as u32).to_le_bytes());
            central.extend_from_slice(&(data.len() as u32).to_le_bytes());
            central.extend_from_slice(&(name.len() as u16).to_le_bytes());
            central.extend_from_slice(&[0; 12]);
            central.extend_from_slice(&offset.to_le_bytes());
            central.extend_from_slice(name.as_bytes());
        }

        let cd_offset = out.len() as u32;
        out.extend_from_slice(&central);
        out.extend_from_slice(&EOCD_SIGNATURE.to_le_bytes());
        out.extend_from_slice(&[0; 4]);
        out.extend_from_slice(&(files.len() as u16).to_le_bytes());
        out.extend_from_slice(&(files.len() as u16).to_le_bytes());
        out.extend_from_slice(&(central.len() as u32).to_le_bytes());
        out.extend_from_slice(&cd_offset.to_le_bytes());
        out.extend_from_slice(&[0, 0]);
        out
    }

    #[test]
    fn stored_and_deflated() {
        let text: &[u8] = b"class data class data class data class data";
        let data = zip(&[
            ("META-INF/", b"", false),
            ("a/A.class", text, false),
            ("a/B.class", text, true),
        ]);

        let archive = Archive::parse(&data).unwrap();
        assert_eq!(archive.len(), 3);
        assert!(archive.entries()[0].is_dir());
        assert_eq!(archive.entries()[2].compression, Compression::Deflated);

        let stored = archive.read(&archive.entries()[1]).unwrap();
        assert!(matches!(stored, Cow::Borrowed(_)));
        assert_eq!(&*stored, text);
        assert_eq!(&*archive.read(&archive.entries()[2]).unwrap(), text);
    }

    #[test]
    fn crc_mismatch() {
        let mut data = zip(&[("a/A.class", b"abcdef", false)]);
        // Flip a byte of the stored payload
        data[LOCAL_HEADER_SIZE + "a/A.class".len()] ^= 0xFF;

        let archive = Archive::parse(&data).unwrap();
        assert!(matches!(
            archive.read(&archive.entries()[0]),
            Err(Error::Malformed { .. })
        ));
    }

    #[test]
    fn broken_archives() {
        assert!(matches!(Archive::parse(&[]), Err(Error::Empty)));
        assert!(Archive::parse(b"not a zip file at all, just text").is_err());

        let data = zip(&[("a/A.class", b"abcdef", true)]);
        // Cut into the central directory
        let eocd = data.len() - EOCD_SIZE;
        let mut truncated = data[..eocd - 10].to_vec();
        truncated.extend_from_slice(&data[eocd..]);
        assert!(Archive::parse(&truncated).is_err());

        let mut zip64 = data.clone();
        let count = zip64.len() - 12;
        zip64[count..count + 2].copy_from_slice(&[0xFF, 0xFF]);
        assert!(matches!(Archive::parse(&zip64), Err(Error::NotSupported)));
    }

    #[test]
    fn oversized_claim_is_malformed() {
        let text: &[u8] = b"class data class data";
        let mut data = zip(&[("a/A.class", text, true)]);
        // Uncompressed size in the central directory
        let cd = data.len() - EOCD_SIZE - (46 + "a/A.class".len());
        data[cd + 24..cd + 28].copy_from_slice(&0xFFFF_FFF0u32.to_le_bytes());

        let archive = Archive::parse(&data).unwrap();
        assert_eq!(archive.entries()[0].uncompressed_size, 0xFFFF_FFF0);
        assert!(matches!(
            archive.read(&archive.entries()[0]),
            Err(Error::Malformed { .. })
        ));
    }

    #[test]
    fn unsupported_entries() {
        let mut data = zip(&[("a/A.class", b"abcdef", false)]);
        // Central directory flags of the only entry
        let cd = data.len() - EOCD_SIZE - (46 + "a/A.class".len());
        data[cd + 8] = 0x01;

        let archive = Archive::parse(&data).unwrap();
        assert!(matches!(
            archive.read(&archive.entries()[0]),
            Err(Error::NotSupported)
        ));
    }
}
