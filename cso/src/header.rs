//! CSO/ZSO container header parsing
//!
//! The 24-byte little-endian header that precedes the block index
//! table in both container flavors.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Read;
use tracing::debug;

use crate::{CSO_MAGIC, Error, HEADER_LENGTH, Result, ZSO_MAGIC};

/// Parsed container header.
///
/// Layout (all little-endian): magic(4), header size(4), uncompressed
/// image size(8), block size(4), version(1), alignment shift(1),
/// reserved(2). The header is immediately followed by
/// `(header_size - 24) / 4` 32-bit index entries.
#[derive(Debug, Clone)]
pub struct CsoHeader {
    /// Container magic, either `CISO` or `ZISO`.
    pub magic: [u8; 4],

    /// Total header size including the index table.
    pub header_size: u32,

    /// Size of the wrapped image once decompressed.
    pub uncompressed_size: u64,

    /// Decompressed size of every block except possibly the last.
    pub block_size: u32,

    /// Index entries are shifted left by this many bits to form
    /// container byte offsets.
    pub align_shift: u8,
}

impl CsoHeader {
    /// Parse and validate a container header at the reader's current
    /// position.
    ///
    /// A short read is a hard failure ([`Error::Io`]); a well-formed
    /// read that fails validation reports which field was rejected, so
    /// callers can treat the source as a plain uncompressed image.
    pub fn parse<R: Read>(source: &mut R) -> Result<Self> {
        let mut magic = [0u8; 4];
        source.read_exact(&mut magic)?;
        if magic != CSO_MAGIC && magic != ZSO_MAGIC {
            return Err(Error::InvalidMagic(magic));
        }

        let header_size = source.read_u32::<LittleEndian>()?;
        let uncompressed_size = source.read_u64::<LittleEndian>()?;
        let block_size = source.read_u32::<LittleEndian>()?;
        let _version = source.read_u8()?;
        let align_shift = source.read_u8()?;
        let mut reserved = [0u8; 2];
        source.read_exact(&mut reserved)?;

        if block_size == 0 {
            return Err(Error::InvalidBlockSize(block_size));
        }
        if uncompressed_size == 0 {
            return Err(Error::InvalidImageSize(uncompressed_size));
        }
        if header_size < HEADER_LENGTH || (header_size - HEADER_LENGTH) % 4 != 0 {
            return Err(Error::InvalidHeaderSize(header_size));
        }

        let header = Self {
            magic,
            header_size,
            uncompressed_size,
            block_size,
            align_shift,
        };

        // N blocks plus one terminator entry.
        if header.entry_count() <= 1 {
            return Err(Error::InvalidIndexLength(header.entry_count()));
        }

        debug!(
            "Parsed {} header: {} blocks of {} bytes, {} bytes uncompressed, align {}",
            if magic == CSO_MAGIC { "CISO" } else { "ZISO" },
            header.block_count(),
            block_size,
            uncompressed_size,
            align_shift,
        );

        Ok(header)
    }

    /// Number of 32-bit entries in the index table.
    pub fn entry_count(&self) -> u32 {
        (self.header_size - HEADER_LENGTH) / 4
    }

    /// Number of data blocks (one less than the entry count, the last
    /// entry only terminates the final block's byte range).
    pub fn block_count(&self) -> u32 {
        self.entry_count() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn raw_header(magic: &[u8; 4], header_size: u32, image_size: u64, block_size: u32) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(magic);
        data.extend_from_slice(&header_size.to_le_bytes());
        data.extend_from_slice(&image_size.to_le_bytes());
        data.extend_from_slice(&block_size.to_le_bytes());
        data.push(1); // version
        data.push(0); // align shift
        data.extend_from_slice(&[0, 0]); // reserved
        data
    }

    #[test]
    fn parses_ciso_and_ziso() {
        for magic in [&CSO_MAGIC, &ZSO_MAGIC] {
            let data = raw_header(magic, 24 + 3 * 4, 4096, 2048);
            let header = CsoHeader::parse(&mut Cursor::new(&data)).unwrap();
            assert_eq!(header.magic, *magic);
            assert_eq!(header.uncompressed_size, 4096);
            assert_eq!(header.block_size, 2048);
            assert_eq!(header.entry_count(), 3);
            assert_eq!(header.block_count(), 2);
        }
    }

    #[test]
    fn rejects_unknown_magic() {
        let data = raw_header(b"ISO9", 24 + 12, 4096, 2048);
        let err = CsoHeader::parse(&mut Cursor::new(&data)).unwrap_err();
        assert!(matches!(err, Error::InvalidMagic(_)));
    }

    #[test]
    fn rejects_zero_block_size() {
        let data = raw_header(&CSO_MAGIC, 24 + 12, 4096, 0);
        let err = CsoHeader::parse(&mut Cursor::new(&data)).unwrap_err();
        assert!(matches!(err, Error::InvalidBlockSize(0)));
    }

    #[test]
    fn rejects_zero_image_size() {
        let data = raw_header(&CSO_MAGIC, 24 + 12, 0, 2048);
        let err = CsoHeader::parse(&mut Cursor::new(&data)).unwrap_err();
        assert!(matches!(err, Error::InvalidImageSize(0)));
    }

    #[test]
    fn rejects_undersized_header() {
        let data = raw_header(&CSO_MAGIC, 16, 4096, 2048);
        let err = CsoHeader::parse(&mut Cursor::new(&data)).unwrap_err();
        assert!(matches!(err, Error::InvalidHeaderSize(16)));
    }

    #[test]
    fn rejects_empty_index() {
        // A single entry cannot bound any block.
        let data = raw_header(&CSO_MAGIC, 24 + 4, 4096, 2048);
        let err = CsoHeader::parse(&mut Cursor::new(&data)).unwrap_err();
        assert!(matches!(err, Error::InvalidIndexLength(1)));
    }

    #[test]
    fn short_header_is_io_error() {
        let data = b"CISO\x18";
        let err = CsoHeader::parse(&mut Cursor::new(&data[..])).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
