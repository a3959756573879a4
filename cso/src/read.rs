//! Random-access decoding of CSO/ZSO containers
//!
//! Decodes arbitrary byte ranges of the wrapped image by decompressing
//! only the blocks that overlap the request. Decoding is deliberately
//! lenient: a zero-length payload means an all-zero block, a corrupt
//! block truncates the readable range instead of failing the call.

use byteorder::{LittleEndian, ReadBytesExt};
use flate2::read::DeflateDecoder;
use std::io::{Read, Seek, SeekFrom};
use tracing::{debug, trace};

use crate::{CsoHeader, CsoStream, OFFSET_MASK, PLAIN_BLOCK_FLAG, Result};

/// An opened CSO/ZSO container.
///
/// Owns the underlying source; dropping the image releases it.
#[derive(Debug)]
pub struct CsoImage<R: Read + Seek> {
    source: R,
    header: CsoHeader,
    index: Vec<u32>,
}

impl<R: Read + Seek> CsoImage<R> {
    /// Open a container positioned at the start of `source`.
    ///
    /// Parses and validates the header, then reads the full index
    /// table. A table shorter than the header promises is a hard
    /// failure ([`Error::Io`]).
    pub fn open(mut source: R) -> Result<Self> {
        let header = CsoHeader::parse(&mut source)?;
        Self::with_header(header, source)
    }

    /// Build an image from an already-parsed header, reading the index
    /// table at the source's current position.
    pub fn with_header(header: CsoHeader, mut source: R) -> Result<Self> {
        let entry_count = header.entry_count() as usize;
        let mut index = Vec::with_capacity(entry_count);
        for _ in 0..entry_count {
            index.push(source.read_u32::<LittleEndian>()?);
        }

        debug!("Read index table with {entry_count} entries");

        Ok(Self {
            source,
            header,
            index,
        })
    }

    /// The parsed container header.
    pub fn header(&self) -> &CsoHeader {
        &self.header
    }

    /// Size of the wrapped image once decompressed.
    pub fn uncompressed_size(&self) -> u64 {
        self.header.uncompressed_size
    }

    /// Decompressed size of every block except possibly the last.
    pub fn block_size(&self) -> u32 {
        self.header.block_size
    }

    /// Number of data blocks in the container.
    pub fn block_count(&self) -> u32 {
        self.header.block_count()
    }

    /// Convert into a forward-only stream over the decompressed image.
    pub fn into_stream(self) -> CsoStream<R> {
        CsoStream::new(self)
    }

    /// Decode the byte range `[offset, offset + size)` of the wrapped
    /// image.
    ///
    /// Returns `Ok(None)` for a zero-size or out-of-range request, or
    /// when no bytes could be decoded at all. The range is clamped to
    /// the image size; if a block fails to decode mid-way the bytes
    /// assembled so far are returned rather than an error. Only
    /// genuine I/O failures from the source propagate as `Err`.
    pub fn read_range(&mut self, offset: u64, size: usize) -> Result<Option<Vec<u8>>> {
        let image_size = self.header.uncompressed_size;
        if size == 0 || offset >= image_size {
            return Ok(None);
        }

        let block_size = u64::from(self.header.block_size);
        let capped = (size as u64).min(image_size - offset) as usize;
        let mut output = vec![0u8; capped];
        let mut scratch = vec![0u8; self.header.block_size as usize];

        let start_block = offset / block_size;
        let end_block = (offset + capped as u64)
            .div_ceil(block_size)
            .min(u64::from(self.header.block_count()));
        let offset_in_block = (offset % block_size) as usize;

        trace!(
            "read_range offset={offset} size={capped} blocks {start_block}..{end_block}"
        );

        let mut out_offset = 0usize;
        let mut remaining = capped;
        for block in start_block..end_block {
            if remaining == 0 {
                break;
            }
            let Some(produced) = self.read_block_into(block as u32, &mut scratch)? else {
                break;
            };
            if produced == 0 {
                break;
            }
            let skip = if block == start_block { offset_in_block } else { 0 };
            if skip >= produced {
                continue;
            }
            let copy = (produced - skip).min(remaining);
            output[out_offset..out_offset + copy].copy_from_slice(&scratch[skip..skip + copy]);
            out_offset += copy;
            remaining -= copy;
        }

        if out_offset == 0 {
            return Ok(None);
        }
        output.truncate(out_offset);
        Ok(Some(output))
    }

    /// Decode block `block` into `dest` (which must hold a full block).
    ///
    /// Returns the number of bytes produced, `Some(0)` for a block
    /// past the end of the image, or `None` when the block is
    /// unreadable (short payload read, corrupt deflate stream) —
    /// callers treat `None` as the end of the readable range.
    pub(crate) fn read_block_into(&mut self, block: u32, dest: &mut [u8]) -> Result<Option<usize>> {
        if block >= self.header.block_count() {
            return Ok(None);
        }

        let entry = self.index[block as usize];
        let next = self.index[block as usize + 1];
        let shift = self.header.align_shift;
        let start = u64::from(entry & OFFSET_MASK) << shift;
        let end = u64::from(next & OFFSET_MASK) << shift;
        // Index entries are not guaranteed non-decreasing; clamp
        // instead of validating.
        let compressed_len = end.saturating_sub(start);

        let expected = u64::from(self.header.block_size)
            .min(
                self.header
                    .uncompressed_size
                    .saturating_sub(u64::from(block) * u64::from(self.header.block_size)),
            ) as usize;
        if expected == 0 {
            return Ok(Some(0));
        }

        if compressed_len == 0 {
            // No stored payload: the block is implicitly all zero.
            dest[..expected].fill(0);
            return Ok(Some(expected));
        }

        self.source.seek(SeekFrom::Start(start))?;
        let mut compressed = Vec::new();
        let read = (&mut self.source)
            .take(compressed_len)
            .read_to_end(&mut compressed)?;
        if read as u64 != compressed_len {
            trace!("Block {block}: short payload read ({read} of {compressed_len} bytes)");
            return Ok(None);
        }

        if entry & PLAIN_BLOCK_FLAG != 0 {
            let copy = expected.min(compressed.len());
            dest[..copy].copy_from_slice(&compressed[..copy]);
            dest[copy..expected].fill(0);
            return Ok(Some(expected));
        }

        // Raw (headerless) deflate into the expected block size.
        let mut decoder = DeflateDecoder::new(&compressed[..]);
        let mut total = 0usize;
        loop {
            if total >= expected {
                break;
            }
            match decoder.read(&mut dest[total..expected]) {
                Ok(0) => break,
                Ok(n) => total += n,
                Err(e) => {
                    trace!("Block {block}: deflate stream rejected: {e}");
                    return Ok(None);
                }
            }
        }
        if total == 0 {
            // Degraded but readable: treat an empty inflate result as
            // an all-zero block rather than failing the whole range.
            dest[..expected].fill(0);
            return Ok(Some(expected));
        }
        Ok(Some(total))
    }
}
