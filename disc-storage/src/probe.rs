//! Disc image probe facade
//!
//! Presents one byte-range contract over both plain images and
//! CSO/ZSO containers. A source that fails container validation is
//! assumed to be a plain uncompressed image and served by a raw
//! seek-and-read path instead.

use cso::{CsoHeader, CsoImage, CsoStream};
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use tracing::{debug, trace};

use crate::Result;

/// Single requests are capped to keep scratch allocations bounded.
const MAX_RANGE_READ: usize = 2 * 1024 * 1024;

/// An opened disc image resource: either a recognized compressed
/// container or a plain byte source.
pub enum DiscImage<R: Read + Seek> {
    Cso(CsoImage<R>),
    Raw(R),
}

impl<R: Read + Seek> DiscImage<R> {
    /// Open a resource positioned at its start.
    ///
    /// Container format errors (and sources too short to hold a
    /// container header) fall back to the raw path; genuine I/O
    /// failures propagate.
    pub fn open(mut source: R) -> Result<Self> {
        match CsoHeader::parse(&mut source) {
            Ok(header) => {
                trace!("Source is a compressed container");
                Ok(Self::Cso(CsoImage::with_header(header, source)?))
            }
            Err(cso::Error::Io(e)) if e.kind() == ErrorKind::UnexpectedEof => {
                source.seek(SeekFrom::Start(0))?;
                Ok(Self::Raw(source))
            }
            Err(cso::Error::Io(e)) => Err(e.into()),
            Err(e) => {
                debug!("Not a compressed container ({e}), using raw access");
                source.seek(SeekFrom::Start(0))?;
                Ok(Self::Raw(source))
            }
        }
    }

    /// Whether the resource was recognized as a compressed container.
    pub fn is_compressed(&self) -> bool {
        matches!(self, Self::Cso(_))
    }

    /// Read up to `size` bytes starting at `offset` of the (logical)
    /// image.
    ///
    /// Returns `Ok(None)` when nothing could be read; a partial result
    /// is returned as-is.
    pub fn read_range(&mut self, offset: u64, size: usize) -> Result<Option<Vec<u8>>> {
        if size == 0 {
            return Ok(None);
        }
        let size = size.min(MAX_RANGE_READ);
        match self {
            Self::Cso(image) => Ok(image.read_range(offset, size)?),
            Self::Raw(source) => {
                source.seek(SeekFrom::Start(offset))?;
                let mut buf = vec![0u8; size];
                let mut filled = 0;
                while filled < size {
                    match source.read(&mut buf[filled..]) {
                        Ok(0) => break,
                        Ok(n) => filled += n,
                        Err(e) if e.kind() == ErrorKind::Interrupted => {}
                        Err(e) => return Err(e.into()),
                    }
                }
                if filled == 0 {
                    return Ok(None);
                }
                buf.truncate(filled);
                Ok(Some(buf))
            }
        }
    }

    /// Convert into a forward-only stream over the logical image,
    /// decoding container blocks transparently.
    pub fn into_stream(self) -> Result<DiscStream<R>> {
        match self {
            Self::Cso(image) => Ok(DiscStream::Cso(image.into_stream())),
            Self::Raw(mut source) => {
                source.seek(SeekFrom::Start(0))?;
                Ok(DiscStream::Raw(source))
            }
        }
    }
}

/// Sequential view over a [`DiscImage`].
pub enum DiscStream<R: Read + Seek> {
    Cso(CsoStream<R>),
    Raw(R),
}

impl<R: Read + Seek> Read for DiscStream<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Self::Cso(stream) => stream.read(buf),
            Self::Raw(source) => source.read(buf),
        }
    }
}
