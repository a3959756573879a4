//! CSO/ZSO compressed disc image reading
//!
//! CSO (and its sibling ZSO, which shares the container layout) wraps a
//! disc image as fixed-size blocks, each stored plain or deflate-
//! compressed and addressed through a leading index table. This crate
//! parses the container and decodes arbitrary byte ranges by
//! decompressing only the blocks that overlap the request, so multi-
//! gigabyte images can be probed without expanding them.

pub mod error;
pub mod header;
pub mod read;
pub mod stream;

#[cfg(test)]
pub(crate) mod testutil;

pub use error::{Error, Result};
pub use header::CsoHeader;
pub use read::CsoImage;
pub use stream::CsoStream;

/// Magic tag of a CSO container.
pub const CSO_MAGIC: [u8; 4] = *b"CISO";

/// Magic tag of a ZSO container (same layout as CSO).
pub const ZSO_MAGIC: [u8; 4] = *b"ZISO";

/// Fixed size of the container header preceding the block index.
pub const HEADER_LENGTH: u32 = 24;

/// High bit of an index entry: the block is stored uncompressed.
pub(crate) const PLAIN_BLOCK_FLAG: u32 = 0x8000_0000;

/// Low 31 bits of an index entry: pre-shift container byte offset.
pub(crate) const OFFSET_MASK: u32 = 0x7FFF_FFFF;
