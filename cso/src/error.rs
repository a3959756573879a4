//! Error types for CSO/ZSO container parsing and block decoding

use thiserror::Error;

/// Result type for CSO operations
pub type Result<T> = std::result::Result<T, Error>;

/// CSO error types
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Magic bytes matched neither CISO nor ZISO
    #[error("Invalid container magic: expected 'CISO' or 'ZISO', got {0:?}")]
    InvalidMagic([u8; 4]),

    /// Header size below the fixed header length, or not index-aligned
    #[error("Invalid header size: {0}")]
    InvalidHeaderSize(u32),

    /// Zero block size
    #[error("Invalid block size: {0}")]
    InvalidBlockSize(u32),

    /// Zero uncompressed image size
    #[error("Invalid uncompressed image size: {0}")]
    InvalidImageSize(u64),

    /// Index table too short to describe a single block
    #[error("Invalid index length: {0} entries (need at least 2)")]
    InvalidIndexLength(u32),
}
