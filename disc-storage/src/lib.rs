//! Disc image discovery and product serial extraction
//!
//! Walks a hierarchical storage tree, filters candidate disc images,
//! and resolves each title's product serial by the cheapest means
//! available: the file name, the ISO9660 boot configuration, or a
//! bounded raw scan — transparently decoding CSO/ZSO containers along
//! the way. The whole pipeline is best-effort: a corrupt or unreadable
//! file yields an entry without a serial, never a failed scan.

pub mod error;
pub mod iso9660;
pub mod probe;
pub mod provider;
pub mod scanner;
pub mod serial;
pub mod types;

pub use error::{DiscError, Result};
pub use iso9660::find_boot_serial;
pub use probe::{DiscImage, DiscStream};
pub use provider::{FsProvider, StorageProvider};
pub use scanner::{DirectoryScanner, IMAGE_EXTENSIONS};
pub use serial::{parse_serial, parse_serial_bytes};
pub use types::{ChildEntry, GameEntry, ListingStatus};
