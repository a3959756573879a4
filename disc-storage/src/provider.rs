//! Storage provider abstraction
//!
//! The scanner reaches its byte sources only through this narrow
//! interface: one-level directory listings plus per-file random-access
//! and sequential readers. Handles are opaque to everything above.

use std::fs::File;
use std::io::{Read, Seek};
use std::path::PathBuf;

use crate::Result;
use crate::types::ChildEntry;

/// Hierarchical byte-source backend consumed by the scanner.
pub trait StorageProvider {
    /// Opaque handle to a file or directory. Owned by the provider;
    /// cloning must be cheap.
    type Handle: Clone;

    /// Byte-range reader over a single file.
    type RandomAccess: Read + Seek;

    /// Sequential reader over a single file.
    type Stream: Read;

    /// List one level of children, in the backend's own order.
    fn list_children(&self, dir: &Self::Handle) -> Result<Vec<ChildEntry<Self::Handle>>>;

    /// Open a file for random-access reads.
    fn open_random_access(&self, file: &Self::Handle) -> Result<Self::RandomAccess>;

    /// Open a file as a forward-only stream.
    fn open_stream(&self, file: &Self::Handle) -> Result<Self::Stream>;
}

/// [`StorageProvider`] backed by the local filesystem.
///
/// Mime types are never reported; filtering falls back to file
/// extensions alone.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsProvider;

impl StorageProvider for FsProvider {
    type Handle = PathBuf;
    type RandomAccess = File;
    type Stream = File;

    fn list_children(&self, dir: &PathBuf) -> Result<Vec<ChildEntry<PathBuf>>> {
        let mut children = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            children.push(ChildEntry {
                handle: entry.path(),
                name: entry.file_name().to_string_lossy().into_owned(),
                mime_type: None,
                is_directory: file_type.is_dir(),
            });
        }
        Ok(children)
    }

    fn open_random_access(&self, file: &PathBuf) -> Result<File> {
        Ok(File::open(file)?)
    }

    fn open_stream(&self, file: &PathBuf) -> Result<File> {
        Ok(File::open(file)?)
    }
}
