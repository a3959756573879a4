//! Storage tree scanning and candidate discovery
//!
//! Walks the provider's tree depth-first, filters candidate disc
//! images by name or mime type, and resolves a product serial for each
//! with the cheapest applicable probe. Best-effort throughout: one
//! unreadable file or directory never fails the scan.

use std::io::Read;
use tracing::{debug, warn};

use crate::Result;
use crate::iso9660;
use crate::probe::DiscImage;
use crate::provider::StorageProvider;
use crate::serial;
use crate::types::{ChildEntry, GameEntry, ListingStatus};

/// Extensions accepted by the candidate filter.
pub const IMAGE_EXTENSIONS: [&str; 7] = [".iso", ".img", ".bin", ".cso", ".zso", ".chd", ".gz"];

const ISO9660_MIME: &str = "application/x-iso9660-image";
const DEFAULT_MAX_DEPTH: usize = 3;
/// Raw images are scanned for a boot line in their first 8 MiB only.
const BIN_SCAN_LIMIT: u64 = 8 * 1024 * 1024;

/// Depth-first scanner over a [`StorageProvider`] tree.
pub struct DirectoryScanner<'a, P: StorageProvider> {
    provider: &'a P,
    max_depth: usize,
}

impl<'a, P: StorageProvider> DirectoryScanner<'a, P> {
    pub fn new(provider: &'a P) -> Self {
        Self {
            provider,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Override the directory recursion limit (default 3). The root's
    /// own children sit at depth 0.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Scan the tree under `root` and return one entry per accepted
    /// file, in the provider's enumeration order.
    pub fn scan(&self, root: &P::Handle) -> Vec<GameEntry<P::Handle>> {
        let mut entries = Vec::new();
        self.walk(root, |child, _path| {
            if child.is_directory || !accepts(&child.name, child.mime_type.as_deref()) {
                return;
            }
            let mut entry = GameEntry::new(child.name.clone(), child.handle.clone());
            entry.serial = self.resolve_serial(&child.name, &child.handle);
            entries.push(entry);
        });
        entries
    }

    /// Diagnostic listing: every tree entry with the filter's verdict.
    /// Paths are relative to `root`; directories carry a trailing `/`.
    pub fn list_with_status(&self, root: &P::Handle) -> Vec<ListingStatus> {
        let mut listing: Vec<ListingStatus> = Vec::new();
        self.walk(root, |child, path| {
            let accepted =
                !child.is_directory && accepts(&child.name, child.mime_type.as_deref());
            listing.push(ListingStatus {
                path: path.to_owned(),
                mime_type: child.mime_type.clone(),
                is_directory: child.is_directory,
                accepted,
            });
        });
        listing
    }

    /// Preorder walk with an explicit work list (no call recursion, so
    /// pathological tree depth cannot exhaust the stack). A directory
    /// that fails to list is skipped with its whole subtree; siblings
    /// continue.
    fn walk(&self, root: &P::Handle, mut visit: impl FnMut(&ChildEntry<P::Handle>, &str)) {
        let mut stack = Vec::new();
        match self.provider.list_children(root) {
            Ok(children) => stack.push((children.into_iter(), 0usize, String::from("/"))),
            Err(e) => {
                warn!("Failed to list scan root: {e}");
                return;
            }
        }

        while let Some((iter, depth, prefix)) = stack.last_mut() {
            let depth = *depth;
            let Some(child) = iter.next() else {
                stack.pop();
                continue;
            };
            let mut path = format!("{prefix}{}", child.name);
            if child.is_directory {
                path.push('/');
            }
            visit(&child, &path);

            if child.is_directory && depth + 1 <= self.max_depth {
                match self.provider.list_children(&child.handle) {
                    Ok(children) => stack.push((children.into_iter(), depth + 1, path)),
                    Err(e) => warn!("Skipping unreadable directory {path}: {e}"),
                }
            }
        }
    }

    /// Resolve a serial for one accepted file; first hit wins. Any
    /// probe failure is logged and swallowed — the entry simply stays
    /// without a serial.
    fn resolve_serial(&self, name: &str, handle: &P::Handle) -> Option<String> {
        if let Some(found) = serial::parse_serial(file_title(name)) {
            return Some(found);
        }

        let ext = extension(name).to_ascii_lowercase();
        let probed = match ext.as_str() {
            "iso" | "img" | "cso" | "zso" => self.probe_filesystem(handle),
            "bin" => self.probe_raw(handle),
            _ => Ok(None),
        };
        match probed {
            Ok(found) => found,
            Err(e) => {
                debug!("Serial probe failed for {name}: {e}");
                None
            }
        }
    }

    /// Disc-image path: ISO9660 boot configuration via the probe.
    fn probe_filesystem(&self, handle: &P::Handle) -> Result<Option<String>> {
        let source = self.provider.open_random_access(handle)?;
        let mut image = DiscImage::open(source)?;
        iso9660::find_boot_serial(&mut image)
    }

    /// Flat-binary path: stream the first part of the (decoded) image
    /// and look for a boot line, falling back to a bare serial match.
    fn probe_raw(&self, handle: &P::Handle) -> Result<Option<String>> {
        let source = self.provider.open_random_access(handle)?;
        let stream = DiscImage::open(source)?.into_stream()?;

        let mut buf = Vec::new();
        stream.take(BIN_SCAN_LIMIT).read_to_end(&mut buf)?;
        if buf.is_empty() {
            return Ok(None);
        }

        if let Some(exe) = iso9660::boot_executable(&buf)
            && let Some(found) = serial::parse_serial_bytes(exe)
        {
            return Ok(Some(found));
        }
        Ok(serial::parse_serial_bytes(&buf))
    }
}

/// Name-or-mime candidate filter.
fn accepts(name: &str, mime: Option<&str>) -> bool {
    let lower = name.to_lowercase();
    if IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
        return true;
    }
    mime.is_some_and(|m| {
        let lower = m.to_lowercase();
        lower.contains("iso9660") || lower == ISO9660_MIME
    })
}

fn file_title(name: &str) -> &str {
    match name.rfind('.') {
        Some(i) if i > 0 => &name[..i],
        _ => name,
    }
}

fn extension(name: &str) -> &str {
    name.rsplit_once('.').map_or("", |(_, ext)| ext)
}
