//! Minimal ISO9660 probing for the boot configuration file
//!
//! Reads just enough of the filesystem to find `SYSTEM.CNF` in the
//! root directory and extract the serial from the boot executable path
//! it references. Joliet, Rock Ridge and multi-extent files are out of
//! scope; anything that does not look like an ISO9660 volume is simply
//! "no serial", not an error.

use regex::bytes::Regex;
use std::io::{Read, Seek};
use std::sync::LazyLock;
use tracing::{debug, trace};

use crate::Result;
use crate::probe::DiscImage;
use crate::serial;

/// ISO9660 logical sector size.
pub const SECTOR_SIZE: usize = 2048;

const PVD_SECTOR: u64 = 16;
const ROOT_EXTENT_OFFSET: usize = 156 + 2;
const ROOT_SIZE_OFFSET: usize = 156 + 10;
/// Root directories larger than this are treated as implausible.
const MAX_ROOT_SIZE: u32 = 512 * 1024;
/// Scan window substituted when the volume metadata looks bogus.
const DEFAULT_ROOT_WINDOW: u32 = 64 * 1024;
const MAX_CNF_READ: u32 = 4096;

static BOOT_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)BOOT\d*\s*=\s*[^\\\r\n]*\\([A-Z0-9_.]+)").expect("boot pattern compiles")
});

/// Extract the executable name from a `BOOT = path\NAME` line: the
/// token after the final backslash, up to the next whitespace.
pub(crate) fn boot_executable(text: &[u8]) -> Option<&[u8]> {
    BOOT_PATH
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_bytes())
}

/// One directory record, borrowed out of the extent buffer.
struct DirectoryRecord<'a> {
    length: usize,
    extent_lba: u32,
    extent_size: u32,
    name: &'a [u8],
}

impl<'a> DirectoryRecord<'a> {
    /// Parse the record starting at `offset`; `None` when the record
    /// would read past the buffer (malformed directory, caller stops).
    fn parse(dir: &'a [u8], offset: usize) -> Option<Self> {
        let length = dir[offset] as usize;
        if offset + length > dir.len() {
            return None;
        }
        let name_len = u8_at(dir, offset + 32) as usize;
        let name_pos = offset + 33;
        let name = if name_len > 0 && name_pos + name_len <= dir.len() {
            &dir[name_pos..name_pos + name_len]
        } else {
            &[]
        };
        Some(Self {
            length,
            extent_lba: u32_le(dir, offset + 2),
            extent_size: u32_le(dir, offset + 10),
            name,
        })
    }

    /// The 0x00/0x01 single-byte names denoting this directory and its
    /// parent.
    fn is_self_or_parent(&self) -> bool {
        self.name.len() == 1 && (self.name[0] == 0 || self.name[0] == 1)
    }

    /// File identifier without the `;version` suffix.
    fn base_name(&self) -> &[u8] {
        match self.name.iter().position(|&b| b == b';') {
            Some(semi) => &self.name[..semi],
            None => self.name,
        }
    }
}

/// Locate `SYSTEM.CNF` in the root directory and extract the serial
/// referenced by its boot line.
///
/// Anything that is not a readable ISO9660 volume returns `Ok(None)`.
/// Iteration stops after the first `SYSTEM.CNF` encounter, whatever
/// the outcome — at most one boot descriptor is expected.
pub fn find_boot_serial<R: Read + Seek>(image: &mut DiscImage<R>) -> Result<Option<String>> {
    let Some(pvd) = image.read_range(PVD_SECTOR * SECTOR_SIZE as u64, SECTOR_SIZE)? else {
        return Ok(None);
    };
    if pvd.len() < SECTOR_SIZE || pvd[0] != 0x01 || &pvd[1..6] != b"CD001" {
        return Ok(None);
    }

    let root_lba = u32_le(&pvd, ROOT_EXTENT_OFFSET);
    let mut root_size = u32_le(&pvd, ROOT_SIZE_OFFSET);
    if root_lba == 0 || root_size == 0 || root_size > MAX_ROOT_SIZE {
        debug!("Implausible root directory metadata (lba={root_lba}, size={root_size}), using default window");
        root_size = DEFAULT_ROOT_WINDOW;
    }

    let Some(dir) = image.read_range(u64::from(root_lba) * SECTOR_SIZE as u64, root_size as usize)?
    else {
        return Ok(None);
    };

    let mut offset = 0;
    while offset < dir.len() {
        if dir[offset] == 0 {
            // Records never span sectors; a zero length pads to the
            // next sector boundary.
            let next = (offset / SECTOR_SIZE + 1) * SECTOR_SIZE;
            if next <= offset {
                break;
            }
            offset = next;
            continue;
        }
        let Some(record) = DirectoryRecord::parse(&dir, offset) else {
            break;
        };

        if !record.is_self_or_parent() && record.base_name().eq_ignore_ascii_case(b"SYSTEM.CNF") {
            trace!(
                "Found SYSTEM.CNF at LBA {} ({} bytes)",
                record.extent_lba, record.extent_size
            );
            let read_size = record.extent_size.min(MAX_CNF_READ);
            if let Some(cnf) = image.read_range(
                u64::from(record.extent_lba) * SECTOR_SIZE as u64,
                read_size as usize,
            )? && let Some(exe) = boot_executable(&cnf)
                && let Some(found) = serial::parse_serial_bytes(exe)
            {
                return Ok(Some(found));
            }
            break;
        }

        offset += record.length;
    }

    Ok(None)
}

fn u8_at(data: &[u8], i: usize) -> u8 {
    data.get(i).copied().unwrap_or(0)
}

fn u32_le(data: &[u8], i: usize) -> u32 {
    match data.get(i..i + 4) {
        Some(bytes) => u32::from_le_bytes(bytes.try_into().unwrap_or([0; 4])),
        None => 0,
    }
}
