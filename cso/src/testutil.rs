//! Synthetic container construction for unit tests.

use flate2::Compression;
use flate2::write::DeflateEncoder;
use std::io::Write;

use crate::{CSO_MAGIC, PLAIN_BLOCK_FLAG};

pub(crate) enum BlockStore {
    Plain,
    Deflate,
    /// No payload bytes at all; decodes as an all-zero block.
    Empty,
}

/// Build a synthetic container around `image`.
pub(crate) fn build_container(
    image: &[u8],
    block_size: usize,
    align_shift: u8,
    store: impl Fn(usize) -> BlockStore,
) -> Vec<u8> {
    let blocks = image.len().div_ceil(block_size);
    let header_size = 24 + 4 * (blocks + 1);
    let align = 1usize << align_shift;

    let mut payloads = Vec::new();
    for i in 0..blocks {
        let chunk = &image[i * block_size..image.len().min((i + 1) * block_size)];
        match store(i) {
            BlockStore::Plain => payloads.push((chunk.to_vec(), true)),
            BlockStore::Empty => {
                assert!(chunk.iter().all(|&b| b == 0), "empty block must be zero");
                payloads.push((Vec::new(), false));
            }
            BlockStore::Deflate => {
                let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
                encoder.write_all(chunk).unwrap();
                payloads.push((encoder.finish().unwrap(), false));
            }
        }
    }

    let mut data = Vec::new();
    data.extend_from_slice(&CSO_MAGIC);
    data.extend_from_slice(&(header_size as u32).to_le_bytes());
    data.extend_from_slice(&(image.len() as u64).to_le_bytes());
    data.extend_from_slice(&(block_size as u32).to_le_bytes());
    data.push(1); // version
    data.push(align_shift);
    data.extend_from_slice(&[0, 0]); // reserved

    let mut offset = header_size;
    for (payload, plain) in &payloads {
        offset = offset.next_multiple_of(align);
        let mut entry = (offset >> align_shift) as u32;
        if *plain {
            entry |= PLAIN_BLOCK_FLAG;
        }
        data.extend_from_slice(&entry.to_le_bytes());
        offset += payload.len();
    }
    offset = offset.next_multiple_of(align);
    data.extend_from_slice(&((offset >> align_shift) as u32).to_le_bytes());

    for (payload, _) in &payloads {
        let aligned = data.len().next_multiple_of(align);
        data.resize(aligned, 0);
        data.extend_from_slice(payload);
    }
    // Pad the tail so the terminator entry's aligned offset is in range.
    let aligned = data.len().next_multiple_of(align);
    data.resize(aligned, 0);
    data
}

pub(crate) fn sample_image(len: usize) -> Vec<u8> {
    // Mix of patterned data and a zero run so one block can be stored
    // with no payload.
    let mut image: Vec<u8> = (0..len).map(|i| (i * 7 % 251) as u8).collect();
    if len >= 4096 {
        image[2048..4096].fill(0);
    }
    image
}
