//! Synthetic disc image fixtures shared by the integration tests.
#![allow(dead_code)] // not every test binary uses every fixture

use flate2::Compression;
use flate2::write::DeflateEncoder;
use std::io::Write;

pub const SECTOR: usize = 2048;

/// Build a minimal ISO9660 image: PVD at sector 16, a root directory
/// at 17 holding `SYSTEM.CNF;1`, and the configuration text at 18.
pub fn build_iso(cnf: &[u8]) -> Vec<u8> {
    build_iso_with_root(cnf, 17, SECTOR as u32)
}

/// Same, with caller-chosen root directory metadata in the PVD.
pub fn build_iso_with_root(cnf: &[u8], root_lba: u32, root_size: u32) -> Vec<u8> {
    let mut image = vec![0u8; SECTOR * 19];

    let pvd = &mut image[16 * SECTOR..17 * SECTOR];
    pvd[0] = 0x01;
    pvd[1..6].copy_from_slice(b"CD001");
    pvd[158..162].copy_from_slice(&root_lba.to_le_bytes());
    pvd[166..170].copy_from_slice(&root_size.to_le_bytes());

    let root = &mut image[17 * SECTOR..18 * SECTOR];
    let mut off = 0;
    off += write_record(root, off, 17, SECTOR as u32, &[0x00]);
    off += write_record(root, off, 17, SECTOR as u32, &[0x01]);
    write_record(root, off, 18, cnf.len() as u32, b"SYSTEM.CNF;1");

    image[18 * SECTOR..18 * SECTOR + cnf.len()].copy_from_slice(cnf);
    image
}

fn write_record(buf: &mut [u8], off: usize, lba: u32, size: u32, name: &[u8]) -> usize {
    let mut len = 33 + name.len();
    len += len & 1; // directory records are padded to even length
    buf[off] = len as u8;
    buf[off + 2..off + 6].copy_from_slice(&lba.to_le_bytes());
    buf[off + 10..off + 14].copy_from_slice(&size.to_le_bytes());
    buf[off + 32] = name.len() as u8;
    buf[off + 33..off + 33 + name.len()].copy_from_slice(name);
    len
}

/// Wrap `image` in a CSO container with deflate-compressed blocks.
pub fn wrap_cso(image: &[u8], block_size: usize) -> Vec<u8> {
    let blocks = image.len().div_ceil(block_size);
    let header_size = 24 + 4 * (blocks + 1);

    let mut payloads = Vec::new();
    for i in 0..blocks {
        let chunk = &image[i * block_size..image.len().min((i + 1) * block_size)];
        let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(chunk).unwrap();
        payloads.push(encoder.finish().unwrap());
    }

    let mut data = Vec::new();
    data.extend_from_slice(b"CISO");
    data.extend_from_slice(&(header_size as u32).to_le_bytes());
    data.extend_from_slice(&(image.len() as u64).to_le_bytes());
    data.extend_from_slice(&(block_size as u32).to_le_bytes());
    data.extend_from_slice(&[1, 0, 0, 0]); // version, align, reserved

    let mut offset = header_size as u32;
    for payload in &payloads {
        data.extend_from_slice(&offset.to_le_bytes());
        offset += payload.len() as u32;
    }
    data.extend_from_slice(&offset.to_le_bytes());
    for payload in &payloads {
        data.extend_from_slice(payload);
    }
    data
}

pub const BOOT_CNF: &[u8] = b"BOOT2 = cdrom0:\\SLUS_201.03;1\r\nVER = 1.00\r\nVMODE = NTSC\r\n";
