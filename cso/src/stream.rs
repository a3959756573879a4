//! Forward-only stream over a decompressed container
//!
//! Adapts a [`CsoImage`] into an ordinary [`Read`] source, decoding
//! blocks strictly in increasing order. Used when a caller wants to
//! treat the wrapped image as a plain byte stream without offsets.

use std::io::{Read, Result as IoResult, Seek};

use crate::{CsoImage, Error};

/// Sequential reader over the decompressed contents of a container.
///
/// Tracks bytes remaining against the image size; a block that fails
/// to decode ends the stream early. Dropping the stream releases the
/// underlying source.
pub struct CsoStream<R: Read + Seek> {
    image: CsoImage<R>,
    block_buffer: Vec<u8>,
    current_block: u32,
    position: usize,
    limit: usize,
    remaining: u64,
}

impl<R: Read + Seek> CsoStream<R> {
    pub(crate) fn new(image: CsoImage<R>) -> Self {
        let block_buffer = vec![0u8; image.block_size() as usize];
        let remaining = image.uncompressed_size();
        Self {
            image,
            block_buffer,
            current_block: 0,
            position: 0,
            limit: 0,
            remaining,
        }
    }

    /// Bytes of decompressed image not yet consumed.
    pub fn remaining(&self) -> u64 {
        self.remaining
    }
}

impl<R: Read + Seek> Read for CsoStream<R> {
    fn read(&mut self, buf: &mut [u8]) -> IoResult<usize> {
        let mut total = 0;

        while total < buf.len() && self.remaining > 0 {
            if self.position >= self.limit {
                if self.current_block >= self.image.block_count() {
                    break;
                }
                let decoded = self
                    .image
                    .read_block_into(self.current_block, &mut self.block_buffer)
                    .map_err(|e| match e {
                        Error::Io(io) => io,
                        other => std::io::Error::other(other),
                    })?;
                self.current_block += 1;
                self.position = 0;
                self.limit = decoded.unwrap_or(0);
                if self.limit == 0 {
                    break;
                }
            }

            let available = self.limit - self.position;
            let copy = (buf.len() - total)
                .min(available)
                .min(self.remaining as usize);
            if copy == 0 {
                break;
            }
            buf[total..total + copy]
                .copy_from_slice(&self.block_buffer[self.position..self.position + copy]);
            self.position += copy;
            self.remaining -= copy as u64;
            total += copy;
        }

        Ok(total)
    }
}
