//! Block-granular output.
//!
//! Everything after the first byte of an archive is written in whole
//! [`BLOCK_SIZE`] units. Payloads whose length is not a multiple of the block
//! size get their last block padded with zeros, so the sink never sees a
//! partial block.

use std::io::{Read, Write};

use log::trace;

use crate::{error::Result, util::read_fill, BLOCK_SIZE};

const ZERO_BLOCK: [u8; BLOCK_SIZE] = [0; BLOCK_SIZE];

/// Writes 512-byte blocks to an output sink and counts the bytes written.
#[derive(Debug)]
pub struct BlockWriter<W: Write> {
    inner: W,
    written: u64,
}

impl<W: Write> BlockWriter<W> {
    pub fn new(inner: W) -> Self {
        BlockWriter { inner, written: 0 }
    }

    /// Write the whole buffer, returning its length.
    pub fn write_bytes(&mut self, buf: &[u8]) -> Result<usize> {
        self.inner.write_all(buf)?;
        self.written += buf.len() as u64;
        Ok(buf.len())
    }

    /// Write one block.
    pub fn write_block(&mut self, block: &[u8; BLOCK_SIZE]) -> Result<()> {
        self.write_bytes(block)?;
        Ok(())
    }

    /// Write `count` all-zero blocks.
    pub fn write_zero_blocks(&mut self, count: usize) -> Result<()> {
        for _ in 0..count {
            self.write_block(&ZERO_BLOCK)?;
        }
        Ok(())
    }

    /// Write an in-memory payload, zero-padding the final block.
    ///
    /// Returns the number of blocks written; an empty payload writes nothing.
    pub fn write_padded(&mut self, data: &[u8]) -> Result<u64> {
        let mut blocks = 0;
        for chunk in data.chunks(BLOCK_SIZE) {
            self.write_chunk(chunk)?;
            blocks += 1;
        }
        trace!("wrote {} bytes in {blocks} blocks", data.len());
        Ok(blocks)
    }

    /// Stream up to `declared_size` bytes from `reader` in 512-byte chunks.
    ///
    /// Returns the number of bytes read. A result other than `declared_size`
    /// means the content did not match: either the reader ran dry early (only
    /// the bytes it produced were written), or it had more to give (detected
    /// with a one-byte probe that is not written).
    pub fn write_payload(&mut self, reader: &mut impl Read, declared_size: u64) -> Result<u64> {
        let mut buf = [0u8; BLOCK_SIZE];
        let mut read: u64 = 0;

        while read < declared_size {
            let want = (declared_size - read).min(BLOCK_SIZE as u64) as usize;
            let n = read_fill(reader, &mut buf[..want])?;
            if n == 0 {
                break;
            }
            self.write_chunk(&buf[..n])?;
            read += n as u64;
            if n < want {
                break;
            }
        }

        if read == declared_size && read_fill(reader, &mut buf[..1])? != 0 {
            read += 1;
        }

        trace!("streamed {read} of {declared_size} declared bytes");
        Ok(read)
    }

    /// Flush the underlying sink.
    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    /// Total number of bytes handed to the sink so far.
    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    fn write_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        debug_assert!(chunk.len() <= BLOCK_SIZE);
        if chunk.len() == BLOCK_SIZE {
            self.write_bytes(chunk)?;
        } else {
            let mut block = ZERO_BLOCK;
            block[..chunk.len()].copy_from_slice(chunk);
            self.write_block(&block)?;
        }
        Ok(())
    }
}
