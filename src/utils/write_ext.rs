//! An extension trait for `std::io::Write` that writes length-prefixed chunks.

use byteorder::{BigEndian, WriteBytesExt};
use std::io::{self, Write};

/// Extends `std::io::Write` with a method for writing a tagged, length-prefixed chunk.
pub trait WriteChunkExt: Write {
    /// Writes `marker`, then `payload.len()` as a big-endian `u32`, then `payload`.
    ///
    /// Fails with `InvalidInput` when the payload is longer than `u32::MAX` bytes.
    fn write_chunk(&mut self, marker: u8, payload: &[u8]) -> io::Result<()>;
}

impl<W: Write + ?Sized> WriteChunkExt for W {
    fn write_chunk(&mut self, marker: u8, payload: &[u8]) -> io::Result<()> {
        let length = u32::try_from(payload.len()).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidInput, "payload too large for u32 length")
        })?;
        self.write_u8(marker)?;
        self.write_u32::<BigEndian>(length)?;
        self.write_all(payload)
    }
}
