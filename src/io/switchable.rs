// src/io/switchable.rs

//! A byte sink with a compression mode switch.
//!
//! The outer container may wrap everything it receives in a general-purpose
//! compressor. The entropy coder's output is already dense, so the encoder
//! turns that off before writing its frame.

use log::trace;
use std::io::{self, Write};

/// A `Write` whose bytes can be routed through or around an outer compressor.
pub trait SwitchableWrite: Write {
    fn enable_compression(&mut self);
    fn disable_compression(&mut self);
}

impl<S: SwitchableWrite + ?Sized> SwitchableWrite for &mut S {
    fn enable_compression(&mut self) {
        (**self).enable_compression()
    }

    fn disable_compression(&mut self) {
        (**self).disable_compression()
    }
}

/// Pass-through [`SwitchableWrite`] that records the mode of every byte.
///
/// No compression is performed; the writer only tracks how many bytes were
/// written in each mode and how often the mode changed.
#[derive(Debug)]
pub struct SwitchableWriter<W: Write> {
    inner: W,
    compressing: bool,
    compressed_bytes: u64,
    raw_bytes: u64,
    switches: usize,
}

impl<W: Write> SwitchableWriter<W> {
    /// Wraps `inner`, starting in raw mode.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            compressing: false,
            compressed_bytes: 0,
            raw_bytes: 0,
            switches: 0,
        }
    }

    pub fn is_compressing(&self) -> bool {
        self.compressing
    }

    /// Bytes written while compression was enabled.
    pub fn compressed_bytes(&self) -> u64 {
        self.compressed_bytes
    }

    /// Bytes written while compression was disabled.
    pub fn raw_bytes(&self) -> u64 {
        self.raw_bytes
    }

    /// Number of actual mode changes.
    pub fn switches(&self) -> usize {
        self.switches
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    fn set_mode(&mut self, compressing: bool) {
        if self.compressing != compressing {
            trace!("Output compression {}", if compressing { "on" } else { "off" });
            self.compressing = compressing;
            self.switches += 1;
        }
    }
}

impl<W: Write> Write for SwitchableWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        if self.compressing {
            self.compressed_bytes += n as u64;
        } else {
            self.raw_bytes += n as u64;
        }
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<W: Write> SwitchableWrite for SwitchableWriter<W> {
    fn enable_compression(&mut self) {
        self.set_mode(true);
    }

    fn disable_compression(&mut self) {
        self.set_mode(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_are_attributed_to_mode() {
        let mut writer = SwitchableWriter::new(Vec::new());
        writer.write_all(b"ab").unwrap();
        writer.enable_compression();
        writer.write_all(b"cde").unwrap();
        writer.disable_compression();
        writer.write_all(b"f").unwrap();

        assert_eq!(writer.raw_bytes(), 3);
        assert_eq!(writer.compressed_bytes(), 3);
        assert_eq!(writer.switches(), 2);
        assert_eq!(writer.into_inner(), b"abcdef");
    }

    #[test]
    fn test_redundant_switch_is_not_counted() {
        let mut writer = SwitchableWriter::new(Vec::new());
        writer.disable_compression();
        writer.enable_compression();
        writer.enable_compression();
        assert!(writer.is_compressing());
        assert_eq!(writer.switches(), 1);
    }

    fn write_compressed<S: SwitchableWrite>(mut sink: S) {
        sink.enable_compression();
        sink.write_all(&[0]).unwrap();
    }

    #[test]
    fn test_works_through_mutable_reference() {
        let mut writer = SwitchableWriter::new(Vec::new());
        write_compressed(&mut writer);
        assert_eq!(writer.compressed_bytes(), 1);
    }
}
