// src/encode/observer.rs

//! Diagnostic hook into the token serializer.
//!
//! The encoder reports every block it visits and every context bucket it
//! selects to a [`ContextObserver`]. The default observer does nothing;
//! [`AnnotationWriter`] dumps the events as text for offline inspection.

use crate::encode::model::position::BlockPosition;
use crate::image::components::Channel;
use std::fmt;
use std::io::{self, Write};

/// The token classes that select a context bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenClass {
    Zeros7x7,
    ZeroFlag7x7,
    ExpDc,
    ResDc,
    SignDc,
    Exp7x7,
    Res7x7,
    Sign7x7,
    Zeros1x8,
    Zeros8x1,
    Exp8,
    Thresh8,
    Res8,
    Sign8,
}

impl fmt::Display for TokenClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenClass::Zeros7x7 => "ZEROS7x7",
            TokenClass::ZeroFlag7x7 => "ZEROFLAG7x7",
            TokenClass::ExpDc => "EXPDC",
            TokenClass::ResDc => "RESDC",
            TokenClass::SignDc => "SIGNDC",
            TokenClass::Exp7x7 => "EXP7x7",
            TokenClass::Res7x7 => "RES7x7",
            TokenClass::Sign7x7 => "SIGN7x7",
            TokenClass::Zeros1x8 => "ZEROS1x8",
            TokenClass::Zeros8x1 => "ZEROS8x1",
            TokenClass::Exp8 => "EXP8",
            TokenClass::Thresh8 => "THRESH8",
            TokenClass::Res8 => "RES8",
            TokenClass::Sign8 => "SIGN8",
        };
        f.write_str(name)
    }
}

/// Where a block sits and how it is coded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSite {
    pub channel: Channel,
    pub row: usize,
    pub column: usize,
    pub position: BlockPosition,
    pub coded_length: u8,
}

/// Receives encoder events. Every method defaults to a no-op.
pub trait ContextObserver {
    /// Called before a block's tokens are serialized.
    fn begin_block(&mut self, _site: &BlockSite) {}

    /// Called when a context bucket is chosen for a coefficient at raster index `coord`.
    fn context(&mut self, _class: TokenClass, _coord: usize, _bucket: usize) {}
}

/// The observer used when none is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ContextObserver for NoopObserver {}

impl<O: ContextObserver + ?Sized> ContextObserver for &mut O {
    fn begin_block(&mut self, site: &BlockSite) {
        (**self).begin_block(site)
    }

    fn context(&mut self, class: TokenClass, coord: usize, bucket: usize) {
        (**self).context(class, coord, bucket)
    }
}

/// Writes one line per event to a side stream.
///
/// Write failures do not disturb encoding; the first one is kept and
/// returned by [`AnnotationWriter::finish`].
pub struct AnnotationWriter<W: Write> {
    writer: W,
    site: Option<BlockSite>,
    error: Option<io::Error>,
}

impl<W: Write> AnnotationWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, site: None, error: None }
    }

    fn emit(&mut self, args: fmt::Arguments<'_>) {
        if self.error.is_none() {
            if let Err(e) = self.writer.write_fmt(args) {
                self.error = Some(e);
            }
        }
    }

    /// Flushes the stream and returns it, or the first write error.
    pub fn finish(mut self) -> io::Result<W> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write> ContextObserver for AnnotationWriter<W> {
    fn begin_block(&mut self, site: &BlockSite) {
        self.site = Some(*site);
        self.emit(format_args!(
            "col[{:02}] y[{:02}]x[{:02}] {} len={}\n",
            site.channel.index(),
            site.row,
            site.column,
            site.position,
            site.coded_length
        ));
    }

    fn context(&mut self, class: TokenClass, coord: usize, bucket: usize) {
        let Some(site) = self.site else { return };
        self.emit(format_args!(
            "col[{:02}] y[{:02}]x[{:02}] by[{:02}]x[{:02}] [{}] = {}\n",
            site.channel.index(),
            site.row,
            site.column,
            coord / 8,
            coord % 8,
            class,
            bucket
        ));
    }
}
