// src/encode/encoder.rs

//! Encoder orchestrator: one coding pass over every block of an image.
//!
//! Blocks are visited row by row, with the rows of the different channels
//! interleaved by [`BlockStore::next_channel`]. Each block is coded against
//! the model of its (channel, structural position) variant, and the whole
//! pass produces a single arithmetic-coded payload framed as
//! `b'x' | u32 BE length | payload`.

use crate::encode::model::position::BlockPosition;
use crate::encode::model::tables::{Model, ProbabilityTableSet};
use crate::encode::observer::{BlockSite, ContextObserver, NoopObserver};
use crate::encode::tokens::serialize_tokens;
use crate::encode::vp8::BoolEncoder;
use crate::image::components::{BlockStore, Channel, ChannelCursor};
use crate::io::SwitchableWrite;
use crate::utils::error::{LeptonError, Result};
use crate::utils::write_ext::WriteChunkExt;
use log::{debug, error, info, trace};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Marker byte that opens the encoded chunk.
pub const CHUNK_MARKER: u8 = b'x';

/// Configuration for a [`Vp8ComponentEncoder`].
#[derive(Clone, Default)]
pub struct EncoderOptions {
    initial_model: Option<Box<Model>>,
    model_export: Option<PathBuf>,
}

impl EncoderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts every probability table variant from a copy of `model`.
    pub fn with_initial_model(mut self, model: Box<Model>) -> Self {
        self.initial_model = Some(model);
        self
    }

    /// Writes the learned (Y, middle) model to `path` after each pass.
    pub fn with_model_export(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_export = Some(path.into());
        self
    }

    pub fn initial_model(&self) -> Option<&Model> {
        self.initial_model.as_deref()
    }

    pub fn model_export(&self) -> Option<&PathBuf> {
        self.model_export.as_ref()
    }
}

/// Entropy codes the coefficient blocks of a [`BlockStore`].
pub struct Vp8ComponentEncoder<O: ContextObserver = NoopObserver> {
    options: EncoderOptions,
    observer: O,
}

impl Vp8ComponentEncoder<NoopObserver> {
    pub fn new(options: EncoderOptions) -> Self {
        Self { options, observer: NoopObserver }
    }
}

impl<O: ContextObserver> Vp8ComponentEncoder<O> {
    /// Creates an encoder that reports its block visits and context choices to `observer`.
    pub fn with_observer(options: EncoderOptions, observer: O) -> Self {
        Self { options, observer }
    }

    pub fn options(&self) -> &EncoderOptions {
        &self.options
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    pub fn into_observer(self) -> O {
        self.observer
    }

    /// Encodes every block of `input` and writes the framed result to `output`.
    ///
    /// The frame is written with compression disabled. When a model export
    /// path is configured and the model cannot be written there, nothing is
    /// written to `output`.
    ///
    /// # Panics
    ///
    /// If `input` holds fewer blocks than its dimensions promise.
    pub fn encode_chunk<S, W>(&mut self, input: &S, output: &mut W) -> Result<()>
    where
        S: BlockStore + ?Sized,
        W: SwitchableWrite,
    {
        let channel_count = input.channel_count();
        let mut cursors = vec![ChannelCursor::default(); channel_count];
        output.enable_compression();

        let mut tables = ProbabilityTableSet::new(self.options.initial_model());
        for &channel in &Channel::ALL[..channel_count] {
            tables.set_quantization_table(channel, *input.quantization_table(channel));
        }
        debug!(
            "Encoding {} channel(s), warm start: {}",
            channel_count,
            self.options.initial_model.is_some()
        );

        let mut encoder = BoolEncoder::new();
        while let Some(channel) = input.next_channel(&cursors) {
            let cursor = &mut cursors[channel.index()];
            self.process_row(input, channel, cursor, &mut tables, &mut encoder);
        }
        let payload = encoder.finish();
        info!("Entropy coded stream: {} bytes", payload.len());

        // the tables are final here; export before any frame byte so a failure leaves no frame
        if let Some(path) = &self.options.model_export {
            let model = tables.get_mut(Channel::Y, BlockPosition::Middle).model_mut();
            model.optimize();
            export_model(path, model)?;
            debug!("Exported model to {}", path.display());
        }

        output.disable_compression();
        if u32::try_from(payload.len()).is_err() {
            return Err(LeptonError::StreamTooLarge(payload.len()));
        }
        output.write_chunk(CHUNK_MARKER, &payload)?;
        Ok(())
    }

    fn process_row<S: BlockStore + ?Sized>(
        &mut self,
        input: &S,
        channel: Channel,
        cursor: &mut ChannelCursor,
        tables: &mut ProbabilityTableSet,
        encoder: &mut BoolEncoder,
    ) {
        let width = input.block_width(channel);
        let height = input.block_height(channel);
        trace!("{} row {} at block {}", channel, cursor.row, cursor.position);

        for column in 0..width {
            let index = cursor.position;
            assert!(
                index < width * height,
                "{} cursor {} past the end of a {}x{} channel",
                channel,
                index,
                width,
                height
            );
            let position = BlockPosition::classify(cursor.row, column, width);
            let block = input.block(channel, index);
            let neighbors = input.neighbors(channel, index, position);
            self.observer.begin_block(&BlockSite {
                channel,
                row: cursor.row,
                column,
                position,
                coded_length: block.coded_length(),
            });
            let (variant, quantization) = tables.select(channel, position);
            serialize_tokens(block, &neighbors, variant, quantization, encoder, &mut self.observer);
            cursor.advance();
        }
        cursor.row += 1;
    }
}

/// Writes `model` to a new file at `path`.
fn export_model(path: &Path, model: &Model) -> Result<()> {
    let to_error = |source| {
        error!("Cannot export model to {}: {}", path.display(), source);
        LeptonError::ModelExport { path: path.to_path_buf(), source }
    };
    let mut file = BufWriter::new(File::create(path).map_err(to_error)?);
    model
        .serialize(&mut file)
        .and_then(|_| file.flush())
        .map_err(to_error)
}
