// src/encode/decoder.rs

//! Decoder orchestrator: rebuilds the block store from an encoded chunk.

use crate::encode::encoder::CHUNK_MARKER;
use crate::encode::model::position::BlockPosition;
use crate::encode::model::tables::{Model, ProbabilityTableSet};
use crate::encode::tokens::deserialize_tokens;
use crate::encode::vp8::BoolDecoder;
use crate::image::components::{
    BlockStore, Channel, ChannelCursor, ComponentInfo, UncompressedComponents,
};
use crate::utils::error::{LeptonError, Result};
use byteorder::{BigEndian, ReadBytesExt};
use log::{debug, trace};
use std::io::Read;

/// Decodes chunks written by [`Vp8ComponentEncoder`](super::encoder::Vp8ComponentEncoder).
///
/// The decoder must start from the same model the encoder started from.
#[derive(Clone, Default)]
pub struct Vp8ComponentDecoder {
    initial_model: Option<Box<Model>>,
}

impl Vp8ComponentDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_initial_model(mut self, model: Box<Model>) -> Self {
        self.initial_model = Some(model);
        self
    }

    /// Reads one framed chunk from `input` and decodes it into a store shaped by `layout`.
    pub fn decode_chunk<R: Read>(
        &mut self,
        input: &mut R,
        layout: Vec<ComponentInfo>,
    ) -> Result<UncompressedComponents> {
        let marker = input.read_u8()?;
        if marker != CHUNK_MARKER {
            return Err(LeptonError::Stream(format!(
                "expected chunk marker {:#04x}, found {:#04x}",
                CHUNK_MARKER, marker
            )));
        }
        let length = input.read_u32::<BigEndian>()? as usize;
        // the length is untrusted; let the buffer grow only as bytes actually arrive
        let mut payload = Vec::new();
        input.by_ref().take(length as u64).read_to_end(&mut payload)?;
        if payload.len() != length {
            return Err(LeptonError::Stream(format!(
                "chunk claims {} bytes but only {} are present",
                length,
                payload.len()
            )));
        }
        debug!("Decoding {} byte chunk", length);

        let mut store = UncompressedComponents::new(layout)?;
        let channel_count = store.channel_count();
        let mut tables = ProbabilityTableSet::new(self.initial_model.as_deref());
        for &channel in &Channel::ALL[..channel_count] {
            tables.set_quantization_table(channel, *store.quantization_table(channel));
        }

        let mut decoder = BoolDecoder::new(&payload);
        let mut cursors = vec![ChannelCursor::default(); channel_count];
        while let Some(channel) = store.next_channel(&cursors) {
            let cursor = &mut cursors[channel.index()];
            let width = store.block_width(channel);
            trace!("{} row {} at block {}", channel, cursor.row, cursor.position);
            for column in 0..width {
                let index = cursor.position;
                let position = BlockPosition::classify(cursor.row, column, width);
                let block = {
                    let neighbors = store.neighbors(channel, index, position);
                    let (variant, quantization) = tables.select(channel, position);
                    deserialize_tokens(&neighbors, variant, quantization, &mut decoder)
                };
                store.push_block(channel, block)?;
                cursor.advance();
            }
            cursor.row += 1;
        }
        Ok(store)
    }
}
