// src/encode/model/tables.rs

//! Adaptive probability tables.
//!
//! A [`Model`] holds every [`Branch`] needed to code one block. Each
//! (channel, structural position) pair owns its own model, so adaptation
//! learned at one position never leaks into another, while all blocks at the
//! same channel and position keep refining the same state across the image.

use crate::encode::model::position::BlockPosition;
use crate::encode::vp8::Branch;
use crate::image::block::{INTERIOR_COUNT, QuantizationTable};
use crate::image::components::Channel;
use crate::utils::error::{LeptonError, Result};
use bytemuck::{Pod, Zeroable};
use std::io::{self, Read, Write};

/// Longest AC magnitude in bits (`i16::MIN` has 16).
pub const MAX_EXPONENT: usize = 16;
/// Longest DC delta in bits (DC minus its prediction spans 17 bits).
pub const DC_MAX_EXPONENT: usize = 17;
pub const NUM_NONZEROS_BUCKETS: usize = 10;
pub const NUM_REMAINING_BUCKETS: usize = 8;
pub const NUM_EXPONENT_BUCKETS: usize = 12;
pub const NUM_DC_BUCKETS: usize = 16;
/// Nodes of the 3-bit tree used for edge nonzero counts and threshold bits.
pub const NUM_TREE3_NODES: usize = 8;
/// Nodes of the 6-bit tree used for the interior nonzero count.
pub const NUM_TREE6_NODES: usize = 64;
/// Coefficients on the two edge strips (first row and first column, DC excluded).
pub const EDGE_COUNT: usize = 14;
pub const NUM_SIGN_CONTEXTS: usize = 3;

/// All adaptive state for one structural position of one channel.
#[derive(Clone, Copy, Pod, Zeroable)]
#[repr(C)]
pub struct Model {
    pub num_nonzeros_7x7: [[Branch; NUM_TREE6_NODES]; NUM_NONZEROS_BUCKETS],
    pub zero_flag_7x7: [[[Branch; 3]; INTERIOR_COUNT]; NUM_REMAINING_BUCKETS],
    pub exponent_7x7: [[[Branch; MAX_EXPONENT - 1]; NUM_EXPONENT_BUCKETS]; INTERIOR_COUNT],
    pub residual_7x7: [[Branch; MAX_EXPONENT - 1]; INTERIOR_COUNT],
    pub sign_7x7: [[Branch; NUM_SIGN_CONTEXTS]; INTERIOR_COUNT],
    pub exponent_dc: [[Branch; DC_MAX_EXPONENT]; NUM_DC_BUCKETS],
    pub residual_dc: [[Branch; DC_MAX_EXPONENT - 1]; NUM_DC_BUCKETS],
    pub sign_dc: [Branch; NUM_DC_BUCKETS],
    pub num_nonzeros_edge: [[[Branch; NUM_TREE3_NODES]; NUM_TREE3_NODES]; 2],
    pub exponent_edge: [[[Branch; MAX_EXPONENT]; NUM_EXPONENT_BUCKETS]; EDGE_COUNT],
    pub threshold_edge: [[[Branch; NUM_TREE3_NODES]; MAX_EXPONENT]; EDGE_COUNT],
    pub residual_edge: [[Branch; MAX_EXPONENT - 1]; EDGE_COUNT],
    pub sign_edge: [[Branch; NUM_SIGN_CONTEXTS]; EDGE_COUNT],
}

impl Model {
    /// Size of a serialized model in bytes.
    pub const SERIALIZED_SIZE: usize = std::mem::size_of::<Model>();

    /// A model where every branch starts at even odds.
    pub fn new_boxed() -> Box<Model> {
        let mut model: Box<Model> = bytemuck::zeroed_box();
        model.branches_mut().fill(Branch::new());
        model
    }

    /// Every branch of the model, flattened.
    pub fn branches(&self) -> &[Branch] {
        bytemuck::cast_slice(std::slice::from_ref(self))
    }

    pub fn branches_mut(&mut self) -> &mut [Branch] {
        bytemuck::cast_slice_mut(std::slice::from_mut(self))
    }

    /// Recomputes every cached probability from its counters.
    pub fn optimize(&mut self) {
        self.branches_mut().iter_mut().for_each(Branch::optimize);
    }

    /// Writes the model's raw bytes.
    pub fn serialize<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(bytemuck::bytes_of(self))
    }

    /// Reads a model written by [`Model::serialize`].
    pub fn load<R: Read>(reader: &mut R) -> Result<Box<Model>> {
        let mut model: Box<Model> = bytemuck::zeroed_box();
        reader.read_exact(bytemuck::bytes_of_mut(&mut *model)).map_err(|e| {
            LeptonError::InvalidArg(format!(
                "model must be {} bytes: {}",
                Self::SERIALIZED_SIZE,
                e
            ))
        })?;
        model.branches_mut().iter_mut().for_each(Branch::sanitize);
        Ok(model)
    }
}

/// One probability table variant: the model for a (channel, position) pair.
#[derive(Clone)]
pub struct ProbabilityTables {
    channel: Channel,
    position: BlockPosition,
    model: Box<Model>,
}

impl ProbabilityTables {
    pub fn new(channel: Channel, position: BlockPosition, initial: Option<&Model>) -> Self {
        let model = match initial {
            Some(m) => Box::new(*m),
            None => Model::new_boxed(),
        };
        Self { channel, position, model }
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn position(&self) -> BlockPosition {
        self.position
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut Model {
        &mut self.model
    }
}

/// The 18 probability table variants of a coding pass plus each channel's
/// quantization table.
pub struct ProbabilityTableSet {
    tables: [[ProbabilityTables; BlockPosition::COUNT]; Channel::COUNT],
    quantization: [QuantizationTable; Channel::COUNT],
}

impl ProbabilityTableSet {
    /// Builds all variants, each starting from a copy of `initial` when given.
    pub fn new(initial: Option<&Model>) -> Self {
        let tables = std::array::from_fn(|c| {
            std::array::from_fn(|p| {
                ProbabilityTables::new(Channel::ALL[c], BlockPosition::ALL[p], initial)
            })
        });
        Self {
            tables,
            quantization: [QuantizationTable::default(); Channel::COUNT],
        }
    }

    pub fn set_quantization_table(&mut self, channel: Channel, table: QuantizationTable) {
        self.quantization[channel.index()] = table;
    }

    pub fn quantization_table(&self, channel: Channel) -> &QuantizationTable {
        &self.quantization[channel.index()]
    }

    pub fn get(&self, channel: Channel, position: BlockPosition) -> &ProbabilityTables {
        &self.tables[channel.index()][position.index()]
    }

    pub fn get_mut(&mut self, channel: Channel, position: BlockPosition) -> &mut ProbabilityTables {
        &mut self.tables[channel.index()][position.index()]
    }

    /// The variant to code with, together with the channel's quantization table.
    pub fn select(
        &mut self,
        channel: Channel,
        position: BlockPosition,
    ) -> (&mut ProbabilityTables, &QuantizationTable) {
        (
            &mut self.tables[channel.index()][position.index()],
            &self.quantization[channel.index()],
        )
    }
}
