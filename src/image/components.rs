// src/image/components.rs

//! The block store: decoded coefficient blocks for every channel of an image.
//!
//! The entropy coder only needs a narrow view of the store, described by the
//! [`BlockStore`] trait. [`UncompressedComponents`] is the in-memory
//! implementation used by the decoder and by callers that already hold the
//! JPEG's coefficients.

use crate::encode::model::context::Neighbors;
use crate::encode::model::position::BlockPosition;
use crate::image::block::{CoefficientBlock, QuantizationTable};
use crate::utils::error::{LeptonError, Result};
use std::fmt;

/// A color channel of a JPEG image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Y = 0,
    Cb = 1,
    Cr = 2,
}

impl Channel {
    pub const COUNT: usize = 3;
    pub const ALL: [Channel; Channel::COUNT] = [Channel::Y, Channel::Cb, Channel::Cr];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Channel::Y => "Y",
            Channel::Cb => "Cb",
            Channel::Cr => "Cr",
        };
        f.write_str(name)
    }
}

/// Traversal state for one channel during a coding pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ChannelCursor {
    /// Linear index of the next block in the channel's raster.
    pub position: usize,
    /// Index of the row currently being walked.
    pub row: usize,
}

impl ChannelCursor {
    #[inline]
    pub fn advance(&mut self) {
        self.position += 1;
    }
}

/// Read-only access to an image's coefficient blocks.
///
/// Implementors must hold `block_width(ch) * block_height(ch)` blocks per
/// channel in raster order. The coder treats a violation as a bug and panics.
pub trait BlockStore {
    /// Number of channels, 1 to 3.
    fn channel_count(&self) -> usize;

    /// Blocks per row.
    fn block_width(&self, channel: Channel) -> usize;

    /// Number of block rows.
    fn block_height(&self, channel: Channel) -> usize;

    /// The block at linear index `index` of `channel`.
    fn block(&self, channel: Channel, index: usize) -> &CoefficientBlock;

    fn quantization_table(&self, channel: Channel) -> &QuantizationTable;

    /// Picks the channel whose next row should be coded, or `None` when every
    /// channel is exhausted.
    ///
    /// The unfinished channel that is proportionally least advanced wins, ties
    /// going to the lowest channel index. Subsampled chroma rows therefore
    /// interleave with the luma rows covering the same image area.
    fn next_channel(&self, cursors: &[ChannelCursor]) -> Option<Channel> {
        let heights: Vec<usize> = (0..self.channel_count())
            .map(|i| self.block_height(Channel::ALL[i]))
            .collect();
        (0..self.channel_count())
            .filter(|&i| cursors[i].row < heights[i])
            .min_by(|&a, &b| {
                let lhs = cursors[a].row as u128 * heights[b] as u128;
                let rhs = cursors[b].row as u128 * heights[a] as u128;
                lhs.cmp(&rhs)
            })
            .map(|i| Channel::ALL[i])
    }

    /// The causal neighbors of the block at `index`, limited to what `position` makes available.
    fn neighbors(&self, channel: Channel, index: usize, position: BlockPosition) -> Neighbors<'_> {
        let width = self.block_width(channel);
        Neighbors {
            left: position.has_left().then(|| self.block(channel, index - 1)),
            above: position.has_above().then(|| self.block(channel, index - width)),
            above_right: position
                .has_above_right()
                .then(|| self.block(channel, index - width + 1)),
        }
    }
}

/// Geometry and quantization for one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentInfo {
    pub block_width: usize,
    pub block_height: usize,
    pub quantization: QuantizationTable,
}

impl ComponentInfo {
    pub fn new(block_width: usize, block_height: usize, quantization: QuantizationTable) -> Self {
        Self { block_width, block_height, quantization }
    }

    pub fn block_count(&self) -> usize {
        self.block_width * self.block_height
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Component {
    info: ComponentInfo,
    blocks: Vec<CoefficientBlock>,
}

/// In-memory block store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UncompressedComponents {
    components: Vec<Component>,
}

impl UncompressedComponents {
    /// Creates an empty store with the given channel layout (1 to 3 channels).
    pub fn new(layout: Vec<ComponentInfo>) -> Result<Self> {
        if layout.is_empty() || layout.len() > Channel::COUNT {
            return Err(LeptonError::InvalidArg(format!(
                "expected 1 to {} components, got {}",
                Channel::COUNT,
                layout.len()
            )));
        }
        for (i, info) in layout.iter().enumerate() {
            if info.block_width.checked_mul(info.block_height).is_none() {
                return Err(LeptonError::InvalidArg(format!(
                    "component {} of {}x{} blocks is too large",
                    i, info.block_width, info.block_height
                )));
            }
        }
        // blocks grow as they are pushed; the layout may come from an untrusted header
        let components = layout
            .into_iter()
            .map(|info| Component { blocks: Vec::new(), info })
            .collect();
        Ok(Self { components })
    }

    /// Creates a store from complete channels.
    pub fn from_blocks(channels: Vec<(ComponentInfo, Vec<CoefficientBlock>)>) -> Result<Self> {
        let layout = channels.iter().map(|(info, _)| info.clone()).collect();
        let mut store = Self::new(layout)?;
        for (i, (info, blocks)) in channels.into_iter().enumerate() {
            if blocks.len() != info.block_count() {
                return Err(LeptonError::InvalidArg(format!(
                    "component {} expects {} blocks, got {}",
                    i,
                    info.block_count(),
                    blocks.len()
                )));
            }
            store.components[i].blocks = blocks;
        }
        Ok(store)
    }

    /// Appends the next block, in raster order, to `channel`.
    pub fn push_block(&mut self, channel: Channel, block: CoefficientBlock) -> Result<()> {
        let component = self.components.get_mut(channel.index()).ok_or_else(|| {
            LeptonError::InvalidArg(format!("no component for channel {}", channel))
        })?;
        if component.blocks.len() >= component.info.block_count() {
            return Err(LeptonError::InvalidArg(format!(
                "channel {} already holds all {} blocks",
                channel,
                component.info.block_count()
            )));
        }
        component.blocks.push(block);
        Ok(())
    }

    pub fn info(&self, channel: Channel) -> &ComponentInfo {
        &self.components[channel.index()].info
    }

    pub fn layout(&self) -> Vec<ComponentInfo> {
        self.components.iter().map(|c| c.info.clone()).collect()
    }

    pub fn blocks(&self, channel: Channel) -> &[CoefficientBlock] {
        &self.components[channel.index()].blocks
    }

    /// True once every channel holds all of its blocks.
    pub fn is_complete(&self) -> bool {
        self.components
            .iter()
            .all(|c| c.blocks.len() == c.info.block_count())
    }
}

impl BlockStore for UncompressedComponents {
    fn channel_count(&self) -> usize {
        self.components.len()
    }

    fn block_width(&self, channel: Channel) -> usize {
        self.info(channel).block_width
    }

    fn block_height(&self, channel: Channel) -> usize {
        self.info(channel).block_height
    }

    fn block(&self, channel: Channel, index: usize) -> &CoefficientBlock {
        &self.components[channel.index()].blocks[index]
    }

    fn quantization_table(&self, channel: Channel) -> &QuantizationTable {
        &self.info(channel).quantization
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(dims: &[(usize, usize)]) -> Vec<ComponentInfo> {
        dims.iter()
            .map(|&(w, h)| ComponentInfo::new(w, h, QuantizationTable::default()))
            .collect()
    }

    fn visit_order(store: &UncompressedComponents) -> Vec<Channel> {
        let mut cursors = vec![ChannelCursor::default(); store.channel_count()];
        let mut order = Vec::new();
        while let Some(channel) = store.next_channel(&cursors) {
            order.push(channel);
            cursors[channel.index()].row += 1;
        }
        order
    }

    #[test]
    fn test_rejects_bad_channel_count() {
        assert!(UncompressedComponents::new(Vec::new()).is_err());
        assert!(UncompressedComponents::new(layout(&[(1, 1); 4])).is_err());
    }

    #[test]
    fn test_rejects_overflowing_dimensions() {
        let result = UncompressedComponents::new(layout(&[(usize::MAX, 2)]));
        assert!(matches!(result, Err(LeptonError::InvalidArg(_))));
        // a huge but representable layout is accepted without allocating it up front
        let store = UncompressedComponents::new(layout(&[(1 << 20, 1 << 20)])).unwrap();
        assert!(store.blocks(Channel::Y).is_empty());
    }

    #[test]
    fn test_from_blocks_checks_count() {
        let info = ComponentInfo::new(2, 2, QuantizationTable::default());
        let blocks = vec![CoefficientBlock::zeroed(); 3];
        let result = UncompressedComponents::from_blocks(vec![(info, blocks)]);
        assert!(matches!(result, Err(LeptonError::InvalidArg(_))));
    }

    #[test]
    fn test_push_block_stops_at_capacity() {
        let mut store = UncompressedComponents::new(layout(&[(1, 1)])).unwrap();
        assert!(!store.is_complete());
        store.push_block(Channel::Y, CoefficientBlock::zeroed()).unwrap();
        assert!(store.is_complete());
        assert!(store.push_block(Channel::Y, CoefficientBlock::zeroed()).is_err());
        assert!(store.push_block(Channel::Cb, CoefficientBlock::zeroed()).is_err());
    }

    #[test]
    fn test_next_channel_equal_heights_round_robin() {
        let store = UncompressedComponents::new(layout(&[(2, 2), (2, 2), (2, 2)])).unwrap();
        use Channel::*;
        assert_eq!(visit_order(&store), vec![Y, Cb, Cr, Y, Cb, Cr]);
    }

    #[test]
    fn test_zero_width_channel_still_walks_its_rows() {
        let store = UncompressedComponents::new(layout(&[(2, 2), (0, 3)])).unwrap();
        use Channel::*;
        assert_eq!(visit_order(&store), vec![Y, Cb, Cb, Y, Cb]);
    }

    #[test]
    fn test_next_channel_subsampled_chroma() {
        let store = UncompressedComponents::new(layout(&[(4, 4), (2, 2), (2, 2)])).unwrap();
        use Channel::*;
        assert_eq!(visit_order(&store), vec![Y, Cb, Cr, Y, Y, Cb, Cr, Y]);
    }

    #[test]
    fn test_neighbors_follow_position_flags() {
        let info = ComponentInfo::new(3, 2, QuantizationTable::default());
        let blocks = (0..6)
            .map(|i| {
                let mut zz = [0i16; 64];
                zz[0] = i as i16;
                CoefficientBlock::from_zigzag(zz)
            })
            .collect();
        let store = UncompressedComponents::from_blocks(vec![(info, blocks)]).unwrap();

        let n = store.neighbors(Channel::Y, 4, BlockPosition::Middle);
        assert_eq!(n.left.map(|b| b.dc()), Some(3));
        assert_eq!(n.above.map(|b| b.dc()), Some(1));
        assert_eq!(n.above_right.map(|b| b.dc()), Some(2));

        let n = store.neighbors(Channel::Y, 0, BlockPosition::Corner);
        assert!(n.left.is_none() && n.above.is_none() && n.above_right.is_none());

        let n = store.neighbors(Channel::Y, 5, BlockPosition::MidRight);
        assert_eq!(n.left.map(|b| b.dc()), Some(4));
        assert_eq!(n.above.map(|b| b.dc()), Some(2));
        assert!(n.above_right.is_none());
    }
}
