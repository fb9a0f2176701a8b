//! Coefficient blocks and the store that holds them.

pub mod block;
pub mod components;

pub use block::{CoefficientBlock, EdgeDirection, QuantizationTable};
pub use components::{BlockStore, Channel, ChannelCursor, ComponentInfo, UncompressedComponents};
