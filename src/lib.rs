//! A Rust library for losslessly recompressing JPEG coefficient data.
//!
//! A baseline JPEG stores its quantized DCT coefficients with Huffman codes.
//! This crate re-encodes those coefficients with a VP8-style boolean
//! arithmetic coder whose probabilities adapt per context, and decodes them
//! back bit-exactly.
//!
//! # Quick Start
//!
//! ```ignore
//! use lepton_encoder::{EncoderOptions, SwitchableWriter, Vp8ComponentEncoder, Vp8ComponentDecoder};
//!
//! // `components` holds the blocks produced by a JPEG Huffman decoder
//! let mut sink = SwitchableWriter::new(Vec::new());
//! Vp8ComponentEncoder::new(EncoderOptions::new()).encode_chunk(&components, &mut sink)?;
//!
//! let bytes = sink.into_inner();
//! let restored = Vp8ComponentDecoder::new().decode_chunk(&mut bytes.as_slice(), components.layout())?;
//! assert_eq!(restored, components);
//! ```
//!
//! # Features
//!
//! - **Position-aware models**: separate adaptive tables for each channel and
//!   each structural position of a block (corner, top edge, middle, ...)
//! - **Warm start**: a learned model can be exported and reused as the
//!   starting point of later passes
//! - **Diagnostics**: an observer hook reports every context bucket chosen

// Core modules
pub mod encode;
pub mod image;
pub mod io;
pub mod utils;

// Public API
pub use encode::{
    AnnotationWriter, ContextObserver, EncoderOptions, NoopObserver, Vp8ComponentDecoder, Vp8ComponentEncoder,
};
pub use encode::model::Model;
pub use image::{BlockStore, Channel, CoefficientBlock, ComponentInfo, QuantizationTable, UncompressedComponents};
pub use io::{SwitchableWrite, SwitchableWriter};

// Re-export error types for convenience
pub use crate::utils::error::{LeptonError, Result};
