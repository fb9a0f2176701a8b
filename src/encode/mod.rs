//! Context-adaptive entropy coding of coefficient blocks.
//!
//! ## Module Map
//!
//! - `vp8` - boolean arithmetic coder and adaptive branches
//! - `model` - probability tables, structural positions, context buckets
//! - `tokens` - per-block token serialization and its mirror
//! - `encoder` / `decoder` - whole-image coding passes
//! - `observer` - diagnostic hook into context selection

pub mod decoder;
pub mod encoder;
pub mod model;
pub mod observer;
pub mod tokens;
pub mod vp8;

pub use decoder::Vp8ComponentDecoder;
pub use encoder::{CHUNK_MARKER, EncoderOptions, Vp8ComponentEncoder};
pub use observer::{AnnotationWriter, BlockSite, ContextObserver, NoopObserver, TokenClass};

// Re-export error types for convenience
pub use crate::utils::error::{LeptonError, Result};
