//! VP8 boolean arithmetic coder with count-based adaptive probabilities.

pub mod bool_decoder;
pub mod bool_encoder;
pub mod branch;

pub use bool_decoder::BoolDecoder;
pub use bool_encoder::BoolEncoder;
pub use branch::Branch;
