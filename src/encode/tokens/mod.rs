//! Token serialization: one coefficient block to and from modeled binary decisions.
//!
//! ## Module Map
//!
//! - `serialize` - block to tokens, feeding the `BoolEncoder`
//! - `deserialize` - the exact mirror, driven by the `BoolDecoder`
//!
//! Both sides derive every context from `encode::model::context`, which is
//! what keeps them in lockstep.

pub mod deserialize;
pub mod serialize;

pub use deserialize::deserialize_tokens;
pub use serialize::serialize_tokens;
