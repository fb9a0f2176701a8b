//! Probability models and the context arithmetic that indexes them.

pub mod context;
pub mod position;
pub mod tables;

pub use context::Neighbors;
pub use position::BlockPosition;
pub use tables::{Model, ProbabilityTableSet, ProbabilityTables};
