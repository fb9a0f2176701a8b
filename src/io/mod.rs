//! Output sinks.

pub mod switchable;

pub use switchable::{SwitchableWrite, SwitchableWriter};
