//! Tool registry surface: the `Tool` trait lives at `crate::tool`, this
//! module just gathers the concrete, built-in implementations.

pub mod builtin;

pub use crate::tool::{Tool, ToolOutput};
