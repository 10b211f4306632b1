//! CLI command implementations.

pub mod builtins;
pub mod generate;
