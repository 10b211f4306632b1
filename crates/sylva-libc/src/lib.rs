//! Sylva definitions for the C standard library.
//!
//! Converts a C declaration graph ([`sylva_cdefs::CDefs`]) into Sylva type
//! definitions: aliases, C-layout structs and unions, arrays, function
//! signatures and enumerator constants, rendered as Sylva source text.
//!
//! ## Modules
//!
//! - [`definitions`]: The definition builder and its ordered output
//! - [`target`]: Converted type model and its arena
//! - [`render`]: Sylva syntax for definitions and use-site references
//! - [`builtins`]: C builtin spellings and compiler intrinsics
//! - [`config`]: Builder configuration
//! - [`stdlib`]: Dump loading and conversion in one step
//! - [`error`]: Error types

pub mod builtins;
pub mod config;
pub mod definitions;
pub mod error;
pub mod render;
pub mod stdlib;
pub mod target;

// Re-exports for convenience.
pub use builtins::BuiltinTable;
pub use config::{BuilderConfig, UnresolvedPolicy};
pub use definitions::{convert, DefinitionBuilder, Definitions};
pub use error::{BuildError, Result};
pub use render::{sanitize, Definition, Reference};
pub use stdlib::StdLib;
pub use target::{TargetType, TargetTypes, TypeId};
