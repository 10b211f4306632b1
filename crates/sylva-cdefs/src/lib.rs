//! Declaration graph for C type declarations.
//!
//! Holds the parsed C declarations a header set contributes: scalars,
//! composites, typedefs, function signatures, and named forward links
//! between them.
//!
//! ## Modules
//!
//! - [`node`]: Declaration node kinds and the `CDefId` arena index
//! - [`graph`]: The ordered, name-indexed `CDefs` container
//! - [`builder`]: Programmatic graph construction
//! - [`dump`]: JSON declaration dumps written by the external C parser

pub mod builder;
pub mod dump;
pub mod graph;
pub mod node;

// Re-export key types for convenience
pub use builder::CDefsBuilder;
pub use dump::Dump;
pub use graph::{CDefs, GraphError};
pub use node::{CDef, CDefId, CDefKind, Enumerator, Member};
