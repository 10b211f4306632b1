//! Definition builder error types.

use sylva_cdefs::{CDefId, GraphError};

/// Errors that abort conversion of a declaration graph.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The graph is internally inconsistent (e.g. a dangling node id).
    #[error("declaration graph error: {0}")]
    Graph(#[from] GraphError),

    /// A reference names nothing in the graph or builtin table.
    #[error("unresolved reference `{name}`: not declared by any header and not a known builtin")]
    UnresolvedReference { name: String },

    /// A declaration kind that must be named arrived without a name.
    #[error("{kind} declaration {id} has no name")]
    Unnamed { id: CDefId, kind: &'static str },

    /// Failed to parse a builder configuration file.
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for builder operations.
pub type Result<T> = std::result::Result<T, BuildError>;
