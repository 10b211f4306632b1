//! The declaration graph container.
//!
//! Nodes are stored in an arena and addressed by [`CDefId`]. Named top-level
//! declarations form an ordered mapping: redeclaring a name replaces its node
//! but keeps the position the name was first seen at.

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;

use crate::dump::Dump;
use crate::node::{CDef, CDefId, CDefKind, Member};

/// Errors that can occur while building or loading a declaration graph.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("declaration not found: {0}")]
    NodeNotFound(CDefId),

    #[error("invalid declaration dump: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for graph operations.
pub type Result<T> = std::result::Result<T, GraphError>;

/// An ordered, name-indexed collection of C declarations.
#[derive(Debug, Clone, Default)]
pub struct CDefs {
    nodes: Vec<CDef>,
    /// Top-level declarations in first-seen order.
    order: Vec<(String, CDefId)>,
    /// Index: name -> position in `order`.
    index: HashMap<String, usize>,
}

impl CDefs {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and merge several dumps in order; later dumps win on redeclaration.
    pub fn from_dumps<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let mut graph = CDefs::new();
        for path in paths {
            let dump = Dump::load(path.as_ref())?;
            dump.lower_into(&mut graph);
        }
        Ok(graph)
    }

    /// Allocate a node in the arena without declaring it.
    pub fn alloc(&mut self, node: CDef) -> CDefId {
        let id = CDefId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Declare `name` as a top-level declaration for `id`.
    ///
    /// Returns the previously declared node if the name was already taken.
    pub fn declare(&mut self, name: &str, id: CDefId) -> Option<CDefId> {
        match self.index.get(name) {
            Some(&pos) => Some(std::mem::replace(&mut self.order[pos].1, id)),
            None => {
                self.index.insert(name.to_string(), self.order.len());
                self.order.push((name.to_string(), id));
                None
            }
        }
    }

    /// Merge a later graph into this one. Its nodes are re-indexed; its
    /// declarations override same-named ones here.
    pub fn extend(&mut self, other: CDefs) {
        let offset = self.nodes.len();
        let shift = |id: CDefId| CDefId(id.0 + offset);
        for node in other.nodes {
            let kind = match node.kind {
                CDefKind::Array { element, count } => CDefKind::Array {
                    element: shift(element),
                    count,
                },
                CDefKind::Enum {
                    underlying,
                    members,
                } => CDefKind::Enum {
                    underlying: shift(underlying),
                    members,
                },
                CDefKind::Struct { fields } => CDefKind::Struct {
                    fields: shift_members(fields, offset),
                },
                CDefKind::Union { fields } => CDefKind::Union {
                    fields: shift_members(fields, offset),
                },
                CDefKind::Typedef { target } => CDefKind::Typedef {
                    target: shift(target),
                },
                CDefKind::Pointer { base, is_const } => CDefKind::Pointer {
                    base: shift(base),
                    is_const,
                },
                CDefKind::Function { params, ret } => CDefKind::Function {
                    params: shift_members(params, offset),
                    ret: shift(ret),
                },
                CDefKind::FunctionPointer { params, ret } => CDefKind::FunctionPointer {
                    params: shift_members(params, offset),
                    ret: shift(ret),
                },
                CDefKind::BlockFunctionPointer { params, ret } => {
                    CDefKind::BlockFunctionPointer {
                        params: shift_members(params, offset),
                        ret: shift(ret),
                    }
                }
                scalar_or_reference => scalar_or_reference,
            };
            self.nodes.push(CDef::new(node.name, kind));
        }
        for (name, id) in other.order {
            self.declare(&name, shift(id));
        }
    }

    /// Get a node by id.
    pub fn get(&self, id: CDefId) -> Result<&CDef> {
        self.nodes.get(id.0).ok_or(GraphError::NodeNotFound(id))
    }

    /// Look up a top-level declaration by name.
    pub fn lookup(&self, name: &str) -> Option<CDefId> {
        self.index.get(name).map(|&pos| self.order[pos].1)
    }

    /// Iterate top-level declarations in order.
    pub fn top_level(&self) -> impl Iterator<Item = (&str, CDefId)> {
        self.order.iter().map(|(name, id)| (name.as_str(), *id))
    }

    /// Iterate every node in the arena, declared or nested.
    pub fn nodes(&self) -> impl Iterator<Item = (CDefId, &CDef)> {
        self.nodes.iter().enumerate().map(|(i, node)| (CDefId(i), node))
    }

    /// Number of top-level declarations.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Number of nodes in the arena.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

fn shift_members(members: Vec<Member>, offset: usize) -> Vec<Member> {
    members
        .into_iter()
        .map(|m| Member::new(m.name, CDefId(m.ty.0 + offset)))
        .collect()
}
