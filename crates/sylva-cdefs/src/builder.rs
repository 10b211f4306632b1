//! Declaration graph construction API.
//!
//! `CDefsBuilder` allocates nodes in a [`CDefs`] arena and wires them together
//! by id. Constructors that take a name declare the node at top level; use
//! [`CDefsBuilder::add`] for a named node that should stay nested.
//!
//! # Example
//!
//! ```rust
//! use sylva_cdefs::builder::CDefsBuilder;
//!
//! let mut b = CDefsBuilder::new();
//! let long = b.integer(8, true);
//! let tm = b.structure(Some("struct timespec"), vec![("tv_sec", long), ("tv_nsec", long)]);
//! let graph = b.build();
//!
//! assert_eq!(graph.lookup("struct timespec"), Some(tm));
//! assert_eq!(graph.len(), 1);
//! ```

use crate::graph::CDefs;
use crate::node::{CDef, CDefId, CDefKind, Enumerator, Member};

/// A builder for declaration graphs.
#[derive(Debug, Default)]
pub struct CDefsBuilder {
    graph: CDefs,
}

impl CDefsBuilder {
    /// Create a new empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a node without declaring it at top level.
    pub fn add(&mut self, node: CDef) -> CDefId {
        self.graph.alloc(node)
    }

    /// Declare an existing node under `name`, replacing any earlier declaration.
    pub fn declare(&mut self, name: &str, id: CDefId) {
        self.graph.declare(name, id);
    }

    fn add_declared(&mut self, name: Option<&str>, kind: CDefKind) -> CDefId {
        let id = self.graph.alloc(CDef::new(name.map(str::to_string), kind));
        if let Some(name) = name {
            self.graph.declare(name, id);
        }
        id
    }

    // === Scalars ===

    pub fn void(&mut self) -> CDefId {
        self.add(CDef::anonymous(CDefKind::Void { is_const: false }))
    }

    pub fn bool(&mut self) -> CDefId {
        self.add(CDef::anonymous(CDefKind::Bool {
            size: 1,
            is_const: false,
        }))
    }

    pub fn integer(&mut self, size: u32, is_signed: bool) -> CDefId {
        self.add(CDef::anonymous(CDefKind::Integer {
            size,
            is_signed,
            is_const: false,
            bitfield_width: None,
        }))
    }

    /// An integer member occupying `width` bits.
    pub fn bitfield(&mut self, size: u32, is_signed: bool, width: u32) -> CDefId {
        self.add(CDef::anonymous(CDefKind::Integer {
            size,
            is_signed,
            is_const: false,
            bitfield_width: Some(width),
        }))
    }

    pub fn float(&mut self, size: u32) -> CDefId {
        self.add(CDef::anonymous(CDefKind::FloatingPoint {
            size,
            is_const: false,
        }))
    }

    pub fn complex(&mut self, size: u32) -> CDefId {
        self.add(CDef::anonymous(CDefKind::Complex {
            size,
            is_const: false,
        }))
    }

    /// A const-qualified copy of a scalar, pointer or reference node.
    ///
    /// Other kinds carry no qualifier and are returned unchanged.
    pub fn constant(&mut self, id: CDefId) -> CDefId {
        let Ok(node) = self.graph.get(id) else {
            return id;
        };
        let mut node = node.clone();
        match &mut node.kind {
            CDefKind::Void { is_const }
            | CDefKind::Bool { is_const, .. }
            | CDefKind::Integer { is_const, .. }
            | CDefKind::FloatingPoint { is_const, .. }
            | CDefKind::Complex { is_const, .. }
            | CDefKind::Pointer { is_const, .. }
            | CDefKind::Reference { is_const, .. } => *is_const = true,
            _ => return id,
        }
        self.add(node)
    }

    // === Derived types ===

    pub fn array(&mut self, element: CDefId, count: Option<u64>) -> CDefId {
        self.add(CDef::anonymous(CDefKind::Array { element, count }))
    }

    pub fn named_array(&mut self, name: &str, element: CDefId, count: Option<u64>) -> CDefId {
        self.add_declared(Some(name), CDefKind::Array { element, count })
    }

    pub fn pointer(&mut self, base: CDefId, is_const: bool) -> CDefId {
        self.add(CDef::anonymous(CDefKind::Pointer { base, is_const }))
    }

    /// A named forward link, e.g. `struct tm` or `__builtin_va_list`.
    pub fn reference(&mut self, target: &str, is_const: bool) -> CDefId {
        self.add(CDef::anonymous(CDefKind::Reference {
            target: target.to_string(),
            is_const,
        }))
    }

    pub fn enumeration(
        &mut self,
        name: Option<&str>,
        underlying: CDefId,
        members: &[(&str, i64)],
    ) -> CDefId {
        let members = members
            .iter()
            .map(|(name, value)| Enumerator {
                name: name.to_string(),
                value: *value,
            })
            .collect();
        self.add_declared(
            name,
            CDefKind::Enum {
                underlying,
                members,
            },
        )
    }

    pub fn structure(&mut self, name: Option<&str>, fields: Vec<(&str, CDefId)>) -> CDefId {
        self.add_declared(
            name,
            CDefKind::Struct {
                fields: members(fields),
            },
        )
    }

    pub fn union(&mut self, name: Option<&str>, fields: Vec<(&str, CDefId)>) -> CDefId {
        self.add_declared(
            name,
            CDefKind::Union {
                fields: members(fields),
            },
        )
    }

    pub fn typedef(&mut self, name: &str, target: CDefId) -> CDefId {
        self.add_declared(Some(name), CDefKind::Typedef { target })
    }

    pub fn function(&mut self, name: &str, params: Vec<(&str, CDefId)>, ret: CDefId) -> CDefId {
        self.add_declared(
            Some(name),
            CDefKind::Function {
                params: members(params),
                ret,
            },
        )
    }

    pub fn function_pointer(&mut self, params: Vec<(&str, CDefId)>, ret: CDefId) -> CDefId {
        self.add(CDef::anonymous(CDefKind::FunctionPointer {
            params: members(params),
            ret,
        }))
    }

    pub fn block_function_pointer(&mut self, params: Vec<(&str, CDefId)>, ret: CDefId) -> CDefId {
        self.add(CDef::anonymous(CDefKind::BlockFunctionPointer {
            params: members(params),
            ret,
        }))
    }

    /// Finish construction.
    pub fn build(self) -> CDefs {
        self.graph
    }
}

fn members(pairs: Vec<(&str, CDefId)>) -> Vec<Member> {
    pairs
        .into_iter()
        .map(|(name, ty)| Member::new(name, ty))
        .collect()
}
