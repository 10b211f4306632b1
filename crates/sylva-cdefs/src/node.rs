//! Declaration node types.
//!
//! A node is one parsed C declaration: a scalar, a composite, a function
//! signature, or a named forward link to another declaration.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable arena index of a declaration node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CDefId(pub usize);

impl fmt::Display for CDefId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A struct or union member, or a named function parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    pub ty: CDefId,
}

impl Member {
    pub fn new(name: impl Into<String>, ty: CDefId) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// One enumerator of a C enum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enumerator {
    pub name: String,
    pub value: i64,
}

/// The kind of declaration a node represents, with its kind-specific data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CDefKind {
    Void {
        is_const: bool,
    },
    Bool {
        size: u32,
        is_const: bool,
    },
    Integer {
        size: u32,
        is_signed: bool,
        is_const: bool,
        /// Width in bits when the integer is a bitfield member.
        bitfield_width: Option<u32>,
    },
    FloatingPoint {
        size: u32,
        is_const: bool,
    },
    Complex {
        size: u32,
        is_const: bool,
    },
    Array {
        element: CDefId,
        /// `None` for a flexible (unsized) array.
        count: Option<u64>,
    },
    Enum {
        /// The integer representation every enumerator is typed by.
        underlying: CDefId,
        members: Vec<Enumerator>,
    },
    Struct {
        fields: Vec<Member>,
    },
    Union {
        fields: Vec<Member>,
    },
    Typedef {
        target: CDefId,
    },
    Pointer {
        base: CDefId,
        is_const: bool,
    },
    /// A forward link to another declaration by name, e.g. `struct tm`.
    Reference {
        target: String,
        is_const: bool,
    },
    Function {
        params: Vec<Member>,
        ret: CDefId,
    },
    FunctionPointer {
        params: Vec<Member>,
        ret: CDefId,
    },
    BlockFunctionPointer {
        params: Vec<Member>,
        ret: CDefId,
    },
}

impl CDefKind {
    /// Short lowercase label used in diagnostics.
    pub fn label(&self) -> &'static str {
        match self {
            CDefKind::Void { .. } => "void",
            CDefKind::Bool { .. } => "bool",
            CDefKind::Integer { .. } => "integer",
            CDefKind::FloatingPoint { .. } => "floating point",
            CDefKind::Complex { .. } => "complex",
            CDefKind::Array { .. } => "array",
            CDefKind::Enum { .. } => "enum",
            CDefKind::Struct { .. } => "struct",
            CDefKind::Union { .. } => "union",
            CDefKind::Typedef { .. } => "typedef",
            CDefKind::Pointer { .. } => "pointer",
            CDefKind::Reference { .. } => "reference",
            CDefKind::Function { .. } => "function",
            CDefKind::FunctionPointer { .. } => "function pointer",
            CDefKind::BlockFunctionPointer { .. } => "block function pointer",
        }
    }

    /// Whether this is one of the scalar kinds.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            CDefKind::Void { .. }
                | CDefKind::Bool { .. }
                | CDefKind::Integer { .. }
                | CDefKind::FloatingPoint { .. }
                | CDefKind::Complex { .. }
        )
    }

    /// Ids of the nodes nested directly in this one. Named `Reference`
    /// targets are not followed.
    pub fn children(&self) -> Vec<CDefId> {
        match self {
            CDefKind::Void { .. }
            | CDefKind::Bool { .. }
            | CDefKind::Integer { .. }
            | CDefKind::FloatingPoint { .. }
            | CDefKind::Complex { .. }
            | CDefKind::Reference { .. } => Vec::new(),
            CDefKind::Array { element, .. } => vec![*element],
            CDefKind::Enum { underlying, .. } => vec![*underlying],
            CDefKind::Struct { fields } | CDefKind::Union { fields } => {
                fields.iter().map(|field| field.ty).collect()
            }
            CDefKind::Typedef { target } => vec![*target],
            CDefKind::Pointer { base, .. } => vec![*base],
            CDefKind::Function { params, ret }
            | CDefKind::FunctionPointer { params, ret }
            | CDefKind::BlockFunctionPointer { params, ret } => params
                .iter()
                .map(|param| param.ty)
                .chain(std::iter::once(*ret))
                .collect(),
        }
    }
}

/// A declaration node: an optional C name plus its kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CDef {
    pub name: Option<String>,
    pub kind: CDefKind,
}

impl CDef {
    pub fn new(name: Option<String>, kind: CDefKind) -> Self {
        Self { name, kind }
    }

    pub fn anonymous(kind: CDefKind) -> Self {
        Self { name: None, kind }
    }

    pub fn named(name: impl Into<String>, kind: CDefKind) -> Self {
        Self {
            name: Some(name.into()),
            kind,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl fmt::Display for CDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} `{name}`", self.kind.label()),
            None => write!(f, "anonymous {}", self.kind.label()),
        }
    }
}
