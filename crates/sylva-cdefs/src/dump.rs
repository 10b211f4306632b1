//! Declaration dump parsing.
//!
//! The external C parser writes one dump per header file: a JSON document
//! listing the header's top-level declarations, with nested types inline and
//! forward links expressed as `Reference` nodes.
//!
//! ```json
//! {
//!   "declarations": [
//!     { "kind": "Typedef", "name": "size_t",
//!       "type": { "kind": "Integer", "size": 8, "is_signed": false } },
//!     { "kind": "Struct", "name": "struct tm", "fields": [
//!       { "name": "tm_sec", "type": { "kind": "Integer", "size": 4, "is_signed": true } }
//!     ] }
//!   ]
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::graph::{CDefs, Result};
use crate::node::{CDef, CDefId, CDefKind, Enumerator, Member};

/// The parsed contents of one dump file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dump {
    #[serde(default)]
    pub declarations: Vec<DumpNode>,
}

/// A declaration as written by the parser, children nested inline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DumpNode {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(flatten)]
    pub kind: DumpKind,
}

/// A named member or parameter in a dump.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DumpMember {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: DumpNode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum DumpKind {
    Void {
        #[serde(default)]
        is_const: bool,
    },
    Bool {
        #[serde(default = "default_bool_size")]
        size: u32,
        #[serde(default)]
        is_const: bool,
    },
    Integer {
        size: u32,
        #[serde(default)]
        is_signed: bool,
        #[serde(default)]
        is_const: bool,
        #[serde(default)]
        is_bitfield: bool,
        #[serde(default)]
        bitfield_width: Option<u32>,
    },
    FloatingPoint {
        size: u32,
        #[serde(default)]
        is_const: bool,
    },
    Complex {
        size: u32,
        #[serde(default)]
        is_const: bool,
    },
    Array {
        element: Box<DumpNode>,
        #[serde(default)]
        count: Option<u64>,
    },
    Enum {
        #[serde(rename = "type")]
        underlying: Box<DumpNode>,
        #[serde(default)]
        members: Vec<Enumerator>,
    },
    Struct {
        #[serde(default)]
        fields: Vec<DumpMember>,
    },
    Union {
        #[serde(default)]
        fields: Vec<DumpMember>,
    },
    Typedef {
        #[serde(rename = "type")]
        target: Box<DumpNode>,
    },
    Pointer {
        base: Box<DumpNode>,
        #[serde(default)]
        is_const: bool,
    },
    Reference {
        target: String,
        #[serde(default)]
        is_const: bool,
    },
    Function {
        #[serde(default)]
        params: Vec<DumpMember>,
        #[serde(rename = "return")]
        ret: Box<DumpNode>,
    },
    FunctionPointer {
        #[serde(default)]
        params: Vec<DumpMember>,
        #[serde(rename = "return")]
        ret: Box<DumpNode>,
    },
    BlockFunctionPointer {
        #[serde(default)]
        params: Vec<DumpMember>,
        #[serde(rename = "return")]
        ret: Box<DumpNode>,
    },
}

fn default_bool_size() -> u32 {
    1
}

impl Dump {
    /// Parse a dump from a JSON string.
    pub fn parse(input: &str) -> Result<Self> {
        Ok(serde_json::from_str(input)?)
    }

    /// Parse a dump from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Lower every declaration into `graph`, declaring top-level entries in
    /// order. Unnamed top-level declarations (e.g. `enum { A, B };`) are
    /// declared under a synthetic `<anonymous #N>` key so they still convert.
    pub fn lower_into(&self, graph: &mut CDefs) {
        for decl in &self.declarations {
            let id = lower(decl, graph);
            match &decl.name {
                Some(name) => graph.declare(name, id),
                None => graph.declare(&format!("<anonymous {id}>"), id),
            };
        }
    }

    /// Lower this dump into a fresh graph.
    pub fn into_graph(self) -> CDefs {
        let mut graph = CDefs::new();
        self.lower_into(&mut graph);
        graph
    }
}

fn lower(node: &DumpNode, graph: &mut CDefs) -> CDefId {
    let kind = match &node.kind {
        DumpKind::Void { is_const } => CDefKind::Void {
            is_const: *is_const,
        },
        DumpKind::Bool { size, is_const } => CDefKind::Bool {
            size: *size,
            is_const: *is_const,
        },
        DumpKind::Integer {
            size,
            is_signed,
            is_const,
            is_bitfield,
            bitfield_width,
        } => CDefKind::Integer {
            size: *size,
            is_signed: *is_signed,
            is_const: *is_const,
            bitfield_width: if *is_bitfield { *bitfield_width } else { None },
        },
        DumpKind::FloatingPoint { size, is_const } => CDefKind::FloatingPoint {
            size: *size,
            is_const: *is_const,
        },
        DumpKind::Complex { size, is_const } => CDefKind::Complex {
            size: *size,
            is_const: *is_const,
        },
        DumpKind::Array { element, count } => CDefKind::Array {
            element: lower(element, graph),
            count: *count,
        },
        DumpKind::Enum {
            underlying,
            members,
        } => CDefKind::Enum {
            underlying: lower(underlying, graph),
            members: members.clone(),
        },
        DumpKind::Struct { fields } => CDefKind::Struct {
            fields: lower_members(fields, graph),
        },
        DumpKind::Union { fields } => CDefKind::Union {
            fields: lower_members(fields, graph),
        },
        DumpKind::Typedef { target } => CDefKind::Typedef {
            target: lower(target, graph),
        },
        DumpKind::Pointer { base, is_const } => CDefKind::Pointer {
            base: lower(base, graph),
            is_const: *is_const,
        },
        DumpKind::Reference { target, is_const } => CDefKind::Reference {
            target: target.clone(),
            is_const: *is_const,
        },
        DumpKind::Function { params, ret } => CDefKind::Function {
            params: lower_members(params, graph),
            ret: lower(ret, graph),
        },
        DumpKind::FunctionPointer { params, ret } => CDefKind::FunctionPointer {
            params: lower_members(params, graph),
            ret: lower(ret, graph),
        },
        DumpKind::BlockFunctionPointer { params, ret } => CDefKind::BlockFunctionPointer {
            params: lower_members(params, graph),
            ret: lower(ret, graph),
        },
    };
    graph.alloc(CDef::new(node.name.clone(), kind))
}

fn lower_members(members: &[DumpMember], graph: &mut CDefs) -> Vec<Member> {
    members
        .iter()
        .map(|m| Member::new(m.name.clone(), lower(&m.ty, graph)))
        .collect()
}
