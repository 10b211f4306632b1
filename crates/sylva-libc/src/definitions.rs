//! Conversion of a C declaration graph into Sylva definitions.
//!
//! The builder walks the graph's top-level declarations once. Each node is
//! converted at most once (memoized by [`CDefId`]) into the form its referrers
//! mention it by; nodes that yield a nameable definition register it in the
//! output as a side effect, at whatever depth they are reached.
//!
//! Self- and mutually-referential composites are linked through `Reference`
//! nodes. A named composite reserves its memo entry before converting its
//! fields, so a reference back to it resolves to a bare name instead of
//! recursing into its body.
//!
//! # Example
//!
//! ```rust
//! use sylva_cdefs::CDefsBuilder;
//! use sylva_libc::{convert, BuiltinTable, UnresolvedPolicy};
//!
//! let mut b = CDefsBuilder::new();
//! let int = b.integer(4, true);
//! let next = b.reference("struct list", false);
//! let next = b.pointer(next, false);
//! b.structure(Some("struct list"), vec![("value", int), ("next", next)]);
//! let graph = b.build();
//!
//! let defs = convert(&graph, &BuiltinTable::libc(), UnresolvedPolicy::Skip).unwrap();
//! assert_eq!(
//!     defs.get("struct list").unwrap(),
//!     "cstruct struct_list {\n    value: i32,\n    next: cptr(var struct_list),\n}"
//! );
//! ```

use std::collections::{HashMap, HashSet};

use sylva_cdefs::{CDef, CDefId, CDefKind, CDefs, Enumerator, Member};
use tracing::{debug, info, warn};

use crate::builtins::BuiltinTable;
use crate::config::UnresolvedPolicy;
use crate::error::{BuildError, Result};
use crate::render::sanitize;
use crate::target::{
    Alias, Array, Builtin, Composite, CompositeKind, Const, Field, FunctionSignature,
    FunctionType, Pointer, Ref, Scalar, ScalarKind, TargetType, TargetTypes, TypeId,
};

/// Layout metadata some parsers report as a member; never a real field.
const PACKED_MEMBER: &str = "packed";

const ENUM_TAG_PREFIX: &str = "enum ";

/// Size of a C `int`, used when an enum's representation is unknown.
const DEFAULT_ENUM_SIZE: u32 = 4;

/// Ordered output of a conversion: definition name to rendered definition.
///
/// Names are sanitized (`struct tm` is stored as `struct_tm`); lookups accept
/// either spelling.
#[derive(Debug, Clone, Default)]
pub struct Definitions {
    types: TargetTypes,
    entries: Vec<(String, TypeId)>,
    index: HashMap<String, usize>,
    skipped: Vec<String>,
}

impl Definitions {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Definition names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// The converted type registered under `name`.
    pub fn target(&self, name: &str) -> Option<&TargetType> {
        self.index
            .get(&sanitize(name))
            .map(|&pos| self.types.get(self.entries[pos].1))
    }

    /// The rendered definition registered under `name`.
    pub fn get(&self, name: &str) -> Option<String> {
        self.index
            .get(&sanitize(name))
            .and_then(|&pos| self.types.definition(self.entries[pos].1))
    }

    /// `(name, rendered definition)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, String)> {
        self.entries.iter().filter_map(|(name, id)| {
            self.types
                .definition(*id)
                .map(|text| (name.as_str(), text))
        })
    }

    /// Every definition, separated by blank lines.
    pub fn render(&self) -> String {
        let mut out = self
            .iter()
            .map(|(_, text)| text)
            .collect::<Vec<_>>()
            .join("\n\n");
        if !out.is_empty() {
            out.push('\n');
        }
        out
    }

    /// The arena backing every registered definition.
    pub fn types(&self) -> &TargetTypes {
        &self.types
    }

    /// Builtin names dropped during conversion, in first-seen order.
    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }

    fn insert(&mut self, name: String, ty: TypeId) {
        match self.index.get(&name) {
            Some(&pos) => self.entries[pos].1 = ty,
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, ty));
            }
        }
    }
}

/// Converts a declaration graph on first request and caches the result.
pub struct DefinitionBuilder<'g> {
    graph: &'g CDefs,
    builtins: &'g BuiltinTable,
    output: Option<Definitions>,
}

impl<'g> DefinitionBuilder<'g> {
    /// Create a builder over `graph`.
    ///
    /// Under [`UnresolvedPolicy::Reject`], every `Reference` reachable from a
    /// top-level declaration must name a declaration, a builtin or an `enum`
    /// tag, or construction fails.
    pub fn new(
        graph: &'g CDefs,
        builtins: &'g BuiltinTable,
        policy: UnresolvedPolicy,
    ) -> Result<Self> {
        if policy == UnresolvedPolicy::Reject {
            check_references(graph, builtins)?;
        }
        Ok(Self {
            graph,
            builtins,
            output: None,
        })
    }

    /// The converted definitions. Converts on the first call only.
    pub fn definitions(&mut self) -> Result<&Definitions> {
        let defs = match self.output.take() {
            Some(defs) => defs,
            None => Converter::new(self.graph, self.builtins).run()?,
        };
        Ok(self.output.insert(defs))
    }

    /// Consume the builder, converting if that has not happened yet.
    pub fn into_definitions(mut self) -> Result<Definitions> {
        match self.output.take() {
            Some(defs) => Ok(defs),
            None => Converter::new(self.graph, self.builtins).run(),
        }
    }
}

/// Convert `graph` in one call.
pub fn convert(
    graph: &CDefs,
    builtins: &BuiltinTable,
    policy: UnresolvedPolicy,
) -> Result<Definitions> {
    DefinitionBuilder::new(graph, builtins, policy)?.into_definitions()
}

/// Checks the references reachable from top-level declarations. Undeclared
/// `enum` tags pass, as conversion widens them to an integer.
fn check_references(graph: &CDefs, builtins: &BuiltinTable) -> Result<()> {
    // Reversed so the first offending reference in declaration order is reported.
    let mut pending: Vec<CDefId> = graph.top_level().map(|(_, id)| id).collect();
    pending.reverse();
    let mut seen = HashSet::new();
    while let Some(id) = pending.pop() {
        if !seen.insert(id) {
            continue;
        }
        let node = graph.get(id)?;
        if let CDefKind::Reference { target, .. } = &node.kind {
            let known = graph.lookup(target).is_some()
                || builtins.contains(target)
                || target.starts_with(ENUM_TAG_PREFIX);
            if !known {
                return Err(BuildError::UnresolvedReference {
                    name: target.clone(),
                });
            }
        }
        pending.extend(node.kind.children().into_iter().rev());
    }
    Ok(())
}

/// Conversion state for one pass over a graph.
struct Converter<'g> {
    graph: &'g CDefs,
    builtins: &'g BuiltinTable,
    out: Definitions,
    /// Node -> the form its referrers use; `None` when it was dropped.
    memo: HashMap<CDefId, Option<TypeId>>,
    /// Definition name -> node that registered it.
    owners: HashMap<String, CDefId>,
    /// `Reference` nodes whose target is being resolved.
    resolving: HashSet<CDefId>,
    skipped: HashSet<String>,
}

impl<'g> Converter<'g> {
    fn new(graph: &'g CDefs, builtins: &'g BuiltinTable) -> Self {
        Self {
            graph,
            builtins,
            out: Definitions::default(),
            memo: HashMap::new(),
            owners: HashMap::new(),
            resolving: HashSet::new(),
            skipped: HashSet::new(),
        }
    }

    fn run(mut self) -> Result<Definitions> {
        let graph = self.graph;
        for (_, id) in graph.top_level() {
            self.convert(id)?;
        }
        info!(
            definitions = self.out.len(),
            skipped = self.out.skipped.len(),
            "converted declaration graph"
        );
        Ok(self.out)
    }

    fn alloc(&mut self, ty: TargetType) -> TypeId {
        self.out.types.alloc(ty)
    }

    fn convert(&mut self, id: CDefId) -> Result<Option<TypeId>> {
        if let Some(&converted) = self.memo.get(&id) {
            return Ok(converted);
        }
        let graph = self.graph;
        let node = graph.get(id)?;
        let converted = match &node.kind {
            CDefKind::Void { .. }
            | CDefKind::Bool { .. }
            | CDefKind::Integer { .. }
            | CDefKind::FloatingPoint { .. }
            | CDefKind::Complex { .. } => self.scalar(node, false),
            CDefKind::Array { element, count } => {
                self.array(id, node, *element, *count, false)?
            }
            CDefKind::Enum {
                underlying,
                members,
            } => self.enumeration(id, *underlying, members)?,
            CDefKind::Struct { fields } => {
                self.composite(id, node, CompositeKind::Struct, fields)?
            }
            CDefKind::Union { fields } => self.composite(id, node, CompositeKind::Union, fields)?,
            CDefKind::Typedef { target } => self.typedef(id, node, *target)?,
            CDefKind::Pointer { base, is_const } => match self.convert(*base)? {
                Some(base) => Some(self.alloc(TargetType::Pointer(Pointer {
                    base,
                    is_const: *is_const,
                }))),
                None => None,
            },
            CDefKind::Reference { target, is_const } => {
                if !self.resolving.insert(id) {
                    info!(reference = %target, "dropping forward declaration that resolves to itself");
                    self.record_skipped(target);
                    return Ok(None);
                }
                let resolved = self.resolve(target, *is_const);
                self.resolving.remove(&id);
                resolved?
            }
            CDefKind::Function { params, ret } => self.function(id, node, params, *ret)?,
            CDefKind::FunctionPointer { params, ret } => {
                self.function_type(params, *ret, false)?
            }
            CDefKind::BlockFunctionPointer { params, ret } => {
                self.function_type(params, *ret, true)?
            }
        };
        self.memo.insert(id, converted);
        Ok(converted)
    }

    /// Bitfield widths survive only when `as_member` is set.
    fn scalar(&mut self, node: &CDef, as_member: bool) -> Option<TypeId> {
        let scalar = match node.kind {
            CDefKind::Void { is_const } => Scalar::new(ScalarKind::Void, 0).constant(is_const),
            CDefKind::Bool { size, is_const } => {
                Scalar::new(ScalarKind::Bool, size).constant(is_const)
            }
            CDefKind::Integer {
                size,
                is_signed,
                is_const,
                bitfield_width,
            } => Scalar::new(ScalarKind::Integer, size)
                .signed(is_signed)
                .constant(is_const)
                .bitfield(if as_member { bitfield_width } else { None }),
            CDefKind::FloatingPoint { size, is_const } => {
                Scalar::new(ScalarKind::Float, size).constant(is_const)
            }
            CDefKind::Complex { size, is_const } => {
                Scalar::new(ScalarKind::Complex, size).constant(is_const)
            }
            _ => return None,
        };
        Some(self.alloc(TargetType::Scalar(scalar)))
    }

    fn array(
        &mut self,
        id: CDefId,
        node: &CDef,
        element: CDefId,
        count: Option<u64>,
        inline: bool,
    ) -> Result<Option<TypeId>> {
        let Some(element) = self.convert(element)? else {
            return Ok(None);
        };
        let name = if inline { None } else { node.name.clone() };
        let array = self.alloc(TargetType::Array(Array {
            name: name.clone(),
            element,
            count,
        }));
        if let Some(name) = &name {
            self.register(name, array, id);
        }
        Ok(Some(array))
    }

    /// Registers one constant per enumerator; referrers see the underlying
    /// integer type.
    fn enumeration(
        &mut self,
        id: CDefId,
        underlying: CDefId,
        members: &[Enumerator],
    ) -> Result<Option<TypeId>> {
        let Some(ty) = self.convert(underlying)? else {
            return Ok(None);
        };
        for member in members {
            let constant = self.alloc(TargetType::Const(Const {
                name: member.name.clone(),
                ty,
                value: member.value,
            }));
            self.register(&member.name, constant, id);
        }
        Ok(Some(ty))
    }

    fn composite(
        &mut self,
        id: CDefId,
        node: &CDef,
        kind: CompositeKind,
        fields: &[Member],
    ) -> Result<Option<TypeId>> {
        let Some(name) = node.name() else {
            let fields = self.fields("<anonymous>", fields)?;
            return Ok(Some(self.alloc(TargetType::Composite(Composite {
                kind,
                name: None,
                fields,
            }))));
        };

        let slot = self.alloc(TargetType::Composite(Composite {
            kind,
            name: Some(name.to_string()),
            fields: Vec::new(),
        }));
        self.memo.insert(id, Some(slot));

        let converted = self.fields(name, fields)?;
        if let TargetType::Composite(composite) = self.out.types.get_mut(slot) {
            composite.fields = converted;
        }
        self.register(name, slot, id);
        Ok(Some(slot))
    }

    fn fields(&mut self, owner: &str, fields: &[Member]) -> Result<Vec<Field>> {
        let mut converted = Vec::with_capacity(fields.len());
        for member in fields {
            if member.name == PACKED_MEMBER {
                debug!(owner, "skipping packed layout marker");
                continue;
            }
            match self.member(member)? {
                Some(ty) => converted.push(Field {
                    name: member.name.clone(),
                    ty,
                }),
                None => warn!(owner, member = %member.name, "omitting member of undefined builtin type"),
            }
        }
        Ok(converted)
    }

    fn member(&mut self, member: &Member) -> Result<Option<TypeId>> {
        let graph = self.graph;
        let node = graph.get(member.ty)?;
        if let CDefKind::Integer {
            bitfield_width: Some(_),
            ..
        } = node.kind
        {
            return Ok(self.scalar(node, true));
        }
        self.convert(member.ty)
    }

    /// `f(void)` may arrive as a single unnamed `void` parameter.
    fn signature_params<'p>(&self, params: &'p [Member]) -> Result<&'p [Member]> {
        if let [only] = params {
            if matches!(self.graph.get(only.ty)?.kind, CDefKind::Void { .. }) {
                return Ok(&[]);
            }
        }
        Ok(params)
    }

    fn function(
        &mut self,
        id: CDefId,
        node: &CDef,
        params: &[Member],
        ret: CDefId,
    ) -> Result<Option<TypeId>> {
        let name = node.name().ok_or(BuildError::Unnamed {
            id,
            kind: node.kind.label(),
        })?;
        let params = self.signature_params(params)?;
        let mut converted = Vec::with_capacity(params.len());
        for param in params {
            let Some(ty) = self.convert(param.ty)? else {
                info!(function = name, param = %param.name, "skipping function with undefined builtin parameter");
                return Ok(None);
            };
            converted.push(Field {
                name: param.name.clone(),
                ty,
            });
        }
        let Some(ret) = self.convert(ret)? else {
            info!(function = name, "skipping function with undefined builtin return type");
            return Ok(None);
        };
        let signature = self.alloc(TargetType::FunctionSignature(FunctionSignature {
            name: name.to_string(),
            params: converted,
            ret,
        }));
        self.register(name, signature, id);
        Ok(Some(signature))
    }

    fn function_type(
        &mut self,
        params: &[Member],
        ret: CDefId,
        is_block: bool,
    ) -> Result<Option<TypeId>> {
        let params = self.signature_params(params)?;
        let mut converted = Vec::with_capacity(params.len());
        for param in params {
            let Some(ty) = self.convert(param.ty)? else {
                return Ok(None);
            };
            converted.push(ty);
        }
        let Some(ret) = self.convert(ret)? else {
            return Ok(None);
        };
        Ok(Some(self.alloc(TargetType::FunctionType(FunctionType {
            params: converted,
            ret,
            is_block,
        }))))
    }

    fn typedef(&mut self, id: CDefId, node: &CDef, target: CDefId) -> Result<Option<TypeId>> {
        let name = node.name().ok_or(BuildError::Unnamed {
            id,
            kind: node.kind.label(),
        })?;
        let graph = self.graph;
        let target_node = graph.get(target)?;
        let aliased = match &target_node.kind {
            // No enumerated-integer type in Sylva: enum typedefs widen to a
            // signed integer of the enum's size.
            CDefKind::Reference { target: tag, .. } => match self.enum_size(tag)? {
                Some(size) => Some(self.signed_integer(size)),
                None => self.convert(target)?,
            },
            CDefKind::Enum { underlying, .. } => {
                self.convert(target)?;
                let size = self.integer_size(*underlying)?;
                Some(self.signed_integer(size))
            }
            // A named array would register a second definition under the
            // typedef's name.
            CDefKind::Array { element, count } if target_node.name.is_some() => {
                self.array(target, target_node, *element, *count, true)?
            }
            _ => self.convert(target)?,
        };
        let Some(aliased) = aliased else {
            info!(typedef = name, "dropping typedef of undefined builtin");
            return Ok(None);
        };
        let alias = self.alloc(TargetType::Alias(Alias {
            name: name.to_string(),
            target: aliased,
        }));
        self.register(name, alias, id);
        Ok(Some(self.alloc(TargetType::Ref(Ref {
            target: name.to_string(),
            is_const: false,
        }))))
    }

    /// Size of the enum `tag` names, if it names one.
    fn enum_size(&self, tag: &str) -> Result<Option<u32>> {
        match self.graph.lookup(tag) {
            Some(resolved) => match &self.graph.get(resolved)?.kind {
                CDefKind::Enum { underlying, .. } => Ok(Some(self.integer_size(*underlying)?)),
                _ => Ok(None),
            },
            None if tag.starts_with(ENUM_TAG_PREFIX) => Ok(Some(DEFAULT_ENUM_SIZE)),
            None => Ok(None),
        }
    }

    fn integer_size(&self, id: CDefId) -> Result<u32> {
        match self.graph.get(id)?.kind {
            CDefKind::Integer { size, .. } => Ok(size),
            _ => Ok(DEFAULT_ENUM_SIZE),
        }
    }

    fn signed_integer(&mut self, size: u32) -> TypeId {
        self.alloc(TargetType::Scalar(
            Scalar::new(ScalarKind::Integer, size).signed(true),
        ))
    }

    fn resolve(&mut self, target: &str, is_const: bool) -> Result<Option<TypeId>> {
        let graph = self.graph;
        if let Some(resolved) = graph.lookup(target) {
            let node = graph.get(resolved)?;
            let Some(form) = self.convert(resolved)? else {
                return Ok(None);
            };
            let registered = matches!(
                node.kind,
                CDefKind::Struct { .. }
                    | CDefKind::Union { .. }
                    | CDefKind::Typedef { .. }
                    | CDefKind::Function { .. }
                    | CDefKind::Array { .. }
            );
            let qualified = match (node.name(), self.out.types.get(form)) {
                (Some(name), _) if registered => TargetType::Ref(Ref {
                    target: name.to_string(),
                    is_const,
                }),
                // Enums are shared through their underlying scalar.
                (_, TargetType::Scalar(scalar)) if is_const && !scalar.is_const => {
                    TargetType::Scalar(scalar.clone().constant(true))
                }
                _ => return Ok(Some(form)),
            };
            return Ok(Some(self.alloc(qualified)));
        }
        if let Some(primitive) = self.builtins.primitive(target) {
            return Ok(Some(self.alloc(TargetType::Builtin(Builtin {
                primitive: primitive.to_string(),
                is_const,
            }))));
        }
        if target.starts_with(ENUM_TAG_PREFIX) {
            debug!(reference = target, "widening undeclared enum tag");
            let int = Scalar::new(ScalarKind::Integer, DEFAULT_ENUM_SIZE)
                .signed(true)
                .constant(is_const);
            return Ok(Some(self.alloc(TargetType::Scalar(int))));
        }
        self.skip(target);
        Ok(None)
    }

    fn skip(&mut self, name: &str) {
        if !self.record_skipped(name) {
            return;
        }
        if self.builtins.is_intrinsic(name) {
            info!(reference = name, "found builtin");
        } else {
            info!(reference = name, "treating undeclared name as a builtin");
        }
    }

    /// Returns whether `name` was newly recorded.
    fn record_skipped(&mut self, name: &str) -> bool {
        if !self.skipped.insert(name.to_string()) {
            return false;
        }
        self.out.skipped.push(name.to_string());
        true
    }

    fn register(&mut self, name: &str, ty: TypeId, source: CDefId) {
        let key = sanitize(name);
        if let Some(previous) = self.owners.insert(key.clone(), source) {
            if previous != source {
                warn!(definition = %key, "definition replaced by a later declaration");
            }
        }
        debug!(definition = %key, "registered definition");
        self.out.insert(key, ty);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sylva_cdefs::{CDefsBuilder, GraphError};

    fn convert_graph(graph: &CDefs) -> Definitions {
        convert(graph, &BuiltinTable::libc(), UnresolvedPolicy::Skip).unwrap()
    }

    fn names(defs: &Definitions) -> Vec<&str> {
        defs.names().collect()
    }

    #[test]
    fn typedef_of_scalar() {
        let mut b = CDefsBuilder::new();
        let ulong = b.integer(8, false);
        b.typedef("size_t", ulong);
        let defs = convert_graph(&b.build());
        assert_eq!(defs.get("size_t").unwrap(), "alias size_t: u64");
    }

    #[test]
    fn scalar_families() {
        let mut b = CDefsBuilder::new();
        let flag = b.bool();
        let real = b.float(8);
        let wide = b.float(16);
        let cplx = b.complex(16);
        b.structure(
            Some("struct sample"),
            vec![("ok", flag), ("x", real), ("y", wide), ("z", cplx)],
        );
        let defs = convert_graph(&b.build());
        assert_eq!(
            defs.get("struct sample").unwrap(),
            "cstruct struct_sample {\n    ok: bool,\n    x: f64,\n    y: f128,\n    z: c128,\n}"
        );
    }

    #[test]
    fn enum_decomposes_into_constants() {
        let mut b = CDefsBuilder::new();
        let uint = b.integer(4, false);
        b.enumeration(
            Some("enum color"),
            uint,
            &[("RED", 0), ("GREEN", 1), ("BLUE", 2)],
        );
        let defs = convert_graph(&b.build());

        assert_eq!(names(&defs), vec!["RED", "GREEN", "BLUE"]);
        assert_eq!(defs.get("RED").unwrap(), "const RED: u32 = 0");
        assert_eq!(defs.get("BLUE").unwrap(), "const BLUE: u32 = 2");
        assert!(defs.get("enum color").is_none());
    }

    #[test]
    fn enum_field_uses_underlying_integer() {
        let mut b = CDefsBuilder::new();
        let uint = b.integer(4, false);
        b.enumeration(Some("enum mode"), uint, &[("ON", 1)]);
        let mode = b.reference("enum mode", false);
        b.structure(Some("struct dev"), vec![("mode", mode)]);
        let defs = convert_graph(&b.build());
        assert_eq!(
            defs.get("struct dev").unwrap(),
            "cstruct struct_dev {\n    mode: u32,\n}"
        );
    }

    #[test]
    fn member_order_is_declaration_order() {
        let mut b = CDefsBuilder::new();
        let int = b.integer(4, true);
        let chr = b.integer(1, true);
        b.structure(Some("struct s"), vec![("z", int), ("a", chr), ("m", int)]);
        b.union(Some("union u"), vec![("y", chr), ("b", int)]);
        b.function("f", vec![("second", int), ("first", chr)], int);
        b.structure(Some("struct empty"), vec![]);
        let defs = convert_graph(&b.build());

        assert_eq!(
            defs.get("struct s").unwrap(),
            "cstruct struct_s {\n    z: i32,\n    a: i8,\n    m: i32,\n}"
        );
        assert_eq!(
            defs.get("union u").unwrap(),
            "cunion union_u {\n    y: i8,\n    b: i32,\n}"
        );
        assert_eq!(defs.get("f").unwrap(), "cfn f(second: i32, first: i8): i32");
        assert_eq!(defs.get("struct empty").unwrap(), "cstruct struct_empty {}");
    }

    #[test]
    fn self_referential_struct() {
        let mut b = CDefsBuilder::new();
        let int = b.integer(4, true);
        let link = b.reference("struct node", false);
        let next = b.pointer(link, false);
        b.structure(Some("struct node"), vec![("value", int), ("next", next)]);
        let defs = convert_graph(&b.build());

        assert_eq!(names(&defs), vec!["struct_node"]);
        assert_eq!(
            defs.get("struct node").unwrap(),
            "cstruct struct_node {\n    value: i32,\n    next: cptr(var struct_node),\n}"
        );
    }

    #[test]
    fn mutually_referential_structs() {
        let mut b = CDefsBuilder::new();
        let to_b = b.reference("struct b", false);
        let to_b = b.pointer(to_b, false);
        let to_a = b.reference("struct a", true);
        let to_a = b.pointer(to_a, false);
        b.structure(Some("struct a"), vec![("b", to_b)]);
        b.structure(Some("struct b"), vec![("a", to_a)]);
        let defs = convert_graph(&b.build());

        // `struct b` finishes converting first.
        assert_eq!(names(&defs), vec!["struct_b", "struct_a"]);
        assert_eq!(
            defs.get("struct a").unwrap(),
            "cstruct struct_a {\n    b: cptr(var struct_b),\n}"
        );
        assert_eq!(
            defs.get("struct b").unwrap(),
            "cstruct struct_b {\n    a: cptr(struct_a),\n}"
        );
    }

    #[test]
    fn anonymous_struct_is_inlined() {
        let mut b = CDefsBuilder::new();
        let int = b.integer(4, true);
        let inner = b.structure(None, vec![("a", int), ("b", int)]);
        b.structure(Some("struct outer"), vec![("inner", inner), ("c", int)]);
        let defs = convert_graph(&b.build());

        assert_eq!(names(&defs), vec!["struct_outer"]);
        assert_eq!(
            defs.get("struct outer").unwrap(),
            "cstruct struct_outer {\n    inner: cstruct { a: i32, b: i32 },\n    c: i32,\n}"
        );
    }

    #[test]
    fn nested_named_struct_surfaces() {
        let mut b = CDefsBuilder::new();
        let int = b.integer(4, true);
        let inner = b.add(CDef::named(
            "struct inner",
            CDefKind::Struct {
                fields: vec![Member::new("x", int)],
            },
        ));
        b.structure(Some("struct outer"), vec![("i", inner)]);
        let defs = convert_graph(&b.build());

        assert_eq!(names(&defs), vec!["struct_inner", "struct_outer"]);
        assert_eq!(
            defs.get("struct outer").unwrap(),
            "cstruct struct_outer {\n    i: struct_inner,\n}"
        );
    }

    #[test]
    fn void_and_value_returning_functions() {
        let mut b = CDefsBuilder::new();
        let void = b.void();
        let int = b.integer(4, true);
        b.function("foo", vec![("x", int)], void);
        b.function("bar", vec![], int);
        b.function("baz", vec![("", void)], int);
        let defs = convert_graph(&b.build());

        assert_eq!(defs.get("foo").unwrap(), "cfn foo(x: i32)");
        assert_eq!(defs.get("bar").unwrap(), "cfn bar(): i32");
        assert_eq!(defs.get("baz").unwrap(), "cfn baz(): i32");
    }

    #[test]
    fn builtin_reference_is_dropped() {
        let mut b = CDefsBuilder::new();
        let va = b.reference("__builtin_va_list", false);
        b.typedef("__gnuc_va_list", va);
        let int = b.integer(4, true);
        let chr = b.integer(1, true);
        let chr = b.constant(chr);
        let fmt = b.pointer(chr, false);
        let ap = b.reference("__gnuc_va_list", false);
        b.function("vprintf", vec![("fmt", fmt), ("ap", ap)], int);
        b.function("puts", vec![("s", fmt)], int);
        let defs = convert_graph(&b.build());

        assert_eq!(names(&defs), vec!["puts"]);
        assert_eq!(defs.skipped(), ["__builtin_va_list".to_string()]);
        assert_eq!(defs.get("puts").unwrap(), "cfn puts(s: cptr(i8)): i32");
    }

    #[test]
    fn member_of_dropped_type_is_omitted() {
        let mut b = CDefsBuilder::new();
        let int = b.integer(4, true);
        let opaque = b.reference("__uint128_t", false);
        b.structure(Some("struct wide"), vec![("lo", int), ("big", opaque), ("hi", int)]);
        let defs = convert_graph(&b.build());
        assert_eq!(
            defs.get("struct wide").unwrap(),
            "cstruct struct_wide {\n    lo: i32,\n    hi: i32,\n}"
        );
    }

    #[test]
    fn builtin_spelling_resolves_to_primitive() {
        let mut b = CDefsBuilder::new();
        let uint = b.reference("unsigned int", false);
        b.typedef("uint_t", uint);
        let defs = convert_graph(&b.build());
        assert_eq!(defs.get("uint_t").unwrap(), "alias uint_t: cuint");
    }

    #[test]
    fn typedef_to_enum_widens() {
        let mut b = CDefsBuilder::new();
        let uint = b.integer(4, false);
        b.enumeration(Some("enum color"), uint, &[("RED", 0)]);
        let tag = b.reference("enum color", false);
        b.typedef("color_t", tag);
        let undeclared = b.reference("enum missing", false);
        b.typedef("missing_t", undeclared);
        let defs = convert_graph(&b.build());

        assert_eq!(defs.get("color_t").unwrap(), "alias color_t: i32");
        assert_eq!(defs.get("missing_t").unwrap(), "alias missing_t: i32");
        assert!(defs.skipped().is_empty());
    }

    #[test]
    fn typedef_of_inline_enum() {
        let mut b = CDefsBuilder::new();
        let ushort = b.integer(2, false);
        let inline = b.enumeration(None, ushort, &[("A", 0), ("B", 1)]);
        b.typedef("ab_t", inline);
        let defs = convert_graph(&b.build());

        assert_eq!(names(&defs), vec!["A", "B", "ab_t"]);
        assert_eq!(defs.get("ab_t").unwrap(), "alias ab_t: i16");
        assert_eq!(defs.get("A").unwrap(), "const A: u16 = 0");
    }

    #[test]
    fn typedef_of_named_array_is_anonymous() {
        let mut b = CDefsBuilder::new();
        let long = b.integer(8, true);
        let buf = b.add(CDef::named(
            "jmp_buf",
            CDefKind::Array {
                element: long,
                count: Some(8),
            },
        ));
        b.typedef("jmp_buf", buf);
        let defs = convert_graph(&b.build());

        assert_eq!(names(&defs), vec!["jmp_buf"]);
        assert_eq!(defs.get("jmp_buf").unwrap(), "alias jmp_buf: [i64 * 8]");
    }

    #[test]
    fn named_and_flexible_arrays() {
        let mut b = CDefsBuilder::new();
        let byte = b.integer(1, false);
        b.named_array("sigset", byte, Some(128));
        let tail = b.array(byte, None);
        let int = b.integer(4, true);
        b.structure(Some("struct msg"), vec![("len", int), ("data", tail)]);
        let defs = convert_graph(&b.build());

        assert_eq!(defs.get("sigset").unwrap(), "carray sigset: [u8 * 128]");
        assert_eq!(
            defs.get("struct msg").unwrap(),
            "cstruct struct_msg {\n    len: i32,\n    data: [u8 * _],\n}"
        );
    }

    #[test]
    fn bitfields_only_on_members() {
        let mut b = CDefsBuilder::new();
        let flag = b.bitfield(4, false, 3);
        let int = b.integer(4, true);
        b.structure(Some("struct flags"), vec![("mode", flag), ("count", int)]);
        b.typedef("mode_t", flag);
        let defs = convert_graph(&b.build());

        assert_eq!(
            defs.get("struct flags").unwrap(),
            "cstruct struct_flags {\n    mode: cbitfield(u32, 3),\n    count: i32,\n}"
        );
        assert_eq!(defs.get("mode_t").unwrap(), "alias mode_t: u32");
    }

    #[test]
    fn packed_marker_is_excluded() {
        let mut b = CDefsBuilder::new();
        let int = b.integer(4, true);
        b.structure(Some("struct p"), vec![("a", int), ("packed", int), ("b", int)]);
        let defs = convert_graph(&b.build());
        assert_eq!(
            defs.get("struct p").unwrap(),
            "cstruct struct_p {\n    a: i32,\n    b: i32,\n}"
        );
    }

    #[test]
    fn function_pointers() {
        let mut b = CDefsBuilder::new();
        let void = b.void();
        let int = b.integer(4, true);
        let handler = b.function_pointer(vec![("sig", int)], void);
        let handler = b.pointer(handler, false);
        b.typedef("sighandler_t", handler);
        let block = b.block_function_pointer(vec![("", int), ("", int)], int);
        b.typedef("cmp_block_t", block);
        let defs = convert_graph(&b.build());

        assert_eq!(
            defs.get("sighandler_t").unwrap(),
            "alias sighandler_t: cptr(var cfntype(i32))"
        );
        assert_eq!(
            defs.get("cmp_block_t").unwrap(),
            "alias cmp_block_t: cblockfntype(i32, i32): i32"
        );
    }

    #[test]
    fn references_keep_constness() {
        let mut b = CDefsBuilder::new();
        let int = b.integer(4, true);
        b.structure(Some("struct tm"), vec![("tm_sec", int)]);
        let tm = b.reference("struct tm", true);
        let tm = b.pointer(tm, false);
        let out = b.reference("struct tm", false);
        let out = b.pointer(out, false);
        let long = b.integer(8, true);
        b.function("mktime", vec![("tm", out)], long);
        b.function("asctime_r", vec![("tm", tm)], long);
        let defs = convert_graph(&b.build());

        assert_eq!(defs.get("mktime").unwrap(), "cfn mktime(tm: cptr(var struct_tm)): i64");
        assert_eq!(defs.get("asctime_r").unwrap(), "cfn asctime_r(tm: cptr(struct_tm)): i64");
    }

    #[test]
    fn typedef_reference_renders_alias_name() {
        let mut b = CDefsBuilder::new();
        let ulong = b.integer(8, false);
        b.typedef("size_t", ulong);
        let size = b.reference("size_t", false);
        let void = b.void();
        let ptr = b.pointer(void, false);
        b.function("malloc", vec![("size", size)], ptr);
        let defs = convert_graph(&b.build());
        assert_eq!(defs.get("malloc").unwrap(), "cfn malloc(size: size_t): cptr(var void)");
    }

    #[test]
    fn conversion_is_idempotent() {
        let mut b = CDefsBuilder::new();
        let int = b.integer(4, true);
        let link = b.reference("struct node", false);
        let next = b.pointer(link, false);
        b.structure(Some("struct node"), vec![("value", int), ("next", next)]);
        b.enumeration(Some("enum e"), int, &[("X", 7)]);
        let graph = b.build();
        let table = BuiltinTable::libc();

        let mut builder = DefinitionBuilder::new(&graph, &table, UnresolvedPolicy::Skip).unwrap();
        let first = builder.definitions().unwrap().render();
        let second = builder.definitions().unwrap().render();
        assert_eq!(first, second);
        assert_eq!(first, convert_graph(&graph).render());
        assert!(first.ends_with("const X: i32 = 7\n"));
    }

    #[test]
    fn reject_policy_fails_on_unknown_names() {
        let mut b = CDefsBuilder::new();
        let mystery = b.reference("mystery_t", false);
        b.typedef("m_t", mystery);
        let graph = b.build();
        let builtins = BuiltinTable::libc();
        let result = DefinitionBuilder::new(&graph, &builtins, UnresolvedPolicy::Reject);
        assert!(matches!(
            result,
            Err(BuildError::UnresolvedReference { name }) if name == "mystery_t"
        ));

        let defs = convert_graph(&graph);
        assert!(defs.is_empty());
        assert_eq!(defs.skipped(), ["mystery_t".to_string()]);
    }

    #[test]
    fn reject_policy_accepts_intrinsics() {
        let mut b = CDefsBuilder::new();
        let va = b.reference("__builtin_va_list", false);
        b.typedef("va_list", va);
        let graph = b.build();
        let defs = convert(&graph, &BuiltinTable::libc(), UnresolvedPolicy::Reject).unwrap();
        assert!(defs.is_empty());
    }

    #[test]
    fn reject_policy_accepts_undeclared_enum_tags() {
        let mut b = CDefsBuilder::new();
        let tag = b.reference("enum missing", false);
        b.typedef("missing_t", tag);
        let field = b.reference("enum missing", false);
        b.structure(Some("struct holder"), vec![("value", field)]);
        let graph = b.build();

        let defs = convert(&graph, &BuiltinTable::libc(), UnresolvedPolicy::Reject).unwrap();
        assert_eq!(defs.get("missing_t").unwrap(), "alias missing_t: i32");
        assert_eq!(
            defs.get("struct holder").unwrap(),
            "cstruct struct_holder {\n    value: i32,\n}"
        );
        assert!(defs.skipped().is_empty());
    }

    #[test]
    fn reject_policy_ignores_superseded_declarations() {
        let mut b = CDefsBuilder::new();
        let mystery = b.reference("mystery_t", false);
        b.typedef("value_t", mystery);
        let int = b.integer(4, true);
        b.typedef("value_t", int);
        let graph = b.build();

        let defs = convert(&graph, &BuiltinTable::libc(), UnresolvedPolicy::Reject).unwrap();
        assert_eq!(defs.get("value_t").unwrap(), "alias value_t: i32");
    }

    #[test]
    fn self_named_forward_declaration_is_dropped() {
        let mut b = CDefsBuilder::new();
        let marker = b.add(CDef::named(
            "struct _IO_marker",
            CDefKind::Reference {
                target: "struct _IO_marker".to_string(),
                is_const: false,
            },
        ));
        b.declare("struct _IO_marker", marker);
        let int = b.integer(4, true);
        let link = b.reference("struct _IO_marker", false);
        let link = b.pointer(link, false);
        b.structure(Some("struct file"), vec![("flags", int), ("markers", link)]);
        let graph = b.build();

        for policy in [UnresolvedPolicy::Skip, UnresolvedPolicy::Reject] {
            let defs = convert(&graph, &BuiltinTable::libc(), policy).unwrap();
            assert_eq!(names(&defs), vec!["struct_file"]);
            assert_eq!(
                defs.get("struct file").unwrap(),
                "cstruct struct_file {\n    flags: i32,\n}"
            );
            assert_eq!(defs.skipped(), ["struct _IO_marker".to_string()]);
        }
    }

    #[test]
    fn forward_declaration_loop_is_dropped() {
        let mut b = CDefsBuilder::new();
        for (name, target) in [("a_t", "b_t"), ("b_t", "a_t")] {
            let id = b.add(CDef::named(
                name,
                CDefKind::Reference {
                    target: target.to_string(),
                    is_const: false,
                },
            ));
            b.declare(name, id);
        }
        let forward = b.reference("a_t", false);
        let void = b.void();
        b.function("use_a", vec![("a", forward)], void);
        let defs = convert_graph(&b.build());

        assert!(defs.is_empty());
        assert_eq!(defs.skipped(), ["a_t".to_string()]);
    }

    #[test]
    fn const_enum_pointee_keeps_constness() {
        let mut b = CDefsBuilder::new();
        let uint = b.integer(4, false);
        b.enumeration(Some("enum color"), uint, &[("RED", 0)]);
        let void = b.void();
        let readonly = b.reference("enum color", true);
        let readonly = b.pointer(readonly, false);
        b.function("paint", vec![("c", readonly)], void);
        let mutable = b.reference("enum color", false);
        let mutable = b.pointer(mutable, false);
        b.function("pick", vec![("c", mutable)], void);
        let defs = convert_graph(&b.build());

        assert_eq!(defs.get("paint").unwrap(), "cfn paint(c: cptr(u32))");
        assert_eq!(defs.get("pick").unwrap(), "cfn pick(c: cptr(var u32))");
        assert_eq!(defs.get("RED").unwrap(), "const RED: u32 = 0");
    }

    #[test]
    fn sanitized_collision_is_last_write_wins() {
        let mut b = CDefsBuilder::new();
        let int = b.integer(4, true);
        b.structure(Some("struct Foo"), vec![("a", int)]);
        b.typedef("struct_Foo", int);
        let defs = convert_graph(&b.build());

        assert_eq!(defs.len(), 1);
        assert_eq!(defs.get("struct Foo").unwrap(), "alias struct_Foo: i32");
    }

    #[test]
    fn dangling_node_aborts() {
        let mut b = CDefsBuilder::new();
        b.typedef("broken_t", CDefId(99));
        let graph = b.build();
        let result = convert(&graph, &BuiltinTable::libc(), UnresolvedPolicy::Skip);
        assert!(matches!(
            result,
            Err(BuildError::Graph(GraphError::NodeNotFound(CDefId(99))))
        ));
    }

    #[test]
    fn unnamed_function_aborts() {
        let mut b = CDefsBuilder::new();
        let int = b.integer(4, true);
        let f = b.add(CDef::anonymous(CDefKind::Function {
            params: vec![],
            ret: int,
        }));
        b.declare("<anonymous>", f);
        let result = convert(&b.build(), &BuiltinTable::libc(), UnresolvedPolicy::Skip);
        assert!(matches!(
            result,
            Err(BuildError::Unnamed { kind: "function", .. })
        ));
    }
}
