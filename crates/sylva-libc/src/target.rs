//! Sylva target type model.
//!
//! Converted types live in a [`TargetTypes`] arena and refer to each other by
//! [`TypeId`]. A variant can play two roles: a *definition* is a standalone
//! top-level declaration, a *reference* is the short form used wherever the
//! type is mentioned. Which roles a variant plays is decided by
//! [`TargetType::as_definition`] and [`TargetType::as_reference`].

use std::fmt;

use crate::builtins::VOID_PRIMITIVE;
use crate::render::{Definition, Reference};

/// Arena index of a converted type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub usize);

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// Scalar families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Void,
    Bool,
    Integer,
    Float,
    Complex,
}

/// A fixed-width primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scalar {
    pub kind: ScalarKind,
    /// Size in bytes.
    pub size: u32,
    pub is_signed: bool,
    pub is_const: bool,
    /// Bit width, only for integer struct/union members.
    pub bitfield_width: Option<u32>,
}

impl Scalar {
    pub fn new(kind: ScalarKind, size: u32) -> Self {
        Self {
            kind,
            size,
            is_signed: false,
            is_const: false,
            bitfield_width: None,
        }
    }

    pub fn signed(mut self, is_signed: bool) -> Self {
        self.is_signed = is_signed;
        self
    }

    pub fn constant(mut self, is_const: bool) -> Self {
        self.is_const = is_const;
        self
    }

    pub fn bitfield(mut self, width: Option<u32>) -> Self {
        self.bitfield_width = width;
        self
    }

    pub fn bits(&self) -> u64 {
        u64::from(self.size) * 8
    }
}

/// A primitive named by the builtin table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Builtin {
    pub primitive: String,
    pub is_const: bool,
}

/// A type synonym: `alias NAME: TARGET`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alias {
    pub name: String,
    pub target: TypeId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pointer {
    pub base: TypeId,
    pub is_const: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Array {
    pub name: Option<String>,
    pub element: TypeId,
    /// `None` renders as a flexible array.
    pub count: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompositeKind {
    Struct,
    Union,
}

impl CompositeKind {
    pub fn keyword(self) -> &'static str {
        match self {
            CompositeKind::Struct => "cstruct",
            CompositeKind::Union => "cunion",
        }
    }
}

/// A named, typed slot: a composite field or a function parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub ty: TypeId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Composite {
    pub kind: CompositeKind,
    pub name: Option<String>,
    pub fields: Vec<Field>,
}

/// A named C function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSignature {
    pub name: String,
    pub params: Vec<Field>,
    pub ret: TypeId,
}

/// An unnamed function-pointer or block-pointer type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionType {
    pub params: Vec<TypeId>,
    pub ret: TypeId,
    pub is_block: bool,
}

/// A deferred link to a registered definition, mentioned by name only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ref {
    pub target: String,
    pub is_const: bool,
}

/// One enumerator, emitted as a standalone constant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Const {
    pub name: String,
    pub ty: TypeId,
    pub value: i64,
}

/// A converted type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetType {
    Alias(Alias),
    Scalar(Scalar),
    Builtin(Builtin),
    Pointer(Pointer),
    Array(Array),
    Composite(Composite),
    FunctionSignature(FunctionSignature),
    FunctionType(FunctionType),
    Ref(Ref),
    Const(Const),
}

impl TargetType {
    /// The definition role, if this variant can be declared at top level.
    pub fn as_definition(&self) -> Option<&dyn Definition> {
        match self {
            TargetType::Alias(alias) => Some(alias),
            TargetType::Array(array) if array.name.is_some() => Some(array),
            TargetType::Composite(composite) if composite.name.is_some() => Some(composite),
            TargetType::FunctionSignature(function) => Some(function),
            TargetType::Const(constant) => Some(constant),
            _ => None,
        }
    }

    /// The reference role, if this variant can be mentioned at a use site.
    pub fn as_reference(&self) -> Option<&dyn Reference> {
        match self {
            TargetType::Alias(_) => None,
            TargetType::Scalar(scalar) => Some(scalar),
            TargetType::Builtin(builtin) => Some(builtin),
            TargetType::Pointer(pointer) => Some(pointer),
            TargetType::Array(array) => Some(array),
            TargetType::Composite(composite) => Some(composite),
            TargetType::FunctionSignature(function) => Some(function),
            TargetType::FunctionType(function) => Some(function),
            TargetType::Ref(reference) => Some(reference),
            TargetType::Const(constant) => Some(constant),
        }
    }

    /// Whether the type is const-qualified where it is mentioned.
    pub fn is_const(&self) -> bool {
        match self {
            TargetType::Scalar(scalar) => scalar.is_const,
            TargetType::Builtin(builtin) => builtin.is_const,
            TargetType::Pointer(pointer) => pointer.is_const,
            TargetType::Ref(reference) => reference.is_const,
            _ => false,
        }
    }

    /// Whether the type is `void`.
    pub fn is_void(&self) -> bool {
        match self {
            TargetType::Scalar(scalar) => scalar.kind == ScalarKind::Void,
            TargetType::Builtin(builtin) => builtin.primitive == VOID_PRIMITIVE,
            _ => false,
        }
    }
}

/// Arena owning every converted type.
#[derive(Debug, Clone, Default)]
pub struct TargetTypes {
    types: Vec<TargetType>,
}

impl TargetTypes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, ty: TargetType) -> TypeId {
        let id = TypeId(self.types.len());
        self.types.push(ty);
        id
    }

    /// Get a type by id. Ids are only minted by [`TargetTypes::alloc`].
    pub fn get(&self, id: TypeId) -> &TargetType {
        &self.types[id.0]
    }

    pub fn get_mut(&mut self, id: TypeId) -> &mut TargetType {
        &mut self.types[id.0]
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Render the use-site form of a type.
    ///
    /// Definition-only variants are mentioned by their name.
    pub fn reference(&self, id: TypeId) -> String {
        let ty = self.get(id);
        match (ty.as_reference(), ty.as_definition()) {
            (Some(reference), _) => reference.render_reference(self),
            (None, Some(definition)) => crate::render::sanitize(definition.name()),
            (None, None) => String::new(),
        }
    }

    /// Render the standalone definition of a type, if it has one.
    pub fn definition(&self, id: TypeId) -> Option<String> {
        self.get(id)
            .as_definition()
            .map(|definition| definition.render_definition(self))
    }
}
