//! Text rendering of converted types in Sylva syntax.
//!
//! | Type | Definition | Reference |
//! |---|---|---|
//! | alias | `alias NAME: T` | (name) |
//! | scalar | | `i32`, `u8`, `f64`, `bool`, `void`, `cbitfield(u32, 3)` |
//! | pointer | | `cptr(T)` to const, `cptr(var T)` otherwise |
//! | array | `carray NAME: [T * N]` | `NAME`, or `[T * N]` / `[T * _]` inline |
//! | struct / union | `cstruct NAME { ... }` | `NAME`, or the body inline |
//! | function | `cfn NAME(a: T): R` | `NAME` |
//! | function pointer | | `cfntype(T): R`, `cblockfntype(T): R` |
//! | constant | `const NAME: T = V` | `NAME` |

use crate::target::{
    Alias, Array, Builtin, Composite, Const, Field, FunctionSignature, FunctionType, Pointer,
    Ref, Scalar, ScalarKind, TargetTypes, TypeId,
};

/// Capability of rendering a standalone top-level declaration.
pub trait Definition {
    /// The C name this definition is registered under.
    fn name(&self) -> &str;

    fn render_definition(&self, types: &TargetTypes) -> String;
}

/// Capability of rendering a use-site mention.
pub trait Reference {
    fn render_reference(&self, types: &TargetTypes) -> String;
}

/// Make a C name legal in Sylva syntax: `struct tm` becomes `struct_tm`.
pub fn sanitize(name: &str) -> String {
    name.replace(' ', "_")
}

fn field_name(field: &Field, index: usize, fallback: &str) -> String {
    if field.name.is_empty() {
        format!("{fallback}{index}")
    } else {
        sanitize(&field.name)
    }
}

/// `: T` for non-void returns, nothing for void.
fn return_suffix(types: &TargetTypes, ret: TypeId) -> String {
    if types.get(ret).is_void() {
        String::new()
    } else {
        format!(": {}", types.reference(ret))
    }
}

fn inline_fields(types: &TargetTypes, fields: &[Field]) -> String {
    fields
        .iter()
        .enumerate()
        .map(|(i, field)| format!("{}: {}", field_name(field, i, "anon"), types.reference(field.ty)))
        .collect::<Vec<_>>()
        .join(", ")
}

impl Definition for Alias {
    fn name(&self) -> &str {
        &self.name
    }

    fn render_definition(&self, types: &TargetTypes) -> String {
        format!("alias {}: {}", sanitize(&self.name), types.reference(self.target))
    }
}

impl Reference for Scalar {
    fn render_reference(&self, _types: &TargetTypes) -> String {
        let token = match self.kind {
            ScalarKind::Void => return "void".to_string(),
            ScalarKind::Bool => return "bool".to_string(),
            ScalarKind::Integer if self.is_signed => format!("i{}", self.bits()),
            ScalarKind::Integer => format!("u{}", self.bits()),
            ScalarKind::Float => format!("f{}", self.bits()),
            ScalarKind::Complex => format!("c{}", self.bits()),
        };
        match self.bitfield_width {
            Some(width) if self.kind == ScalarKind::Integer => {
                format!("cbitfield({token}, {width})")
            }
            _ => token,
        }
    }
}

impl Reference for Builtin {
    fn render_reference(&self, _types: &TargetTypes) -> String {
        self.primitive.clone()
    }
}

impl Reference for Pointer {
    fn render_reference(&self, types: &TargetTypes) -> String {
        let base = types.reference(self.base);
        if types.get(self.base).is_const() {
            format!("cptr({base})")
        } else {
            format!("cptr(var {base})")
        }
    }
}

impl Array {
    fn shape(&self, types: &TargetTypes) -> String {
        let element = types.reference(self.element);
        match self.count {
            Some(count) => format!("[{element} * {count}]"),
            None => format!("[{element} * _]"),
        }
    }
}

impl Definition for Array {
    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    fn render_definition(&self, types: &TargetTypes) -> String {
        format!("carray {}: {}", sanitize(self.name()), self.shape(types))
    }
}

impl Reference for Array {
    fn render_reference(&self, types: &TargetTypes) -> String {
        match &self.name {
            Some(name) => sanitize(name),
            None => self.shape(types),
        }
    }
}

impl Definition for Composite {
    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    fn render_definition(&self, types: &TargetTypes) -> String {
        let keyword = self.kind.keyword();
        let name = sanitize(self.name());
        if self.fields.is_empty() {
            return format!("{keyword} {name} {{}}");
        }
        let mut out = format!("{keyword} {name} {{\n");
        for (i, field) in self.fields.iter().enumerate() {
            out.push_str(&format!(
                "    {}: {},\n",
                field_name(field, i, "anon"),
                types.reference(field.ty)
            ));
        }
        out.push('}');
        out
    }
}

impl Reference for Composite {
    fn render_reference(&self, types: &TargetTypes) -> String {
        let keyword = self.kind.keyword();
        match &self.name {
            Some(name) => sanitize(name),
            None if self.fields.is_empty() => format!("{keyword} {{}}"),
            None => format!("{keyword} {{ {} }}", inline_fields(types, &self.fields)),
        }
    }
}

impl Definition for FunctionSignature {
    fn name(&self) -> &str {
        &self.name
    }

    fn render_definition(&self, types: &TargetTypes) -> String {
        let params = self
            .params
            .iter()
            .enumerate()
            .map(|(i, param)| format!("{}: {}", field_name(param, i, "arg"), types.reference(param.ty)))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "cfn {}({params}){}",
            sanitize(&self.name),
            return_suffix(types, self.ret)
        )
    }
}

impl Reference for FunctionSignature {
    fn render_reference(&self, _types: &TargetTypes) -> String {
        sanitize(&self.name)
    }
}

impl Reference for FunctionType {
    fn render_reference(&self, types: &TargetTypes) -> String {
        let keyword = if self.is_block { "cblockfntype" } else { "cfntype" };
        let params = self
            .params
            .iter()
            .map(|param| types.reference(*param))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{keyword}({params}){}", return_suffix(types, self.ret))
    }
}

impl Reference for Ref {
    fn render_reference(&self, _types: &TargetTypes) -> String {
        sanitize(&self.target)
    }
}

impl Definition for Const {
    fn name(&self) -> &str {
        &self.name
    }

    fn render_definition(&self, types: &TargetTypes) -> String {
        format!(
            "const {}: {} = {}",
            sanitize(&self.name),
            types.reference(self.ty),
            self.value
        )
    }
}

impl Reference for Const {
    fn render_reference(&self, _types: &TargetTypes) -> String {
        sanitize(&self.name)
    }
}
