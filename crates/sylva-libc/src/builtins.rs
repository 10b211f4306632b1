//! C builtin type names.
//!
//! Maps builtin C spellings to the Sylva primitives they render as, and
//! recognizes compiler intrinsics that no header defines. The table is an
//! ordinary value: build it once and pass it to the definition builder.

use std::collections::{HashMap, HashSet};

/// Spellings per primitive. Names keep C's distinctions (`char` signedness,
/// `long` vs `long long`) and leave the data model to the target.
const LIBC_PRIMITIVES: &[(&[&str], &str)] = &[
    (&["char"], "cchar"),
    (&["signed char"], "scchar"),
    (&["unsigned char"], "ucchar"),
    (&["short", "short int", "signed short", "signed short int"], "cshort"),
    (&["unsigned short", "unsigned short int"], "cushort"),
    (&["int", "signed", "signed int"], "cint"),
    (&["unsigned", "unsigned int"], "cuint"),
    (&["long", "long int", "signed long", "signed long int"], "clong"),
    (&["unsigned long", "unsigned long int"], "culong"),
    (
        &[
            "long long",
            "long long int",
            "signed long long",
            "signed long long int",
        ],
        "clonglong",
    ),
    (&["unsigned long long", "unsigned long long int"], "culonglong"),
    (&["float"], "cfloat"),
    (&["double"], "cdouble"),
    (&["long double"], "clongdouble"),
    (&["float_t"], "cfloat_t"),
    (&["double_t"], "cdouble_t"),
    (&["float _Complex"], "cfloati"),
    (&["double _Complex"], "cdoublei"),
    (&["long double _Complex"], "clongdoublei"),
    (&["_Bool"], "cbool"),
    (&["void"], VOID_PRIMITIVE),
];

/// The primitive `void` renders as when named through the table.
pub const VOID_PRIMITIVE: &str = "cvoid";

/// Opaque compiler types referenced by libc headers but declared nowhere.
const INTRINSICS: &[&str] = &[
    "__int128_t",
    "__uint128_t",
    "__NSConstantString",
    "__va_list_tag",
];

const INTRINSIC_PREFIX: &str = "__builtin_";

/// Lookup table for builtin C type names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltinTable {
    primitives: HashMap<String, String>,
    intrinsics: HashSet<String>,
}

impl BuiltinTable {
    /// An empty table: only `__builtin_*` names count as intrinsics.
    pub fn empty() -> Self {
        Self {
            primitives: HashMap::new(),
            intrinsics: HashSet::new(),
        }
    }

    /// The default table for a C standard library.
    pub fn libc() -> Self {
        let mut table = Self::empty();
        for (spellings, primitive) in LIBC_PRIMITIVES {
            for spelling in *spellings {
                table
                    .primitives
                    .insert(spelling.to_string(), primitive.to_string());
            }
        }
        table
            .intrinsics
            .extend(INTRINSICS.iter().map(|name| name.to_string()));
        table
    }

    /// Add or replace a spelling.
    pub fn with_primitive(mut self, spelling: &str, primitive: &str) -> Self {
        self.primitives
            .insert(spelling.to_string(), primitive.to_string());
        self
    }

    /// Add an intrinsic name.
    pub fn with_intrinsic(mut self, name: &str) -> Self {
        self.intrinsics.insert(name.to_string());
        self
    }

    /// The primitive a builtin spelling renders as.
    pub fn primitive(&self, spelling: &str) -> Option<&str> {
        self.primitives.get(spelling).map(String::as_str)
    }

    /// Whether `name` is a compiler intrinsic with no definition.
    pub fn is_intrinsic(&self, name: &str) -> bool {
        name.starts_with(INTRINSIC_PREFIX) || self.intrinsics.contains(name)
    }

    /// Whether the table recognizes `name` at all.
    pub fn contains(&self, name: &str) -> bool {
        self.primitive(name).is_some() || self.is_intrinsic(name)
    }
}

impl Default for BuiltinTable {
    fn default() -> Self {
        Self::libc()
    }
}
