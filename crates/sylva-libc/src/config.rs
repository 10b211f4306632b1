//! Builder configuration.
//!
//! ```toml
//! unresolved = "reject"
//! intrinsics = ["__gnuc_va_list"]
//!
//! [builtins]
//! "__int128" = "i128"
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::builtins::BuiltinTable;
use crate::error::Result;

/// What to do with a reference that names neither a declaration nor a builtin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnresolvedPolicy {
    /// Treat it as a builtin the headers do not define and drop it.
    #[default]
    Skip,
    /// Fail builder construction.
    Reject,
}

/// Options for a definition builder run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuilderConfig {
    #[serde(default)]
    pub unresolved: UnresolvedPolicy,
    /// Extra builtin spellings, mapped to Sylva primitives.
    #[serde(default)]
    pub builtins: BTreeMap<String, String>,
    /// Extra compiler intrinsic names to drop.
    #[serde(default)]
    pub intrinsics: Vec<String>,
}

impl BuilderConfig {
    /// Parse a configuration from a TOML string.
    pub fn parse(input: &str) -> Result<Self> {
        Ok(toml::from_str(input)?)
    }

    /// Parse a configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// The libc builtin table extended with this configuration's entries.
    pub fn builtin_table(&self) -> BuiltinTable {
        let table = self
            .builtins
            .iter()
            .fold(BuiltinTable::libc(), |table, (spelling, primitive)| {
                table.with_primitive(spelling, primitive)
            });
        self.intrinsics
            .iter()
            .fold(table, |table, name| table.with_intrinsic(name))
    }
}
