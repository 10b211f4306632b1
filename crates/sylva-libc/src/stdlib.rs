//! The converted C standard library.

use std::path::Path;

use sylva_cdefs::CDefs;
use tracing::info;

use crate::config::BuilderConfig;
use crate::definitions::{convert, Definitions};
use crate::error::Result;
use crate::target::{TargetType, TypeId};

/// Declaration dumps of a C library together with their Sylva definitions.
#[derive(Debug, Clone)]
pub struct StdLib {
    graph: CDefs,
    definitions: Definitions,
}

impl StdLib {
    /// Load dumps in order (later dumps win on redeclaration) and convert them.
    pub fn from_dumps<P: AsRef<Path>>(paths: &[P], config: &BuilderConfig) -> Result<Self> {
        let graph = CDefs::from_dumps(paths)?;
        info!(
            dumps = paths.len(),
            declarations = graph.len(),
            "loaded declaration dumps"
        );
        Self::from_graph(graph, config)
    }

    /// Convert an already loaded graph.
    pub fn from_graph(graph: CDefs, config: &BuilderConfig) -> Result<Self> {
        let builtins = config.builtin_table();
        let definitions = convert(&graph, &builtins, config.unresolved)?;
        Ok(Self { graph, definitions })
    }

    pub fn graph(&self) -> &CDefs {
        &self.graph
    }

    pub fn definitions(&self) -> &Definitions {
        &self.definitions
    }

    /// The library's own names for builtin types, e.g. `size_t -> u64`.
    ///
    /// Aliases of other aliases are followed down to the primitive.
    pub fn builtin_aliases(&self) -> impl Iterator<Item = (&str, String)> + '_ {
        self.definitions
            .names()
            .filter_map(move |name| match self.definitions.target(name)? {
                TargetType::Alias(alias) => {
                    self.primitive_of(alias.target).map(|primitive| (name, primitive))
                }
                _ => None,
            })
    }

    fn primitive_of(&self, id: TypeId) -> Option<String> {
        let types = self.definitions.types();
        let mut current = id;
        // Each hop moves to a distinct registered alias.
        for _ in 0..=self.definitions.len() {
            match types.get(current) {
                TargetType::Scalar(_) | TargetType::Builtin(_) => {
                    return Some(types.reference(current));
                }
                TargetType::Ref(link) => match self.definitions.target(&link.target)? {
                    TargetType::Alias(alias) => current = alias.target,
                    _ => return None,
                },
                _ => return None,
            }
        }
        None
    }
}
