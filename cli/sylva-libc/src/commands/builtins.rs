//! `sylva-libc builtins`: list the library's aliases of builtin types.

use std::path::PathBuf;

use anyhow::{Context, Result};
use sylva_libc::StdLib;

use crate::config::SylvaLibcConfig;

/// One `name -> primitive` line per builtin alias, in declaration order.
pub fn list(dumps: &[PathBuf], config: &SylvaLibcConfig) -> Result<Vec<String>> {
    let lib =
        StdLib::from_dumps(dumps, &config.builder).context("converting declaration dumps")?;
    Ok(lib
        .builtin_aliases()
        .map(|(name, primitive)| format!("{name} -> {primitive}"))
        .collect())
}

pub fn run(dumps: &[PathBuf], config: &SylvaLibcConfig) -> Result<()> {
    for line in list(dumps, config)? {
        println!("{line}");
    }
    Ok(())
}
