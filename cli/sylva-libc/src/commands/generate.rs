//! `sylva-libc generate`: convert declaration dumps into Sylva definitions.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sylva_libc::{StdLib, UnresolvedPolicy};
use tracing::info;

use crate::config::SylvaLibcConfig;

/// Convert `dumps` and render the output text, header banner included.
pub fn render(dumps: &[PathBuf], config: &SylvaLibcConfig, strict: bool) -> Result<String> {
    let mut builder = config.builder.clone();
    if strict {
        builder.unresolved = UnresolvedPolicy::Reject;
    }
    let lib = StdLib::from_dumps(dumps, &builder).context("converting declaration dumps")?;
    let defs = lib.definitions();
    info!(
        definitions = defs.len(),
        skipped = defs.skipped().len(),
        "generated definitions"
    );

    let mut out = String::new();
    if let Some(header) = &config.output.header {
        for line in header.lines() {
            out.push_str(format!("# {line}").trim_end());
            out.push('\n');
        }
        out.push('\n');
    }
    out.push_str(&defs.render());
    Ok(out)
}

/// Write the rendered definitions to `output`, or stdout.
pub fn run(
    dumps: &[PathBuf],
    config: &SylvaLibcConfig,
    output: Option<&Path>,
    strict: bool,
) -> Result<()> {
    let text = render(dumps, config, strict)?;
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
            fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
            info!(path = %path.display(), "wrote definitions");
        }
        None => print!("{text}"),
    }
    Ok(())
}
