//! sylva-libc CLI: generate Sylva bindings for the C standard library.

mod commands;
mod config;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use config::SylvaLibcConfig;

#[derive(Parser)]
#[command(
    name = "sylva-libc",
    version,
    about = "Sylva definitions for the C standard library"
)]
struct Cli {
    /// Log every registered definition
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert declaration dumps into Sylva definitions
    Generate {
        /// Declaration dumps, in load order (later dumps win)
        #[arg(required = true)]
        dumps: Vec<PathBuf>,
        /// Configuration file (default: nearest sylva-libc.toml)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Output file (default: [output].path, else stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Fail on references to names no dump declares
        #[arg(long)]
        strict: bool,
    },
    /// List the library's aliases of builtin types
    Builtins {
        /// Declaration dumps, in load order
        #[arg(required = true)]
        dumps: Vec<PathBuf>,
        /// Configuration file (default: nearest sylva-libc.toml)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;

    match cli.command {
        Commands::Generate {
            dumps,
            config,
            output,
            strict,
        } => {
            let (config, config_dir) = load_config(&cwd, config.as_deref())?;
            let output = output.or_else(|| {
                config
                    .output
                    .path
                    .as_ref()
                    .map(|path| config_dir.join(path))
            });
            commands::generate::run(&dumps, &config, output.as_deref(), strict)
        }

        Commands::Builtins { dumps, config } => {
            let (config, _) = load_config(&cwd, config.as_deref())?;
            commands::builtins::run(&dumps, &config)
        }
    }
}

/// Load the configuration and the directory its relative paths start from.
fn load_config(cwd: &Path, explicit: Option<&Path>) -> anyhow::Result<(SylvaLibcConfig, PathBuf)> {
    if let Some(path) = explicit {
        let dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| cwd.to_path_buf());
        return Ok((SylvaLibcConfig::load(path)?, dir));
    }
    match SylvaLibcConfig::find_and_load(cwd)? {
        Some((config, dir)) => Ok((config, dir)),
        None => Ok((SylvaLibcConfig::default(), cwd.to_path_buf())),
    }
}
