//! CLI entry point for bnd-bridge.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

/// bnd-bridge — derive binding metadata from C API headers.
#[derive(Parser, Debug)]
#[command(name = "bnd-bridge", version, about)]
struct Cli {
    /// Path to the bnd-bridge.toml configuration file.
    #[arg(default_value = "bnd-bridge.toml")]
    config: PathBuf,

    /// Output file path (overrides config).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Analyze a JSON declaration tree instead of parsing headers.
    #[arg(long)]
    decls: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("bnd_bridge=info")),
        )
        .init();

    let cli = Cli::parse();
    bnd_bridge::run(&cli.config, cli.output.as_deref(), cli.decls.as_deref())?;
    Ok(())
}
