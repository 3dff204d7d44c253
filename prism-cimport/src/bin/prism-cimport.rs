//! CLI entry point for prism-cimport.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

/// prism-cimport — import C header declarations into Prism modules.
#[derive(Parser, Debug)]
#[command(name = "prism-cimport", version, about)]
struct Cli {
    /// Path to the cimport.toml configuration file.
    #[arg(default_value = "cimport.toml")]
    config: PathBuf,

    /// Import only the named module.
    #[arg(short, long)]
    module: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("prism_cimport=info")),
        )
        .init();

    let cli = Cli::parse();
    prism_cimport::run(&cli.config, cli.module.as_deref())?;
    Ok(())
}
