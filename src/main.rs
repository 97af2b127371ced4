//! layercfg inspector
//!
//! Shows which configuration files a loader picks up, the document they
//! merge into, and the environment variables that override each value.

use anyhow::Result;
use clap::Parser;
use layercfg::cli::{Cli, inspect};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    inspect::run(&cli.command, &mut out)
}
