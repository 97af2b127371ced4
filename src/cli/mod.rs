//! CLI command definitions for the `layercfg` inspector.
//!
//! The inspector has no target struct. It works on the raw documents the
//! loader would apply, which is enough to see which files win and which
//! environment variables a deployment can set.

pub mod inspect;

use crate::loader::Loader;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for the merged document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
    Toml,
}

/// Inspect layered configuration files
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the files that would be loaded, in application order
    Files(SourceArgs),

    /// Print the document produced by applying every file in order
    Show {
        #[command(flatten)]
        source: SourceArgs,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Yaml)]
        format: OutputFormat,
    },

    /// Print the environment variable for every leaf of the merged document
    Env {
        #[command(flatten)]
        source: SourceArgs,

        /// Prefix prepended to every variable name
        #[arg(short, long, default_value = "")]
        prefix: String,

        /// Print the entries as a JSON array
        #[arg(long)]
        json: bool,
    },
}

/// Where to look for configuration files.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Extra candidate filename, searched after config.yaml and secret.yaml
    #[arg(short, long = "file", value_name = "NAME")]
    pub files: Vec<String>,

    /// Directory to search, in precedence order (default: .)
    #[arg(short, long = "dir", value_name = "DIR")]
    pub dirs: Vec<PathBuf>,

    /// Also search the platform config directory for this application
    #[arg(long, value_name = "NAME")]
    pub app: Option<String>,
}

impl SourceArgs {
    /// The loader these arguments describe.
    pub fn loader(&self) -> Loader {
        let mut loader = Loader::new();
        for name in &self.files {
            loader = loader.file(name.clone());
        }
        if !self.dirs.is_empty() {
            loader = loader.dirs(self.dirs.iter().cloned());
        }
        if let Some(app) = &self.app {
            loader = loader.app_dirs(app);
        }
        loader
    }
}
