//! Command-line interface.

use crate::config::{ConfigError, DEFAULT_CONFIG_FILE, GenerationKind, RunConfig};
use crate::run::Mode;
use clap::Parser;
use clap::builder::PossibleValuesParser;
use std::path::PathBuf;

/// Generate conversion functions between versioned and internal Go API types.
#[derive(Debug, Parser)]
#[command(name = "convgen", version)]
pub struct Cli {
    /// Comma-separated package directories
    #[arg(short, long, value_delimiter = ',')]
    pub dirs: Vec<PathBuf>,

    /// What to generate
    #[arg(short, long, value_enum)]
    pub kind: Option<GenerationKind>,

    /// Output file name; `{package}` is replaced with the package name
    #[arg(short = 'f', long)]
    pub file: Option<String>,

    /// Header (license) text file prepended to generated files
    #[arg(short, long)]
    pub copyright: Option<PathBuf>,

    /// Run configuration [default: convgen.toml if present]
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Type provider
    #[arg(long, value_parser = PossibleValuesParser::new(convgen_loader::list_providers()))]
    pub provider: Option<String>,

    /// Print generated files instead of writing them
    #[arg(long)]
    pub dry_run: bool,

    /// Fail when any diagnostic is reported
    #[arg(long)]
    pub strict: bool,

    /// Print the loaded type universe as JSON and exit
    #[arg(long)]
    pub dump_universe: bool,
}

impl Cli {
    /// The config file, overridden by the flags that were given.
    pub fn run_config(&self) -> Result<RunConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => RunConfig::load_or_default(path, true)?,
            None => RunConfig::load_or_default(&PathBuf::from(DEFAULT_CONFIG_FILE), false)?,
        };
        if !self.dirs.is_empty() {
            config.dirs = self.dirs.clone();
        }
        if let Some(kind) = self.kind {
            config.kind = kind;
        }
        if let Some(file) = &self.file {
            config.output_file = file.clone();
        }
        if let Some(copyright) = &self.copyright {
            config.header_file = Some(copyright.clone());
        }
        if let Some(provider) = &self.provider {
            config.provider = provider.clone();
        }
        if self.strict {
            config.strict = true;
        }
        Ok(config)
    }

    pub fn mode(&self) -> Mode {
        if self.dry_run { Mode::DryRun } else { Mode::Write }
    }
}
