//! The generation pipeline: load, plan, render, write.
//!
//! Loading is all-or-nothing. Rendering and writing are isolated per
//! package: one failing artifact does not stop its siblings.

use crate::config::{ConfigError, RunConfig};
use crate::output::{EmitError, EmitOptions, get_generator};
use crate::plan::plan;
use crate::write::write_atomic;
use convgen_loader::{LoadError, LoadReport, PackageLoader};
use convgen_model::{Diagnostic, Universe};
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("no generator for {0:?}")]
    NoGenerator(crate::config::GenerationKind),

    #[error("{0} diagnostic(s) reported in strict mode")]
    Strict(usize),
}

/// What to do with rendered artifacts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Write,
    /// Render but do not touch the filesystem.
    DryRun,
}

/// One rendered file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Import path of the package the file belongs to.
    pub package: String,
    pub path: PathBuf,
    pub content: String,
}

#[derive(Debug)]
pub struct PackageFailure {
    pub package: String,
    pub error: EmitError,
}

#[derive(Debug)]
pub struct RunSummary {
    pub load: LoadReport,
    pub artifacts: Vec<Artifact>,
    /// Paths whose content changed on disk. Empty for dry runs.
    pub written: Vec<PathBuf>,
    pub failures: Vec<PackageFailure>,
    /// Walk and plan diagnostics, in the order they were found.
    pub diagnostics: Vec<Diagnostic>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Load the configured directories into a fresh universe.
pub fn load(config: &RunConfig) -> Result<(Universe, LoadReport), RunError> {
    config.validate()?;
    let provider = convgen_loader::get_provider(&config.provider)
        .ok_or_else(|| ConfigError::UnknownProvider(config.provider.clone()))?;
    let mut universe = Universe::new();
    let report =
        PackageLoader::new(provider, config.load_options()).load(&config.dirs, &mut universe)?;
    Ok((universe, report))
}

/// Run the whole pipeline.
pub fn run(config: &RunConfig, mode: Mode) -> Result<RunSummary, RunError> {
    let header = config.header()?;
    let (universe, load_report) = load(config)?;
    let generator = get_generator(config.kind).ok_or(RunError::NoGenerator(config.kind))?;

    let plan = plan(&universe);
    tracing::debug!(
        generator = generator.name(),
        packages = plan.packages.len(),
        "planned packages"
    );
    let diagnostics: Vec<Diagnostic> = universe
        .diagnostics()
        .iter()
        .chain(plan.diagnostics.iter())
        .cloned()
        .collect();
    if config.strict && !diagnostics.is_empty() {
        for diagnostic in &diagnostics {
            tracing::error!("{diagnostic}");
        }
        return Err(RunError::Strict(diagnostics.len()));
    }

    let options = EmitOptions {
        header,
        runtime_package: config.runtime_package.clone(),
    };
    let mut summary = RunSummary {
        load: load_report,
        artifacts: Vec::new(),
        written: Vec::new(),
        failures: Vec::new(),
        diagnostics,
    };

    for package in &plan.packages {
        let rendered = package
            .source_path
            .as_ref()
            .ok_or_else(|| EmitError::NoSourceDir {
                package: package.path.clone(),
            })
            .and_then(|dir| {
                let content = generator.generate(&universe, package, &options)?;
                Ok(Artifact {
                    package: package.path.clone(),
                    path: dir.join(config.output_file_for(&package.name)),
                    content,
                })
            });
        let artifact = match rendered {
            Ok(artifact) => artifact,
            Err(error) => {
                tracing::warn!(package = %package.path, error = %error, "failed to render");
                summary.failures.push(PackageFailure {
                    package: package.path.clone(),
                    error,
                });
                continue;
            }
        };
        if mode == Mode::Write {
            match write_atomic(&artifact.path, &artifact.content) {
                Ok(true) => summary.written.push(artifact.path.clone()),
                Ok(false) => {}
                Err(error) => {
                    tracing::warn!(package = %package.path, error = %error, "failed to write");
                    summary.failures.push(PackageFailure {
                        package: package.path.clone(),
                        error,
                    });
                }
            }
        }
        summary.artifacts.push(artifact);
    }

    tracing::info!(
        artifacts = summary.artifacts.len(),
        written = summary.written.len(),
        failures = summary.failures.len(),
        diagnostics = summary.diagnostics.len(),
        "generation finished"
    );
    Ok(summary)
}
