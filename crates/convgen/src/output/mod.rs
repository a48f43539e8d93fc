//! Artifact generators.
//!
//! Each generator renders a [`PackagePlan`] into the contents of one source
//! file. Generators are looked up by the [`GenerationKind`] of the run.

pub mod go;

use crate::config::GenerationKind;
use crate::plan::PackagePlan;
use convgen_model::Universe;
use std::path::PathBuf;

pub use go::ConversionGenerator;

#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    #[error("{package}: type {name} cannot be spelled in generated code")]
    Unrenderable { package: String, name: String },

    #[error("{package}: no source directory to write into")]
    NoSourceDir { package: String },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Settings shared by every artifact of a run.
#[derive(Debug, Clone, Default)]
pub struct EmitOptions {
    /// Text placed before the generated marker, usually a license.
    pub header: String,
    /// Import path of the package defining `Scheme` and `FuncRegistry`.
    pub runtime_package: String,
}

/// A code generator for one kind of artifact.
pub trait Generator: Send + Sync {
    /// Unique generator identifier (e.g., "conversion").
    fn name(&self) -> &'static str;

    fn kind(&self) -> GenerationKind;

    /// Render the artifact for one package.
    fn generate(
        &self,
        universe: &Universe,
        plan: &PackagePlan,
        options: &EmitOptions,
    ) -> Result<String, EmitError>;
}

static GENERATORS: &[&dyn Generator] = &[&ConversionGenerator];

/// Get the generator for a kind.
pub fn get_generator(kind: GenerationKind) -> Option<&'static dyn Generator> {
    GENERATORS.iter().find(|g| g.kind() == kind).copied()
}
