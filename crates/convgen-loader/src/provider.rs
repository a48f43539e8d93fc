//! The type-provider boundary.

use crate::error::LoadError;
use convgen_model::PackageData;
use std::path::{Path, PathBuf};

/// A source of type descriptions for package directories.
///
/// Providers are called from several threads at once during loading and
/// must not keep per-call state.
pub trait TypeProvider: Send + Sync {
    /// Provider identifier (e.g., "go", "manifest").
    fn name(&self) -> &'static str;

    /// Describe the package in `dir`.
    fn load_package(&self, dir: &Path) -> Result<PackageData, LoadError>;

    /// Directory of `import_path` as seen from the package in `importer`,
    /// if the provider can load it. Used to pull in dependency packages.
    fn resolve_import(&self, importer: &Path, import_path: &str) -> Option<PathBuf>;
}
