//! Provider for type descriptions dumped by other tools.
//!
//! A package directory carries a `convgen.package.json` file holding the
//! serialized [`PackageData`]. Manifests are self-contained: every package
//! a run needs must be listed as an input.

use crate::error::LoadError;
use crate::provider::TypeProvider;
use convgen_model::PackageData;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "convgen.package.json";

pub struct ManifestProvider;

impl TypeProvider for ManifestProvider {
    fn name(&self) -> &'static str {
        "manifest"
    }

    fn load_package(&self, dir: &Path) -> Result<PackageData, LoadError> {
        let path = dir.join(MANIFEST_FILE);
        let content = std::fs::read_to_string(&path).map_err(|e| LoadError::io(&path, e))?;
        let mut data: PackageData = serde_json::from_str(&content)
            .map_err(|source| LoadError::Manifest { path, source })?;
        if data.source_path.is_none() {
            data.source_path = Some(dir.to_path_buf());
        }
        Ok(data)
    }

    fn resolve_import(&self, _importer: &Path, _import_path: &str) -> Option<PathBuf> {
        None
    }
}
