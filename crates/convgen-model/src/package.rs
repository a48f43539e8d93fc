//! Package-level registries.

use crate::types::TypeId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Lightweight reference to an imported package. Imports are only used for
/// naming and resolution, so they are never populated further.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRef {
    pub path: String,
    pub name: String,
}

/// Package-level information. Maps are keyed by local name (without the
/// package qualifier) and ordered so iteration is deterministic.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Package {
    /// Canonical import path, e.g. `example.com/api/v1`.
    pub path: String,
    /// Directory the package was loaded from.
    pub source_path: Option<PathBuf>,
    /// Name from the `package x` clause. Empty until the package is loaded.
    pub name: String,
    /// Import path of the internal counterpart of a versioned package.
    pub internal_path: Option<String>,
    /// Whether the package was an input of the run rather than a dependency
    /// or a placeholder created by a reference.
    pub loaded: bool,
    pub types: BTreeMap<String, TypeId>,
    pub functions: BTreeMap<String, TypeId>,
    pub variables: BTreeMap<String, TypeId>,
    pub constants: BTreeMap<String, TypeId>,
    /// Imports by local alias.
    pub imports: BTreeMap<String, PackageRef>,
}

impl Package {
    pub(crate) fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            ..Self::default()
        }
    }

    /// Name used to refer to this package from generated code.
    pub fn local_name(&self) -> &str {
        if self.name.is_empty() {
            crate::name::assumed_package_name(&self.path)
        } else {
            &self.name
        }
    }
}
