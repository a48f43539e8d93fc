//! Package loading: providers in, a populated [`Universe`] out.
//!
//! Input directories are described in parallel. Population of the universe
//! is sequential, so each qualified name is created by exactly one walk.

use crate::error::LoadError;
use crate::provider::TypeProvider;
use crate::resolve::DefinitionIndex;
use convgen_model::name::assumed_package_name;
use convgen_model::{Declaration, PackageData, PackageRef, Universe, WalkOptions, Walker};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;

#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub walk: WalkOptions,
    /// Versioned package path → internal package path. Overrides inference.
    pub internal_links: BTreeMap<String, String>,
}

/// What a load produced, for the run summary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Import paths of the input packages, in input order.
    pub inputs: Vec<String>,
    /// Import paths of packages pulled in to resolve references.
    pub dependencies: Vec<String>,
    /// Number of declarations routed into the universe.
    pub declarations: usize,
}

pub struct PackageLoader<'p> {
    provider: &'p dyn TypeProvider,
    options: LoadOptions,
}

impl<'p> PackageLoader<'p> {
    pub fn new(provider: &'p dyn TypeProvider, options: LoadOptions) -> Self {
        Self { provider, options }
    }

    /// Load every directory in `dirs` into `universe`.
    ///
    /// Fails on the first input that cannot be described; nothing is added
    /// to the universe in that case. Dependencies that fail to load are
    /// skipped with a warning and their types resolve as unknown.
    pub fn load(&self, dirs: &[PathBuf], universe: &mut Universe) -> Result<LoadReport, LoadError> {
        let mut inputs: Vec<PackageData> = dirs
            .par_iter()
            .map(|dir| self.provider.load_package(dir))
            .collect::<Result<_, _>>()?;
        tracing::debug!(
            provider = self.provider.name(),
            count = inputs.len(),
            "described input packages"
        );

        let mut dependencies = self.load_dependencies(&inputs);

        // Package clause names by import path.
        let declared: HashMap<String, String> = inputs
            .iter()
            .chain(&dependencies)
            .map(|d| (d.path.clone(), d.name.clone()))
            .collect();
        for data in inputs.iter_mut().chain(dependencies.iter_mut()) {
            requalify(data, &declared);
        }

        let mut index = DefinitionIndex::default();
        for data in inputs.iter().chain(&dependencies) {
            index.insert(data);
        }

        for data in &dependencies {
            register(universe, data, false, &declared);
        }
        for data in &inputs {
            register(universe, data, true, &declared);
        }
        for data in &inputs {
            if let Some(internal) = self.internal_link(data, &index) {
                tracing::debug!(package = %data.path, internal = %internal, "linked internal package");
                universe.package(&data.path).internal_path = Some(internal);
            } else {
                tracing::debug!(package = %data.path, "no internal counterpart");
            }
        }

        let mut report = LoadReport {
            inputs: inputs.iter().map(|d| d.path.clone()).collect(),
            dependencies: dependencies.iter().map(|d| d.path.clone()).collect(),
            declarations: 0,
        };

        let counterparts: HashSet<String> = inputs
            .iter()
            .filter_map(|d| universe.find_package(&d.path)?.internal_path.clone())
            .collect();

        let mut walker = Walker::new(universe, &index, &self.options.walk);
        for data in &inputs {
            report.declarations += populate(&mut walker, data);
        }
        // Counterparts that are only dependencies still need their types
        // for planning.
        for data in dependencies.iter().filter(|d| counterparts.contains(&d.path)) {
            for decl in data.types() {
                walker.walk_type_decl(&data.path, decl);
            }
        }

        tracing::info!(
            inputs = report.inputs.len(),
            dependencies = report.dependencies.len(),
            declarations = report.declarations,
            "loaded packages"
        );
        Ok(report)
    }

    /// Packages imported by `inputs`, transitively, that the provider can
    /// load. Searched level by level; each level is described in parallel.
    fn load_dependencies(&self, inputs: &[PackageData]) -> Vec<PackageData> {
        let mut seen: HashSet<String> = inputs.iter().map(|d| d.path.clone()).collect();
        let mut frontier = self.pending_imports(inputs, &mut seen);
        for data in inputs {
            if let Some(internal) = self.internal_candidate(data)
                && let Some(importer) = &data.source_path
                && seen.insert(internal.clone())
                && let Some(dir) = self.provider.resolve_import(importer, &internal)
            {
                frontier.push((dir, internal));
            }
        }

        let mut loaded = Vec::new();
        while !frontier.is_empty() {
            let level: Vec<PackageData> = frontier
                .par_iter()
                .filter_map(|(dir, path)| match self.provider.load_package(dir) {
                    Ok(data) => Some(data),
                    Err(e) => {
                        tracing::warn!(package = %path, error = %e, "skipping dependency");
                        None
                    }
                })
                .collect();
            frontier = self.pending_imports(&level, &mut seen);
            loaded.extend(level);
        }
        loaded.sort_by(|a, b| a.path.cmp(&b.path));
        loaded
    }

    /// Imports of `packages` not seen yet that resolve to a directory.
    fn pending_imports(
        &self,
        packages: &[PackageData],
        seen: &mut HashSet<String>,
    ) -> Vec<(PathBuf, String)> {
        let mut pending = Vec::new();
        for data in packages {
            let Some(importer) = &data.source_path else {
                continue;
            };
            for import in &data.imports {
                if self.options.walk.is_external(&import.path) || seen.contains(&import.path) {
                    continue;
                }
                if let Some(dir) = self.provider.resolve_import(importer, &import.path) {
                    seen.insert(import.path.clone());
                    pending.push((dir, import.path.clone()));
                }
            }
        }
        pending
    }

    /// Configured link, or the parent path of a package named like an API
    /// version.
    fn internal_candidate(&self, data: &PackageData) -> Option<String> {
        if let Some(link) = self.options.internal_links.get(&data.path) {
            return Some(link.clone());
        }
        if !is_version_name(&data.name) {
            return None;
        }
        let (parent, _) = data.path.rsplit_once('/')?;
        Some(parent.to_string())
    }

    fn internal_link(&self, data: &PackageData, index: &DefinitionIndex) -> Option<String> {
        if let Some(link) = self.options.internal_links.get(&data.path) {
            return Some(link.clone());
        }
        self.internal_candidate(data)
            .filter(|candidate| index.contains_package(candidate))
    }
}

/// Package metadata and import stubs. Declarations are added by
/// [`populate`].
fn register(
    universe: &mut Universe,
    data: &PackageData,
    input: bool,
    declared: &HashMap<String, String>,
) {
    let package = universe.package(&data.path);
    package.name = data.name.clone();
    package.source_path = data.source_path.clone();
    package.loaded = input;
    for import in &data.imports {
        let name = declared
            .get(&import.path)
            .map(String::as_str)
            .unwrap_or_else(|| assumed_package_name(&import.path));
        package.imports.insert(
            import.alias.as_deref().unwrap_or(name).to_string(),
            PackageRef {
                path: import.path.clone(),
                name: name.to_string(),
            },
        );
    }
}

/// Unaliased qualifiers are resolved by the assumed package name while a
/// file is read. Where the imported package declares a different name,
/// references spelled with the declared name are pointed at its path.
fn requalify(data: &mut PackageData, declared: &HashMap<String, String>) {
    let renames: HashMap<String, String> = data
        .imports
        .iter()
        .filter(|import| import.alias.is_none())
        .filter_map(|import| {
            let name = declared.get(&import.path)?;
            (name != import.local_name()).then(|| (name.clone(), import.path.clone()))
        })
        .collect();
    if renames.is_empty() {
        return;
    }
    tracing::debug!(package = %data.path, imports = renames.len(), "requalified imports");
    data.visit_packages_mut(&mut |package| {
        if let Some(path) = renames.get(package.as_str()) {
            *package = path.clone();
        }
    });
}

/// Route every declaration of `data` through the walker. Returns the number
/// of declarations routed.
fn populate(walker: &mut Walker<'_>, data: &PackageData) -> usize {
    for decl in &data.declarations {
        match decl {
            Declaration::Type(t) => {
                walker.walk_type_decl(&data.path, t);
            }
            Declaration::Function(f) => {
                walker.declare_function(&data.path, f);
            }
            Declaration::Variable(v) => {
                walker.declare_variable(&data.path, v);
            }
            Declaration::Constant(c) => {
                walker.declare_constant(&data.path, c);
            }
        }
    }
    tracing::debug!(
        package = %data.path,
        declarations = data.declarations.len(),
        "populated package"
    );
    data.declarations.len()
}

/// `v1`, `v1beta1`, `v2alpha3`.
pub fn is_version_name(name: &str) -> bool {
    let Some(rest) = name.strip_prefix('v') else {
        return false;
    };
    let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return false;
    }
    let rest = &rest[digits..];
    if rest.is_empty() {
        return true;
    }
    let Some(number) = rest
        .strip_prefix("alpha")
        .or_else(|| rest.strip_prefix("beta"))
    else {
        return false;
    };
    !number.is_empty() && number.chars().all(|c| c.is_ascii_digit())
}
