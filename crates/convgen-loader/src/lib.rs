//! Package loading for convgen.
//!
//! A [`TypeProvider`] describes package directories as
//! [`PackageData`](convgen_model::PackageData); the [`PackageLoader`] feeds
//! those descriptions through the walker into a
//! [`Universe`](convgen_model::Universe).
//!
//! Two providers ship with the crate:
//! - [`GoSourceProvider`] parses Go sources with tree-sitter
//! - [`ManifestProvider`] reads pre-dumped JSON descriptions

mod error;
pub mod go_mod;
pub mod golang;
mod loader;
pub mod manifest;
mod provider;
mod resolve;

pub use error::LoadError;
pub use go_mod::GoModule;
pub use golang::{GENERATED_MARKER, GoSourceProvider};
pub use loader::{LoadOptions, LoadReport, PackageLoader, is_version_name};
pub use manifest::{MANIFEST_FILE, ManifestProvider};
pub use provider::TypeProvider;
pub use resolve::DefinitionIndex;

/// All providers, in lookup order.
static PROVIDERS: &[&dyn TypeProvider] = &[&GoSourceProvider, &ManifestProvider];

/// Get a provider by name.
pub fn get_provider(name: &str) -> Option<&'static dyn TypeProvider> {
    PROVIDERS.iter().find(|p| p.name() == name).copied()
}

/// Names of all providers.
pub fn list_providers() -> Vec<&'static str> {
    PROVIDERS.iter().map(|p| p.name()).collect()
}
