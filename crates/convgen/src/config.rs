//! Run configuration.
//!
//! Loaded from `convgen.toml` (or the file given with `--config`), then
//! overridden by command-line flags.
//!
//! Example convgen.toml:
//! ```toml
//! dirs = ["pkg/apis/widgets/v1", "pkg/apis/widgets"]
//! output_file = "zz_generated.conversion.go"
//! header_file = "hack/boilerplate.go.txt"
//! external_schema_packages = ["time", "k8s.io/apimachinery/pkg/apis/meta/v1"]
//!
//! [internal_links]
//! "example.com/api/widgets/v1" = "example.com/api/widgets"
//! ```

use convgen_loader::LoadOptions;
use convgen_model::WalkOptions;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "convgen.toml";
pub const DEFAULT_OUTPUT_FILE: &str = "zz_generated.conversion.go";
pub const DEFAULT_RUNTIME_PACKAGE: &str = "sysadm/apimachinery/runtime/v1beta1";
pub const DEFAULT_EXTERNAL_SCHEMA_PACKAGES: &[&str] = &[
    "time",
    "google.golang.org/protobuf",
    "github.com/golang/protobuf",
];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to read header file {path}: {source}")]
    Header {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no source directories given (use --dirs or `dirs` in the config)")]
    NoDirs,

    #[error(
        "unknown type provider '{0}' (available: {available})",
        available = convgen_loader::list_providers().join(", ")
    )]
    UnknownProvider(String),
}

/// What to generate. Only conversion functions are supported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum GenerationKind {
    #[default]
    Conversion,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Package directories to generate for.
    pub dirs: Vec<PathBuf>,
    pub kind: GenerationKind,
    /// Output file name; `{package}` is replaced with the package name.
    pub output_file: String,
    /// Text file prepended to every generated file.
    pub header_file: Option<PathBuf>,
    /// Import path of the package defining `Scheme` and `FuncRegistry`.
    pub runtime_package: String,
    /// Type provider name.
    pub provider: String,
    /// Versioned package path → internal package path.
    pub internal_links: BTreeMap<String, String>,
    /// Packages whose types are treated as opaque.
    pub external_schema_packages: Vec<String>,
    /// Fail when any diagnostic is reported.
    pub strict: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            dirs: Vec::new(),
            kind: GenerationKind::Conversion,
            output_file: DEFAULT_OUTPUT_FILE.to_string(),
            header_file: None,
            runtime_package: DEFAULT_RUNTIME_PACKAGE.to_string(),
            provider: "go".to_string(),
            internal_links: BTreeMap::new(),
            external_schema_packages: DEFAULT_EXTERNAL_SCHEMA_PACKAGES
                .iter()
                .map(|p| p.to_string())
                .collect(),
            strict: false,
        }
    }
}

impl RunConfig {
    /// Load a config file. Relative paths in it are taken relative to the
    /// file's directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(base) = path.parent() {
            config.rebase(base);
        }
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Load `path` if it exists, otherwise use defaults. A missing file is
    /// only an error when it was asked for explicitly.
    pub fn load_or_default(path: &Path, explicit: bool) -> Result<Self, ConfigError> {
        if !explicit && !path.exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    fn rebase(&mut self, base: &Path) {
        for dir in &mut self.dirs {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }
        if let Some(header) = &mut self.header_file
            && header.is_relative()
        {
            *header = base.join(&*header);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dirs.is_empty() {
            return Err(ConfigError::NoDirs);
        }
        if convgen_loader::get_provider(&self.provider).is_none() {
            return Err(ConfigError::UnknownProvider(self.provider.clone()));
        }
        Ok(())
    }

    /// Output file name for the package named `package`.
    pub fn output_file_for(&self, package: &str) -> String {
        self.output_file.replace("{package}", package)
    }

    /// Contents of the header file, or an empty header.
    pub fn header(&self) -> Result<String, ConfigError> {
        match &self.header_file {
            Some(path) => std::fs::read_to_string(path).map_err(|source| ConfigError::Header {
                path: path.clone(),
                source,
            }),
            None => Ok(String::new()),
        }
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            walk: WalkOptions {
                external_schema_packages: self.external_schema_packages.clone(),
            },
            internal_links: self.internal_links.clone(),
        }
    }
}
