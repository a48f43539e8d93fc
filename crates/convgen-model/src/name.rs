//! Qualified names and type-descriptor parsing.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A type name with an optional package qualifier.
///
/// Builtins and structurally anonymous shapes (`[]string`, `map[string]int`,
/// `*example.com/api.Widget`) have an empty package; for the latter the whole
/// descriptor is kept as the local name so identical shapes still dedupe.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Name {
    /// Import path of the declaring package. Empty for builtins and anonymous shapes.
    pub package: String,
    /// Local name inside the package.
    pub name: String,
    /// Optional location of the definition, for sources where package and path differ.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Prefixes that mark a descriptor as structurally anonymous. These may
/// contain `.` characters (qualified element types), so they are detected
/// before any package splitting happens.
const ANONYMOUS_PREFIXES: &[&str] = &[
    "struct{",
    "interface{",
    "<-chan",
    "chan<-",
    "chan ",
    "func(",
    "*",
    "map[",
    "[",
];

impl Name {
    pub fn new(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
            path: None,
        }
    }

    /// A name in the builtin (empty) package.
    pub fn builtin(name: impl Into<String>) -> Self {
        Self::new("", name)
    }

    /// Recover package path and local name from a textual type descriptor.
    ///
    /// `example.com/api/v1.Widget` splits at the final `.`; anonymous shapes
    /// and bare identifiers stay unqualified.
    pub fn from_descriptor(descriptor: &str) -> Self {
        if is_anonymous_descriptor(descriptor) {
            return Self::builtin(descriptor);
        }
        match descriptor.rsplit_once('.') {
            Some((package, name)) => Self::new(package, name),
            None => Self::builtin(descriptor),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.package.is_empty() && is_anonymous_descriptor(&self.name)
    }

    /// Whether the local name is visible outside its package.
    pub fn is_exported(&self) -> bool {
        is_exported(&self.name)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.package.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}.{}", self.package, self.name)
        }
    }
}

pub fn is_anonymous_descriptor(descriptor: &str) -> bool {
    ANONYMOUS_PREFIXES
        .iter()
        .any(|prefix| descriptor.starts_with(prefix))
}

/// Go visibility: an identifier is exported when it starts with an upper-case letter.
pub fn is_exported(ident: &str) -> bool {
    ident.chars().next().is_some_and(char::is_uppercase)
}

/// Last segment of an import path.
pub fn last_path_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Package name assumed for an unaliased import whose package clause is not
/// known: the last path segment without a `go-` prefix, cut at the first
/// character that cannot appear in an identifier. `gopkg.in/yaml.v3` is
/// `yaml`. Version segments such as `v1` are kept.
pub fn assumed_package_name(path: &str) -> &str {
    let base = last_path_segment(path);
    let base = base.strip_prefix("go-").unwrap_or(base);
    let end = base
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(base.len());
    &base[..end]
}
