//! Go module discovery for import-path derivation and resolution.
//!
//! A package's import path is the module path from the enclosing go.mod
//! joined with the directory's location relative to the module root.

use std::path::{Path, PathBuf};

/// Information from a go.mod file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoModule {
    /// Module path (e.g., "sysadm/apimachinery")
    pub path: String,
    /// Directory containing the go.mod file.
    pub root: PathBuf,
}

impl GoModule {
    /// Find and parse the go.mod governing `dir`.
    pub fn discover(dir: &Path) -> Option<Self> {
        let go_mod = find_go_mod(dir)?;
        let content = std::fs::read_to_string(&go_mod).ok()?;
        let path = parse_go_mod_content(&content)?;
        Some(Self {
            path,
            root: go_mod.parent()?.to_path_buf(),
        })
    }

    /// Import path of the package in `dir`, which must lie inside the module.
    pub fn import_path(&self, dir: &Path) -> Option<String> {
        let rel = dir.strip_prefix(&self.root).ok()?;
        let mut path = self.path.clone();
        for component in rel.components() {
            path.push('/');
            path.push_str(&component.as_os_str().to_string_lossy());
        }
        Some(path)
    }

    /// Local directory for an import path. `None` for imports outside the
    /// module. Does not check that the directory exists.
    pub fn resolve_import(&self, import_path: &str) -> Option<PathBuf> {
        let rel = import_path.strip_prefix(&self.path)?;
        if rel.is_empty() {
            return Some(self.root.clone());
        }
        // "example.com/apix" is not inside "example.com/api"
        let rel = rel.strip_prefix('/')?;
        Some(self.root.join(rel))
    }
}

/// Module path declared by go.mod content.
pub fn parse_go_mod_content(content: &str) -> Option<String> {
    content.lines().find_map(|line| {
        let line = line.split("//").next().unwrap_or_default().trim();
        // module github.com/user/project
        let rest = line.strip_prefix("module ")?;
        Some(rest.trim().trim_matches('"').to_string())
    })
}

/// Find go.mod by walking up from a directory.
pub fn find_go_mod(start: &Path) -> Option<PathBuf> {
    let mut current = if start.is_file() {
        start.parent()?.to_path_buf()
    } else {
        start.to_path_buf()
    };

    loop {
        let go_mod = current.join("go.mod");
        if go_mod.exists() {
            return Some(go_mod);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module() -> GoModule {
        GoModule {
            path: "sysadm/apimachinery".to_string(),
            root: PathBuf::from("/fake/root"),
        }
    }

    #[test]
    fn test_parse_go_mod() {
        let content = r#"
module sysadm/apimachinery // main module

go 1.21

require (
    github.com/pkg/errors v0.9.1
    golang.org/x/sync v0.3.0
)
"#;
        assert_eq!(
            parse_go_mod_content(content).as_deref(),
            Some("sysadm/apimachinery")
        );
        assert_eq!(parse_go_mod_content("go 1.21\n"), None);
    }

    #[test]
    fn test_import_path() {
        let module = module();
        assert_eq!(
            module.import_path(Path::new("/fake/root/command/v1beta1")),
            Some("sysadm/apimachinery/command/v1beta1".to_string())
        );
        assert_eq!(
            module.import_path(Path::new("/fake/root")),
            Some("sysadm/apimachinery".to_string())
        );
        assert_eq!(module.import_path(Path::new("/elsewhere")), None);
    }

    #[test]
    fn test_resolve_internal_import() {
        let module = module();
        assert_eq!(
            module.resolve_import("sysadm/apimachinery/runtime/v1beta1"),
            Some(PathBuf::from("/fake/root/runtime/v1beta1"))
        );
        assert!(module.resolve_import("github.com/other/lib").is_none());
        assert!(module.resolve_import("sysadm/apimachineryx").is_none());
    }
}
