//! Definition lookup across every loaded package.

use convgen_model::{PackageData, TypeDecl, TypeResolver};
use std::collections::HashMap;

/// Type declarations of all input and dependency packages, by import path
/// and local name. The walker resolves named references through it.
#[derive(Debug, Default)]
pub struct DefinitionIndex {
    packages: HashMap<String, HashMap<String, TypeDecl>>,
}

impl DefinitionIndex {
    pub fn insert(&mut self, data: &PackageData) {
        let types = self.packages.entry(data.path.clone()).or_default();
        for decl in data.types() {
            types.insert(decl.name.clone(), decl.clone());
        }
    }

    pub fn contains_package(&self, path: &str) -> bool {
        self.packages.contains_key(path)
    }
}

impl TypeResolver for DefinitionIndex {
    fn resolve(&self, package: &str, name: &str) -> Option<&TypeDecl> {
        self.packages.get(package)?.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use convgen_model::{Declaration, TypeExpr};

    #[test]
    fn test_resolve_inserted_types() {
        let data = PackageData {
            path: "example.com/api".into(),
            name: "api".into(),
            source_path: None,
            declarations: vec![Declaration::Type(TypeDecl {
                name: "Widget".into(),
                definition: TypeExpr::Struct { fields: Vec::new() },
                alias: false,
                generic: false,
                methods: Vec::new(),
                comment_lines: Vec::new(),
                second_closest_comment_lines: Vec::new(),
            })],
            imports: Vec::new(),
        };
        let mut index = DefinitionIndex::default();
        index.insert(&data);
        assert!(index.contains_package("example.com/api"));
        assert!(index.resolve("example.com/api", "Widget").is_some());
        assert!(index.resolve("example.com/api", "Gadget").is_none());
        assert!(index.resolve("example.com/other", "Widget").is_none());
    }
}
