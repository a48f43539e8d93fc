//! The universe: arena of canonical type nodes plus the package registry.
//!
//! Every operation here is get-or-create. Creating a node registers a
//! placeholder under its qualified name *before* anything walks its children,
//! which is what lets self- and mutually-referential structs terminate:
//! the recursive lookup finds the placeholder instead of recursing again.

use crate::builtins::{ALIASES, PRIMITIVES};
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::kind::Kind;
use crate::name::Name;
use crate::package::Package;
use crate::types::{NodeState, Shape, Type, TypeId};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Table {
    Types,
    Functions,
    Variables,
    Constants,
}

/// Registry of all packages and type nodes for one generation run.
#[derive(Debug, Clone)]
pub struct Universe {
    nodes: Vec<Type>,
    packages: BTreeMap<String, Package>,
    diagnostics: Diagnostics,
}

impl Default for Universe {
    fn default() -> Self {
        Self::new()
    }
}

impl Universe {
    /// Create a universe with the builtin primitives pre-registered.
    pub fn new() -> Self {
        let mut universe = Self {
            nodes: Vec::new(),
            packages: BTreeMap::new(),
            diagnostics: Diagnostics::default(),
        };
        for primitive in PRIMITIVES {
            let id = universe.type_(&Name::builtin(*primitive));
            universe.classify(id, Shape::Builtin { underlying: None }, None);
        }
        for (alias, target) in ALIASES {
            let id = universe.type_(&Name::builtin(*target));
            universe.package("").types.insert((*alias).to_string(), id);
        }
        universe
    }

    /// Package for `path`, creating an empty marker if it is not known yet.
    /// The caller finishes construction of a new package.
    pub fn package(&mut self, path: &str) -> &mut Package {
        self.packages
            .entry(path.to_string())
            .or_insert_with(|| Package::new(path))
    }

    pub fn find_package(&self, path: &str) -> Option<&Package> {
        self.packages.get(path)
    }

    /// All packages ordered by import path.
    pub fn packages(&self) -> impl Iterator<Item = &Package> {
        self.packages.values()
    }

    /// Canonical type for a qualified name. Builtins are always found; any
    /// other unknown name gets a placeholder the caller must classify.
    pub fn type_(&mut self, name: &Name) -> TypeId {
        self.get_or_create(Table::Types, name)
    }

    /// Canonical function declaration. A new node is classified
    /// `DeclarationOf`; the caller fills in its type.
    pub fn function(&mut self, name: &Name) -> TypeId {
        self.get_or_create(Table::Functions, name)
    }

    pub fn variable(&mut self, name: &Name) -> TypeId {
        self.get_or_create(Table::Variables, name)
    }

    pub fn constant(&mut self, name: &Name) -> TypeId {
        self.get_or_create(Table::Constants, name)
    }

    /// Look up a type without creating it.
    pub fn lookup(&self, name: &Name) -> Option<TypeId> {
        self.packages.get(&name.package)?.types.get(&name.name).copied()
    }

    pub fn builtin(&self, name: &str) -> Option<TypeId> {
        self.lookup(&Name::builtin(name))
    }

    pub fn get(&self, id: TypeId) -> &Type {
        &self.nodes[id.index()]
    }

    pub fn kind(&self, id: TypeId) -> Kind {
        self.get(id).kind()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TypeId, &Type)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, t)| (TypeId(i as u32), t))
    }

    /// Assign the shape of a placeholder. Returns `false` and keeps the
    /// first shape when the node was already classified; a differing kind or
    /// definition is reported as a name collision.
    pub fn classify(&mut self, id: TypeId, shape: Shape, descriptor: Option<String>) -> bool {
        let node = &mut self.nodes[id.index()];
        if !node.is_classified() {
            node.state = NodeState::Classified(shape);
            node.descriptor = descriptor;
            return true;
        }
        let existing = node.kind();
        let descriptor_differs = matches!(
            (&node.descriptor, &descriptor),
            (Some(a), Some(b)) if a != b
        );
        if existing != shape.kind() || descriptor_differs {
            let message = format!(
                "already classified as {} from `{}`; ignoring {} from `{}`",
                existing,
                node.descriptor.as_deref().unwrap_or("?"),
                shape.kind(),
                descriptor.as_deref().unwrap_or("?"),
            );
            let subject = node.name.to_string();
            self.diagnostics
                .push(Diagnostic::new(DiagnosticKind::NameCollision, subject, message));
        }
        false
    }

    pub(crate) fn node_mut(&mut self, id: TypeId) -> &mut Type {
        &mut self.nodes[id.index()]
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Serializable view of the loaded packages and their nodes.
    pub fn dump(&self) -> serde_json::Value {
        #[derive(Serialize)]
        struct PackageView<'a> {
            #[serde(flatten)]
            package: &'a Package,
            nodes: BTreeMap<String, &'a Type>,
        }

        let packages: Vec<PackageView<'_>> = self
            .packages
            .values()
            .filter(|p| p.loaded)
            .map(|package| {
                let nodes = package
                    .types
                    .iter()
                    .chain(&package.functions)
                    .chain(&package.variables)
                    .chain(&package.constants)
                    .map(|(name, id)| (name.clone(), self.get(*id)))
                    .collect();
                PackageView { package, nodes }
            })
            .collect();
        serde_json::json!({ "packages": packages })
    }

    fn get_or_create(&mut self, table: Table, name: &Name) -> TypeId {
        if let Some(id) = self.table(table, &name.package).and_then(|t| t.get(&name.name)) {
            return *id;
        }
        let id = TypeId(self.nodes.len() as u32);
        let mut node = Type::placeholder(name.clone());
        if table != Table::Types {
            node.state = NodeState::Classified(Shape::DeclarationOf {
                underlying: None,
                signature: None,
            });
        }
        self.nodes.push(node);
        let package = self.package(&name.package);
        let map = match table {
            Table::Types => &mut package.types,
            Table::Functions => &mut package.functions,
            Table::Variables => &mut package.variables,
            Table::Constants => &mut package.constants,
        };
        map.insert(name.name.clone(), id);
        id
    }

    fn table(&self, table: Table, package: &str) -> Option<&BTreeMap<String, TypeId>> {
        let package = self.packages.get(package)?;
        Some(match table {
            Table::Types => &package.types,
            Table::Functions => &package.functions,
            Table::Variables => &package.variables,
            Table::Constants => &package.constants,
        })
    }
}
