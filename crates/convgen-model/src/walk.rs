//! Type walker: turns provider descriptions into canonical universe nodes.
//!
//! A node is registered under its qualified name and marked in progress
//! before its children are walked. Re-entering a node that is classified or
//! in progress returns it immediately, so recursive types terminate and every
//! shape is classified exactly once.

use crate::builtins::canonical_primitive;
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::name::{Name, is_exported};
use crate::source::{FieldExpr, MethodExpr, SignatureExpr, TypeDecl, TypeExpr};
use crate::types::{ChanDir, Shape, Signature, TypeId};
use crate::universe::Universe;
use indexmap::IndexMap;
use std::collections::HashSet;

/// Finds the definition of a named type. Implemented by whatever holds the
/// declarations of every package the walk may reach.
pub trait TypeResolver {
    fn resolve(&self, package: &str, name: &str) -> Option<&TypeDecl>;
}

/// Resolver that knows nothing; every named reference becomes Unknown.
pub struct NoDefinitions;

impl TypeResolver for NoDefinitions {
    fn resolve(&self, _package: &str, _name: &str) -> Option<&TypeDecl> {
        None
    }
}

#[derive(Debug, Clone, Default)]
pub struct WalkOptions {
    /// Import-path prefixes whose named types are classified ExternalSchema
    /// without being walked.
    pub external_schema_packages: Vec<String>,
}

impl WalkOptions {
    pub fn is_external(&self, package: &str) -> bool {
        self.external_schema_packages.iter().any(|prefix| {
            package == prefix
                || package
                    .strip_prefix(prefix.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }
}

pub struct Walker<'a> {
    universe: &'a mut Universe,
    resolver: &'a dyn TypeResolver,
    options: &'a WalkOptions,
    in_progress: HashSet<TypeId>,
}

impl<'a> Walker<'a> {
    pub fn new(
        universe: &'a mut Universe,
        resolver: &'a dyn TypeResolver,
        options: &'a WalkOptions,
    ) -> Self {
        Self {
            universe,
            resolver,
            options,
            in_progress: HashSet::new(),
        }
    }

    pub fn universe(&mut self) -> &mut Universe {
        self.universe
    }

    /// Canonical node for `expr`. With `use_name` the node is registered
    /// under that name instead of the one derived from the descriptor; this
    /// is how declared types get their own identity.
    pub fn walk(&mut self, expr: &TypeExpr, use_name: Option<&Name>) -> TypeId {
        let descriptor = expr.descriptor();
        let name = match use_name {
            Some(name) => name.clone(),
            None => match expr {
                TypeExpr::Unrecognized { text } => Name::builtin(text.clone()),
                _ => Name::from_descriptor(&descriptor),
            },
        };
        match expr {
            TypeExpr::Basic { name: basic } => self.walk_basic(&name, basic, descriptor),
            TypeExpr::Named {
                package,
                name: local,
            } if package.is_empty() => self.walk_basic(&name, local, descriptor),
            TypeExpr::Named { package, name } => self.walk_named(package, name),
            TypeExpr::Struct { fields } => self.walk_struct(&name, fields, descriptor),
            TypeExpr::Map { key, elem } => {
                let Some(id) = self.begin(&name) else {
                    return self.universe.type_(&name);
                };
                let elem = self.walk(elem, None);
                if let Some(shape) = self.degraded_shape(elem) {
                    return self.finish(id, shape, descriptor);
                }
                let key = self.walk(key, None);
                if let Some(shape) = self.degraded_shape(key) {
                    return self.finish(id, shape, descriptor);
                }
                self.finish(id, Shape::Map { key, elem }, descriptor)
            }
            TypeExpr::Slice { elem } => {
                self.walk_container(&name, elem, descriptor, |elem| Shape::Slice { elem })
            }
            TypeExpr::Pointer { elem } => {
                self.walk_container(&name, elem, descriptor, |elem| Shape::Pointer { elem })
            }
            TypeExpr::Array { len, elem } => {
                let len = *len;
                self.walk_container(&name, elem, descriptor, move |elem| Shape::Array {
                    elem,
                    len,
                })
            }
            TypeExpr::Chan { dir, elem } => {
                let dir: ChanDir = *dir;
                self.walk_container(&name, elem, descriptor, move |elem| Shape::Channel {
                    elem,
                    dir,
                })
            }
            TypeExpr::Func { signature } => {
                let Some(id) = self.begin(&name) else {
                    return self.universe.type_(&name);
                };
                if signature.receiver.is_some() {
                    return self.finish(id, Shape::Unsupported, descriptor);
                }
                let signature = self.walk_signature(signature, Vec::new());
                self.finish(id, Shape::Function { signature }, descriptor)
            }
            TypeExpr::Interface { methods, embeds } => {
                self.walk_interface(&name, methods, embeds, descriptor)
            }
            TypeExpr::Unrecognized { text } => {
                let Some(id) = self.begin(&name) else {
                    return self.universe.type_(&name);
                };
                self.universe.report(Diagnostic::new(
                    DiagnosticKind::UnsupportedShape,
                    name.to_string(),
                    format!("cannot classify `{text}`"),
                ));
                self.finish(id, Shape::Unknown, descriptor)
            }
        }
    }

    /// Walk a type declared in `package`, registering it under its own
    /// name together with its methods and comments.
    pub fn walk_type_decl(&mut self, package: &str, decl: &TypeDecl) -> TypeId {
        let name = Name::new(package, &decl.name);
        let id = self.universe.type_(&name);
        if self.in_progress.contains(&id) {
            return id;
        }
        if self.universe.get(id).is_classified() {
            self.check_redefinition(id, decl);
            return id;
        }

        {
            let node = self.universe.node_mut(id);
            node.comment_lines = decl.comment_lines.clone();
            node.second_closest_comment_lines = decl.second_closest_comment_lines.clone();
        }

        let descriptor = decl.definition.descriptor();
        if !name.is_exported() {
            self.universe.classify(id, Shape::Unsupported, Some(descriptor));
            return id;
        }
        if self.options.is_external(package) {
            self.universe.classify(id, Shape::ExternalSchema, Some(descriptor));
            return id;
        }
        if decl.generic {
            self.universe.report(Diagnostic::new(
                DiagnosticKind::UnsupportedShape,
                name.to_string(),
                "generic types are not supported",
            ));
            self.universe.classify(id, Shape::Unsupported, Some(descriptor));
            return id;
        }

        if decl.alias {
            self.in_progress.insert(id);
            let underlying = self.walk(&decl.definition, None);
            self.finish(id, Shape::Alias { underlying }, descriptor);
        } else {
            match self.underlying_definition(&decl.definition) {
                Ok(definition) => {
                    self.walk(&definition, Some(&name));
                    self.universe.node_mut(id).descriptor = Some(descriptor);
                }
                Err(shape) => {
                    self.universe.classify(id, shape, Some(descriptor));
                }
            }
        }

        self.walk_methods(id, &name, decl);
        id
    }

    fn walk_basic(&mut self, name: &Name, basic: &str, descriptor: String) -> TypeId {
        let primitive = Name::builtin(canonical_primitive(basic).unwrap_or(basic));
        let is_primitive = name.package.is_empty() && name.name == basic;
        if is_primitive {
            let id = self.universe.type_(name);
            if !self.universe.get(id).is_classified() {
                // untyped constants and other builtins outside the fixed set
                self.universe
                    .classify(id, Shape::Builtin { underlying: None }, None);
            }
            return id;
        }
        let Some(id) = self.begin(name) else {
            return self.universe.type_(name);
        };
        let primitive_name = primitive.name.clone();
        let underlying = self.walk_basic(&primitive, &primitive_name, primitive_name.clone());
        self.finish(
            id,
            Shape::Builtin {
                underlying: Some(underlying),
            },
            descriptor,
        )
    }

    fn walk_named(&mut self, package: &str, local: &str) -> TypeId {
        let name = Name::new(package, local);
        let id = self.universe.type_(&name);
        if self.universe.get(id).is_classified() || self.in_progress.contains(&id) {
            return id;
        }
        if !is_exported(local) {
            self.universe.classify(id, Shape::Unsupported, None);
            return id;
        }
        if self.options.is_external(package) {
            self.universe.classify(id, Shape::ExternalSchema, None);
            return id;
        }
        let resolver = self.resolver;
        match resolver.resolve(package, local) {
            Some(decl) => self.walk_type_decl(package, decl),
            None => {
                self.universe.report(Diagnostic::new(
                    DiagnosticKind::UnresolvedType,
                    name.to_string(),
                    "no definition found",
                ));
                self.universe.classify(id, Shape::Unknown, None);
                id
            }
        }
    }

    fn walk_struct(&mut self, name: &Name, fields: &[FieldExpr], descriptor: String) -> TypeId {
        let Some(id) = self.begin(name) else {
            return self.universe.type_(name);
        };
        let mut members = IndexMap::new();
        for field in fields {
            if !is_exported(&field.name) {
                continue;
            }
            let member = self.walk(&field.ty, None);
            if self.is_degraded(member) {
                let kind = self.universe.kind(member);
                self.universe.report(Diagnostic::new(
                    DiagnosticKind::DroppedField,
                    format!("{name}.{}", field.name),
                    format!("field type `{}` is {kind}", field.ty.descriptor()),
                ));
                continue;
            }
            let member_name = Name {
                package: name.package.clone(),
                name: field.name.clone(),
                path: name.path.clone(),
            };
            members.insert(member_name, member);
        }
        self.finish(id, Shape::Struct { members }, descriptor)
    }

    fn walk_interface(
        &mut self,
        name: &Name,
        methods: &[MethodExpr],
        embeds: &[TypeExpr],
        descriptor: String,
    ) -> TypeId {
        let Some(id) = self.begin(name) else {
            return self.universe.type_(name);
        };
        let mut walked = IndexMap::new();
        let mut embedded = Vec::new();
        for embed in embeds {
            let embed_id = self.walk(embed, None);
            // an embedding we cannot see into leaves the method set unknown
            if let Some(shape) = self.degraded_shape(embed_id) {
                return self.finish(id, shape, descriptor);
            }
            if let Some(Shape::Interface { methods, .. }) = self.universe.get(embed_id).shape() {
                walked.extend(methods.iter().map(|(method, method_type)| (method.clone(), *method_type)));
            }
            embedded.push(embed_id);
        }
        for method in methods {
            let func = TypeExpr::Func {
                signature: method.signature.clone(),
            };
            let method_type = self.walk(&func, None);
            walked.insert(Name::new(&name.package, &method.name), method_type);
        }
        self.finish(
            id,
            Shape::Interface {
                methods: walked,
                embeds: embedded,
            },
            descriptor,
        )
    }

    fn walk_container(
        &mut self,
        name: &Name,
        elem: &TypeExpr,
        descriptor: String,
        shape: impl FnOnce(TypeId) -> Shape,
    ) -> TypeId {
        let Some(id) = self.begin(name) else {
            return self.universe.type_(name);
        };
        let elem = self.walk(elem, None);
        let shape = self.degraded_shape(elem).unwrap_or_else(|| shape(elem));
        self.finish(id, shape, descriptor)
    }

    fn walk_signature(&mut self, signature: &SignatureExpr, comment_lines: Vec<String>) -> Signature {
        let parameters = signature.params.iter().map(|p| self.walk(p, None)).collect();
        let results = signature.results.iter().map(|r| self.walk(r, None)).collect();
        Signature {
            receiver: None,
            parameters,
            results,
            variadic: signature.variadic,
            comment_lines,
        }
    }

    /// Function node for a signature, optionally bound to a receiver. Bound
    /// signatures are described on the declaring type, not as Function nodes.
    pub(crate) fn walk_func(&mut self, signature: &SignatureExpr) -> (TypeId, Signature) {
        let func = TypeExpr::Func {
            signature: SignatureExpr {
                receiver: None,
                ..signature.clone()
            },
        };
        let id = self.walk(&func, None);
        let walked = match self.universe.get(id).signature() {
            Some(walked) => walked.clone(),
            None => self.walk_signature(signature, Vec::new()),
        };
        (id, walked)
    }

    fn walk_methods(&mut self, id: TypeId, name: &Name, decl: &TypeDecl) {
        for method in &decl.methods {
            if !is_exported(&method.name) {
                continue;
            }
            let (method_type, _) = self.walk_func(&method.signature);
            self.universe
                .node_mut(id)
                .methods
                .insert(Name::new(&name.package, &method.name), method_type);
        }
    }

    /// Follow `type A B` chains to the definition that gives A its shape.
    /// Returns the shape to classify with when the chain ends somewhere that
    /// cannot be walked.
    fn underlying_definition(&self, definition: &TypeExpr) -> Result<TypeExpr, Shape> {
        let resolver = self.resolver;
        let mut current = definition;
        let mut seen = HashSet::new();
        while let TypeExpr::Named { package, name } = current {
            if package.is_empty() {
                break;
            }
            if !seen.insert((package.as_str(), name.as_str())) {
                return Err(Shape::Unsupported);
            }
            if self.options.is_external(package) {
                return Err(Shape::ExternalSchema);
            }
            match resolver.resolve(package, name) {
                Some(decl) if decl.generic => return Err(Shape::Unsupported),
                Some(decl) => current = &decl.definition,
                None => return Err(Shape::Unknown),
            }
        }
        Ok(current.clone())
    }

    fn check_redefinition(&mut self, id: TypeId, decl: &TypeDecl) {
        let node = self.universe.get(id);
        let descriptor = decl.definition.descriptor();
        if node.descriptor.as_ref().is_some_and(|d| *d != descriptor) {
            let message = format!(
                "already defined as `{}`; ignoring `{descriptor}`",
                node.descriptor.as_deref().unwrap_or_default()
            );
            let subject = node.name.to_string();
            self.universe.report(Diagnostic::new(
                DiagnosticKind::NameCollision,
                subject,
                message,
            ));
        }
    }

    /// Register `name` and mark it in progress. `None` when the node is
    /// already classified or being walked further up the stack.
    fn begin(&mut self, name: &Name) -> Option<TypeId> {
        let id = self.universe.type_(name);
        if self.universe.get(id).is_classified() || self.in_progress.contains(&id) {
            return None;
        }
        self.in_progress.insert(id);
        Some(id)
    }

    fn finish(&mut self, id: TypeId, shape: Shape, descriptor: String) -> TypeId {
        self.in_progress.remove(&id);
        self.universe.classify(id, shape, Some(descriptor));
        id
    }

    /// Classified as Unknown or Unsupported. Nodes still being walked are
    /// not degraded.
    fn is_degraded(&self, id: TypeId) -> bool {
        let node = self.universe.get(id);
        node.is_classified() && node.kind().is_degraded()
    }

    fn degraded_shape(&self, id: TypeId) -> Option<Shape> {
        if !self.is_degraded(id) {
            return None;
        }
        match self.universe.get(id).shape() {
            Some(Shape::Unsupported) => Some(Shape::Unsupported),
            _ => Some(Shape::Unknown),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::Kind;
    use crate::source::MethodDecl;
    use std::collections::HashMap;

    const PKG: &str = "example.com/api";

    #[derive(Default)]
    struct Fixture {
        decls: HashMap<(String, String), TypeDecl>,
    }

    impl Fixture {
        fn with(mut self, package: &str, decl: TypeDecl) -> Self {
            self.decls
                .insert((package.to_string(), decl.name.clone()), decl);
            self
        }
    }

    impl TypeResolver for Fixture {
        fn resolve(&self, package: &str, name: &str) -> Option<&TypeDecl> {
            self.decls.get(&(package.to_string(), name.to_string()))
        }
    }

    fn decl(name: &str, definition: TypeExpr) -> TypeDecl {
        TypeDecl {
            name: name.to_string(),
            definition,
            alias: false,
            generic: false,
            methods: Vec::new(),
            comment_lines: Vec::new(),
            second_closest_comment_lines: Vec::new(),
        }
    }

    fn field(name: &str, ty: TypeExpr) -> FieldExpr {
        FieldExpr {
            name: name.to_string(),
            ty,
            embedded: false,
            tag: None,
        }
    }

    fn strukt(fields: Vec<FieldExpr>) -> TypeExpr {
        TypeExpr::Struct { fields }
    }

    #[test]
    fn test_mutually_recursive_structs_terminate() {
        let a = decl(
            "A",
            strukt(vec![field("B", TypeExpr::pointer(TypeExpr::named(PKG, "B")))]),
        );
        let b = decl(
            "B",
            strukt(vec![field("A", TypeExpr::pointer(TypeExpr::named(PKG, "A")))]),
        );
        let fixture = Fixture::default().with(PKG, a.clone()).with(PKG, b);
        let mut universe = Universe::new();
        let options = WalkOptions::default();
        let mut walker = Walker::new(&mut universe, &fixture, &options);
        let a_id = walker.walk_type_decl(PKG, &a);

        let b_id = universe.lookup(&Name::new(PKG, "B")).unwrap();
        assert_eq!(universe.kind(a_id), Kind::Struct);
        assert_eq!(universe.kind(b_id), Kind::Struct);

        let (_, a_member) = universe.get(a_id).members().next().unwrap();
        assert_eq!(universe.get(a_member).elem(), Some(b_id));
        let (_, b_member) = universe.get(b_id).members().next().unwrap();
        assert_eq!(universe.get(b_member).elem(), Some(a_id));
        assert!(universe.diagnostics().is_empty());
    }

    #[test]
    fn test_self_referential_struct() {
        let node = decl(
            "Node",
            strukt(vec![
                field("Value", TypeExpr::basic("string")),
                field("Next", TypeExpr::pointer(TypeExpr::named(PKG, "Node"))),
                field("Children", TypeExpr::slice(TypeExpr::named(PKG, "Node"))),
            ]),
        );
        let fixture = Fixture::default().with(PKG, node.clone());
        let mut universe = Universe::new();
        let options = WalkOptions::default();
        let id = Walker::new(&mut universe, &fixture, &options).walk_type_decl(PKG, &node);

        let members: Vec<_> = universe.get(id).members().collect();
        assert_eq!(members.len(), 3);
        assert_eq!(universe.get(members[1].1).elem(), Some(id));
        assert_eq!(universe.get(members[2].1).elem(), Some(id));
        assert!(universe.iter().all(|(_, t)| t.is_classified()));
    }

    #[test]
    fn test_builtins_stay_canonical() {
        let mut universe = Universe::new();
        let string = universe.builtin("string").unwrap();
        let uint8 = universe.builtin("uint8").unwrap();
        let options = WalkOptions::default();
        let mut walker = Walker::new(&mut universe, &NoDefinitions, &options);
        assert_eq!(walker.walk(&TypeExpr::basic("string"), None), string);
        assert_eq!(walker.walk(&TypeExpr::basic("byte"), None), uint8);
        let bytes = walker.walk(&TypeExpr::slice(TypeExpr::basic("byte")), None);
        let uint8s = walker.walk(&TypeExpr::slice(TypeExpr::basic("uint8")), None);
        assert_eq!(universe.get(bytes).elem(), Some(uint8));
        assert_eq!(universe.get(uint8s).elem(), Some(uint8));
    }

    #[test]
    fn test_identical_shapes_share_a_node() {
        let mut universe = Universe::new();
        let options = WalkOptions::default();
        let mut walker = Walker::new(&mut universe, &NoDefinitions, &options);
        let expr = TypeExpr::Map {
            key: Box::new(TypeExpr::basic("string")),
            elem: Box::new(TypeExpr::basic("int")),
        };
        let first = walker.walk(&expr, None);
        let second = walker.walk(&expr, None);
        assert_eq!(first, second);
        assert_eq!(universe.get(first).name, Name::builtin("map[string]int"));
    }

    #[test]
    fn test_degraded_fields_are_dropped_with_diagnostics() {
        let holder = decl(
            "Holder",
            strukt(vec![
                field("Name", TypeExpr::basic("string")),
                field("Secret", TypeExpr::named(PKG, "secret")),
                field("Raw", TypeExpr::Unrecognized { text: "unsafe.Pointer".into() }),
                field("Items", TypeExpr::slice(TypeExpr::named(PKG, "secret"))),
                field("hidden", TypeExpr::basic("int")),
            ]),
        );
        let mut universe = Universe::new();
        let options = WalkOptions::default();
        let id = Walker::new(&mut universe, &NoDefinitions, &options).walk_type_decl(PKG, &holder);

        let names: Vec<_> = universe
            .get(id)
            .members()
            .map(|(n, _)| n.name.clone())
            .collect();
        assert_eq!(names, ["Name"]);
        let dropped: Vec<_> = universe
            .diagnostics()
            .of_kind(DiagnosticKind::DroppedField)
            .map(|d| d.subject.clone())
            .collect();
        assert_eq!(
            dropped,
            [
                "example.com/api.Holder.Secret",
                "example.com/api.Holder.Raw",
                "example.com/api.Holder.Items",
            ]
        );
    }

    #[test]
    fn test_unresolved_named_type_is_unknown() {
        let mut universe = Universe::new();
        let options = WalkOptions::default();
        let id = Walker::new(&mut universe, &NoDefinitions, &options)
            .walk(&TypeExpr::named(PKG, "Missing"), None);
        assert_eq!(universe.kind(id), Kind::Unknown);
        assert_eq!(
            universe
                .diagnostics()
                .of_kind(DiagnosticKind::UnresolvedType)
                .count(),
            1
        );
    }

    #[test]
    fn test_external_schema_packages() {
        let options = WalkOptions {
            external_schema_packages: vec!["time".into(), "google.golang.org/protobuf".into()],
        };
        assert!(options.is_external("time"));
        assert!(options.is_external("google.golang.org/protobuf/types/known/timestamppb"));
        assert!(!options.is_external("timeutil"));

        let mut universe = Universe::new();
        let id = Walker::new(&mut universe, &NoDefinitions, &options)
            .walk(&TypeExpr::named("time", "Time"), None);
        assert_eq!(universe.kind(id), Kind::ExternalSchema);
        assert!(universe.diagnostics().is_empty());
    }

    #[test]
    fn test_named_basic_points_at_primitive() {
        let phase = decl("Phase", TypeExpr::basic("string"));
        let mut universe = Universe::new();
        let string = universe.builtin("string").unwrap();
        let options = WalkOptions::default();
        let id = Walker::new(&mut universe, &NoDefinitions, &options).walk_type_decl(PKG, &phase);
        assert_eq!(universe.kind(id), Kind::Builtin);
        assert_eq!(universe.get(id).underlying(), Some(string));
    }

    #[test]
    fn test_alias_and_defined_types() {
        let base = decl("Base", strukt(vec![field("Name", TypeExpr::basic("string"))]));
        let alias = TypeDecl {
            alias: true,
            ..decl("Other", TypeExpr::named(PKG, "Base"))
        };
        let defined = decl("Derived", TypeExpr::named(PKG, "Base"));
        let fixture = Fixture::default().with(PKG, base);
        let mut universe = Universe::new();
        let options = WalkOptions::default();
        let mut walker = Walker::new(&mut universe, &fixture, &options);
        let alias_id = walker.walk_type_decl(PKG, &alias);
        let defined_id = walker.walk_type_decl(PKG, &defined);

        let base_id = universe.lookup(&Name::new(PKG, "Base")).unwrap();
        assert_eq!(universe.kind(alias_id), Kind::Alias);
        assert_eq!(universe.get(alias_id).underlying(), Some(base_id));
        assert_eq!(universe.kind(defined_id), Kind::Struct);
        assert_eq!(universe.get(defined_id).members().count(), 1);
    }

    #[test]
    fn test_generic_and_unexported_declarations_are_unsupported() {
        let generic = TypeDecl {
            generic: true,
            ..decl("List", strukt(Vec::new()))
        };
        let private = decl("state", strukt(Vec::new()));
        let mut universe = Universe::new();
        let options = WalkOptions::default();
        let mut walker = Walker::new(&mut universe, &NoDefinitions, &options);
        let generic_id = walker.walk_type_decl(PKG, &generic);
        let private_id = walker.walk_type_decl(PKG, &private);
        assert_eq!(universe.kind(generic_id), Kind::Unsupported);
        assert_eq!(universe.kind(private_id), Kind::Unsupported);
    }

    #[test]
    fn test_methods_and_comments() {
        let widget = TypeDecl {
            methods: vec![
                MethodDecl {
                    name: "Validate".into(),
                    signature: SignatureExpr {
                        results: vec![TypeExpr::basic("error")],
                        ..SignatureExpr::default()
                    },
                    comment_lines: Vec::new(),
                },
                MethodDecl {
                    name: "reset".into(),
                    signature: SignatureExpr::default(),
                    comment_lines: Vec::new(),
                },
            ],
            comment_lines: vec!["Widget is a thing.".into()],
            ..decl("Widget", strukt(Vec::new()))
        };
        let mut universe = Universe::new();
        let options = WalkOptions::default();
        let id = Walker::new(&mut universe, &NoDefinitions, &options).walk_type_decl(PKG, &widget);

        let node = universe.get(id);
        assert_eq!(node.comment_lines, ["Widget is a thing."]);
        assert_eq!(node.methods.len(), 1);
        let validate = node.methods[&Name::new(PKG, "Validate")];
        assert_eq!(universe.kind(validate), Kind::Function);
        assert_eq!(universe.get(validate).name, Name::builtin("func() error"));
    }

    #[test]
    fn test_redefinition_is_a_collision() {
        let first = decl("Widget", strukt(Vec::new()));
        let second = decl("Widget", TypeExpr::basic("string"));
        let mut universe = Universe::new();
        let options = WalkOptions::default();
        let mut walker = Walker::new(&mut universe, &NoDefinitions, &options);
        let a = walker.walk_type_decl(PKG, &first);
        let b = walker.walk_type_decl(PKG, &second);
        assert_eq!(a, b);
        assert_eq!(universe.kind(a), Kind::Struct);
        assert_eq!(
            universe
                .diagnostics()
                .of_kind(DiagnosticKind::NameCollision)
                .count(),
            1
        );
    }

    #[test]
    fn test_bound_function_type_is_unsupported() {
        let mut universe = Universe::new();
        let options = WalkOptions::default();
        let bound = TypeExpr::Func {
            signature: SignatureExpr {
                receiver: Some(Box::new(TypeExpr::named(PKG, "Widget"))),
                ..SignatureExpr::default()
            },
        };
        let id = Walker::new(&mut universe, &NoDefinitions, &options).walk(&bound, None);
        assert_eq!(universe.kind(id), Kind::Unsupported);
    }
}
