//! Walking whole packages described as provider data.

use convgen_model::{
    DiagnosticKind, FieldExpr, Kind, Name, PackageData, Shape, TypeDecl, TypeExpr, TypeId,
    TypeResolver, Universe, WalkOptions, Walker,
};

struct Packages(Vec<PackageData>);

impl TypeResolver for Packages {
    fn resolve(&self, package: &str, name: &str) -> Option<&TypeDecl> {
        self.0
            .iter()
            .find(|p| p.path == package)?
            .types()
            .find(|t| t.name == name)
    }
}

fn package(json: serde_json::Value) -> PackageData {
    serde_json::from_value(json).unwrap()
}

fn walk_all(packages: &Packages, universe: &mut Universe) {
    let options = WalkOptions::default();
    let mut walker = Walker::new(universe, packages, &options);
    for data in &packages.0 {
        for decl in data.types() {
            walker.walk_type_decl(&data.path, decl);
        }
    }
}

fn string_field(name: &str) -> serde_json::Value {
    serde_json::json!({"name": name, "type": {"kind": "basic", "name": "string"}})
}

#[test]
fn mutually_recursive_packages_terminate() {
    let packages = Packages(vec![
        package(serde_json::json!({
            "path": "example.com/a",
            "name": "a",
            "declarations": [{"decl": "type", "name": "A", "definition": {"kind": "struct", "fields": [
                string_field("Label"),
                {"name": "Peer", "type": {"kind": "pointer", "elem": {"kind": "named", "package": "example.com/b", "name": "B"}}}
            ]}}]
        })),
        package(serde_json::json!({
            "path": "example.com/b",
            "name": "b",
            "declarations": [{"decl": "type", "name": "B", "definition": {"kind": "struct", "fields": [
                {"name": "Peers", "type": {"kind": "map", "key": {"kind": "basic", "name": "string"},
                    "elem": {"kind": "pointer", "elem": {"kind": "named", "package": "example.com/a", "name": "A"}}}}
            ]}}]
        })),
    ]);
    let mut universe = Universe::new();
    walk_all(&packages, &mut universe);

    let a = universe.lookup(&Name::new("example.com/a", "A")).unwrap();
    let b = universe.lookup(&Name::new("example.com/b", "B")).unwrap();
    assert_eq!(universe.kind(a), Kind::Struct);
    assert_eq!(universe.kind(b), Kind::Struct);

    let peer = universe
        .get(a)
        .members()
        .find(|(n, _)| n.name == "Peer")
        .map(|(_, id)| id)
        .unwrap();
    assert_eq!(universe.get(peer).elem(), Some(b));

    let (_, peers) = universe.get(b).members().next().unwrap();
    let elem = universe.get(peers).elem().unwrap();
    assert_eq!(universe.get(elem).elem(), Some(a));
    assert!(universe.diagnostics().is_empty());
}

#[test]
fn builtins_are_shared_across_packages() {
    let packages = Packages(
        ["example.com/x", "example.com/y", "example.com/z"]
            .iter()
            .map(|path| {
                package(serde_json::json!({
                    "path": path,
                    "name": "p",
                    "declarations": [{"decl": "type", "name": "T", "definition": {"kind": "struct", "fields": [
                        string_field("Name")
                    ]}}]
                }))
            })
            .collect(),
    );
    let mut universe = Universe::new();
    walk_all(&packages, &mut universe);

    let string = universe.builtin("string").unwrap();
    for data in &packages.0 {
        let t = universe.lookup(&Name::new(&data.path, "T")).unwrap();
        let (_, member) = universe.get(t).members().next().unwrap();
        assert_eq!(member, string);
    }
}

#[test]
fn embedded_interfaces_are_distinct_shapes() {
    let reader = serde_json::json!({"kind": "named", "package": "example.com/a", "name": "Reader"});
    let packages = Packages(vec![package(serde_json::json!({
        "path": "example.com/a",
        "name": "a",
        "declarations": [
            {"decl": "type", "name": "Reader", "definition": {"kind": "interface", "methods": [
                {"name": "Read", "signature": {
                    "params": [{"kind": "slice", "elem": {"kind": "basic", "name": "byte"}}],
                    "results": [{"kind": "basic", "name": "int"}, {"kind": "basic", "name": "error"}]
                }}
            ]}},
            {"decl": "type", "name": "Source", "definition": {"kind": "struct", "fields": [
                {"name": "Any", "type": {"kind": "interface", "methods": []}},
                {"name": "Stream", "type": {"kind": "interface", "methods": [], "embeds": [reader]}},
                {"name": "Foreign", "type": {"kind": "interface", "methods": [],
                    "embeds": [{"kind": "named", "package": "io", "name": "Reader"}]}}
            ]}}
        ]
    }))]);
    let mut universe = Universe::new();
    walk_all(&packages, &mut universe);

    let source = universe.lookup(&Name::new("example.com/a", "Source")).unwrap();
    let members: Vec<(&str, TypeId)> = universe
        .get(source)
        .members()
        .map(|(name, id)| (name.name.as_str(), id))
        .collect();
    let [("Any", any), ("Stream", stream)] = members.as_slice() else {
        panic!("unexpected members {members:?}");
    };
    assert_ne!(any, stream);
    assert_eq!(universe.get(*any).name, Name::builtin("interface{}"));
    assert_eq!(
        universe.get(*stream).name,
        Name::builtin("interface{example.com/a.Reader}")
    );

    let reader_id = universe.lookup(&Name::new("example.com/a", "Reader")).unwrap();
    let Some(Shape::Interface { methods, embeds }) = universe.get(*stream).shape() else {
        panic!("Stream is not an interface");
    };
    assert_eq!(embeds, &[reader_id]);
    let method_names: Vec<&str> = methods.keys().map(|name| name.name.as_str()).collect();
    assert_eq!(method_names, ["Read"]);

    // io.Reader has no definition: its method set is unknown, so the field goes.
    assert!(
        universe
            .diagnostics()
            .of_kind(DiagnosticKind::DroppedField)
            .any(|d| d.subject == "example.com/a.Source.Foreign")
    );
}

#[test]
fn second_lookup_returns_the_same_node() {
    let mut universe = Universe::new();
    let name = Name::new("example.com/api", "Widget");
    let first = universe.type_(&name);
    universe.package("example.com/other");
    assert_eq!(universe.type_(&name), first);
    assert_eq!(universe.lookup(&name), Some(first));
}

#[test]
fn unsupported_fields_are_dropped() {
    let data = PackageData {
        path: "example.com/api".into(),
        name: "api".into(),
        source_path: None,
        declarations: vec![convgen_model::Declaration::Type(TypeDecl {
            name: "Holder".into(),
            definition: TypeExpr::Struct {
                fields: vec![
                    FieldExpr {
                        name: "Name".into(),
                        ty: TypeExpr::basic("string"),
                        embedded: false,
                        tag: Some("`json:\"name\"`".into()),
                    },
                    FieldExpr {
                        name: "Opaque".into(),
                        ty: TypeExpr::Unrecognized {
                            text: "unsafe.Pointer".into(),
                        },
                        embedded: false,
                        tag: None,
                    },
                ],
            },
            alias: false,
            generic: false,
            methods: Vec::new(),
            comment_lines: Vec::new(),
            second_closest_comment_lines: Vec::new(),
        })],
        imports: Vec::new(),
    };
    let packages = Packages(vec![data]);
    let mut universe = Universe::new();
    walk_all(&packages, &mut universe);

    let holder = universe.lookup(&Name::new("example.com/api", "Holder")).unwrap();
    let members: Vec<_> = universe.get(holder).members().map(|(n, _)| n.name.as_str()).collect();
    assert_eq!(members, ["Name"]);
    assert_eq!(
        universe
            .diagnostics()
            .of_kind(DiagnosticKind::DroppedField)
            .count(),
        1
    );
}

#[test]
fn dump_lists_loaded_packages() {
    let mut universe = Universe::new();
    let options = WalkOptions::default();
    let decl = TypeDecl {
        name: "Phase".into(),
        definition: TypeExpr::basic("string"),
        alias: false,
        generic: false,
        methods: Vec::new(),
        comment_lines: vec!["Phase of a widget.".into()],
        second_closest_comment_lines: Vec::new(),
    };
    Walker::new(&mut universe, &convgen_model::NoDefinitions, &options)
        .walk_type_decl("example.com/api", &decl);
    universe.package("example.com/api").loaded = true;

    let dump = universe.dump();
    let packages = dump["packages"].as_array().unwrap();
    assert_eq!(packages.len(), 1);
    assert_eq!(packages[0]["path"], "example.com/api");
    let phase = &packages[0]["nodes"]["Phase"];
    assert_eq!(phase["state"]["state"], "Classified");
    assert_eq!(phase["state"]["shape"]["kind"], "Builtin");
    assert_eq!(phase["comment_lines"][0], "Phase of a widget.");
}
