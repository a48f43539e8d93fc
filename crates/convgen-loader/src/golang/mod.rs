//! Go source provider backed by tree-sitter.
//!
//! Reads the non-test `.go` files of a package directory and describes every
//! top-level declaration as [`PackageData`]. Named type references are kept
//! as references; the walker resolves them against the loaded packages.

mod consts;
mod types;

use crate::error::LoadError;
use crate::go_mod::GoModule;
use crate::provider::TypeProvider;
use consts::{ConstScope, KnownConstants};
use convgen_model::name::assumed_package_name;
use convgen_model::{
    ConstantDecl, Declaration, FunctionDecl, ImportDecl, MethodDecl, PackageData, TypeDecl,
    TypeExpr, VariableDecl,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tree_sitter::{Node, Parser};
use types::FileScope;

/// Marker line convgen writes above the package clause. Files carrying it
/// are skipped when reading a package so a rerun sees the same input as the
/// first run.
pub const GENERATED_MARKER: &str = "// Code generated by convgen. DO NOT EDIT.";

pub struct GoSourceProvider;

impl TypeProvider for GoSourceProvider {
    fn name(&self) -> &'static str {
        "go"
    }

    fn load_package(&self, dir: &Path) -> Result<PackageData, LoadError> {
        let dir = dir.canonicalize().map_err(|e| LoadError::io(dir, e))?;
        let module =
            GoModule::discover(&dir).ok_or_else(|| LoadError::MissingGoMod(dir.clone()))?;
        let import_path = module
            .import_path(&dir)
            .ok_or_else(|| LoadError::MissingGoMod(dir.clone()))?;

        let mut sources = Vec::new();
        for file in source_files(&dir)? {
            let source = std::fs::read_to_string(&file).map_err(|e| LoadError::io(&file, e))?;
            if is_generated(&source) {
                tracing::debug!(file = %file.display(), "skipping generated file");
                continue;
            }
            sources.push((file, source));
        }
        if sources.is_empty() {
            return Err(LoadError::NoSources(dir));
        }

        let mut data = read_package(&import_path, &sources)?;
        data.source_path = Some(dir);
        Ok(data)
    }

    fn resolve_import(&self, importer: &Path, import_path: &str) -> Option<PathBuf> {
        let module = GoModule::discover(importer)?;
        let dir = module.resolve_import(import_path)?;
        dir.is_dir().then_some(dir)
    }
}

/// Whether the marker appears before the package clause.
fn is_generated(source: &str) -> bool {
    source
        .lines()
        .take_while(|line| !line.starts_with("package "))
        .any(|line| line.trim_end() == GENERATED_MARKER)
}

/// Non-test Go files of `dir`, sorted by name.
fn source_files(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    let entries = std::fs::read_dir(dir).map_err(|e| LoadError::io(dir, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| LoadError::io(dir, e))?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.ends_with(".go") && !name.ends_with("_test.go") && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Describe one package from the contents of its files.
pub(crate) fn read_package(
    import_path: &str,
    sources: &[(PathBuf, String)],
) -> Result<PackageData, LoadError> {
    let mut parser = Parser::new();
    parser
        .set_language(&arborium_go::language().into())
        .map_err(|e| LoadError::Parser(format!("tree-sitter init: {}", e)))?;

    let mut reader = PackageReader {
        path: import_path,
        name: None,
        declarations: Vec::new(),
        methods: Vec::new(),
        imports: Vec::new(),
        constants: KnownConstants::new(),
    };
    for (file, source) in sources {
        let tree = parser
            .parse(source, None)
            .ok_or_else(|| LoadError::Parser(format!("failed to parse {}", file.display())))?;
        let root = tree.root_node();
        if root.has_error() {
            let (line, column) = first_error(root);
            return Err(LoadError::Syntax {
                file: file.clone(),
                line,
                column,
            });
        }
        reader.read_file(file, source, root)?;
    }
    Ok(reader.finish())
}

fn first_error(node: Node) -> (usize, usize) {
    if node.is_error() || node.is_missing() {
        let position = node.start_position();
        return (position.row + 1, position.column + 1);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.has_error() {
            return first_error(child);
        }
    }
    let position = node.start_position();
    (position.row + 1, position.column + 1)
}

struct PackageReader<'p> {
    path: &'p str,
    name: Option<String>,
    declarations: Vec<Declaration>,
    /// Methods by receiver base type name.
    methods: Vec<(String, MethodDecl)>,
    imports: Vec<ImportDecl>,
    constants: KnownConstants,
}

impl PackageReader<'_> {
    fn read_file(&mut self, file: &Path, source: &str, root: Node) -> Result<(), LoadError> {
        let mut cursor = root.walk();
        let children: Vec<Node> = root.named_children(&mut cursor).collect();

        let mut file_imports = HashMap::new();
        for child in &children {
            match child.kind() {
                "package_clause" => {
                    let name = child
                        .named_child(0)
                        .map(|n| &source[n.byte_range()])
                        .unwrap_or_default();
                    self.set_name(file, name)?;
                }
                "import_declaration" => self.read_imports(*child, source, &mut file_imports),
                _ => {}
            }
        }

        let scope = FileScope {
            source,
            package: self.path,
            imports: &file_imports,
        };
        for child in children {
            match child.kind() {
                "type_declaration" => self.read_types(&scope, child),
                "function_declaration" => self.read_function(&scope, child),
                "method_declaration" => self.read_method(&scope, child),
                "var_declaration" => self.read_variables(&scope, child),
                "const_declaration" => self.read_constants(&scope, child),
                _ => {}
            }
        }
        Ok(())
    }

    fn set_name(&mut self, file: &Path, name: &str) -> Result<(), LoadError> {
        match &self.name {
            Some(existing) if existing != name => Err(LoadError::MixedPackages {
                dir: file.parent().map(Path::to_path_buf).unwrap_or_default(),
                first: existing.clone(),
                second: name.to_string(),
            }),
            Some(_) => Ok(()),
            None => {
                self.name = Some(name.to_string());
                Ok(())
            }
        }
    }

    fn read_imports(&mut self, node: Node, source: &str, file_imports: &mut HashMap<String, String>) {
        let mut specs = Vec::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "import_spec" => specs.push(child),
                "import_spec_list" => {
                    let mut list_cursor = child.walk();
                    specs.extend(
                        child
                            .named_children(&mut list_cursor)
                            .filter(|s| s.kind() == "import_spec"),
                    );
                }
                _ => {}
            }
        }

        for spec in specs {
            let Some(path) = spec.child_by_field_name("path") else {
                continue;
            };
            let path = source[path.byte_range()].trim_matches(|c| c == '"' || c == '`');
            let alias = spec
                .child_by_field_name("name")
                .map(|n| source[n.byte_range()].to_string());
            match alias.as_deref() {
                Some("_") | Some(".") => continue,
                Some(local) => file_imports.insert(local.to_string(), path.to_string()),
                None => file_imports.insert(assumed_package_name(path).to_string(), path.to_string()),
            };
            let import = ImportDecl {
                alias,
                path: path.to_string(),
            };
            if !self.imports.contains(&import) {
                self.imports.push(import);
            }
        }
    }

    fn read_types(&mut self, scope: &FileScope, decl: Node) {
        let mut cursor = decl.walk();
        for spec in decl.named_children(&mut cursor) {
            if !matches!(spec.kind(), "type_spec" | "type_alias") {
                continue;
            }
            let (Some(name), Some(ty)) = (
                scope.field_text(spec, "name"),
                spec.child_by_field_name("type"),
            ) else {
                continue;
            };
            let (comment_lines, second_closest_comment_lines) = doc_comments(scope, spec, decl);
            tracing::debug!(package = self.path, name, "type");
            self.declarations.push(Declaration::Type(TypeDecl {
                name: name.to_string(),
                definition: scope.type_expr(ty),
                alias: spec.kind() == "type_alias",
                generic: spec.child_by_field_name("type_parameters").is_some(),
                methods: Vec::new(),
                comment_lines,
                second_closest_comment_lines,
            }));
        }
    }

    fn read_function(&mut self, scope: &FileScope, node: Node) {
        let Some(name) = scope.field_text(node, "name") else {
            return;
        };
        let (comment_lines, _) = doc_comments(scope, node, node);
        self.declarations.push(Declaration::Function(FunctionDecl {
            name: name.to_string(),
            signature: scope.signature(node, None),
            generic: node.child_by_field_name("type_parameters").is_some(),
            comment_lines,
        }));
    }

    fn read_method(&mut self, scope: &FileScope, node: Node) {
        let (Some(name), Some(receiver)) = (
            scope.field_text(node, "name"),
            node.child_by_field_name("receiver"),
        ) else {
            return;
        };
        let mut cursor = receiver.walk();
        let Some(receiver_type) = receiver
            .named_children(&mut cursor)
            .find(|c| c.kind() == "parameter_declaration")
            .and_then(|p| p.child_by_field_name("type"))
        else {
            return;
        };
        let Some(base) = receiver_base_name(scope, receiver_type) else {
            return;
        };
        let (comment_lines, _) = doc_comments(scope, node, node);
        let receiver = scope.type_expr(receiver_type);
        self.methods.push((
            base.to_string(),
            MethodDecl {
                name: name.to_string(),
                signature: scope.signature(node, Some(receiver)),
                comment_lines,
            },
        ));
    }

    fn read_variables(&mut self, scope: &FileScope, decl: Node) {
        let mut specs = Vec::new();
        let mut cursor = decl.walk();
        for child in decl.named_children(&mut cursor) {
            match child.kind() {
                "var_spec" => specs.push(child),
                "var_spec_list" => {
                    let mut list_cursor = child.walk();
                    specs.extend(
                        child
                            .named_children(&mut list_cursor)
                            .filter(|s| s.kind() == "var_spec"),
                    );
                }
                _ => {}
            }
        }

        for spec in specs {
            let explicit = spec.child_by_field_name("type").map(|t| scope.type_expr(t));
            let values = expression_list(spec);
            let mut name_cursor = spec.walk();
            let names: Vec<&str> = spec
                .children_by_field_name("name", &mut name_cursor)
                .map(|n| scope.text(n))
                .collect();
            for (i, name) in names.into_iter().enumerate() {
                if name == "_" {
                    continue;
                }
                let ty = explicit
                    .clone()
                    .or_else(|| values.get(i).and_then(|v| self.value_type(scope, *v)))
                    .unwrap_or_else(|| TypeExpr::Unrecognized {
                        text: values.get(i).map(|v| scope.text(*v)).unwrap_or_default().to_string(),
                    });
                self.declarations.push(Declaration::Variable(VariableDecl {
                    name: name.to_string(),
                    ty,
                }));
            }
        }
    }

    /// Type of an initializer expression, for the shapes where it is
    /// evident without type checking.
    fn value_type(&self, scope: &FileScope, node: Node) -> Option<TypeExpr> {
        match node.kind() {
            "composite_literal" => Some(scope.type_expr(node.child_by_field_name("type")?)),
            "unary_expression" if scope.field_text(node, "operator") == Some("&") => {
                let operand = node.child_by_field_name("operand")?;
                (operand.kind() == "composite_literal")
                    .then(|| self.value_type(scope, operand))
                    .flatten()
                    .map(TypeExpr::pointer)
            }
            "int_literal" => Some(TypeExpr::basic("int")),
            "float_literal" => Some(TypeExpr::basic("float64")),
            "rune_literal" => Some(TypeExpr::basic("rune")),
            "interpreted_string_literal" | "raw_string_literal" => Some(TypeExpr::basic("string")),
            "true" | "false" => Some(TypeExpr::basic("bool")),
            "identifier" => {
                let (_, ty) = self.constants.get(scope.text(node))?;
                Some(match ty {
                    TypeExpr::Basic { name } => match name.strip_prefix("untyped ") {
                        Some("float") => TypeExpr::basic("float64"),
                        Some("rune") => TypeExpr::basic("rune"),
                        Some(other) => TypeExpr::basic(other),
                        None => ty.clone(),
                    },
                    _ => ty.clone(),
                })
            }
            _ => None,
        }
    }

    fn read_constants(&mut self, scope: &FileScope, decl: Node) {
        let mut cursor = decl.walk();
        let specs: Vec<Node> = decl
            .named_children(&mut cursor)
            .filter(|c| c.kind() == "const_spec")
            .collect();

        // implicit repetition reuses the last explicit type and expressions
        let mut previous: (Option<Node>, Vec<Node>) = (None, Vec::new());
        for (iota, spec) in specs.into_iter().enumerate() {
            let values = expression_list(spec);
            if !values.is_empty() {
                previous = (spec.child_by_field_name("type"), values);
            }
            let (type_node, values) = &previous;

            let mut name_cursor = spec.walk();
            let names: Vec<&str> = spec
                .children_by_field_name("name", &mut name_cursor)
                .map(|n| scope.text(n))
                .collect();
            for (i, name) in names.into_iter().enumerate() {
                let eval = ConstScope {
                    file: scope,
                    known: &self.constants,
                    iota: iota as i64,
                };
                let Some(expr) = values.get(i) else {
                    continue;
                };
                let value = eval.value(*expr);
                let ty = match type_node {
                    Some(t) => scope.type_expr(*t),
                    None => eval.infer_type(*expr, &value),
                };
                if name == "_" {
                    continue;
                }
                self.constants
                    .insert(name.to_string(), (value.clone(), ty.clone()));
                self.declarations.push(Declaration::Constant(ConstantDecl {
                    name: name.to_string(),
                    ty,
                    value,
                }));
            }
        }
    }

    fn finish(self) -> PackageData {
        let PackageReader {
            path,
            name,
            mut declarations,
            methods,
            imports,
            ..
        } = self;
        for (receiver, method) in methods {
            let target = declarations.iter_mut().find_map(|d| match d {
                Declaration::Type(t) if t.name == receiver => Some(t),
                _ => None,
            });
            match target {
                Some(decl) => decl.methods.push(method),
                None => tracing::debug!(
                    receiver = %receiver,
                    method = %method.name,
                    "method without receiver type"
                ),
            }
        }
        PackageData {
            path: path.to_string(),
            name: name.unwrap_or_else(|| assumed_package_name(path).to_string()),
            source_path: None,
            declarations,
            imports,
        }
    }
}

fn expression_list(spec: Node) -> Vec<Node> {
    let Some(list) = spec.child_by_field_name("value") else {
        return Vec::new();
    };
    let mut cursor = list.walk();
    list.named_children(&mut cursor)
        .filter(|n| n.kind() != "comment")
        .collect()
}

/// Local name of a method receiver's type: `T`, `*T` or `T[K]`.
fn receiver_base_name<'a>(scope: &FileScope<'a>, node: Node) -> Option<&'a str> {
    match node.kind() {
        "type_identifier" => Some(scope.text(node)),
        "pointer_type" | "parenthesized_type" => receiver_base_name(scope, node.named_child(0)?),
        "generic_type" => receiver_base_name(scope, node.child_by_field_name("type")?),
        _ => None,
    }
}

/// Doc comment of a declaration and the comment block one blank line above
/// it. For an ungrouped `type X ...` the comments sit before the enclosing
/// declaration rather than the spec.
fn doc_comments(scope: &FileScope, spec: Node, decl: Node) -> (Vec<String>, Vec<String>) {
    let ungrouped = spec
        .prev_sibling()
        .is_some_and(|s| matches!(s.kind(), "type" | "var" | "const"));
    if ungrouped {
        comment_blocks(scope, decl)
    } else {
        comment_blocks(scope, spec)
    }
}

fn comment_blocks(scope: &FileScope, node: Node) -> (Vec<String>, Vec<String>) {
    let mut boundary = node.start_position().row;
    let mut sibling = node.prev_sibling();

    let mut closest = Vec::new();
    while let Some(comment) = sibling.filter(|s| s.kind() == "comment") {
        if comment.end_position().row + 1 != boundary {
            break;
        }
        closest.push(comment);
        boundary = comment.start_position().row;
        sibling = comment.prev_sibling();
    }

    let mut second = Vec::new();
    let mut gap = 2;
    while let Some(comment) = sibling.filter(|s| s.kind() == "comment") {
        if comment.end_position().row + gap != boundary {
            break;
        }
        second.push(comment);
        gap = 1;
        boundary = comment.start_position().row;
        sibling = comment.prev_sibling();
    }

    (comment_text(scope, &closest), comment_text(scope, &second))
}

/// Comment nodes (collected bottom-up) as source-ordered lines without
/// comment markers.
fn comment_text(scope: &FileScope, comments: &[Node]) -> Vec<String> {
    let mut lines = Vec::new();
    for comment in comments.iter().rev() {
        let text = scope.text(*comment);
        if let Some(line) = text.strip_prefix("//") {
            lines.push(line.strip_prefix(' ').unwrap_or(line).trim_end().to_string());
        } else {
            let inner = text
                .strip_prefix("/*")
                .and_then(|t| t.strip_suffix("*/"))
                .unwrap_or(text);
            lines.extend(inner.lines().map(|l| l.trim().to_string()));
        }
    }
    lines
}
