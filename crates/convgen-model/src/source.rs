//! Type descriptions handed over by a type provider.
//!
//! Providers (a Go source reader, a JSON manifest, a test fixture) describe
//! each package as plain data; the walker turns these descriptions into
//! canonical nodes. Named references are not expanded inline: the walker asks
//! a [`TypeResolver`](crate::walk::TypeResolver) for their definitions, which
//! keeps recursive types finite.

use crate::types::ChanDir;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::PathBuf;

/// Structural description of a Go type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeExpr {
    /// A predeclared type: `string`, `int64`, `error`, `untyped int`.
    Basic { name: String },
    /// Reference to a declared type. `package` is an import path.
    Named { package: String, name: String },
    Struct { fields: Vec<FieldExpr> },
    Map {
        key: Box<TypeExpr>,
        elem: Box<TypeExpr>,
    },
    Slice { elem: Box<TypeExpr> },
    Array {
        len: Option<u64>,
        elem: Box<TypeExpr>,
    },
    Pointer { elem: Box<TypeExpr> },
    Chan { dir: ChanDir, elem: Box<TypeExpr> },
    Func { signature: SignatureExpr },
    Interface {
        methods: Vec<MethodExpr>,
        /// Embedded interfaces, in source order.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        embeds: Vec<TypeExpr>,
    },
    /// Anything the provider could not describe (generic instantiations,
    /// `unsafe.Pointer`, constraint unions). Carries the source text.
    Unrecognized { text: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldExpr {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeExpr,
    #[serde(default)]
    pub embedded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

/// A function signature. For variadic functions the last parameter has the
/// slice type `[]T`, as the Go type checker reports it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SignatureExpr {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<Box<TypeExpr>>,
    #[serde(default)]
    pub params: Vec<TypeExpr>,
    #[serde(default)]
    pub results: Vec<TypeExpr>,
    #[serde(default)]
    pub variadic: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodExpr {
    pub name: String,
    pub signature: SignatureExpr,
}

impl TypeExpr {
    pub fn basic(name: &str) -> Self {
        TypeExpr::Basic {
            name: name.to_string(),
        }
    }

    pub fn named(package: &str, name: &str) -> Self {
        TypeExpr::Named {
            package: package.to_string(),
            name: name.to_string(),
        }
    }

    pub fn pointer(elem: TypeExpr) -> Self {
        TypeExpr::Pointer {
            elem: Box::new(elem),
        }
    }

    pub fn slice(elem: TypeExpr) -> Self {
        TypeExpr::Slice {
            elem: Box::new(elem),
        }
    }

    /// Textual descriptor in Go type-checker notation, with full import
    /// paths as qualifiers: `map[string]*example.com/api.Widget`.
    pub fn descriptor(&self) -> String {
        let mut out = String::new();
        self.write_descriptor(&mut out);
        out
    }

    fn write_descriptor(&self, out: &mut String) {
        match self {
            TypeExpr::Basic { name } => out.push_str(name),
            TypeExpr::Named { package, name } => {
                if !package.is_empty() {
                    out.push_str(package);
                    out.push('.');
                }
                out.push_str(name);
            }
            TypeExpr::Struct { fields } => {
                out.push_str("struct{");
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        out.push_str("; ");
                    }
                    if !field.embedded {
                        out.push_str(&field.name);
                        out.push(' ');
                    }
                    field.ty.write_descriptor(out);
                }
                out.push('}');
            }
            TypeExpr::Map { key, elem } => {
                out.push_str("map[");
                key.write_descriptor(out);
                out.push(']');
                elem.write_descriptor(out);
            }
            TypeExpr::Slice { elem } => {
                out.push_str("[]");
                elem.write_descriptor(out);
            }
            TypeExpr::Array { len, elem } => {
                match len {
                    Some(len) => {
                        let _ = write!(out, "[{len}]");
                    }
                    None => out.push_str("[...]"),
                }
                elem.write_descriptor(out);
            }
            TypeExpr::Pointer { elem } => {
                out.push('*');
                elem.write_descriptor(out);
            }
            TypeExpr::Chan { dir, elem } => {
                out.push_str(match dir {
                    ChanDir::Both => "chan ",
                    ChanDir::Send => "chan<- ",
                    ChanDir::Recv => "<-chan ",
                });
                elem.write_descriptor(out);
            }
            TypeExpr::Func { signature } => {
                out.push_str("func");
                signature.write_descriptor(out);
            }
            TypeExpr::Interface { methods, embeds } => {
                out.push_str("interface{");
                for (i, embed) in embeds.iter().enumerate() {
                    if i > 0 {
                        out.push_str("; ");
                    }
                    embed.write_descriptor(out);
                }
                for (i, method) in methods.iter().enumerate() {
                    if i > 0 || !embeds.is_empty() {
                        out.push_str("; ");
                    }
                    out.push_str(&method.name);
                    method.signature.write_descriptor(out);
                }
                out.push('}');
            }
            TypeExpr::Unrecognized { text } => out.push_str(text),
        }
    }
}

impl TypeExpr {
    /// Visit the package path of every named reference in this expression.
    pub fn visit_packages_mut(&mut self, f: &mut dyn FnMut(&mut String)) {
        match self {
            TypeExpr::Named { package, .. } => f(package),
            TypeExpr::Basic { .. } | TypeExpr::Unrecognized { .. } => {}
            TypeExpr::Struct { fields } => {
                for field in fields {
                    field.ty.visit_packages_mut(f);
                }
            }
            TypeExpr::Map { key, elem } => {
                key.visit_packages_mut(f);
                elem.visit_packages_mut(f);
            }
            TypeExpr::Slice { elem }
            | TypeExpr::Array { elem, .. }
            | TypeExpr::Pointer { elem }
            | TypeExpr::Chan { elem, .. } => elem.visit_packages_mut(f),
            TypeExpr::Func { signature } => signature.visit_packages_mut(f),
            TypeExpr::Interface { methods, embeds } => {
                for method in methods {
                    method.signature.visit_packages_mut(f);
                }
                for embed in embeds {
                    embed.visit_packages_mut(f);
                }
            }
        }
    }
}

impl SignatureExpr {
    fn visit_packages_mut(&mut self, f: &mut dyn FnMut(&mut String)) {
        let receiver = self.receiver.iter_mut().map(|r| &mut **r);
        for ty in receiver.chain(&mut self.params).chain(&mut self.results) {
            ty.visit_packages_mut(f);
        }
    }

    fn write_descriptor(&self, out: &mut String) {
        out.push('(');
        let last = self.params.len().saturating_sub(1);
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            match param {
                TypeExpr::Slice { elem } if self.variadic && i == last => {
                    out.push_str("...");
                    elem.write_descriptor(out);
                }
                _ => param.write_descriptor(out),
            }
        }
        out.push(')');
        match self.results.as_slice() {
            [] => {}
            [single] => {
                out.push(' ');
                single.write_descriptor(out);
            }
            many => {
                out.push_str(" (");
                for (i, result) in many.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    result.write_descriptor(out);
                }
                out.push(')');
            }
        }
    }
}

/// Literal value of a constant declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ConstValue {
    String(String),
    Bool(bool),
    Int(i64),
    Float(f64),
    /// An expression the provider did not evaluate, kept as source text.
    Expr(String),
}

impl ConstValue {
    /// Strings render as their raw, unquoted, untruncated text; every other
    /// value renders in a human-readable form that is for display only.
    pub fn render(&self) -> String {
        match self {
            ConstValue::String(s) => s.clone(),
            ConstValue::Bool(b) => b.to_string(),
            ConstValue::Int(i) => i.to_string(),
            ConstValue::Float(f) => format!("{f}"),
            ConstValue::Expr(text) => text.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub name: String,
    pub signature: SignatureExpr,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comment_lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: String,
    pub definition: TypeExpr,
    /// `type A = B` rather than `type A B`.
    #[serde(default)]
    pub alias: bool,
    /// Declared with type parameters.
    #[serde(default)]
    pub generic: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<MethodDecl>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comment_lines: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub second_closest_comment_lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: String,
    pub signature: SignatureExpr,
    #[serde(default)]
    pub generic: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comment_lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeExpr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstantDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeExpr,
    pub value: ConstValue,
}

/// A top-level declaration of a package scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "decl", rename_all = "snake_case")]
pub enum Declaration {
    Type(TypeDecl),
    Function(FunctionDecl),
    Variable(VariableDecl),
    Constant(ConstantDecl),
}

impl Declaration {
    pub fn name(&self) -> &str {
        match self {
            Declaration::Type(d) => &d.name,
            Declaration::Function(d) => &d.name,
            Declaration::Variable(d) => &d.name,
            Declaration::Constant(d) => &d.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportDecl {
    /// Explicit local alias, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    pub path: String,
}

impl ImportDecl {
    /// Name the import is referred to by inside the importing file. Without
    /// an alias this is a guess until the imported package clause is read.
    pub fn local_name(&self) -> &str {
        self.alias
            .as_deref()
            .unwrap_or_else(|| crate::name::assumed_package_name(&self.path))
    }
}

/// Everything a provider reports for one package directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageData {
    pub path: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_path: Option<PathBuf>,
    #[serde(default)]
    pub declarations: Vec<Declaration>,
    #[serde(default)]
    pub imports: Vec<ImportDecl>,
}

impl PackageData {
    pub fn types(&self) -> impl Iterator<Item = &TypeDecl> {
        self.declarations.iter().filter_map(|d| match d {
            Declaration::Type(t) => Some(t),
            _ => None,
        })
    }

    /// Visit the package path of every named reference in every declaration.
    pub fn visit_packages_mut(&mut self, f: &mut dyn FnMut(&mut String)) {
        for decl in &mut self.declarations {
            match decl {
                Declaration::Type(t) => {
                    t.definition.visit_packages_mut(f);
                    for method in &mut t.methods {
                        method.signature.visit_packages_mut(f);
                    }
                }
                Declaration::Function(func) => func.signature.visit_packages_mut(f),
                Declaration::Variable(v) => v.ty.visit_packages_mut(f),
                Declaration::Constant(c) => c.ty.visit_packages_mut(f),
            }
        }
    }
}
