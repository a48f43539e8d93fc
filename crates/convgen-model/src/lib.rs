//! Canonical, cycle-safe type model for Go conversion generation.
//!
//! # Architecture
//!
//! ```text
//! Provider data          Walker / Extractors         Universe
//! ─────────────     ──────────────────────────     ──────────────
//! TypeExpr      ─┐                                ┌─> packages (path → Package)
//! Declaration   ─┼─> Walker::walk_type_decl ──────┼─> nodes (TypeId → Type)
//! PackageData   ─┘   Walker::declare_*            └─> diagnostics
//! ```
//!
//! Every qualified [`Name`] maps to exactly one node for the lifetime of a
//! [`Universe`]. Nodes start as placeholders and are classified once.
//!
//! # Example
//!
//! ```
//! use convgen_model::{Kind, Name, NoDefinitions, TypeExpr, Universe, WalkOptions, Walker};
//!
//! let mut universe = Universe::new();
//! let options = WalkOptions::default();
//! let mut walker = Walker::new(&mut universe, &NoDefinitions, &options);
//! let names = walker.walk(&TypeExpr::slice(TypeExpr::basic("string")), None);
//!
//! assert_eq!(universe.kind(names), Kind::Slice);
//! assert_eq!(universe.get(names).name, Name::builtin("[]string"));
//! ```

pub mod builtins;
mod declare;
pub mod diagnostics;
pub mod kind;
pub mod name;
pub mod package;
pub mod source;
pub mod types;
pub mod universe;
pub mod walk;

pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use kind::Kind;
pub use name::Name;
pub use package::{Package, PackageRef};
pub use source::{
    ConstValue, ConstantDecl, Declaration, FieldExpr, FunctionDecl, ImportDecl, MethodDecl,
    MethodExpr, PackageData, SignatureExpr, TypeDecl, TypeExpr, VariableDecl,
};
pub use types::{ChanDir, NodeState, Shape, Signature, Type, TypeId};
pub use universe::Universe;
pub use walk::{NoDefinitions, TypeResolver, WalkOptions, Walker};
