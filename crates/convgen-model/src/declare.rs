//! Declaration extractors: top-level functions, variables and constants.
//!
//! Each declaration becomes a `DeclarationOf` node in its package's
//! function, variable or constant table. The node's `underlying` is the
//! walked type of the signature or value.

use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::name::Name;
use crate::source::{ConstantDecl, FunctionDecl, TypeExpr, VariableDecl};
use crate::types::{NodeState, Shape, TypeId};
use crate::walk::Walker;

impl Walker<'_> {
    pub fn declare_function(&mut self, package: &str, decl: &FunctionDecl) -> TypeId {
        let name = Name::new(package, &decl.name);
        let id = self.universe().function(&name);
        if self.universe().get(id).underlying().is_some() {
            return id;
        }
        if decl.generic {
            self.universe().report(Diagnostic::new(
                DiagnosticKind::UnsupportedShape,
                name.to_string(),
                "generic functions are not supported",
            ));
        }
        let (func_type, mut signature) = self.walk_func(&decl.signature);
        signature.comment_lines = decl.comment_lines.clone();
        let node = self.universe().node_mut(id);
        node.comment_lines = decl.comment_lines.clone();
        node.state = NodeState::Classified(Shape::DeclarationOf {
            underlying: Some(func_type),
            signature: Some(signature),
        });
        tracing::debug!(function = %name, "declared");
        id
    }

    pub fn declare_variable(&mut self, package: &str, decl: &VariableDecl) -> TypeId {
        let name = Name::new(package, &decl.name);
        let id = self.universe().variable(&name);
        if self.universe().get(id).underlying().is_some() {
            return id;
        }
        if let TypeExpr::Unrecognized { text } = &decl.ty {
            self.universe().report(Diagnostic::new(
                DiagnosticKind::UnsupportedShape,
                name.to_string(),
                format!("type of `{text}` cannot be inferred; variable has no type"),
            ));
            return id;
        }
        let ty = self.walk(&decl.ty, None);
        self.set_underlying(id, ty);
        id
    }

    pub fn declare_constant(&mut self, package: &str, decl: &ConstantDecl) -> TypeId {
        let name = Name::new(package, &decl.name);
        let id = self.universe().constant(&name);
        if self.universe().get(id).underlying().is_some() {
            return id;
        }
        let ty = self.walk(&decl.ty, None);
        self.set_underlying(id, ty);
        self.universe().node_mut(id).const_value = Some(decl.value.render());
        id
    }

    fn set_underlying(&mut self, id: TypeId, ty: TypeId) {
        self.universe().node_mut(id).state = NodeState::Classified(Shape::DeclarationOf {
            underlying: Some(ty),
            signature: None,
        });
    }
}
