//! Conversion planning.
//!
//! For every loaded versioned package linked to an internal package, each
//! struct type gets a pair of conversion functions. A function that already
//! exists in the versioned package under the conventional name is
//! registered as hand-written; all others are generated from a field-by-field
//! match of the two struct shapes.

use convgen_model::{Diagnostic, DiagnosticKind, Diagnostics, Kind, Package, Shape, TypeId, Universe};
use std::collections::HashMap;
use std::path::PathBuf;

/// `Convert_<from>_<T>_To_<to>_<T>` for both directions, keyed by package
/// names: `(versioned → internal, internal → versioned)`.
pub fn conversion_names(versioned: &str, internal: &str, type_name: &str) -> (String, String) {
    (
        format!("Convert_{versioned}_{type_name}_To_{internal}_{type_name}"),
        format!("Convert_{internal}_{type_name}_To_{versioned}_{type_name}"),
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    ToInternal,
    FromInternal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// Defined by hand in the versioned package; registered with
    /// `AddConversionFunc`.
    HandWritten,
    /// Synthesized into the artifact; registered with
    /// `AddGeneratedConversionFunc`.
    Generated,
}

/// How one destination field is filled from its source field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldStep {
    /// `out.F = in.F`
    Assign,
    /// `out.F = T(in.F)`, `target` being the destination field type.
    Cast { target: TypeId },
    /// Nested struct with a planned conversion.
    Convert { function: String },
    /// `*S` to `*D`; `elem` is `D`.
    ConvertPointer { function: String, elem: TypeId },
    /// `[]S` to `[]D`; `elem` is `D`.
    ConvertSlice { function: String, elem: TypeId },
    /// `map[K]S` to `map[K]D`.
    ConvertMap { function: String, key: TypeId, elem: TypeId },
    /// No strategy applies; the generated code carries a warning comment.
    Manual { reason: ManualReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManualReason {
    Incompatible,
    MissingInPeer,
}

impl ManualReason {
    pub fn as_str(self) -> &'static str {
        match self {
            ManualReason::Incompatible => "requires manual conversion",
            ManualReason::MissingInPeer => "does not exist in peer type",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPlan {
    pub name: String,
    pub step: FieldStep,
}

/// One direction of one type pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    pub function: String,
    pub direction: Direction,
    pub source: TypeId,
    pub target: TypeId,
    pub registration: Registration,
    /// Field steps in source declaration order. Empty for hand-written
    /// conversions.
    pub fields: Vec<FieldPlan>,
}

/// Both directions for one struct type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypePair {
    pub name: String,
    pub versioned: TypeId,
    pub internal: TypeId,
    pub to_internal: Conversion,
    pub from_internal: Conversion,
}

/// Everything generated for one versioned package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagePlan {
    pub path: String,
    pub name: String,
    pub source_path: Option<PathBuf>,
    pub internal_path: String,
    pub internal_name: String,
    /// Sorted by type name.
    pub pairs: Vec<TypePair>,
}

impl PackagePlan {
    pub fn conversions(&self) -> impl Iterator<Item = &Conversion> {
        self.pairs
            .iter()
            .flat_map(|p| [&p.to_internal, &p.from_internal])
    }
}

#[derive(Debug, Default)]
pub struct Plan {
    /// Sorted by import path.
    pub packages: Vec<PackagePlan>,
    pub diagnostics: Diagnostics,
}

/// Plan conversions for every linked versioned package in `universe`.
pub fn plan(universe: &Universe) -> Plan {
    let mut plan = Plan::default();
    for package in universe.packages().filter(|p| p.loaded) {
        let Some(internal_path) = &package.internal_path else {
            continue;
        };
        let Some(internal) = universe.find_package(internal_path) else {
            plan.diagnostics.push(Diagnostic::new(
                DiagnosticKind::MissingCounterpart,
                &package.path,
                format!("internal package {internal_path} is not loaded"),
            ));
            continue;
        };
        let planned = PackagePlanner {
            universe,
            versioned: package,
            internal,
            diagnostics: &mut plan.diagnostics,
        }
        .plan();
        if planned.pairs.is_empty() {
            // an artifact without conversions would only import the internal
            // package, which Go rejects as unused
            tracing::debug!(package = %planned.path, "no struct pairs; nothing to generate");
            continue;
        }
        tracing::debug!(
            package = %planned.path,
            pairs = planned.pairs.len(),
            "planned conversions"
        );
        plan.packages.push(planned);
    }
    plan
}

struct PackagePlanner<'a> {
    universe: &'a Universe,
    versioned: &'a Package,
    internal: &'a Package,
    diagnostics: &'a mut Diagnostics,
}

impl PackagePlanner<'_> {
    fn plan(mut self) -> PackagePlan {
        let mut matched = Vec::new();
        for (name, &versioned) in &self.versioned.types {
            if self.universe.kind(versioned) != Kind::Struct {
                continue;
            }
            let counterpart = self
                .internal
                .types
                .get(name)
                .copied()
                .filter(|id| self.universe.kind(*id) == Kind::Struct);
            match counterpart {
                Some(internal) => matched.push((name.clone(), versioned, internal)),
                None => self.diagnostics.push(Diagnostic::new(
                    DiagnosticKind::MissingCounterpart,
                    self.universe.get(versioned).name.to_string(),
                    format!("no struct {name} in {}", self.internal.path),
                )),
            }
        }

        let (versioned_package, internal_package) = (self.versioned, self.internal);
        let versioned_name = versioned_package.local_name();
        let internal_name = internal_package.local_name();

        // Every planned pair, in both directions, for nested conversions.
        let mut functions = HashMap::new();
        for (name, versioned, internal) in &matched {
            let (to, from) = conversion_names(versioned_name, internal_name, name);
            functions.insert((*versioned, *internal), to);
            functions.insert((*internal, *versioned), from);
        }

        let mut pairs = Vec::new();
        for (name, versioned, internal) in matched {
            let (to, from) = conversion_names(versioned_name, internal_name, &name);
            let to_internal =
                self.conversion(to, Direction::ToInternal, versioned, internal, &functions);
            let from_internal =
                self.conversion(from, Direction::FromInternal, internal, versioned, &functions);
            pairs.push(TypePair {
                name,
                versioned,
                internal,
                to_internal,
                from_internal,
            });
        }

        PackagePlan {
            path: versioned_package.path.clone(),
            name: versioned_name.to_string(),
            source_path: versioned_package.source_path.clone(),
            internal_path: internal_package.path.clone(),
            internal_name: internal_name.to_string(),
            pairs,
        }
    }

    fn conversion(
        &mut self,
        function: String,
        direction: Direction,
        source: TypeId,
        target: TypeId,
        functions: &HashMap<(TypeId, TypeId), String>,
    ) -> Conversion {
        // Only the function name is checked, not its signature.
        if self.versioned.functions.contains_key(&function) {
            tracing::debug!(function = %function, "hand-written conversion");
            return Conversion {
                function,
                direction,
                source,
                target,
                registration: Registration::HandWritten,
                fields: Vec::new(),
            };
        }
        let fields = self.match_fields(source, target, functions);
        Conversion {
            function,
            direction,
            source,
            target,
            registration: Registration::Generated,
            fields,
        }
    }

    fn match_fields(
        &mut self,
        source: TypeId,
        target: TypeId,
        functions: &HashMap<(TypeId, TypeId), String>,
    ) -> Vec<FieldPlan> {
        let universe = self.universe;
        let source_type = universe.get(source);
        let target_fields: HashMap<&str, TypeId> = universe
            .get(target)
            .members()
            .map(|(name, id)| (name.name.as_str(), id))
            .collect();

        let mut fields = Vec::new();
        for (member, from) in source_type.members() {
            let step = match target_fields.get(member.name.as_str()) {
                Some(&to) => {
                    strategy(universe, from, to, functions).unwrap_or(FieldStep::Manual {
                        reason: ManualReason::Incompatible,
                    })
                }
                None => FieldStep::Manual {
                    reason: ManualReason::MissingInPeer,
                },
            };
            if let FieldStep::Manual { reason } = &step {
                self.diagnostics.push(Diagnostic::new(
                    DiagnosticKind::UnmatchedField,
                    format!("{}.{}", source_type.name, member.name),
                    reason.as_str(),
                ));
            }
            fields.push(FieldPlan {
                name: member.name.clone(),
                step,
            });
        }
        fields
    }
}

/// First applicable strategy for a `from` → `to` field, or `None`.
fn strategy(
    universe: &Universe,
    from: TypeId,
    to: TypeId,
    functions: &HashMap<(TypeId, TypeId), String>,
) -> Option<FieldStep> {
    let from = unalias(universe, from);
    let to = unalias(universe, to);
    if from == to {
        return Some(FieldStep::Assign);
    }
    let (from_type, to_type) = (universe.get(from), universe.get(to));
    match (from_type.shape()?, to_type.shape()?) {
        (Shape::Builtin { .. }, Shape::Builtin { .. }) => {
            (primitive(universe, from) == primitive(universe, to))
                .then_some(FieldStep::Cast { target: to })
        }
        (Shape::Struct { .. }, Shape::Struct { .. }) => {
            let function = functions.get(&(from, to))?.clone();
            Some(FieldStep::Convert { function })
        }
        (Shape::Pointer { elem: a }, Shape::Pointer { elem: b }) => {
            let function = functions.get(&(*a, *b))?.clone();
            Some(FieldStep::ConvertPointer { function, elem: *b })
        }
        (Shape::Slice { elem: a }, Shape::Slice { elem: b }) => {
            let function = functions.get(&(*a, *b))?.clone();
            Some(FieldStep::ConvertSlice { function, elem: *b })
        }
        (Shape::Map { key: ka, elem: a }, Shape::Map { key: kb, elem: b }) if ka == kb => {
            let function = functions.get(&(*a, *b))?.clone();
            Some(FieldStep::ConvertMap {
                function,
                key: *kb,
                elem: *b,
            })
        }
        // The same message re-exported under another import path.
        (Shape::ExternalSchema, Shape::ExternalSchema) => {
            (from_type.name.name == to_type.name.name).then_some(FieldStep::Assign)
        }
        _ => None,
    }
}

fn unalias(universe: &Universe, mut id: TypeId) -> TypeId {
    // Bounded: invalid sources can produce alias cycles.
    for _ in 0..universe.len() {
        match universe.get(id).shape() {
            Some(Shape::Alias { underlying }) => id = *underlying,
            _ => break,
        }
    }
    id
}

/// Primitive a builtin rests on: itself, or the underlying of a named basic.
fn primitive(universe: &Universe, id: TypeId) -> TypeId {
    match universe.get(id).shape() {
        Some(Shape::Builtin {
            underlying: Some(underlying),
        }) => *underlying,
        _ => id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use convgen_model::{FieldExpr, NoDefinitions, TypeDecl, TypeExpr, WalkOptions, Walker};

    fn decl(name: &str, definition: TypeExpr, alias: bool) -> TypeDecl {
        TypeDecl {
            name: name.to_string(),
            definition,
            alias,
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

    #[test]
    fn test_conversion_names() {
        let (to, from) = conversion_names("v1", "internal", "Widget");
        assert_eq!(to, "Convert_v1_Widget_To_internal_Widget");
        assert_eq!(from, "Convert_internal_Widget_To_v1_Widget");
    }

    #[test]
    fn test_field_strategies() {
        let mut universe = Universe::new();
        let options = WalkOptions::default();
        let mut walker = Walker::new(&mut universe, &NoDefinitions, &options);
        let signed = walker.walk_type_decl("a", &decl("Small", TypeExpr::basic("int8"), false));
        let unsigned = walker.walk_type_decl("b", &decl("Small", TypeExpr::basic("uint8"), false));
        let also_signed = walker.walk_type_decl("b", &decl("Tiny", TypeExpr::basic("int8"), false));
        let label = walker.walk_type_decl("a", &decl("Label", TypeExpr::basic("string"), true));
        let point = TypeExpr::Struct {
            fields: vec![field("X", TypeExpr::basic("int"))],
        };
        let a_point = walker.walk_type_decl("a", &decl("Point", point.clone(), false));
        let b_point = walker.walk_type_decl("b", &decl("Point", point, false));
        let string = universe.builtin("string").unwrap();

        let none = HashMap::new();
        assert_eq!(strategy(&universe, label, string, &none), Some(FieldStep::Assign));
        assert_eq!(
            strategy(&universe, signed, also_signed, &none),
            Some(FieldStep::Cast { target: also_signed })
        );
        assert_eq!(strategy(&universe, signed, unsigned, &none), None);
        // Structs only convert through a planned pair.
        assert_eq!(strategy(&universe, a_point, b_point, &none), None);
        let planned = HashMap::from([((a_point, b_point), "Convert_a_Point_To_b_Point".to_string())]);
        assert_eq!(
            strategy(&universe, a_point, b_point, &planned),
            Some(FieldStep::Convert {
                function: "Convert_a_Point_To_b_Point".into()
            })
        );
    }
}
