//! Type nodes stored in the [`Universe`](crate::Universe) arena.

use crate::kind::Kind;
use crate::name::Name;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};

/// Handle to a canonical type node. Two lookups of the same qualified name
/// from one universe always yield the same `TypeId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TypeId(pub(crate) u32);

impl TypeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Channel direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

/// A function's signature.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Signature {
    /// Set for methods: the type the method belongs to.
    pub receiver: Option<TypeId>,
    pub parameters: Vec<TypeId>,
    pub results: Vec<TypeId>,
    /// True if the last parameter is of the form `...T`.
    pub variadic: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub comment_lines: Vec<String>,
}

/// Name-keyed maps serialize as ordered entry lists; JSON keys must be strings.
fn entries<S: Serializer>(map: &IndexMap<Name, TypeId>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(map.iter())
}

/// Classified shape of a node, with the payload each kind needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum Shape {
    /// `underlying` points at the primitive for named basic types and is
    /// `None` for the primitives themselves.
    Builtin { underlying: Option<TypeId> },
    Struct {
        #[serde(serialize_with = "entries")]
        members: IndexMap<Name, TypeId>,
    },
    Map { key: TypeId, elem: TypeId },
    Slice { elem: TypeId },
    Pointer { elem: TypeId },
    Array { elem: TypeId, len: Option<u64> },
    Channel { elem: TypeId, dir: ChanDir },
    Alias { underlying: TypeId },
    /// `methods` includes the methods of embedded interfaces.
    Interface {
        #[serde(serialize_with = "entries")]
        methods: IndexMap<Name, TypeId>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        embeds: Vec<TypeId>,
    },
    Function { signature: Signature },
    DeclarationOf {
        underlying: Option<TypeId>,
        signature: Option<Signature>,
    },
    Unknown,
    Unsupported,
    ExternalSchema,
}

impl Shape {
    pub fn kind(&self) -> Kind {
        match self {
            Shape::Builtin { .. } => Kind::Builtin,
            Shape::Struct { .. } => Kind::Struct,
            Shape::Map { .. } => Kind::Map,
            Shape::Slice { .. } => Kind::Slice,
            Shape::Pointer { .. } => Kind::Pointer,
            Shape::Array { .. } => Kind::Array,
            Shape::Channel { .. } => Kind::Channel,
            Shape::Alias { .. } => Kind::Alias,
            Shape::Interface { .. } => Kind::Interface,
            Shape::Function { .. } => Kind::Function,
            Shape::DeclarationOf { .. } => Kind::DeclarationOf,
            Shape::Unknown => Kind::Unknown,
            Shape::Unsupported => Kind::Unsupported,
            Shape::ExternalSchema => Kind::ExternalSchema,
        }
    }
}

/// Lifecycle of a node: registered under its name first, classified once.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "shape")]
pub enum NodeState {
    Placeholder,
    Classified(Shape),
}

/// A canonical type (or declaration) node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Type {
    pub name: Name,
    pub state: NodeState,
    /// Methods of a named type, by method name.
    #[serde(skip_serializing_if = "IndexMap::is_empty", serialize_with = "entries")]
    pub methods: IndexMap<Name, TypeId>,
    /// Comment lines immediately before the definition.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub comment_lines: Vec<String>,
    /// Comment block separated from the definition by one blank line.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub second_closest_comment_lines: Vec<String>,
    /// Rendered value of a constant declaration. Strings keep their raw,
    /// unquoted text; other values are display-only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub const_value: Option<String>,
    /// Textual definition the node was classified from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descriptor: Option<String>,
}

impl Type {
    pub(crate) fn placeholder(name: Name) -> Self {
        Self {
            name,
            state: NodeState::Placeholder,
            methods: IndexMap::new(),
            comment_lines: Vec::new(),
            second_closest_comment_lines: Vec::new(),
            const_value: None,
            descriptor: None,
        }
    }

    /// Placeholders report `Unknown`; use [`Type::is_classified`] to tell them
    /// apart from nodes classified as unknown.
    pub fn kind(&self) -> Kind {
        match &self.state {
            NodeState::Placeholder => Kind::Unknown,
            NodeState::Classified(shape) => shape.kind(),
        }
    }

    pub fn is_classified(&self) -> bool {
        matches!(self.state, NodeState::Classified(_))
    }

    pub fn shape(&self) -> Option<&Shape> {
        match &self.state {
            NodeState::Placeholder => None,
            NodeState::Classified(shape) => Some(shape),
        }
    }

    /// Struct members in declaration order; empty for every other shape.
    pub fn members(&self) -> impl Iterator<Item = (&Name, TypeId)> {
        let members = match self.shape() {
            Some(Shape::Struct { members }) => Some(members),
            _ => None,
        };
        members
            .into_iter()
            .flat_map(|m| m.iter().map(|(name, id)| (name, *id)))
    }

    /// Element type of Map, Slice, Pointer, Array and Channel shapes.
    pub fn elem(&self) -> Option<TypeId> {
        match self.shape()? {
            Shape::Map { elem, .. }
            | Shape::Slice { elem }
            | Shape::Pointer { elem }
            | Shape::Array { elem, .. }
            | Shape::Channel { elem, .. } => Some(*elem),
            _ => None,
        }
    }

    pub fn key(&self) -> Option<TypeId> {
        match self.shape()? {
            Shape::Map { key, .. } => Some(*key),
            _ => None,
        }
    }

    pub fn underlying(&self) -> Option<TypeId> {
        match self.shape()? {
            Shape::Alias { underlying } => Some(*underlying),
            Shape::Builtin { underlying } | Shape::DeclarationOf { underlying, .. } => *underlying,
            _ => None,
        }
    }

    pub fn signature(&self) -> Option<&Signature> {
        match self.shape()? {
            Shape::Function { signature } => Some(signature),
            Shape::DeclarationOf { signature, .. } => signature.as_ref(),
            _ => None,
        }
    }
}
