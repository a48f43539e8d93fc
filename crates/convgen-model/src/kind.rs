//! The closed classification of a type node's shape.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kind {
    /// A primitive such as `bool`, `string` or `int`, or a named type whose
    /// underlying type is one (`type Phase string`).
    Builtin,
    Struct,
    Map,
    Slice,
    Pointer,
    /// A declared alias, `type A = B`.
    Alias,
    /// Any type that could have differing types at run time.
    Interface,
    Array,
    Channel,
    Function,
    /// Not a type but a top-level function, variable or constant. Its type
    /// lives in the node's underlying type.
    DeclarationOf,
    Unknown,
    Unsupported,
    /// An opaque type owned by an external schema (protobuf messages,
    /// `time.Time`), carried by value and never walked.
    ExternalSchema,
}

impl Kind {
    /// Kinds that make a struct field or container element unusable.
    pub fn is_degraded(self) -> bool {
        matches!(self, Kind::Unknown | Kind::Unsupported)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Builtin => "Builtin",
            Kind::Struct => "Struct",
            Kind::Map => "Map",
            Kind::Slice => "Slice",
            Kind::Pointer => "Pointer",
            Kind::Alias => "Alias",
            Kind::Interface => "Interface",
            Kind::Array => "Array",
            Kind::Channel => "Channel",
            Kind::Function => "Function",
            Kind::DeclarationOf => "DeclarationOf",
            Kind::Unknown => "Unknown",
            Kind::Unsupported => "Unsupported",
            Kind::ExternalSchema => "ExternalSchema",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
