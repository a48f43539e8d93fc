//! Primitive types pre-registered in every universe.

/// Builtin type names. Each gets its own node; [`ALIASES`] map onto them.
pub const PRIMITIVES: &[&str] = &[
    "bool",
    "string",
    "int",
    "int8",
    "int16",
    "int32",
    "int64",
    "uint",
    "uint8",
    "uint16",
    "uint32",
    "uint64",
    "uintptr",
    "float32",
    "float64",
    "complex64",
    "complex128",
    "error",
];

/// Predeclared aliases that name the same type as another primitive.
pub const ALIASES: &[(&str, &str)] = &[("byte", "uint8"), ("rune", "int32")];

pub fn canonical_primitive(name: &str) -> Option<&'static str> {
    if let Some((_, target)) = ALIASES.iter().find(|(alias, _)| *alias == name) {
        return Some(target);
    }
    PRIMITIVES.iter().find(|p| **p == name).copied()
}
