//! Go type syntax to [`TypeExpr`].

use convgen_model::builtins::canonical_primitive;
use convgen_model::{ChanDir, FieldExpr, MethodExpr, SignatureExpr, TypeExpr};
use std::collections::HashMap;
use tree_sitter::Node;

/// Name resolution scope of one source file.
pub(crate) struct FileScope<'a> {
    pub source: &'a str,
    /// Import path of the package being read.
    pub package: &'a str,
    /// Import local name → import path.
    pub imports: &'a HashMap<String, String>,
}

impl<'a> FileScope<'a> {
    pub fn text(&self, node: Node) -> &'a str {
        &self.source[node.byte_range()]
    }

    pub fn field_text(&self, node: Node, field: &str) -> Option<&'a str> {
        node.child_by_field_name(field).map(|n| self.text(n))
    }

    /// Import path referred to by `local` in this file.
    pub fn import_path(&self, local: &str) -> String {
        self.imports
            .get(local)
            .cloned()
            .unwrap_or_else(|| local.to_string())
    }

    pub fn type_expr(&self, node: Node) -> TypeExpr {
        match node.kind() {
            "type_identifier" => self.identifier_type(self.text(node)),
            "qualified_type" => {
                let (Some(package), Some(name)) = (
                    self.field_text(node, "package"),
                    self.field_text(node, "name"),
                ) else {
                    return self.unrecognized(node);
                };
                let path = self.import_path(package);
                if path == "unsafe" {
                    return self.unrecognized(node);
                }
                TypeExpr::named(&path, name)
            }
            "pointer_type" => match node.named_child(0) {
                Some(elem) => TypeExpr::pointer(self.type_expr(elem)),
                None => self.unrecognized(node),
            },
            "slice_type" => match node.child_by_field_name("element") {
                Some(elem) => TypeExpr::slice(self.type_expr(elem)),
                None => self.unrecognized(node),
            },
            "array_type" | "implicit_length_array_type" => {
                let Some(elem) = node.child_by_field_name("element") else {
                    return self.unrecognized(node);
                };
                let len = self
                    .field_text(node, "length")
                    .and_then(|text| parse_int(text).ok())
                    .and_then(|len| u64::try_from(len).ok());
                TypeExpr::Array {
                    len,
                    elem: Box::new(self.type_expr(elem)),
                }
            }
            "map_type" => {
                let (Some(key), Some(value)) = (
                    node.child_by_field_name("key"),
                    node.child_by_field_name("value"),
                ) else {
                    return self.unrecognized(node);
                };
                TypeExpr::Map {
                    key: Box::new(self.type_expr(key)),
                    elem: Box::new(self.type_expr(value)),
                }
            }
            "channel_type" => {
                let Some(value) = node.child_by_field_name("value") else {
                    return self.unrecognized(node);
                };
                TypeExpr::Chan {
                    dir: channel_direction(self.text(node)),
                    elem: Box::new(self.type_expr(value)),
                }
            }
            "function_type" => TypeExpr::Func {
                signature: self.signature(node, None),
            },
            "struct_type" => TypeExpr::Struct {
                fields: self.struct_fields(node),
            },
            "interface_type" => self.interface(node),
            "parenthesized_type" => match node.named_child(0) {
                Some(inner) => self.type_expr(inner),
                None => self.unrecognized(node),
            },
            _ => self.unrecognized(node),
        }
    }

    /// Unqualified type name: a predeclared type or one of this package.
    pub fn identifier_type(&self, name: &str) -> TypeExpr {
        match name {
            "any" => TypeExpr::Interface {
                methods: Vec::new(),
                embeds: Vec::new(),
            },
            _ if canonical_primitive(name).is_some() => TypeExpr::basic(name),
            _ => TypeExpr::named(self.package, name),
        }
    }

    /// Signature of a function type, function declaration or method spec.
    /// Parameters and results come from the `parameters` and `result` fields.
    pub fn signature(&self, node: Node, receiver: Option<TypeExpr>) -> SignatureExpr {
        let (params, variadic) = match node.child_by_field_name("parameters") {
            Some(list) => self.parameter_list(list),
            None => (Vec::new(), false),
        };
        let results = match node.child_by_field_name("result") {
            Some(result) if result.kind() == "parameter_list" => self.parameter_list(result).0,
            Some(result) => vec![self.type_expr(result)],
            None => Vec::new(),
        };
        SignatureExpr {
            receiver: receiver.map(Box::new),
            params,
            results,
            variadic,
        }
    }

    fn parameter_list(&self, list: Node) -> (Vec<TypeExpr>, bool) {
        let mut params = Vec::new();
        let mut variadic = false;
        let mut cursor = list.walk();
        for child in list.named_children(&mut cursor) {
            let Some(ty) = child.child_by_field_name("type") else {
                continue;
            };
            match child.kind() {
                "parameter_declaration" => {
                    let expr = self.type_expr(ty);
                    let mut name_cursor = child.walk();
                    let count = child
                        .children_by_field_name("name", &mut name_cursor)
                        .count()
                        .max(1);
                    params.extend(std::iter::repeat_n(expr, count));
                }
                "variadic_parameter_declaration" => {
                    params.push(TypeExpr::slice(self.type_expr(ty)));
                    variadic = true;
                }
                _ => {}
            }
        }
        (params, variadic)
    }

    fn struct_fields(&self, node: Node) -> Vec<FieldExpr> {
        let mut fields = Vec::new();
        let mut cursor = node.walk();
        let Some(list) = node
            .named_children(&mut cursor)
            .find(|c| c.kind() == "field_declaration_list")
        else {
            return fields;
        };
        let mut cursor = list.walk();
        for decl in list.named_children(&mut cursor) {
            if decl.kind() != "field_declaration" {
                continue;
            }
            let Some(ty) = decl.child_by_field_name("type") else {
                continue;
            };
            let tag = self.field_text(decl, "tag").map(str::to_string);
            let mut name_cursor = decl.walk();
            let names: Vec<&str> = decl
                .children_by_field_name("name", &mut name_cursor)
                .map(|n| self.text(n))
                .collect();
            if names.is_empty() {
                fields.push(self.embedded_field(decl, ty, tag));
                continue;
            }
            let expr = self.type_expr(ty);
            for name in names {
                fields.push(FieldExpr {
                    name: name.to_string(),
                    ty: expr.clone(),
                    embedded: false,
                    tag: tag.clone(),
                });
            }
        }
        fields
    }

    /// `Meta`, `*Meta` or `meta.Meta` with no field name: the field is
    /// named after the type.
    fn embedded_field(&self, decl: Node, ty: Node, tag: Option<String>) -> FieldExpr {
        let mut cursor = decl.walk();
        let is_pointer = decl.children(&mut cursor).any(|c| c.kind() == "*");
        let base = match ty.kind() {
            "generic_type" => ty.child_by_field_name("type").unwrap_or(ty),
            _ => ty,
        };
        let name = match base.kind() {
            "qualified_type" => self.field_text(base, "name").unwrap_or_default(),
            _ => self.text(base),
        };
        let mut expr = self.type_expr(ty);
        if is_pointer {
            expr = TypeExpr::pointer(expr);
        }
        FieldExpr {
            name: name.to_string(),
            ty: expr,
            embedded: true,
            tag,
        }
    }

    fn interface(&self, node: Node) -> TypeExpr {
        let mut methods = Vec::new();
        let mut embeds = Vec::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "method_elem" | "method_spec" => {
                    let Some(name) = self.field_text(child, "name") else {
                        continue;
                    };
                    methods.push(MethodExpr {
                        name: name.to_string(),
                        signature: self.signature(child, None),
                    });
                }
                // embedded interfaces and type-set terms
                "type_elem" | "constraint_elem" => {
                    if !self.is_plain_embedding(child) {
                        return self.unrecognized(node);
                    }
                    match child.named_child(0) {
                        Some(embedded) => embeds.push(self.type_expr(embedded)),
                        None => return self.unrecognized(node),
                    }
                }
                _ => {}
            }
        }
        TypeExpr::Interface { methods, embeds }
    }

    /// A single embedded interface name rather than a type-set union or
    /// an approximation term.
    fn is_plain_embedding(&self, elem: Node) -> bool {
        let text = self.text(elem);
        !text.contains('|') && !text.contains('~')
    }

    fn unrecognized(&self, node: Node) -> TypeExpr {
        TypeExpr::Unrecognized {
            text: self.text(node).to_string(),
        }
    }
}

fn channel_direction(text: &str) -> ChanDir {
    if text.starts_with("<-") {
        return ChanDir::Recv;
    }
    let rest = text.strip_prefix("chan").unwrap_or(text).trim_start();
    if rest.starts_with("<-") {
        ChanDir::Send
    } else {
        ChanDir::Both
    }
}

/// Go integer literal: decimal, `0x`, `0o`, `0b`, legacy octal, `_` separators.
pub(crate) fn parse_int(text: &str) -> Result<i64, std::num::ParseIntError> {
    let clean: String = text.chars().filter(|c| *c != '_').collect();
    let lower = clean.to_ascii_lowercase();
    if let Some(hex) = lower.strip_prefix("0x") {
        i64::from_str_radix(hex, 16)
    } else if let Some(oct) = lower.strip_prefix("0o") {
        i64::from_str_radix(oct, 8)
    } else if let Some(bin) = lower.strip_prefix("0b") {
        i64::from_str_radix(bin, 2)
    } else if lower.len() > 1 && lower.starts_with('0') {
        i64::from_str_radix(&lower[1..], 8)
    } else {
        lower.parse()
    }
}
