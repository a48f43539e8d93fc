//! Constant expression evaluation.
//!
//! Covers what API packages use in practice: literals, `iota`, references
//! to earlier constants, arithmetic and bitwise operators, type conversions
//! and `len` of a constant string. Anything else is kept as source text.

use super::types::{FileScope, parse_int};
use convgen_model::{ConstValue, TypeExpr};
use std::collections::HashMap;
use tree_sitter::Node;

/// Constants seen so far in a package, with their types.
pub(crate) type KnownConstants = HashMap<String, (ConstValue, TypeExpr)>;

pub(crate) struct ConstScope<'s, 'a> {
    pub file: &'s FileScope<'a>,
    pub known: &'s KnownConstants,
    pub iota: i64,
}

impl ConstScope<'_, '_> {
    /// Value of `node`, or its source text when it cannot be evaluated.
    pub fn value(&self, node: Node) -> ConstValue {
        self.evaluate(node)
            .unwrap_or_else(|| ConstValue::Expr(self.file.text(node).to_string()))
    }

    pub fn evaluate(&self, node: Node) -> Option<ConstValue> {
        let text = self.file.text(node);
        match node.kind() {
            "int_literal" => parse_int(text).ok().map(ConstValue::Int),
            "float_literal" => text.replace('_', "").parse().ok().map(ConstValue::Float),
            "rune_literal" => {
                let inner = text.strip_prefix('\'')?.strip_suffix('\'')?;
                let unescaped = unescape(inner, '\'')?;
                let mut chars = unescaped.chars();
                let c = chars.next()?;
                chars.next().is_none().then_some(ConstValue::Int(c as i64))
            }
            "interpreted_string_literal" => {
                let inner = text.strip_prefix('"')?.strip_suffix('"')?;
                unescape(inner, '"').map(ConstValue::String)
            }
            "raw_string_literal" => {
                let inner = text.strip_prefix('`')?.strip_suffix('`')?;
                Some(ConstValue::String(inner.replace('\r', "")))
            }
            "true" => Some(ConstValue::Bool(true)),
            "false" => Some(ConstValue::Bool(false)),
            "iota" => Some(ConstValue::Int(self.iota)),
            "identifier" => self.known.get(text).map(|(value, _)| value.clone()),
            "parenthesized_expression" => self.evaluate(node.named_child(0)?),
            "unary_expression" => {
                let operator = self.file.field_text(node, "operator")?;
                let operand = self.evaluate(node.child_by_field_name("operand")?)?;
                unary(operator, operand)
            }
            "binary_expression" => {
                let operator = self.file.field_text(node, "operator")?;
                let left = self.evaluate(node.child_by_field_name("left")?)?;
                let right = self.evaluate(node.child_by_field_name("right")?)?;
                binary(operator, left, right)
            }
            "call_expression" => {
                let function = self.file.field_text(node, "function")?;
                let arguments = node.child_by_field_name("arguments")?;
                let mut cursor = arguments.walk();
                let args: Vec<Node> = arguments.named_children(&mut cursor).collect();
                let [arg] = args.as_slice() else {
                    return None;
                };
                let value = self.evaluate(*arg)?;
                match (function, value) {
                    ("len", ConstValue::String(s)) => Some(ConstValue::Int(s.len() as i64)),
                    ("len" | "cap" | "real" | "imag" | "complex" | "min" | "max", _) => None,
                    // conversion such as Phase("Running") or int64(1)
                    (_, value) => Some(value),
                }
            }
            "type_conversion_expression" => self.evaluate(node.child_by_field_name("operand")?),
            _ => None,
        }
    }

    /// Type of a constant declared without an explicit type.
    pub fn infer_type(&self, node: Node, value: &ConstValue) -> TypeExpr {
        self.declared_type(node)
            .unwrap_or_else(|| untyped(node.kind(), value))
    }

    /// The named type an expression carries through a conversion or a
    /// reference to a typed constant.
    fn declared_type(&self, node: Node) -> Option<TypeExpr> {
        match node.kind() {
            "identifier" => {
                let (_, ty) = self.known.get(self.file.text(node))?;
                (!is_untyped(ty)).then(|| ty.clone())
            }
            "call_expression" => {
                let function = node.child_by_field_name("function")?;
                match function.kind() {
                    "identifier" => {
                        let name = self.file.text(function);
                        if matches!(name, "len" | "cap") {
                            return Some(TypeExpr::basic("int"));
                        }
                        Some(self.file.identifier_type(name))
                    }
                    "selector_expression" => {
                        let package = self.file.field_text(function, "operand")?;
                        let name = self.file.field_text(function, "field")?;
                        Some(TypeExpr::named(&self.file.import_path(package), name))
                    }
                    _ => None,
                }
            }
            "type_conversion_expression" => {
                Some(self.file.type_expr(node.child_by_field_name("type")?))
            }
            "parenthesized_expression" => self.declared_type(node.named_child(0)?),
            "unary_expression" => self.declared_type(node.child_by_field_name("operand")?),
            "binary_expression" => {
                let operator = self.file.field_text(node, "operator")?;
                if is_comparison(operator) {
                    return None;
                }
                self.declared_type(node.child_by_field_name("left")?)
                    .or_else(|| self.declared_type(node.child_by_field_name("right")?))
            }
            _ => None,
        }
    }
}

fn untyped(kind: &str, value: &ConstValue) -> TypeExpr {
    let name = match (kind, value) {
        ("rune_literal", _) => "untyped rune",
        (_, ConstValue::String(_)) => "untyped string",
        (_, ConstValue::Bool(_)) => "untyped bool",
        (_, ConstValue::Float(_)) => "untyped float",
        (_, ConstValue::Int(_)) => "untyped int",
        (_, ConstValue::Expr(_)) => "invalid type",
    };
    TypeExpr::basic(name)
}

fn is_untyped(ty: &TypeExpr) -> bool {
    matches!(ty, TypeExpr::Basic { name } if name.starts_with("untyped ") || name == "invalid type")
}

fn is_comparison(operator: &str) -> bool {
    matches!(operator, "==" | "!=" | "<" | "<=" | ">" | ">=" | "&&" | "||")
}

fn unary(operator: &str, operand: ConstValue) -> Option<ConstValue> {
    match (operator, operand) {
        ("+", value @ (ConstValue::Int(_) | ConstValue::Float(_))) => Some(value),
        ("-", ConstValue::Int(i)) => i.checked_neg().map(ConstValue::Int),
        ("-", ConstValue::Float(f)) => Some(ConstValue::Float(-f)),
        ("^", ConstValue::Int(i)) => Some(ConstValue::Int(!i)),
        ("!", ConstValue::Bool(b)) => Some(ConstValue::Bool(!b)),
        _ => None,
    }
}

fn binary(operator: &str, left: ConstValue, right: ConstValue) -> Option<ConstValue> {
    match (left, right) {
        (ConstValue::Int(a), ConstValue::Int(b)) => int_binary(operator, a, b),
        (ConstValue::String(a), ConstValue::String(b)) => match operator {
            "+" => Some(ConstValue::String(a + &b)),
            "==" => Some(ConstValue::Bool(a == b)),
            "!=" => Some(ConstValue::Bool(a != b)),
            _ => None,
        },
        (ConstValue::Bool(a), ConstValue::Bool(b)) => match operator {
            "&&" => Some(ConstValue::Bool(a && b)),
            "||" => Some(ConstValue::Bool(a || b)),
            "==" => Some(ConstValue::Bool(a == b)),
            "!=" => Some(ConstValue::Bool(a != b)),
            _ => None,
        },
        (left, right) => float_binary(operator, as_float(&left)?, as_float(&right)?),
    }
}

fn int_binary(operator: &str, a: i64, b: i64) -> Option<ConstValue> {
    let shift = || u32::try_from(b).ok().filter(|s| *s < 64);
    let value = match operator {
        "+" => a.checked_add(b)?,
        "-" => a.checked_sub(b)?,
        "*" => a.checked_mul(b)?,
        "/" => a.checked_div(b)?,
        "%" => a.checked_rem(b)?,
        "<<" => {
            let shift = shift()?;
            // checked_shl only bounds the shift amount; bits shifted out are lost
            a.checked_shl(shift).filter(|v| v >> shift == a)?
        }
        ">>" => a.checked_shr(shift()?)?,
        "|" => a | b,
        "&" => a & b,
        "^" => a ^ b,
        "&^" => a & !b,
        _ => return compare(operator, a, b),
    };
    Some(ConstValue::Int(value))
}

fn float_binary(operator: &str, a: f64, b: f64) -> Option<ConstValue> {
    let value = match operator {
        "+" => a + b,
        "-" => a - b,
        "*" => a * b,
        "/" if b != 0.0 => a / b,
        _ => return compare(operator, a, b),
    };
    Some(ConstValue::Float(value))
}

fn compare<T: PartialOrd>(operator: &str, a: T, b: T) -> Option<ConstValue> {
    let result = match operator {
        "==" => a == b,
        "!=" => a != b,
        "<" => a < b,
        "<=" => a <= b,
        ">" => a > b,
        ">=" => a >= b,
        _ => return None,
    };
    Some(ConstValue::Bool(result))
}

fn as_float(value: &ConstValue) -> Option<f64> {
    match value {
        ConstValue::Int(i) => Some(*i as f64),
        ConstValue::Float(f) => Some(*f),
        _ => None,
    }
}

/// Resolve Go escape sequences inside a quoted literal.
fn unescape(inner: &str, quote: char) -> Option<String> {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let escaped = chars.next()?;
        let decoded = match escaped {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            'a' => '\u{07}',
            'b' => '\u{08}',
            'f' => '\u{0C}',
            'v' => '\u{0B}',
            '\\' => '\\',
            c if c == quote => c,
            'x' => byte_escape(hex_digits(&mut chars, 2)?, quote)?,
            'u' => char::from_u32(hex_digits(&mut chars, 4)?)?,
            'U' => char::from_u32(hex_digits(&mut chars, 8)?)?,
            '0'..='7' => {
                let mut code = escaped.to_digit(8)?;
                for _ in 0..2 {
                    code = code * 8 + chars.next()?.to_digit(8)?;
                }
                byte_escape(code, quote)?
            }
            _ => return None,
        };
        out.push(decoded);
    }
    Some(out)
}

/// `\xNN` and `\NNN` denote single bytes in strings. Bytes above 0x7f are
/// not valid UTF-8 on their own, so such strings are not evaluated. In rune
/// literals the same escapes are code points.
fn byte_escape(code: u32, quote: char) -> Option<char> {
    let byte = u8::try_from(code).ok()?;
    if quote == '"' && !byte.is_ascii() {
        return None;
    }
    Some(char::from(byte))
}

fn hex_digits(chars: &mut std::str::Chars<'_>, count: usize) -> Option<u32> {
    let mut code = 0u32;
    for _ in 0..count {
        code = code * 16 + chars.next()?.to_digit(16)?;
    }
    Some(code)
}
