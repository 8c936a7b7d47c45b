//! Zig spellings: types, identifiers and literals.

use crate::error::{Result, TranslateError};
use pbk_ast::{Scalar, Span, Type};
use std::borrow::Cow;

const KEYWORDS: &[&str] = &[
    "addrspace", "align", "allowzero", "and", "anyframe", "anytype", "asm", "async", "await",
    "break", "callconv", "catch", "comptime", "const", "continue", "defer", "else", "enum",
    "errdefer", "error", "export", "extern", "fn", "for", "if", "inline", "linksection",
    "noalias", "noinline", "nosuspend", "opaque", "or", "orelse", "packed", "pub", "resume",
    "return", "struct", "suspend", "switch", "test", "threadlocal", "try", "union",
    "unreachable", "usingnamespace", "var", "volatile", "while",
];

/// Names a local may not take because Zig reserves them as primitive
/// types or values.
const PRIMITIVES: &[&str] = &[
    "anyerror", "anyopaque", "bool", "c_int", "c_long", "c_short", "c_uint", "c_ulong",
    "c_ushort", "comptime_float", "comptime_int", "f16", "f32", "f64", "f80", "f128", "false",
    "isize", "noreturn", "null", "true", "type", "undefined", "usize", "void",
];

pub fn is_keyword(name: &str) -> bool {
    KEYWORDS.contains(&name)
}

/// `iN`/`uN` are primitive integer types for any bit width.
pub fn is_primitive(name: &str) -> bool {
    if PRIMITIVES.contains(&name) {
        return true;
    }
    let mut chars = name.chars();
    matches!(chars.next(), Some('i' | 'u'))
        && !chars.as_str().is_empty()
        && chars.as_str().bytes().all(|b| b.is_ascii_digit())
}

/// Identifier as written in Zig source, escaped with `@"..."` when it is a
/// keyword.
pub fn ident(name: &str) -> Cow<'_, str> {
    if is_keyword(name) {
        Cow::Owned(format!("@\"{name}\""))
    } else {
        Cow::Borrowed(name)
    }
}

pub fn scalar_type(scalar: Scalar) -> &'static str {
    match scalar {
        Scalar::Bool => "bool",
        Scalar::Int => "i32",
        Scalar::Float => "f32",
    }
}

/// Zig type for a value type.
pub fn type_name(ty: Type, span: Span) -> Result<String> {
    Ok(match ty {
        Type::Bool | Type::Int | Type::Float => {
            scalar_type(ty.element().unwrap_or(Scalar::Float)).to_string()
        }
        Type::Vector(scalar, n) => format!("@Vector({n}, {})", scalar_type(scalar)),
        Type::Matrix(n) => format!("[{n}]@Vector({n}, f32)"),
        Type::Void => "void".to_string(),
        Type::String => "[]const u8".to_string(),
        Type::Image(_) | Type::Region | Type::ImageRef | Type::Any => {
            return Err(TranslateError::UnknownType { ty, span });
        }
    })
}

/// Value-producing type name, rejecting `void`.
pub fn value_type_name(ty: Type, span: Span) -> Result<String> {
    match ty {
        Type::Void => Err(TranslateError::UnknownType { ty, span }),
        _ => type_name(ty, span),
    }
}

pub fn float_literal(value: f64) -> String {
    if value.is_nan() {
        "std.math.nan(f32)".to_string()
    } else if value.is_infinite() {
        let sign = if value < 0.0 { "-" } else { "" };
        format!("{sign}std.math.inf(f32)")
    } else {
        // Debug formatting keeps a fraction: `3.0`, not `3`.
        format!("{value:?}")
    }
}

/// Zig string literal for arbitrary text.
pub fn string_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || c == '\u{7f}' => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Zero value for a parameter field without a default.
pub fn zero_value(ty: Type, span: Span) -> Result<String> {
    Ok(match ty {
        Type::Bool => "false".to_string(),
        Type::Int => "0".to_string(),
        Type::Float => "0.0".to_string(),
        Type::Vector(Scalar::Bool, _) => "@splat(false)".to_string(),
        Type::Vector(..) => "@splat(0)".to_string(),
        Type::Matrix(_) => format!("std.mem.zeroes({})", type_name(ty, span)?),
        _ => return Err(TranslateError::UnknownType { ty, span }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names() {
        let span = Span::default();
        assert_eq!(type_name(Type::Float, span).unwrap(), "f32");
        assert_eq!(
            type_name(Type::Vector(Scalar::Int, 3), span).unwrap(),
            "@Vector(3, i32)"
        );
        assert_eq!(
            type_name(Type::Matrix(2), span).unwrap(),
            "[2]@Vector(2, f32)"
        );
        assert!(type_name(Type::Image(4), span).is_err());
    }

    #[test]
    fn test_float_literals_keep_fraction() {
        assert_eq!(float_literal(3.0), "3.0");
        assert_eq!(float_literal(0.25), "0.25");
        assert_eq!(float_literal(-1.5), "-1.5");
    }

    #[test]
    fn test_ident_escapes_keywords() {
        assert_eq!(ident("type_"), "type_");
        assert_eq!(ident("error"), "@\"error\"");
    }

    #[test]
    fn test_primitive_names() {
        assert!(is_primitive("f32"));
        assert!(is_primitive("u8"));
        assert!(is_primitive("i128"));
        assert!(!is_primitive("i"));
        assert!(!is_primitive("index"));
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(string_literal("a \"b\"\n"), "\"a \\\"b\\\"\\n\"");
    }
}
