//! Value entry
//!
//! Converts user text into values of a declared type, and checks (and where
//! lossless, converts) values supplied directly. Only primitives, strings and
//! enums can be entered as text; other types take values from code.

use spyglass_sdk::{Primitive, TypeId, TypeKind, TypeRegistry, Value};

use crate::error::ParseError;

/// Whether values of `ty` can be entered as text
pub fn is_text_enterable(registry: &TypeRegistry, ty: TypeId) -> bool {
    registry.get(ty).is_some_and(|def| {
        matches!(
            def.kind,
            TypeKind::Primitive(_) | TypeKind::String | TypeKind::Enum(_)
        )
    })
}

/// Parse `text` as a value of `ty`
///
/// Integers accept a `0x` prefix. Enums accept a variant name (exact first,
/// then case-insensitive) or a discriminant. Strings are taken verbatim.
pub fn parse_value(text: &str, ty: TypeId, registry: &TypeRegistry) -> Result<Value, ParseError> {
    let def = registry
        .get(ty)
        .ok_or_else(|| ParseError::Unsupported(ty.to_string()))?;

    let invalid = || ParseError::Invalid {
        text: text.to_string(),
        expected: def.name.clone(),
    };
    let trimmed = text.trim();

    match &def.kind {
        TypeKind::String => Ok(Value::str(text)),
        TypeKind::Primitive(Primitive::Bool) => match trimmed.to_ascii_lowercase().as_str() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(invalid()),
        },
        TypeKind::Primitive(Primitive::Int) => {
            parse_int(trimmed).map(Value::Int).ok_or_else(invalid)
        }
        TypeKind::Primitive(Primitive::UInt) => {
            parse_uint(trimmed).map(Value::UInt).ok_or_else(invalid)
        }
        TypeKind::Primitive(Primitive::Float) => trimmed
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| invalid()),
        TypeKind::Primitive(Primitive::Char) => {
            let mut chars = text.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(Value::Char(c)),
                _ => Err(invalid()),
            }
        }
        TypeKind::Enum(variants) => {
            if let Some(discriminant) = parse_int(trimmed) {
                return Ok(Value::enumeration(ty, discriminant));
            }
            variants
                .iter()
                .find(|v| v.name == trimmed)
                .or_else(|| variants.iter().find(|v| v.name.eq_ignore_ascii_case(trimmed)))
                .map(|v| Value::enumeration(ty, v.discriminant))
                .ok_or_else(|| ParseError::UnknownVariant {
                    text: text.to_string(),
                    enum_name: def.name.clone(),
                })
        }
        TypeKind::Class if trimmed == "null" => Ok(Value::Null),
        _ => Err(ParseError::Unsupported(def.name.clone())),
    }
}

fn parse_int(text: &str) -> Option<i64> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    if digits.starts_with(&['-', '+'][..]) {
        return None;
    }
    let magnitude = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => i128::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<i128>().ok()?,
    };
    i64::try_from(if negative { -magnitude } else { magnitude }).ok()
}

fn parse_uint(text: &str) -> Option<u64> {
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => text.parse().ok(),
    }
}

/// Check `value` against `ty`, widening integers where no precision is lost
///
/// Returns `None` when the value does not fit the type.
pub fn coerce_value(registry: &TypeRegistry, ty: TypeId, value: Value) -> Option<Value> {
    if ty == TypeId::OBJECT {
        return Some(value);
    }
    let def = registry.get(ty)?;

    match (&def.kind, value) {
        (TypeKind::Class | TypeKind::String, Value::Null) => Some(Value::Null),
        (TypeKind::String, v @ Value::Str(_)) => Some(v),
        (TypeKind::Primitive(p), v) => coerce_primitive(*p, v),
        (TypeKind::Enum(_), Value::Enum(e)) if e.ty == ty => Some(Value::Enum(e)),
        (TypeKind::Enum(_), v) if v.is_integer() => v.as_int().map(|d| Value::enumeration(ty, d)),
        (TypeKind::Struct, Value::Struct(s)) if s.ty == ty => Some(Value::Struct(s)),
        (TypeKind::Class, Value::Object(obj)) if registry.is_subclass_of(obj.type_id(), ty) => {
            Some(Value::Object(obj))
        }
        _ => None,
    }
}

fn coerce_primitive(primitive: Primitive, value: Value) -> Option<Value> {
    match (primitive, value) {
        (Primitive::Bool, v @ Value::Bool(_)) => Some(v),
        (Primitive::Char, v @ Value::Char(_)) => Some(v),
        (Primitive::Int, v @ Value::Int(_)) => Some(v),
        (Primitive::Int, Value::UInt(u)) => i64::try_from(u).ok().map(Value::Int),
        (Primitive::UInt, v @ Value::UInt(_)) => Some(v),
        (Primitive::UInt, Value::Int(i)) => u64::try_from(i).ok().map(Value::UInt),
        (Primitive::Float, v) => v.as_float().map(Value::Float),
        _ => None,
    }
}
