//! Human-readable previews of evaluated values

use spyglass_sdk::{TypeId, TypeRegistry, Value};

use crate::cache::EvalState;

/// Marker appended to truncated previews
const ELLIPSIS: char = '…';

/// Format a value on one line, at most `max_len` characters long
///
/// `declared` is the member's declared type; integers stored in an
/// enum-typed member are shown as the variant name.
pub fn preview(
    value: &Value,
    declared: Option<TypeId>,
    registry: &TypeRegistry,
    max_len: usize,
) -> String {
    truncate(format_value(value, declared, registry), max_len)
}

/// Format an evaluation state: the value preview, or the fault as
/// `Kind: message`
pub fn describe(
    state: &EvalState,
    declared: Option<TypeId>,
    registry: &TypeRegistry,
    max_len: usize,
) -> String {
    match state {
        EvalState::NotEvaluated => String::new(),
        EvalState::Evaluated(value) => preview(value, declared, registry, max_len),
        EvalState::Faulted(fault) => truncate(fault.to_string(), max_len),
    }
}

fn format_value(value: &Value, declared: Option<TypeId>, registry: &TypeRegistry) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => enum_name(registry, declared, *i).unwrap_or_else(|| i.to_string()),
        Value::UInt(u) => i64::try_from(*u)
            .ok()
            .and_then(|i| enum_name(registry, declared, i))
            .unwrap_or_else(|| u.to_string()),
        Value::Float(f) => {
            if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        Value::Char(c) => format!("'{}'", c),
        Value::Str(s) => format!("\"{}\"", s),
        Value::Enum(e) => enum_name(registry, Some(e.ty), e.discriminant)
            .unwrap_or_else(|| format!("{}({})", registry.name_of(e.ty), e.discriminant)),
        Value::Struct(s) => {
            let fields: Vec<String> = s
                .fields
                .iter()
                .map(|(name, v)| format!("{}: {}", name, format_value(v, None, registry)))
                .collect();
            format!("{} {{ {} }}", registry.name_of(s.ty), fields.join(", "))
        }
        Value::List(list) => format!("[List({})]", list.read().len()),
        Value::Dict(dict) => format!("[Dictionary({})]", dict.read().len()),
        Value::Object(obj) if !obj.is_alive() => "null (destroyed)".to_string(),
        Value::Object(obj) => format!("[object {}]", registry.name_of(obj.type_id())),
    }
}

fn enum_name(registry: &TypeRegistry, ty: Option<TypeId>, discriminant: i64) -> Option<String> {
    let def = registry.get(ty?)?;
    def.variant_name(discriminant).map(str::to_string)
}

fn truncate(text: String, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text;
    }
    let mut out: String = text.chars().take(max_len.saturating_sub(1)).collect();
    out.push(ELLIPSIS);
    out
}
