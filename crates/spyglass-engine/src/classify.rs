//! Value classification
//!
//! [`classify`] maps an evaluation state and the member's declared type to a
//! [`ValueKind`]. Consumers pick what they can do with a value through
//! [`Interaction::for_value`] and never look at the raw value's type
//! themselves.

use std::fmt;

use spyglass_sdk::{StructValue, TypeDef, TypeKind, Value};

use crate::cache::EvalState;

/// Semantic category of an evaluated value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Not evaluated yet
    NotEvaluated,
    /// Evaluation raised a fault
    Faulted,
    /// Null or a destroyed object
    Null,
    /// Boolean
    Boolean,
    /// Integer or float
    Number,
    /// String or character
    String,
    /// Enum constant
    Enum,
    /// Sequence
    Collection,
    /// Key/value pairs
    Dictionary,
    /// Plain value type
    ValueStruct,
    /// Anything else (objects)
    Unsupported,
}

impl ValueKind {
    /// All kinds, in classification order
    pub const ALL: [ValueKind; 11] = [
        ValueKind::NotEvaluated,
        ValueKind::Faulted,
        ValueKind::Null,
        ValueKind::Boolean,
        ValueKind::Number,
        ValueKind::String,
        ValueKind::Enum,
        ValueKind::Collection,
        ValueKind::Dictionary,
        ValueKind::ValueStruct,
        ValueKind::Unsupported,
    ];
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::NotEvaluated => "NotEvaluated",
            ValueKind::Faulted => "Faulted",
            ValueKind::Null => "Null",
            ValueKind::Boolean => "Boolean",
            ValueKind::Number => "Number",
            ValueKind::String => "String",
            ValueKind::Enum => "Enum",
            ValueKind::Collection => "Collection",
            ValueKind::Dictionary => "Dictionary",
            ValueKind::ValueStruct => "ValueStruct",
            ValueKind::Unsupported => "Unsupported",
        };
        f.write_str(name)
    }
}

/// Classify a state against the member's declared type
///
/// First match wins. An integer stored in an enum-typed member counts as
/// an enum, since storage does not always keep the enum type.
pub fn classify(state: &EvalState, declared: Option<&TypeDef>) -> ValueKind {
    let value = match state {
        EvalState::NotEvaluated => return ValueKind::NotEvaluated,
        EvalState::Faulted(_) => return ValueKind::Faulted,
        EvalState::Evaluated(value) => value,
    };
    classify_value(value, declared)
}

/// Classify an evaluated value
pub fn classify_value(value: &Value, declared: Option<&TypeDef>) -> ValueKind {
    let declared_enum = declared.is_some_and(|def| matches!(def.kind, TypeKind::Enum(_)));
    match value {
        v if v.is_null_or_destroyed() => ValueKind::Null,
        Value::Bool(_) => ValueKind::Boolean,
        Value::Int(_) | Value::UInt(_) if declared_enum => ValueKind::Enum,
        Value::Int(_) | Value::UInt(_) | Value::Float(_) => ValueKind::Number,
        Value::Str(_) | Value::Char(_) => ValueKind::String,
        Value::Enum(_) => ValueKind::Enum,
        Value::Dict(_) => ValueKind::Dictionary,
        Value::List(_) => ValueKind::Collection,
        Value::Struct(_) => ValueKind::ValueStruct,
        _ => ValueKind::Unsupported,
    }
}

/// Whether a struct can be edited field by field
///
/// Holds for vector, colour, rect and quaternion shaped structs: every field
/// is a bool, integer, float or char. Anything else is only rendered as text
/// and inspected in a nested inspector.
pub fn is_structurally_editable(value: &StructValue) -> bool {
    !value.fields.is_empty()
        && value.fields.iter().all(|(_, v)| {
            matches!(
                v,
                Value::Bool(_) | Value::Int(_) | Value::UInt(_) | Value::Float(_) | Value::Char(_)
            )
        })
}

/// What a consumer may do with a value of some kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Interaction {
    /// Edit in place from text or a toggle
    pub editable_inline: bool,
    /// Expand into a paged list of entries
    pub expandable: bool,
    /// Open in a nested inspector
    pub inspectable: bool,
    /// Edit field by field (see [`is_structurally_editable`])
    pub structured: bool,
}

impl Interaction {
    const NONE: Interaction = Interaction {
        editable_inline: false,
        expandable: false,
        inspectable: false,
        structured: false,
    };

    /// Interaction table
    ///
    /// A struct's shape is not part of its kind, so `ValueKind::ValueStruct`
    /// is never `structured` here; use [`Interaction::for_value`].
    pub const fn for_kind(kind: ValueKind) -> Interaction {
        match kind {
            ValueKind::NotEvaluated | ValueKind::Faulted | ValueKind::Null => Self::NONE,
            ValueKind::Boolean | ValueKind::Number | ValueKind::String | ValueKind::Enum => {
                Interaction {
                    editable_inline: true,
                    ..Self::NONE
                }
            }
            ValueKind::Collection | ValueKind::Dictionary => Interaction {
                expandable: true,
                inspectable: true,
                ..Self::NONE
            },
            ValueKind::ValueStruct | ValueKind::Unsupported => Interaction {
                inspectable: true,
                ..Self::NONE
            },
        }
    }

    /// Interaction for a classified value, with `structured` set only for
    /// structs that pass [`is_structurally_editable`]
    pub fn for_value(kind: ValueKind, value: Option<&Value>) -> Interaction {
        let mut interaction = Self::for_kind(kind);
        if let (ValueKind::ValueStruct, Some(Value::Struct(s))) = (kind, value) {
            interaction.structured = is_structurally_editable(s);
        }
        interaction
    }

    /// Whether the value can only be rendered as text
    pub fn is_text_only(&self) -> bool {
        *self == Self::NONE
    }
}
