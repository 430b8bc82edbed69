//! Runtime faults raised by member bodies and object storage

/// Result type for member bodies and object storage access
pub type FaultResult<T> = Result<T, Fault>;

/// An exception raised while reading, writing, or invoking a member of a
/// live object.
///
/// `kind` carries the exception type name (`NullReferenceException`,
/// `InvalidCastException`, ...) so consumers can show it next to the
/// message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct Fault {
    /// Exception type name
    pub kind: String,
    /// Human-readable message
    pub message: String,
}

impl Fault {
    /// Create a fault with an arbitrary exception type name
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// `NullReferenceException`
    pub fn null_reference(message: impl Into<String>) -> Self {
        Self::new("NullReferenceException", message)
    }

    /// `InvalidCastException`
    pub fn invalid_cast(message: impl Into<String>) -> Self {
        Self::new("InvalidCastException", message)
    }

    /// `ArgumentException`
    pub fn argument(message: impl Into<String>) -> Self {
        Self::new("ArgumentException", message)
    }

    /// `InvalidOperationException`
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::new("InvalidOperationException", message)
    }

    /// `IndexOutOfRangeException`
    pub fn index_out_of_range(index: usize, len: usize) -> Self {
        Self::new(
            "IndexOutOfRangeException",
            format!("index {} is outside a collection of {} item(s)", index, len),
        )
    }

    /// `MissingMemberException`
    pub fn missing_member(name: &str) -> Self {
        Self::new("MissingMemberException", format!("no member named '{}'", name))
    }
}
