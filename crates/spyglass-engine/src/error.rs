//! Error types for the inspector engine
//!
//! Only [`InspectError`] ever aborts a cache build. Everything else is
//! scoped to one member: enumeration problems are logged and the member is
//! skipped, adapt failures and evaluation faults become descriptor state,
//! and write failures are returned from `set_value` without touching the
//! cached value.

use spyglass_sdk::{Fault, TypeId};

/// Session-fatal conditions
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InspectError {
    /// The value cannot be inspected at all
    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    /// The target object was destroyed before the session started
    #[error("Target {type_name} has been destroyed")]
    DestroyedTarget {
        /// Runtime type name of the target
        type_name: String,
    },

    /// The target's type is not registered
    #[error("Unknown type: {0}")]
    UnknownType(TypeId),
}

/// Problems met while reflecting over a type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnumerationError {
    /// The type's metadata failed to load
    #[error("Type {type_name} has no usable metadata: {reason}")]
    Unreflectable {
        /// Type name
        type_name: String,
        /// Load failure
        reason: String,
    },

    /// A base type id is not registered
    #[error("Base type {0} is not registered")]
    MissingType(TypeId),

    /// The base chain loops back on itself
    #[error("Type hierarchy of {type_name} revisits {repeated}")]
    Cycle {
        /// Type whose chain was walked
        type_name: String,
        /// Type seen twice
        repeated: String,
    },

    /// A member refers to a type that is not registered
    #[error("Member {signature} references unregistered type {ty}")]
    UnresolvedMemberType {
        /// Member signature
        signature: String,
        /// Missing type id
        ty: TypeId,
    },
}

/// Failure to bridge a target to one of its declaring types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdaptError {
    /// The target is not an instance of the declaring type
    #[error("Cannot cast {target} to {declaring}")]
    InvalidCast {
        /// Target type name
        target: String,
        /// Declaring type name
        declaring: String,
    },

    /// The embedded runtime has no wrapper for the declaring type
    #[error("No wrapper generated for {0}")]
    MissingWrapper(String),

    /// The adapter does not handle this target's representation
    #[error("Target is not a {0} object")]
    WrongRepresentation(&'static str),
}

/// Failures captured into a descriptor when evaluation does not succeed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvalFault {
    /// The member body or object storage raised an exception
    #[error(transparent)]
    Raised(#[from] Fault),

    /// The declaring type could not be bridged for this target
    #[error("RepresentationAdaptError: {0}")]
    Adapt(#[from] AdaptError),

    /// Not every required argument has been supplied
    #[error("ArgumentException: {supplied} of {expected} argument(s) supplied")]
    MissingArguments {
        /// Parameter count
        expected: usize,
        /// Arguments present
        supplied: usize,
    },

    /// The collection an entry belongs to no longer exists
    #[error("ObjectDisposedException: the owning collection is no longer available")]
    ContainerGone,
}

impl EvalFault {
    /// Exception type name shown next to the message
    pub fn type_name(&self) -> &str {
        match self {
            EvalFault::Raised(fault) => &fault.kind,
            EvalFault::Adapt(_) => "RepresentationAdaptError",
            EvalFault::MissingArguments { .. } => "ArgumentException",
            EvalFault::ContainerGone => "ObjectDisposedException",
        }
    }
}

/// Failures applying a user-supplied value
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WriteFault {
    /// The member or entry cannot be written
    #[error("{0} is read-only")]
    NotWritable(String),

    /// The setter or object storage raised an exception
    #[error(transparent)]
    Raised(#[from] Fault),

    /// The declaring type could not be bridged for this target
    #[error("RepresentationAdaptError: {0}")]
    Adapt(#[from] AdaptError),

    /// Index arguments are missing
    #[error("{supplied} of {expected} index argument(s) supplied")]
    ArgumentsRequired {
        /// Parameter count
        expected: usize,
        /// Arguments present
        supplied: usize,
    },

    /// The collection an entry belongs to no longer exists
    #[error("The owning collection is no longer available")]
    ContainerGone,

    /// The value does not fit the member's declared type
    #[error("{member} expects {expected}, got {got}")]
    TypeMismatch {
        /// Member signature or entry label
        member: String,
        /// Declared type name
        expected: String,
        /// Supplied value shape
        got: String,
    },

    /// No descriptor exists at the given index
    #[error("No member at index {0}")]
    UnknownMember(usize),

    /// Text could not be converted to the member's type
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Failures converting user text to a value
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The text is not a valid literal of the expected type
    #[error("Cannot parse '{text}' as {expected}")]
    Invalid {
        /// Input text
        text: String,
        /// Expected type name
        expected: String,
    },

    /// The type cannot be entered as text
    #[error("Values of type {0} cannot be entered as text")]
    Unsupported(String),

    /// No enum variant matches
    #[error("'{text}' is not a variant of {enum_name}")]
    UnknownVariant {
        /// Input text
        text: String,
        /// Enum type name
        enum_name: String,
    },
}

/// Failures supplying method or indexer arguments
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArgumentError {
    /// Parameter index out of range
    #[error("Parameter {index} does not exist ({count} parameter(s))")]
    NoSuchParameter {
        /// Requested index
        index: usize,
        /// Parameter count
        count: usize,
    },

    /// Wrong number of arguments
    #[error("Expected {expected} argument(s), got {got}")]
    Count {
        /// Parameter count
        expected: usize,
        /// Supplied count
        got: usize,
    },

    /// Value does not fit the parameter type
    #[error("Parameter '{parameter}' expects {expected}, got {got}")]
    TypeMismatch {
        /// Parameter name
        parameter: String,
        /// Expected type name
        expected: String,
        /// Supplied value shape
        got: String,
    },

    /// Text could not be parsed
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Configuration loading failures
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid TOML for this schema
    #[error("Invalid configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// A value is out of range
    #[error("Invalid configuration value: {0}")]
    Invalid(String),
}
