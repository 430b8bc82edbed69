//! Reflection over registered types
//!
//! - [`walker`]: base-type chains
//! - [`query`]: declared and inherited members of one type
//! - [`blacklist`]: signatures that are never cached

pub mod blacklist;
pub mod query;
pub mod walker;

pub use blacklist::{is_property_accessor, Blacklist, SignaturePattern};
pub use query::{
    parameter_suffix, signature, Member, MemberKind, MemberQuery, QueryFlags, QueryResult,
    ReflectedMember, Scope,
};
pub use walker::{Hierarchy, TypeHierarchyWalker};
