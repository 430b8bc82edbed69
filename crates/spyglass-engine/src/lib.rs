//! Spyglass engine - live object inspection
//!
//! Given a running object (or a type, for its statics), the engine reflects
//! its members once into a sorted member cache, evaluates them lazily, and
//! exposes a filtered, paged window over the result so that only the
//! visible members are ever live.
//!
//! # Architecture
//!
//! ```text
//! TargetHandle
//!     |
//!     v
//! MemberCacheBuilder --(TypeHierarchyWalker, MemberQuery, Blacklist)
//!     |                --(ObjectAdapter per declaring type)
//!     v
//! [MemberDescriptor] --> FilterEngine --> FilteredView
//!                                              |
//!                                              v
//!                                  PagedVirtualDataSource
//!                                              |
//!                                              v
//!                           MemberDescriptor::evaluate --> ValueKind
//! ```
//!
//! [`InspectorSession`] ties these together and is what hosts drive.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use spyglass_engine::{InspectorConfig, InspectorSession, TargetHandle};
//!
//! let target = TargetHandle::instance(&registry, &value)?;
//! let config = InspectorConfig::default();
//! let mut session = InspectorSession::open(Arc::clone(&registry), target, config)?;
//! session.set_name_filter("pos");
//! session.tick();
//! for &index in session.visible() {
//!     println!("{} = {:?}", session.descriptors()[index].signature(), session.preview(index));
//! }
//! ```

#![warn(missing_docs)]

pub mod adapter;
pub mod cache;
pub mod classify;
pub mod config;
pub mod error;
pub mod filter;
pub mod format;
pub mod paging;
pub mod parse;
pub mod reflect;
pub mod session;
pub mod target;

pub use adapter::{
    adapter_for, AdaptedHandle, Binding, ForeignAdapter, NativeAdapter, ObjectAdapter,
};
pub use cache::{
    CacheEntry, CollectionEntry, EntryRole, EvalState, MemberCacheBuilder, MemberDescriptor,
};
pub use classify::{classify, classify_value, is_structurally_editable, Interaction, ValueKind};
pub use config::InspectorConfig;
pub use error::{
    AdaptError, ArgumentError, ConfigError, EnumerationError, EvalFault, InspectError, ParseError,
    WriteFault,
};
pub use filter::{FilterEngine, FilteredView, KindMask, MemberFilter};
pub use paging::{
    CollectionSource, MemberSource, PageWindow, PagedVirtualDataSource, RebuildEvent, ResourcePool,
    VirtualSource,
};
pub use reflect::{Blacklist, MemberKind, Scope, TypeHierarchyWalker};
pub use session::InspectorSession;
pub use target::TargetHandle;
