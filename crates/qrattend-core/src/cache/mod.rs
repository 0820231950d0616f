//! In-memory caching of remote collections.
//!
//! `DirectoryCache` keeps one whole-collection snapshot per resource kind
//! and decides on each read whether the snapshot is still usable:
//! - users: 60 minutes
//! - meetings: 60 minutes
//! - attendance: 10 minutes
//!
//! Nothing is persisted; a restart starts cold.

pub mod manager;

pub use manager::{CachedSnapshot, DirectoryCache, ResourceKind};
