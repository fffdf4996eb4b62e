//! Bookmark domain model.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Separate the caller-supplied candidate, the defaulted write model and
//!   the materialized record.
//!
//! # Invariants
//! - Every persisted record is identified by a store-assigned `BookmarkId`.
//! - Deletion is a hard delete; there is no tombstone state.

pub mod bookmark;
