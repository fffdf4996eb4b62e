//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repository writes must enforce `NewBookmark::validate()` before persistence.
//! - Uniqueness conflicts are reported as `ConstraintViolation`, distinct
//!   from DB transport errors.

pub mod bookmark_repo;
