//! Core domain logic for PostClip.
//! This crate is the single source of truth for bookmark invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::bookmark::{
    Bookmark, BookmarkCandidate, BookmarkId, BookmarkValidationError, NewBookmark,
    DEFAULT_OWNER, DEFAULT_PLATFORM,
};
pub use repo::bookmark_repo::{
    BookmarkListQuery, BookmarkPage, BookmarkRepository, RepoError, RepoResult,
    SqliteBookmarkRepository,
};
pub use service::bookmark_service::{
    BookmarkService, HealthReport, ServiceError, ServiceProfile, ServiceResult,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
