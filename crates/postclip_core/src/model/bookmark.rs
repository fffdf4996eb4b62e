//! Bookmark domain model.
//!
//! # Responsibility
//! - Define the persisted `Bookmark` record and its store-assigned identity.
//! - Define the write model (`NewBookmark`) handed to the store.
//! - Define the raw candidate accepted from the extraction collaborator.
//!
//! # Invariants
//! - `id` and `captured_at` exist only on `Bookmark`; callers cannot supply them.
//! - `media_urls` keeps caller order and duplicates as given.
//! - `url`, `platform` and `owner` are non-empty on every `NewBookmark` that
//!   passes `validate()`.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::num::ParseIntError;
use std::str::FromStr;

/// Platform recorded when the candidate does not name one.
pub const DEFAULT_PLATFORM: &str = "instagram";
/// Owner recorded when the candidate does not name one.
pub const DEFAULT_OWNER: &str = "default";

/// Store-assigned bookmark identifier.
///
/// Opaque to callers. Values grow with insertion order and are never
/// reused, even after a hard delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookmarkId(i64);

impl BookmarkId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl Display for BookmarkId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BookmarkId {
    type Err = ParseIntError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        value.trim().parse::<i64>().map(Self)
    }
}

/// Materialized bookmark record as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: BookmarkId,
    /// Canonical post URL. Unique together with `owner`.
    pub url: String,
    pub platform: String,
    /// Platform-native post identifier.
    pub post_id: Option<String>,
    pub caption: Option<String>,
    pub author_name: Option<String>,
    pub author_handle: Option<String>,
    pub media_urls: Vec<String>,
    /// One of `image|video|carousel|reel` by convention; not enforced.
    pub media_type: Option<String>,
    /// Original post creation time (ISO-8601), as reported by the source.
    pub timestamp: Option<String>,
    /// Capture time (ISO-8601 UTC, millisecond precision) set by the store.
    pub captured_at: String,
    pub owner: String,
}

/// Fully defaulted write model for one bookmark insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBookmark {
    pub url: String,
    pub platform: String,
    pub post_id: Option<String>,
    pub caption: Option<String>,
    pub author_name: Option<String>,
    pub author_handle: Option<String>,
    pub media_urls: Vec<String>,
    pub media_type: Option<String>,
    pub timestamp: Option<String>,
    pub owner: String,
}

impl NewBookmark {
    /// Creates a write model with only the required fields set.
    pub fn new(
        url: impl Into<String>,
        platform: impl Into<String>,
        owner: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            platform: platform.into(),
            post_id: None,
            caption: None,
            author_name: None,
            author_handle: None,
            media_urls: Vec::new(),
            media_type: None,
            timestamp: None,
            owner: owner.into(),
        }
    }

    /// Checks the invariants every persisted record must satisfy.
    pub fn validate(&self) -> Result<(), BookmarkValidationError> {
        if self.url.trim().is_empty() {
            return Err(BookmarkValidationError::EmptyUrl);
        }
        if self.platform.trim().is_empty() {
            return Err(BookmarkValidationError::EmptyPlatform);
        }
        if self.owner.trim().is_empty() {
            return Err(BookmarkValidationError::EmptyOwner);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookmarkValidationError {
    EmptyUrl,
    EmptyPlatform,
    EmptyOwner,
}

impl Display for BookmarkValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyUrl => write!(f, "url required"),
            Self::EmptyPlatform => write!(f, "platform required"),
            Self::EmptyOwner => write!(f, "owner required"),
        }
    }
}

impl Error for BookmarkValidationError {}

/// Raw capture input produced by the page extractor.
///
/// Every field is optional here; required-ness is decided by the service
/// profile. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkCandidate {
    pub url: Option<String>,
    pub platform: Option<String>,
    pub post_id: Option<String>,
    pub caption: Option<String>,
    pub author_name: Option<String>,
    pub author_handle: Option<String>,
    /// Single-field author identity used by some extractor builds.
    pub author_username: Option<String>,
    pub media_urls: Option<Vec<String>>,
    pub media_type: Option<String>,
    pub timestamp: Option<String>,
    #[serde(alias = "userId")]
    pub owner: Option<String>,
}

impl BookmarkCandidate {
    /// Candidate carrying only a URL.
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }
}
