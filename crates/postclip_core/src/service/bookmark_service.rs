//! Bookmark use-case service.
//!
//! # Responsibility
//! - Turn raw capture candidates into validated, defaulted, deduplicated records.
//! - Translate repository outcomes into the caller-facing error taxonomy.
//!
//! # Invariants
//! - `url` is required under every profile; `platform` only under `Strict`.
//! - The duplicate pre-check is advisory. The storage constraint decides, and
//!   a lost race is reported exactly like a pre-check hit.
//! - `ConstraintViolation` never escapes this module.
//! - Service holds no mutable state; concurrency lives in the store.

use crate::model::bookmark::{
    Bookmark, BookmarkCandidate, BookmarkId, NewBookmark, DEFAULT_OWNER, DEFAULT_PLATFORM,
};
use crate::repo::bookmark_repo::{BookmarkListQuery, BookmarkPage, BookmarkRepository, RepoError};
use log::{debug, error, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static POST_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/(?:p|reel)/([A-Za-z0-9_-]+)").expect("valid post id regex"));

/// Validation and presentation variant, fixed at service construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ServiceProfile {
    /// `platform` optional and defaulted; camelCase capture records.
    #[default]
    Capture,
    /// `platform` required; snake_case records under a `data` envelope.
    Strict,
}

impl ServiceProfile {
    /// Parses a profile name (`capture|strict`, case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "capture" => Some(Self::Capture),
            "strict" => Some(Self::Strict),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Capture => "capture",
            Self::Strict => "strict",
        }
    }

    pub fn requires_platform(self) -> bool {
        matches!(self, Self::Strict)
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Caller-facing error taxonomy for bookmark use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Missing or malformed required input. Not retryable.
    InvalidInput(String),
    /// `(url, owner)` already captured. Carries the existing record when it
    /// could be read back.
    Conflict { existing: Option<Box<Bookmark>> },
    NotFound(BookmarkId),
    /// Persistence failed for this request. Safe for the caller to retry.
    StorageUnavailable(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::Conflict { existing } => match existing {
                Some(bookmark) => write!(f, "bookmark already exists: {}", bookmark.id),
                None => write!(f, "bookmark already exists"),
            },
            Self::NotFound(id) => write!(f, "bookmark not found: {id}"),
            Self::StorageUnavailable(err) => write!(f, "storage unavailable: {err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::StorageUnavailable(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::ConstraintViolation { .. } => Self::Conflict { existing: None },
            RepoError::Validation(err) => Self::InvalidInput(err.to_string()),
            other => Self::StorageUnavailable(other),
        }
    }
}

/// Liveness report for health probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthReport {
    pub profile: ServiceProfile,
    /// Bookmarks stored for the default owner.
    pub bookmarks: u64,
}

/// Bookmark service facade over repository implementations.
pub struct BookmarkService<R: BookmarkRepository> {
    repo: R,
    profile: ServiceProfile,
}

impl<R: BookmarkRepository> BookmarkService<R> {
    /// Creates a service using the provided repository and profile.
    pub fn new(repo: R, profile: ServiceProfile) -> Self {
        debug!(
            "event=service_init module=service status=ok profile={}",
            profile.label()
        );
        Self { repo, profile }
    }

    pub fn profile(&self) -> ServiceProfile {
        self.profile
    }

    /// Captures one candidate.
    ///
    /// # Contract
    /// - Fails with `InvalidInput` before touching storage when required
    ///   fields are missing.
    /// - Fails with `Conflict` (carrying the stored record) when the owner
    ///   already captured this url.
    /// - Returns the stored record with `id` and `captured_at` assigned.
    pub fn create(&self, candidate: &BookmarkCandidate) -> ServiceResult<Bookmark> {
        let new_bookmark = self.prepare(candidate)?;

        if let Some(existing) = self
            .repo
            .find_by_url(new_bookmark.url.as_str(), new_bookmark.owner.as_str())?
        {
            info!(
                "event=bookmark_conflict module=service status=ok source=precheck existing_id={}",
                existing.id
            );
            return Err(ServiceError::Conflict {
                existing: Some(Box::new(existing)),
            });
        }

        match self.repo.insert(&new_bookmark) {
            Ok(created) => {
                info!(
                    "event=bookmark_create module=service status=ok id={} profile={}",
                    created.id,
                    self.profile.label()
                );
                Ok(created)
            }
            Err(RepoError::ConstraintViolation { url, owner }) => {
                let existing = self.repo.find_by_url(url.as_str(), owner.as_str())?;
                info!(
                    "event=bookmark_conflict module=service status=ok source=constraint existing_found={}",
                    existing.is_some()
                );
                Err(ServiceError::Conflict {
                    existing: existing.map(Box::new),
                })
            }
            Err(err) => {
                error!(
                    "event=bookmark_create module=service status=error error_code=insert_failed error={}",
                    err
                );
                Err(err.into())
            }
        }
    }

    /// Lists one owner's bookmarks, newest capture first.
    ///
    /// Missing owner means `default`; missing offset means `0`; the limit is
    /// normalized by the repository.
    pub fn list(
        &self,
        owner: Option<&str>,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> ServiceResult<BookmarkPage> {
        let query = BookmarkListQuery {
            owner: non_blank(owner).unwrap_or(DEFAULT_OWNER).to_string(),
            limit,
            offset: offset.unwrap_or(0),
        };
        let page = self.repo.list(&query)?;
        debug!(
            "event=bookmark_list module=service status=ok returned={} total={} limit={} offset={}",
            page.records.len(),
            page.total,
            page.limit,
            page.offset
        );
        Ok(page)
    }

    /// Gets one bookmark by id.
    pub fn get_one(&self, id: BookmarkId) -> ServiceResult<Bookmark> {
        self.repo
            .get_by_id(id)?
            .ok_or(ServiceError::NotFound(id))
    }

    /// Hard-deletes one bookmark. A missing id is `NotFound`.
    pub fn remove(&self, id: BookmarkId) -> ServiceResult<()> {
        if self.repo.delete(id)? == 0 {
            warn!(
                "event=bookmark_delete module=service status=error error_code=not_found id={}",
                id
            );
            return Err(ServiceError::NotFound(id));
        }
        info!(
            "event=bookmark_delete module=service status=ok id={}",
            id
        );
        Ok(())
    }

    /// Reports liveness and the default owner's record count.
    pub fn health(&self) -> ServiceResult<HealthReport> {
        let bookmarks = self.repo.count(DEFAULT_OWNER)?;
        Ok(HealthReport {
            profile: self.profile,
            bookmarks,
        })
    }

    fn prepare(&self, candidate: &BookmarkCandidate) -> ServiceResult<NewBookmark> {
        let url = non_blank(candidate.url.as_deref())
            .ok_or_else(|| ServiceError::InvalidInput("url required".to_string()))?;

        let platform = match non_blank(candidate.platform.as_deref()) {
            Some(platform) => platform,
            None if self.profile.requires_platform() => {
                return Err(ServiceError::InvalidInput("platform required".to_string()));
            }
            None => DEFAULT_PLATFORM,
        };

        let owner = non_blank(candidate.owner.as_deref()).unwrap_or(DEFAULT_OWNER);

        let mut bookmark = NewBookmark::new(url, platform, owner);
        bookmark.post_id = non_empty(&candidate.post_id).or_else(|| derive_post_id(url));
        bookmark.caption = non_empty(&candidate.caption);
        bookmark.author_name = non_empty(&candidate.author_name);
        bookmark.author_handle =
            non_empty(&candidate.author_handle).or_else(|| non_empty(&candidate.author_username));
        bookmark.media_urls = candidate.media_urls.clone().unwrap_or_default();
        bookmark.media_type = non_empty(&candidate.media_type);
        bookmark.timestamp = non_empty(&candidate.timestamp);
        Ok(bookmark)
    }
}

/// Extracts the platform post id from `/p/<id>` or `/reel/<id>` URL paths.
pub fn derive_post_id(url: &str) -> Option<String> {
    POST_ID_RE
        .captures(url)
        .and_then(|captures| captures.get(1))
        .map(|id| id.as_str().to_string())
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|trimmed| !trimmed.is_empty())
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|text| !text.is_empty()).cloned()
}
