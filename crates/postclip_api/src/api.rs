//! Bookmark request boundary.
//!
//! # Responsibility
//! - Accept raw request values (JSON body, path id, query params).
//! - Run exactly one service operation per call on a fresh connection.
//! - Render status codes and profile-specific JSON envelopes.
//!
//! # Invariants
//! - Calls never panic; every failure becomes a status code and body.
//! - `InvalidInput→400`, `Conflict→409`, `NotFound→404`, storage→500.
//! - Storage error details are logged, not returned to the caller.

use crate::config::ApiConfig;
use log::{error, info, warn};
use postclip_core::db::{close_db, open_db};
use postclip_core::{
    Bookmark, BookmarkCandidate, BookmarkId, BookmarkService, RepoError, ServiceError,
    ServiceProfile, ServiceResult, SqliteBookmarkRepository,
};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// One boundary reply: an HTTP-style status and a JSON body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Request boundary bound to one database file and one profile.
#[derive(Debug, Clone)]
pub struct BookmarkApi {
    db_path: PathBuf,
    profile: ServiceProfile,
}

impl BookmarkApi {
    pub fn new(db_path: impl Into<PathBuf>, profile: ServiceProfile) -> Self {
        Self {
            db_path: db_path.into(),
            profile,
        }
    }

    pub fn from_config(config: &ApiConfig) -> Self {
        Self::new(config.db_path.clone(), config.profile)
    }

    pub fn db_path(&self) -> &Path {
        self.db_path.as_path()
    }

    pub fn profile(&self) -> ServiceProfile {
        self.profile
    }

    /// `CREATE(candidate)`: `201` with the stored record.
    pub fn create_bookmark(&self, body: &str) -> ApiResponse {
        self.handle("create", || {
            let candidate: BookmarkCandidate = match serde_json::from_str(body) {
                Ok(candidate) => candidate,
                Err(err) => {
                    return ApiResponse::new(
                        400,
                        json!({ "error": format!("invalid JSON body: {err}") }),
                    );
                }
            };
            match self.with_service(|service| service.create(&candidate)) {
                Ok(created) => ApiResponse::new(
                    201,
                    self.envelope(self.record_key(), self.render(&created)),
                ),
                Err(err) => self.failure(err),
            }
        })
    }

    /// `LIST(owner?, limit?, offset?)`: `200` with one page and the owner's total.
    ///
    /// Unparseable `limit`/`offset` values fall back to their defaults.
    pub fn list_bookmarks(
        &self,
        owner: Option<&str>,
        limit: Option<&str>,
        offset: Option<&str>,
    ) -> ApiResponse {
        self.handle("list", || {
            let limit = limit.and_then(parse_query_number);
            let offset = offset.and_then(parse_query_number);
            match self.with_service(|service| service.list(owner, limit, offset)) {
                Ok(page) => {
                    let records = page
                        .records
                        .iter()
                        .map(|bookmark| self.render(bookmark))
                        .collect::<Vec<_>>();
                    let mut body = Map::new();
                    body.insert(self.list_key().to_string(), Value::Array(records));
                    body.insert("total".to_string(), json!(page.total));
                    body.insert("limit".to_string(), json!(page.limit));
                    body.insert("offset".to_string(), json!(page.offset));
                    ApiResponse::new(200, Value::Object(body))
                }
                Err(err) => self.failure(err),
            }
        })
    }

    /// `GET(id)`: `200` with the record, `404` when absent or unparseable.
    pub fn get_bookmark(&self, id: &str) -> ApiResponse {
        self.handle("get", || {
            let Ok(id) = id.parse::<BookmarkId>() else {
                return self.not_found();
            };
            match self.with_service(|service| service.get_one(id)) {
                Ok(bookmark) => {
                    ApiResponse::new(200, self.envelope(self.record_key(), self.render(&bookmark)))
                }
                Err(err) => self.failure(err),
            }
        })
    }

    /// `DELETE(id)`: `200` with a confirmation, `404` when absent.
    pub fn delete_bookmark(&self, id: &str) -> ApiResponse {
        self.handle("delete", || {
            let Ok(id) = id.parse::<BookmarkId>() else {
                return self.not_found();
            };
            match self.with_service(|service| service.remove(id)) {
                Ok(()) => ApiResponse::new(200, json!({ "ok": true })),
                Err(err) => self.failure(err),
            }
        })
    }

    /// `HEALTH()`: `200` with a liveness indicator.
    pub fn health(&self) -> ApiResponse {
        self.handle("health", || {
            match self.with_service(|service| service.health()) {
                Ok(report) => match report.profile {
                    ServiceProfile::Capture => {
                        ApiResponse::new(200, json!({ "ok": true, "bookmarks": report.bookmarks }))
                    }
                    ServiceProfile::Strict => ApiResponse::new(
                        200,
                        json!({
                            "status": "ok",
                            "ts": chrono::Utc::now()
                                .to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
                        }),
                    ),
                },
                Err(err) => self.failure(err),
            }
        })
    }

    fn handle(&self, op: &'static str, f: impl FnOnce() -> ApiResponse) -> ApiResponse {
        let started_at = Instant::now();
        let response = f();
        info!(
            "event=api_request module=api status={} op={} http_status={} profile={} duration_ms={}",
            if response.is_success() { "ok" } else { "error" },
            op,
            response.status,
            self.profile.label(),
            started_at.elapsed().as_millis()
        );
        response
    }

    fn with_service<T>(
        &self,
        f: impl FnOnce(&BookmarkService<SqliteBookmarkRepository<'_>>) -> ServiceResult<T>,
    ) -> ServiceResult<T> {
        let conn = open_db(&self.db_path)
            .map_err(|err| ServiceError::StorageUnavailable(RepoError::Db(err)))?;
        let outcome = SqliteBookmarkRepository::try_new(&conn)
            .map_err(ServiceError::from)
            .and_then(|repo| f(&BookmarkService::new(repo, self.profile)));
        if let Err(err) = close_db(conn) {
            warn!(
                "event=api_request module=api status=error error_code=db_close_failed error={}",
                err
            );
        }
        outcome
    }

    fn failure(&self, err: ServiceError) -> ApiResponse {
        match err {
            ServiceError::InvalidInput(message) => {
                ApiResponse::new(400, json!({ "error": message }))
            }
            ServiceError::Conflict { existing } => {
                let mut body = Map::new();
                body.insert("error".to_string(), json!(self.conflict_message()));
                if let Some(existing) = existing {
                    body.insert(self.record_key().to_string(), self.render(&existing));
                }
                ApiResponse::new(409, Value::Object(body))
            }
            ServiceError::NotFound(_) => self.not_found(),
            ServiceError::StorageUnavailable(err) => {
                error!(
                    "event=api_request module=api status=error error_code=storage_unavailable error={}",
                    err
                );
                ApiResponse::new(500, json!({ "error": "storage unavailable" }))
            }
        }
    }

    fn not_found(&self) -> ApiResponse {
        let message = match self.profile {
            ServiceProfile::Capture => "not found",
            ServiceProfile::Strict => "Not found",
        };
        ApiResponse::new(404, json!({ "error": message }))
    }

    fn conflict_message(&self) -> &'static str {
        match self.profile {
            ServiceProfile::Capture => "already captured",
            ServiceProfile::Strict => "Bookmark already exists",
        }
    }

    fn record_key(&self) -> &'static str {
        match self.profile {
            ServiceProfile::Capture => "bookmark",
            ServiceProfile::Strict => "data",
        }
    }

    fn list_key(&self) -> &'static str {
        match self.profile {
            ServiceProfile::Capture => "bookmarks",
            ServiceProfile::Strict => "data",
        }
    }

    fn envelope(&self, key: &str, value: Value) -> Value {
        let mut body = Map::new();
        body.insert(key.to_string(), value);
        Value::Object(body)
    }

    fn render(&self, bookmark: &Bookmark) -> Value {
        match self.profile {
            ServiceProfile::Capture => json!({
                "id": bookmark.id,
                "url": bookmark.url,
                "platform": bookmark.platform,
                "postId": bookmark.post_id,
                "caption": bookmark.caption,
                "authorName": bookmark.author_name,
                "authorUsername": bookmark.author_handle,
                "mediaUrls": bookmark.media_urls,
                "mediaType": bookmark.media_type,
                "timestamp": bookmark.timestamp,
                "capturedAt": bookmark.captured_at,
                "owner": bookmark.owner,
            }),
            ServiceProfile::Strict => json!({
                "id": bookmark.id,
                "url": bookmark.url,
                "platform": bookmark.platform,
                "post_id": bookmark.post_id,
                "caption": bookmark.caption,
                "author_name": bookmark.author_name,
                "author_handle": bookmark.author_handle,
                "media_urls": bookmark.media_urls,
                "media_type": bookmark.media_type,
                "timestamp": bookmark.timestamp,
                "saved_at": bookmark.captured_at,
                "user_id": bookmark.owner,
            }),
        }
    }
}

fn parse_query_number(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok()
}
