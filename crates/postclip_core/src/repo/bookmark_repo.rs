//! Bookmark repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide insert/read/list/delete APIs over canonical `bookmarks` storage.
//! - Enforce `(url, owner)` uniqueness in the schema, not in caller logic.
//! - Keep SQL details and `media_urls` encoding inside the persistence boundary.
//!
//! # Invariants
//! - Write paths must call `NewBookmark::validate()` before SQL mutations.
//! - `insert` never overwrites: a duplicate key is `ConstraintViolation`.
//! - Listing order is `captured_at DESC, id DESC` and therefore total.
//! - Read paths reject undecodable persisted state instead of masking it.
//! - Not-found is a value (`None` / `0`), never an error.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::bookmark::{Bookmark, BookmarkId, BookmarkValidationError, NewBookmark};
use rusqlite::{ffi, params, Connection, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

const BOOKMARK_SELECT_SQL: &str = "SELECT
    id,
    url,
    platform,
    post_id,
    caption,
    author_name,
    author_handle,
    media_urls,
    media_type,
    timestamp,
    captured_at,
    owner
FROM bookmarks";

const REQUIRED_COLUMNS: [&str; 12] = [
    "id",
    "url",
    "platform",
    "post_id",
    "caption",
    "author_name",
    "author_handle",
    "media_urls",
    "media_type",
    "timestamp",
    "captured_at",
    "owner",
];

/// Page size applied when the caller gives none (or zero).
pub const LIST_DEFAULT_LIMIT: u32 = 50;
/// Upper bound for one page, to keep responses small.
pub const LIST_LIMIT_MAX: u32 = 200;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for bookmark persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(BookmarkValidationError),
    Db(DbError),
    /// `(url, owner)` already exists. Raised by the storage constraint.
    ConstraintViolation {
        url: String,
        owner: String,
    },
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::ConstraintViolation { owner, .. } => {
                write!(f, "bookmark url already exists for owner `{owner}`")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted bookmark data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}; open it with `open_db`"
            ),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<BookmarkValidationError> for RepoError {
    fn from(value: BookmarkValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Query options for listing one owner's bookmarks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookmarkListQuery {
    pub owner: String,
    /// Defaults to 50 and clamps to 200.
    pub limit: Option<u32>,
    pub offset: u32,
}

impl BookmarkListQuery {
    pub fn for_owner(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            limit: None,
            offset: 0,
        }
    }
}

/// One page of an owner's bookmarks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookmarkPage {
    /// Sorted by `captured_at DESC, id DESC`.
    pub records: Vec<Bookmark>,
    /// Count of all the owner's bookmarks, regardless of paging.
    pub total: u64,
    /// Effective normalized limit used by the query.
    pub limit: u32,
    pub offset: u32,
}

/// Repository interface for bookmark storage.
pub trait BookmarkRepository {
    /// Persists one bookmark and returns it with `id` and `captured_at` set.
    fn insert(&self, bookmark: &NewBookmark) -> RepoResult<Bookmark>;
    fn get_by_id(&self, id: BookmarkId) -> RepoResult<Option<Bookmark>>;
    fn find_by_url(&self, url: &str, owner: &str) -> RepoResult<Option<Bookmark>>;
    fn list(&self, query: &BookmarkListQuery) -> RepoResult<BookmarkPage>;
    fn count(&self, owner: &str) -> RepoResult<u64>;
    /// Hard-deletes one bookmark. Returns rows removed (0 or 1).
    fn delete(&self, id: BookmarkId) -> RepoResult<usize>;
    /// Removes every bookmark for every owner. Maintenance only.
    fn clear(&self) -> RepoResult<usize>;
}

/// SQLite-backed bookmark repository.
pub struct SqliteBookmarkRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBookmarkRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl BookmarkRepository for SqliteBookmarkRepository<'_> {
    fn insert(&self, bookmark: &NewBookmark) -> RepoResult<Bookmark> {
        bookmark.validate()?;
        let media_urls = serde_json::to_string(&bookmark.media_urls)
            .map_err(|err| RepoError::InvalidData(format!("media_urls encode failed: {err}")))?;

        // Insert and read-back commit together, so a failed read leaves no row.
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let inserted = tx.execute(
            "INSERT INTO bookmarks (
                url,
                platform,
                post_id,
                caption,
                author_name,
                author_handle,
                media_urls,
                media_type,
                timestamp,
                owner
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
            params![
                bookmark.url.as_str(),
                bookmark.platform.as_str(),
                bookmark.post_id.as_deref(),
                bookmark.caption.as_deref(),
                bookmark.author_name.as_deref(),
                bookmark.author_handle.as_deref(),
                media_urls,
                bookmark.media_type.as_deref(),
                bookmark.timestamp.as_deref(),
                bookmark.owner.as_str(),
            ],
        );

        if let Err(err) = inserted {
            if is_unique_violation(&err) {
                return Err(RepoError::ConstraintViolation {
                    url: bookmark.url.clone(),
                    owner: bookmark.owner.clone(),
                });
            }
            return Err(err.into());
        }

        let id = BookmarkId::new(tx.last_insert_rowid());
        let created = query_one(
            &tx,
            &format!("{BOOKMARK_SELECT_SQL} WHERE id = ?1;"),
            params![id.get()],
        )?
        .ok_or_else(|| RepoError::InvalidData(format!("inserted bookmark {id} not readable")))?;
        tx.commit()?;

        Ok(created)
    }

    fn get_by_id(&self, id: BookmarkId) -> RepoResult<Option<Bookmark>> {
        query_one(
            self.conn,
            &format!("{BOOKMARK_SELECT_SQL} WHERE id = ?1;"),
            params![id.get()],
        )
    }

    fn find_by_url(&self, url: &str, owner: &str) -> RepoResult<Option<Bookmark>> {
        query_one(
            self.conn,
            &format!("{BOOKMARK_SELECT_SQL} WHERE url = ?1 AND owner = ?2;"),
            params![url, owner],
        )
    }

    fn list(&self, query: &BookmarkListQuery) -> RepoResult<BookmarkPage> {
        let limit = normalize_list_limit(query.limit);

        // Page and total come from one read snapshot.
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Deferred)?;
        let total = count_for_owner(&tx, query.owner.as_str())?;

        let records = {
            let mut stmt = tx.prepare(&format!(
                "{BOOKMARK_SELECT_SQL}
                 WHERE owner = ?1
                 ORDER BY captured_at DESC, id DESC
                 LIMIT ?2 OFFSET ?3;"
            ))?;
            let mut rows = stmt.query(params![
                query.owner.as_str(),
                i64::from(limit),
                i64::from(query.offset)
            ])?;
            let mut records = Vec::new();
            while let Some(row) = rows.next()? {
                records.push(parse_bookmark_row(row)?);
            }
            records
        };
        tx.commit()?;

        Ok(BookmarkPage {
            records,
            total,
            limit,
            offset: query.offset,
        })
    }

    fn count(&self, owner: &str) -> RepoResult<u64> {
        count_for_owner(self.conn, owner)
    }

    fn delete(&self, id: BookmarkId) -> RepoResult<usize> {
        let removed = self
            .conn
            .execute("DELETE FROM bookmarks WHERE id = ?1;", params![id.get()])?;
        Ok(removed)
    }

    fn clear(&self) -> RepoResult<usize> {
        let removed = self.conn.execute("DELETE FROM bookmarks;", [])?;
        Ok(removed)
    }
}

/// Normalizes list limit according to the listing contract.
pub fn normalize_list_limit(limit: Option<u32>) -> u32 {
    match limit {
        Some(0) => LIST_DEFAULT_LIMIT,
        Some(value) if value > LIST_LIMIT_MAX => LIST_LIMIT_MAX,
        Some(value) => value,
        None => LIST_DEFAULT_LIMIT,
    }
}

fn query_one(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> RepoResult<Option<Bookmark>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_bookmark_row(row)?));
    }
    Ok(None)
}

fn count_for_owner(conn: &Connection, owner: &str) -> RepoResult<u64> {
    let total: i64 = conn.query_row(
        "SELECT COUNT(*) FROM bookmarks WHERE owner = ?1;",
        [owner],
        |row| row.get(0),
    )?;
    u64::try_from(total).map_err(|_| RepoError::InvalidData(format!("negative count {total}")))
}

fn parse_bookmark_row(row: &Row<'_>) -> RepoResult<Bookmark> {
    let id = BookmarkId::new(row.get("id")?);
    let media_urls = match row.get::<_, Option<String>>("media_urls")? {
        Some(raw) => serde_json::from_str::<Vec<String>>(&raw).map_err(|err| {
            RepoError::InvalidData(format!(
                "invalid media_urls value in bookmarks.media_urls for id {id}: {err}"
            ))
        })?,
        None => Vec::new(),
    };

    Ok(Bookmark {
        id,
        url: row.get("url")?,
        platform: row.get("platform")?,
        post_id: row.get("post_id")?,
        caption: row.get("caption")?,
        author_name: row.get("author_name")?,
        author_handle: row.get("author_handle")?,
        media_urls,
        media_type: row.get("media_type")?,
        timestamp: row.get("timestamp")?,
        captured_at: row.get("captured_at")?,
        owner: row.get("owner")?,
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "bookmarks")? {
        return Err(RepoError::MissingRequiredTable("bookmarks"));
    }

    for column in REQUIRED_COLUMNS {
        if !table_has_column(conn, "bookmarks", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "bookmarks",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
