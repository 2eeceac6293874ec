//! Bookmark repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide stable CRUD + create-if-absent APIs over `bookmarks` storage.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - `upsert_if_new` is atomic: under concurrent same-key calls exactly one
//!   caller observes a created row. The unique index on `normalized_url`
//!   is the serialization point.
//! - Updates never touch `normalized_url`; the key is frozen at creation.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::DbError;
use crate::model::bookmark::{
    Bookmark, BookmarkId, BookmarkPatch, BookmarkValidationError, NewBookmark,
};
use crate::normalize::tags::canonical_tag_string;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const BOOKMARK_SELECT_SQL: &str = "SELECT
    uuid,
    url,
    normalized_url,
    title,
    description,
    tags,
    source,
    reading_time_minutes,
    content_type,
    language,
    created_at,
    updated_at
FROM bookmarks";

const BOOKMARK_INSERT_SQL: &str = "INSERT INTO bookmarks (
    uuid,
    url,
    normalized_url,
    title,
    description,
    tags,
    source,
    reading_time_minutes,
    content_type,
    language
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
ON CONFLICT (normalized_url) DO NOTHING;";

const BOOKMARKS_DEFAULT_LIMIT: u32 = 100;
const BOOKMARKS_LIMIT_MAX: u32 = 500;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for bookmark persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(BookmarkValidationError),
    Db(DbError),
    NotFound(BookmarkId),
    /// Uniqueness or other constraint violation outside the atomic
    /// create-if-absent path. Surfaced as-is; the core never retries.
    Conflict(String),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "bookmark not found: {id}"),
            Self::Conflict(message) => write!(f, "bookmark store conflict: {message}"),
            Self::InvalidData(message) => write!(f, "invalid persisted bookmark data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::Conflict(_) | Self::InvalidData(_) => None,
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
        match &value {
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Self::Conflict(value.to_string())
            }
            _ => Self::Db(DbError::Sqlite(value)),
        }
    }
}

/// Query options for listing bookmarks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookmarkListQuery {
    /// Maximum rows to return. Defaults to 100 and clamps to 500.
    pub limit: Option<u32>,
    /// Number of rows to skip.
    pub offset: u32,
}

/// Repository interface for bookmark operations.
pub trait BookmarkRepository {
    /// Inserts the row unless its normalized URL already exists.
    ///
    /// Returns the stored bookmark plus `true` when this call created it.
    /// An existing row is returned unchanged; first write wins.
    fn upsert_if_new(&self, new: &NewBookmark) -> RepoResult<(Bookmark, bool)>;
    /// Runs a whole batch through create-if-absent in one transaction.
    ///
    /// Returns `(created, skipped)` counts over the batch in input order.
    fn upsert_batch(&mut self, batch: &[NewBookmark]) -> RepoResult<(usize, usize)>;
    fn get(&self, id: BookmarkId) -> RepoResult<Option<Bookmark>>;
    fn get_by_normalized_url(&self, normalized_url: &str) -> RepoResult<Option<Bookmark>>;
    fn list(&self, query: &BookmarkListQuery) -> RepoResult<Vec<Bookmark>>;
    /// Applies a field patch. Never recomputes `normalized_url`.
    fn update(&self, id: BookmarkId, patch: &BookmarkPatch) -> RepoResult<()>;
    /// Hard-deletes one bookmark. Returns whether a row was removed.
    fn delete(&self, id: BookmarkId) -> RepoResult<bool>;
}

/// SQLite-backed bookmark repository.
pub struct SqliteBookmarkRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteBookmarkRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }
}

impl BookmarkRepository for SqliteBookmarkRepository<'_> {
    fn upsert_if_new(&self, new: &NewBookmark) -> RepoResult<(Bookmark, bool)> {
        new.validate()?;

        // Single-statement insert; SQLite serializes concurrent writers, so
        // exactly one caller per normalized URL sees a changed row count.
        let changed = self.conn.execute(
            BOOKMARK_INSERT_SQL,
            params![
                new.uuid.to_string(),
                new.url.as_str(),
                new.normalized_url.as_str(),
                new.title.as_str(),
                new.description.as_deref(),
                new.tags.as_str(),
                new.source.as_deref(),
                new.reading_time_minutes,
                new.content_type.as_deref(),
                new.language.as_deref(),
            ],
        )?;

        let stored = self
            .get_by_normalized_url(new.normalized_url.as_str())?
            .ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "bookmark `{}` missing directly after upsert",
                    new.normalized_url
                ))
            })?;

        Ok((stored, changed == 1))
    }

    fn upsert_batch(&mut self, batch: &[NewBookmark]) -> RepoResult<(usize, usize)> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut created = 0;
        let mut skipped = 0;
        for new in batch {
            new.validate()?;
            let changed = tx.execute(
                BOOKMARK_INSERT_SQL,
                params![
                    new.uuid.to_string(),
                    new.url.as_str(),
                    new.normalized_url.as_str(),
                    new.title.as_str(),
                    new.description.as_deref(),
                    new.tags.as_str(),
                    new.source.as_deref(),
                    new.reading_time_minutes,
                    new.content_type.as_deref(),
                    new.language.as_deref(),
                ],
            )?;
            if changed == 1 {
                created += 1;
            } else {
                skipped += 1;
            }
        }

        tx.commit()?;
        Ok((created, skipped))
    }

    fn get(&self, id: BookmarkId) -> RepoResult<Option<Bookmark>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{BOOKMARK_SELECT_SQL} WHERE uuid = ?1;"))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_bookmark_row(row)?));
        }

        Ok(None)
    }

    fn get_by_normalized_url(&self, normalized_url: &str) -> RepoResult<Option<Bookmark>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{BOOKMARK_SELECT_SQL} WHERE normalized_url = ?1;"))?;

        let mut rows = stmt.query([normalized_url])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_bookmark_row(row)?));
        }

        Ok(None)
    }

    fn list(&self, query: &BookmarkListQuery) -> RepoResult<Vec<Bookmark>> {
        let mut sql = format!("{BOOKMARK_SELECT_SQL} ORDER BY created_at DESC, uuid ASC LIMIT ?");
        let mut bind_values: Vec<Value> = Vec::new();
        bind_values.push(Value::Integer(i64::from(normalize_list_limit(query.limit))));

        if query.offset > 0 {
            sql.push_str(" OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut bookmarks = Vec::new();
        while let Some(row) = rows.next()? {
            bookmarks.push(parse_bookmark_row(row)?);
        }

        Ok(bookmarks)
    }

    fn update(&self, id: BookmarkId, patch: &BookmarkPatch) -> RepoResult<()> {
        if patch.is_empty() {
            // Nothing to assign; still report a missing target.
            return match self.get(id)? {
                Some(_) => Ok(()),
                None => Err(RepoError::NotFound(id)),
            };
        }

        let mut assignments: Vec<&'static str> = Vec::new();
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(url) = patch.url.as_ref() {
            // Raw URL only. normalized_url keeps the key computed at
            // creation, so the stored key may go stale relative to `url`.
            assignments.push("url = ?");
            bind_values.push(Value::Text(url.clone()));
        }
        if let Some(title) = patch.title.as_ref() {
            assignments.push("title = ?");
            bind_values.push(Value::Text(title.clone()));
        }
        if let Some(description) = patch.description.as_ref() {
            assignments.push("description = ?");
            bind_values.push(Value::Text(description.clone()));
        }
        if let Some(tags) = patch.tags.as_ref() {
            // Same canonicalization rule as creation.
            assignments.push("tags = ?");
            bind_values.push(Value::Text(canonical_tag_string(tags)));
        }
        if let Some(source) = patch.source.as_ref() {
            assignments.push("source = ?");
            bind_values.push(Value::Text(source.clone()));
        }
        if let Some(minutes) = patch.reading_time_minutes {
            assignments.push("reading_time_minutes = ?");
            bind_values.push(Value::Integer(minutes));
        }
        if let Some(content_type) = patch.content_type.as_ref() {
            assignments.push("content_type = ?");
            bind_values.push(Value::Text(content_type.clone()));
        }
        if let Some(language) = patch.language.as_ref() {
            assignments.push("language = ?");
            bind_values.push(Value::Text(language.clone()));
        }

        let sql = format!(
            "UPDATE bookmarks
             SET {},
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?;",
            assignments.join(", ")
        );
        bind_values.push(Value::Text(id.to_string()));

        let changed = self.conn.execute(&sql, params_from_iter(bind_values))?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn delete(&self, id: BookmarkId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM bookmarks WHERE uuid = ?1;", [id.to_string()])?;
        Ok(changed > 0)
    }
}

/// Normalizes list limit according to the listing contract.
pub fn normalize_list_limit(limit: Option<u32>) -> u32 {
    match limit {
        Some(0) => BOOKMARKS_DEFAULT_LIMIT,
        Some(value) if value > BOOKMARKS_LIMIT_MAX => BOOKMARKS_LIMIT_MAX,
        Some(value) => value,
        None => BOOKMARKS_DEFAULT_LIMIT,
    }
}

fn parse_bookmark_row(row: &Row<'_>) -> RepoResult<Bookmark> {
    let uuid_text: String = row.get("uuid")?;
    let uuid = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{uuid_text}` in bookmarks.uuid"))
    })?;

    Ok(Bookmark {
        uuid,
        url: row.get("url")?,
        normalized_url: row.get("normalized_url")?,
        title: row.get("title")?,
        description: row.get("description")?,
        tags: row.get("tags")?,
        source: row.get("source")?,
        reading_time_minutes: row.get("reading_time_minutes")?,
        content_type: row.get("content_type")?,
        language: row.get("language")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
