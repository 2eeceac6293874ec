//! Bookmark use-case service.
//!
//! # Responsibility
//! - Compose normalization, draft construction and the create-if-absent
//!   store contract into CRUD + bulk import entry points.
//!
//! # Invariants
//! - The normalized key is derived exactly once per created bookmark.
//! - Bulk import resolves candidates in input order; a duplicate within
//!   the batch counts the first occurrence as created and every later
//!   same-key occurrence as skipped.
//! - Updates never recompute the normalized key.

use crate::model::bookmark::{Bookmark, BookmarkDraft, BookmarkId, BookmarkPatch, NewBookmark};
use crate::normalize::url::{normalize_url, NormalizeError};
use crate::repo::bookmark_repo::{
    normalize_list_limit, BookmarkListQuery, BookmarkRepository, RepoError, RepoResult,
};
use log::info;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for bookmark use-cases.
#[derive(Debug)]
pub enum BookmarkServiceError {
    /// Caller-supplied URL failed normalization.
    InvalidUrl(NormalizeError),
    /// Target bookmark does not exist.
    BookmarkNotFound(BookmarkId),
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for BookmarkServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidUrl(err) => write!(f, "{err}"),
            Self::BookmarkNotFound(id) => write!(f, "bookmark not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent bookmark state: {details}"),
        }
    }
}

impl Error for BookmarkServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidUrl(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for BookmarkServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::BookmarkNotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<NormalizeError> for BookmarkServiceError {
    fn from(value: NormalizeError) -> Self {
        Self::InvalidUrl(value)
    }
}

/// Outcome counts for a bulk import run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    /// Candidates that created a new bookmark.
    pub imported: usize,
    /// Candidates skipped because their normalized URL already existed,
    /// inside or before this batch.
    pub skipped_duplicates: usize,
}

/// List result envelope used by service callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookmarksListResult {
    /// Items sorted by `created_at DESC, uuid ASC`.
    pub items: Vec<Bookmark>,
    /// Effective normalized limit used by the query.
    pub applied_limit: u32,
}

/// Bookmark service facade over repository implementations.
pub struct BookmarkService<R: BookmarkRepository> {
    repo: R,
}

impl<R: BookmarkRepository> BookmarkService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a bookmark unless its normalized URL already exists.
    ///
    /// Returns the stored bookmark plus `true` when this call created it.
    /// On a duplicate the existing record comes back unchanged; no field
    /// is updated, first write wins.
    pub fn create_bookmark(
        &self,
        draft: &BookmarkDraft,
    ) -> Result<(Bookmark, bool), BookmarkServiceError> {
        let new = NewBookmark::from_draft(draft)?;
        Ok(self.repo.upsert_if_new(&new)?)
    }

    /// Gets one bookmark by stable ID.
    pub fn get_bookmark(&self, id: BookmarkId) -> RepoResult<Option<Bookmark>> {
        self.repo.get(id)
    }

    /// Looks up a bookmark by raw URL through normalization.
    pub fn get_bookmark_by_url(
        &self,
        url: &str,
    ) -> Result<Option<Bookmark>, BookmarkServiceError> {
        let normalized = normalize_url(url)?;
        Ok(self.repo.get_by_normalized_url(&normalized)?)
    }

    /// Lists bookmarks newest-first with pagination.
    pub fn list_bookmarks(
        &self,
        limit: Option<u32>,
        offset: u32,
    ) -> Result<BookmarksListResult, BookmarkServiceError> {
        let applied_limit = normalize_list_limit(limit);
        let query = BookmarkListQuery {
            limit: Some(applied_limit),
            offset,
        };
        let items = self.repo.list(&query)?;
        Ok(BookmarksListResult {
            items,
            applied_limit,
        })
    }

    /// Applies a field patch and returns the updated record.
    ///
    /// The normalized key is deliberately left alone even when the patch
    /// replaces the raw URL.
    pub fn update_bookmark(
        &self,
        id: BookmarkId,
        patch: &BookmarkPatch,
    ) -> Result<Bookmark, BookmarkServiceError> {
        self.repo.update(id, patch)?;
        self.repo
            .get(id)?
            .ok_or(BookmarkServiceError::InconsistentState(
                "updated bookmark not found in read-back",
            ))
    }

    /// Hard-deletes one bookmark by stable ID.
    pub fn delete_bookmark(&self, id: BookmarkId) -> Result<(), BookmarkServiceError> {
        if self.repo.delete(id)? {
            Ok(())
        } else {
            Err(BookmarkServiceError::BookmarkNotFound(id))
        }
    }

    /// Runs a draft batch through create-if-absent in one transaction.
    ///
    /// Candidates resolve in input order; duplicate detection is surfaced
    /// as counts, never as an error. A draft with an unusable URL aborts
    /// the batch before any write happens.
    pub fn import_drafts(
        &mut self,
        drafts: impl IntoIterator<Item = BookmarkDraft>,
    ) -> Result<ImportSummary, BookmarkServiceError> {
        let mut batch = Vec::new();
        for draft in drafts {
            batch.push(NewBookmark::from_draft(&draft)?);
        }

        let total = batch.len();
        let (imported, skipped_duplicates) = self.repo.upsert_batch(&batch)?;
        info!(
            "event=bulk_import module=service status=ok total={total} imported={imported} skipped={skipped_duplicates}"
        );

        Ok(ImportSummary {
            imported,
            skipped_duplicates,
        })
    }
}
