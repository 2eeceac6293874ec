//! Bookmark domain records.
//!
//! # Responsibility
//! - Define the transient draft produced by importers and API callers.
//! - Define the persistence-ready `NewBookmark` with its explicit
//!   construction function.
//! - Define the stored `Bookmark` and the field-by-field update patch.
//!
//! # Invariants
//! - `NewBookmark::from_draft` is the only place a normalized key is born.
//! - Tags are always canonicalized before they reach persistence.
//! - Applying a patch never touches `normalized_url`.

use crate::normalize::tags::{canonical_tag_string, split_tag_string};
use crate::normalize::url::{normalize_url, NormalizeError};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a stored bookmark.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type BookmarkId = Uuid;

/// Transient candidate record produced by parsing or by API callers.
///
/// Drafts have no identity and no normalized key; they are consumed once
/// by the create-if-absent path and discarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkDraft {
    /// Raw URL as supplied by the caller. Must be non-empty to persist.
    pub url: String,
    /// Display title. Falls back to the URL when blank.
    pub title: String,
    pub description: Option<String>,
    /// Tag values in first-occurrence order; canonicalized downstream.
    pub tags: Vec<String>,
    /// Label describing where this candidate came from.
    pub source: Option<String>,
    pub reading_time_minutes: Option<i64>,
    pub content_type: Option<String>,
    pub language: Option<String>,
}

impl BookmarkDraft {
    /// Creates a draft with only the required fields set.
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            description: None,
            tags: Vec::new(),
            source: None,
            reading_time_minutes: None,
            content_type: None,
            language: None,
        }
    }
}

/// Persistence-ready bookmark row, one step before the store.
///
/// Mirrors the stored shape minus timestamps, which the store assigns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBookmark {
    pub uuid: BookmarkId,
    pub url: String,
    /// Dedup key. Computed once here; later URL edits never refresh it.
    pub normalized_url: String,
    pub title: String,
    pub description: Option<String>,
    /// Canonical comma-joined tag string.
    pub tags: String,
    pub source: Option<String>,
    pub reading_time_minutes: Option<i64>,
    pub content_type: Option<String>,
    pub language: Option<String>,
}

impl NewBookmark {
    /// Builds a persistence-ready row from a draft.
    ///
    /// This is the single construction path into the store: the normalized
    /// key is derived here and tags are always canonicalized, with no
    /// implicit hooks involved. A blank draft title falls back to the raw
    /// URL.
    pub fn from_draft(draft: &BookmarkDraft) -> Result<Self, NormalizeError> {
        let normalized_url = normalize_url(&draft.url)?;
        let title = if draft.title.trim().is_empty() {
            draft.url.clone()
        } else {
            draft.title.clone()
        };

        Ok(Self {
            uuid: Uuid::new_v4(),
            url: draft.url.clone(),
            normalized_url,
            title,
            description: draft.description.clone(),
            tags: canonical_tag_string(&draft.tags),
            source: draft.source.clone(),
            reading_time_minutes: draft.reading_time_minutes,
            content_type: draft.content_type.clone(),
            language: draft.language.clone(),
        })
    }

    /// Validates invariants the store relies on.
    ///
    /// Checked by the repository before any SQL mutation, so rows built by
    /// hand go through the same gate as rows built from drafts.
    pub fn validate(&self) -> Result<(), BookmarkValidationError> {
        if self.url.trim().is_empty() {
            return Err(BookmarkValidationError::EmptyUrl);
        }
        if self.normalized_url.trim().is_empty() {
            return Err(BookmarkValidationError::EmptyNormalizedUrl);
        }
        if self.title.trim().is_empty() {
            return Err(BookmarkValidationError::BlankTitle);
        }
        Ok(())
    }
}

/// Validation failure for persistence-ready rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookmarkValidationError {
    EmptyUrl,
    EmptyNormalizedUrl,
    BlankTitle,
}

impl Display for BookmarkValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyUrl => write!(f, "bookmark URL must not be empty"),
            Self::EmptyNormalizedUrl => write!(f, "bookmark normalized URL must not be empty"),
            Self::BlankTitle => write!(f, "bookmark title must not be blank"),
        }
    }
}

impl Error for BookmarkValidationError {}

/// Stored bookmark as read back from persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    /// Stable global ID used for lookups and updates.
    pub uuid: BookmarkId,
    /// Raw URL as originally saved (or later patched).
    pub url: String,
    /// Unique dedup key, frozen at creation time.
    pub normalized_url: String,
    pub title: String,
    pub description: Option<String>,
    /// Canonical comma-joined tag string.
    pub tags: String,
    pub source: Option<String>,
    pub reading_time_minutes: Option<i64>,
    pub content_type: Option<String>,
    pub language: Option<String>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds. Bumped on every applied patch.
    pub updated_at: i64,
}

impl Bookmark {
    /// Decomposes the canonical tag string into a list.
    pub fn tag_list(&self) -> Vec<String> {
        split_tag_string(&self.tags)
    }
}

/// Field-by-field update for a stored bookmark.
///
/// Every field is present-or-absent; absent fields are left untouched.
/// Each present field is applied by an explicit named branch in the
/// repository, so the tag canonicalization rule stays visible instead of
/// hiding behind attribute-name dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkPatch {
    /// Replaces the raw URL only. The normalized key computed at creation
    /// is intentionally left as-is, so a patched URL can drift from its
    /// dedup key.
    pub url: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Replacement tag set; canonicalized on apply.
    pub tags: Option<Vec<String>>,
    pub source: Option<String>,
    pub reading_time_minutes: Option<i64>,
    pub content_type: Option<String>,
    pub language: Option<String>,
}

impl BookmarkPatch {
    /// Returns whether the patch carries no fields at all.
    pub fn is_empty(&self) -> bool {
        self.url.is_none()
            && self.title.is_none()
            && self.description.is_none()
            && self.tags.is_none()
            && self.source.is_none()
            && self.reading_time_minutes.is_none()
            && self.content_type.is_none()
            && self.language.is_none()
    }
}
