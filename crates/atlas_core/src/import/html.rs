//! Importer for Netscape-style bookmark HTML exports.
//!
//! # Responsibility
//! - Scan exported HTML for anchor elements and yield one draft per anchor
//!   carrying an `href`.
//! - Extract title text, `tags` and `description` attributes the way the
//!   common browser export format spells them.
//!
//! # Invariants
//! - Parsing is lazy and restartable; re-parsing the same input yields the
//!   same drafts in document order.
//! - Anchors without an `href` are skipped silently, never an error.
//! - The `source` label is fixed for a whole parse call.

use crate::model::bookmark::BookmarkDraft;
use once_cell::sync::Lazy;
use regex::{CaptureMatches, Regex};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::{Path, PathBuf};

/// Source label stamped on drafts when none is configured explicitly.
pub const DEFAULT_SOURCE_LABEL: &str = "html-import";

static ANCHOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<a\b([^>]*)>(.*?)</a\s*>").expect("valid anchor regex"));
static ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)([a-z][a-z0-9_-]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
        .expect("valid attribute regex")
});
static MARKUP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid markup regex"));

pub type ImportResult<T> = Result<T, ImportError>;

/// Error for importer I/O failures. Parsing itself never fails.
#[derive(Debug)]
pub enum ImportError {
    ReadFile { path: PathBuf, source: io::Error },
}

impl Display for ImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReadFile { path, source } => {
                write!(f, "failed to read bookmark export `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ReadFile { source, .. } => Some(source),
        }
    }
}

/// Parses exported bookmark HTML into `BookmarkDraft` values.
#[derive(Debug, Clone)]
pub struct HtmlImporter {
    source: Option<String>,
}

impl Default for HtmlImporter {
    fn default() -> Self {
        Self {
            source: Some(DEFAULT_SOURCE_LABEL.to_string()),
        }
    }
}

impl HtmlImporter {
    /// Creates an importer stamping the default source label on drafts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an importer with a custom (or absent) source label.
    pub fn with_source(source: Option<String>) -> Self {
        Self { source }
    }

    /// Lazily parses anchors from the provided HTML.
    ///
    /// The returned iterator yields drafts in document order and can be
    /// recreated from the same input for an identical sequence.
    pub fn parse<'h>(&self, html: &'h str) -> Anchors<'h> {
        Anchors {
            matches: Lazy::force(&ANCHOR_RE).captures_iter(html),
            source: self.source.clone(),
        }
    }

    /// Reads and parses an export file in one call.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> ImportResult<Vec<BookmarkDraft>> {
        let path = path.as_ref();
        let html = std::fs::read_to_string(path).map_err(|source| ImportError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(self.parse(&html).collect())
    }
}

/// Lazy draft sequence over the anchors of one HTML document.
pub struct Anchors<'h> {
    matches: CaptureMatches<'static, 'h>,
    source: Option<String>,
}

impl Iterator for Anchors<'_> {
    type Item = BookmarkDraft;

    fn next(&mut self) -> Option<BookmarkDraft> {
        loop {
            let captures = self.matches.next()?;
            let attrs = parse_attributes(captures.get(1).map_or("", |m| m.as_str()));

            let href = match attrs.get("href") {
                Some(value) if !value.is_empty() => value.clone(),
                _ => continue,
            };

            let text = visible_text(captures.get(2).map_or("", |m| m.as_str()));
            let title = if text.is_empty() { href.clone() } else { text };

            let mut draft = BookmarkDraft::new(href, title);
            draft.description = attrs.get("description").cloned();
            draft.source = self.source.clone();
            if let Some(raw) = attrs.get("tags") {
                draft.tags = raw
                    .split(',')
                    .map(str::trim)
                    .filter(|tag| !tag.is_empty())
                    .map(str::to_string)
                    .collect();
            }

            return Some(draft);
        }
    }
}

/// Collects attributes from an anchor's attribute blob.
///
/// Names are lower-cased (exports commonly shout `HREF`/`TAGS`); for a
/// repeated attribute the first occurrence wins.
fn parse_attributes(blob: &str) -> HashMap<String, String> {
    let mut attrs = HashMap::new();
    for captures in Lazy::force(&ATTR_RE).captures_iter(blob) {
        let name = captures[1].to_lowercase();
        let value = captures
            .get(2)
            .or_else(|| captures.get(3))
            .map_or("", |m| m.as_str());
        attrs.entry(name).or_insert_with(|| decode_entities(value));
    }
    attrs
}

/// Derives the visible text of an anchor: inner markup removed, basic
/// entities decoded, surrounding whitespace trimmed.
fn visible_text(inner_html: &str) -> String {
    let stripped = Lazy::force(&MARKUP_RE).replace_all(inner_html, "");
    decode_entities(stripped.trim())
}

fn decode_entities(value: &str) -> String {
    value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
