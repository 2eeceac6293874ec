//! URL normalization for duplicate detection.
//!
//! # Responsibility
//! - Map a raw URL string to the canonical key used by the unique index.
//! - Strip noise that does not change link identity: case, `www.`, trailing
//!   slashes, fragments and tracking query parameters.
//!
//! # Invariants
//! - `normalize_url` is deterministic and has no side effects.
//! - Re-normalizing an already normalized URL yields the same string.
//! - Query parameter order survives normalization.

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Query keys dropped during normalization: `utm_` prefixed keys plus the
/// Facebook and Google click identifiers, matched case-insensitively.
static TRACKING_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:utm_|fbclid$|gclid$)").expect("valid tracking key regex"));

pub type NormalizeResult<T> = Result<T, NormalizeError>;

/// Error for URL normalization input failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizeError {
    /// Input was empty or whitespace-only.
    EmptyUrl,
}

impl Display for NormalizeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyUrl => write!(f, "URL cannot be empty"),
        }
    }
}

impl Error for NormalizeError {}

/// Normalizes the provided URL for deduplication purposes.
///
/// Steps, in order:
/// 1. trim surrounding whitespace (empty input is rejected);
/// 2. split into scheme, host, path and query, discarding any fragment;
/// 3. lower-case the scheme, defaulting an absent scheme to `https`;
/// 4. lower-case the host and strip one leading `www.`;
/// 5. strip trailing `/` from the path, defaulting an empty path to `/`;
/// 6. drop tracking query parameters, keeping the rest in original order.
///
/// Host-less inputs such as `mailto:` URLs run through the same steps; the
/// host handling is simply a no-op on an empty authority.
pub fn normalize_url(raw: &str) -> NormalizeResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(NormalizeError::EmptyUrl);
    }

    let parts = split_url(trimmed);

    let mut scheme = parts.scheme.to_lowercase();
    if scheme.is_empty() {
        scheme = "https".to_string();
    }

    let mut host = parts.authority.to_lowercase();
    if let Some(stripped) = host.strip_prefix("www.") {
        host = stripped.to_string();
    }

    let path = parts.path.trim_end_matches('/');
    let path = if path.is_empty() { "/" } else { path };

    let query = strip_tracking_params(parts.query);

    Ok(recompose(&scheme, &host, path, &query))
}

struct UrlParts<'a> {
    scheme: &'a str,
    authority: &'a str,
    path: &'a str,
    query: &'a str,
}

fn split_url(input: &str) -> UrlParts<'_> {
    let without_fragment = input.split_once('#').map_or(input, |(head, _)| head);

    let (scheme, rest) = match without_fragment.split_once(':') {
        Some((candidate, tail)) if is_scheme(candidate) => (candidate, tail),
        _ => ("", without_fragment),
    };

    let (authority, path_and_query) = match rest.strip_prefix("//") {
        Some(stripped) => {
            let end = stripped.find(['/', '?']).unwrap_or(stripped.len());
            (&stripped[..end], &stripped[end..])
        }
        None => ("", rest),
    };

    let (path, query) = match path_and_query.split_once('?') {
        Some((path, query)) => (path, query),
        None => (path_and_query, ""),
    };

    UrlParts {
        scheme,
        authority,
        path,
        query,
    }
}

fn is_scheme(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        _ => false,
    }
}

/// Drops tracking segments from a raw query string.
///
/// Segments are `key=value` pairs split on `&`; empty segments are dropped
/// and surviving segments keep their original relative order.
fn strip_tracking_params(query: &str) -> String {
    if query.is_empty() {
        return String::new();
    }

    let mut kept: Vec<&str> = Vec::new();
    for segment in query.split('&') {
        if segment.is_empty() {
            continue;
        }
        let key = segment.split_once('=').map_or(segment, |(key, _)| key);
        if TRACKING_KEY_RE.is_match(key) {
            continue;
        }
        kept.push(segment);
    }
    kept.join("&")
}

fn recompose(scheme: &str, host: &str, path: &str, query: &str) -> String {
    let mut out = String::with_capacity(scheme.len() + host.len() + path.len() + query.len() + 4);
    out.push_str(scheme);
    out.push(':');

    if !host.is_empty() || path.starts_with("//") {
        out.push_str("//");
        out.push_str(host);
        if !path.starts_with('/') {
            out.push('/');
        }
    }
    out.push_str(path);

    if !query.is_empty() {
        out.push('?');
        out.push_str(query);
    }
    out
}
