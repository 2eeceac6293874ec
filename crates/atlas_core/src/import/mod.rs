//! Bookmark importers.
//!
//! # Responsibility
//! - Turn external export formats into `BookmarkDraft` sequences.
//!
//! # Invariants
//! - Importers never deduplicate; the create-if-absent store path owns
//!   that decision.

pub mod html;
